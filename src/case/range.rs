/// ASCII distance between an upper case letter and its lower case form.
pub const DELTA: u8 = b'a' - b'A';

/// Exclusive lower bound of the lower case letters (`'a' - 1`).
pub const LOWER_BASE: u8 = b'a' - 1;
/// Inclusive upper bound of the lower case letters.
pub const LOWER_TOP: u8 = b'z';
/// Exclusive lower bound of the upper case letters (`'A' - 1`).
pub const UPPER_BASE: u8 = b'A' - 1;
/// Inclusive upper bound of the upper case letters.
pub const UPPER_TOP: u8 = b'Z';

/// Command line switch requesting lower case output.
pub const SWITCH_LOWERCASE: &str = "-a";
/// Command line switch requesting upper case output.
pub const SWITCH_UPPERCASE: &str = "-A";

/// Byte range `(base, top]` whose members get shifted by [`DELTA`].
///
/// Every kernel, vector or scalar, tests membership against the same two
/// bytes so the paths agree on the boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseRange {
    pub(crate) base: u8,
    pub(crate) top: u8,
}

impl CaseRange {
    /// Lower case letters, converted when upper-casing.
    pub const LOWER_LETTERS: CaseRange = CaseRange {
        base: LOWER_BASE,
        top: LOWER_TOP,
    };

    /// Upper case letters, converted when lower-casing.
    pub const UPPER_LETTERS: CaseRange = CaseRange {
        base: UPPER_BASE,
        top: UPPER_TOP,
    };

    /// Exclusive lower bound.
    pub fn base(self) -> u8 {
        self.base
    }

    /// Inclusive upper bound.
    pub fn top(self) -> u8 {
        self.top
    }

    #[inline(always)]
    pub fn contains(self, b: u8) -> bool {
        b > self.base && b <= self.top
    }
}

/// Conversion direction, fixed once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    ToUpper,
    ToLower,
}

impl Mode {
    /// Parse a mode switch (`-A` or `-a`).
    pub fn from_switch(arg: &[u8]) -> Option<Mode> {
        match arg {
            b"-A" => Some(Mode::ToUpper),
            b"-a" => Some(Mode::ToLower),
            _ => None,
        }
    }

    pub fn switch(self) -> &'static str {
        match self {
            Mode::ToUpper => SWITCH_UPPERCASE,
            Mode::ToLower => SWITCH_LOWERCASE,
        }
    }

    /// The letters this mode rewrites.
    #[inline]
    pub fn range(self) -> CaseRange {
        match self {
            Mode::ToUpper => CaseRange::LOWER_LETTERS,
            Mode::ToLower => CaseRange::UPPER_LETTERS,
        }
    }
}
