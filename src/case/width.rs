use std::fmt;

/// Bytes handled by one vector instruction. `Scalar` means no vector unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LaneWidth {
    Scalar = 0,
    W8 = 8,
    W16 = 16,
    W32 = 32,
    W64 = 64,
}

impl LaneWidth {
    /// All widths, narrowest first.
    pub const ALL: [LaneWidth; 5] = [
        LaneWidth::Scalar,
        LaneWidth::W8,
        LaneWidth::W16,
        LaneWidth::W32,
        LaneWidth::W64,
    ];

    /// Width the crate was built for (see build.rs, `ACONV_LANES`).
    #[cfg(aconv_lanes = "64")]
    pub const COMPILED: LaneWidth = LaneWidth::W64;
    #[cfg(aconv_lanes = "32")]
    pub const COMPILED: LaneWidth = LaneWidth::W32;
    #[cfg(aconv_lanes = "16")]
    pub const COMPILED: LaneWidth = LaneWidth::W16;
    #[cfg(aconv_lanes = "8")]
    pub const COMPILED: LaneWidth = LaneWidth::W8;
    #[cfg(not(any(
        aconv_lanes = "8",
        aconv_lanes = "16",
        aconv_lanes = "32",
        aconv_lanes = "64"
    )))]
    pub const COMPILED: LaneWidth = LaneWidth::Scalar;

    #[inline]
    pub const fn bytes(self) -> usize {
        self as usize
    }

    pub fn from_bytes(n: usize) -> Option<LaneWidth> {
        match n {
            0 => Some(LaneWidth::Scalar),
            8 => Some(LaneWidth::W8),
            16 => Some(LaneWidth::W16),
            32 => Some(LaneWidth::W32),
            64 => Some(LaneWidth::W64),
            _ => None,
        }
    }

    /// Parse a `--lanes` value. `auto` is handled by the caller.
    pub fn parse(s: &str) -> Option<LaneWidth> {
        if s == "scalar" {
            return Some(LaneWidth::Scalar);
        }
        s.parse::<usize>().ok().and_then(LaneWidth::from_bytes)
    }

    /// Instruction set extension backing this width on the current target.
    pub fn isa(self) -> &'static str {
        match self {
            LaneWidth::Scalar => "scalar",
            LaneWidth::W8 => "swar64",
            #[cfg(target_arch = "aarch64")]
            LaneWidth::W16 => "neon",
            #[cfg(not(target_arch = "aarch64"))]
            LaneWidth::W16 => "sse4.1",
            LaneWidth::W32 => "avx2",
            LaneWidth::W64 => "avx512bw",
        }
    }
}

impl fmt::Display for LaneWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

/// Probe the running CPU for the widest supported lane width.
///
/// Checks extensions widest first and stops at the first hit.
/// Pure function of the hardware; cheap enough to call more than once,
/// but the dispatcher only calls it at startup.
pub fn detect() -> LaneWidth {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx512bw") {
            return LaneWidth::W64;
        }
        if is_x86_feature_detected!("avx2") {
            return LaneWidth::W32;
        }
        if is_x86_feature_detected!("sse4.1") {
            return LaneWidth::W16;
        }
        if is_x86_feature_detected!("mmx") {
            return LaneWidth::W8;
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            return LaneWidth::W16;
        }
    }

    LaneWidth::Scalar
}
