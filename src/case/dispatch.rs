use std::fmt;

use thiserror::Error;

use super::range::{CaseRange, Mode};
use super::vector::{KernelFn, LaneConstants, kernel_for};
use super::width::{self, LaneWidth};

/// Startup failures. Both mean the requested width cannot run here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("compiled vector size ({wanted}) is wider than available: {available}")]
    UnsupportedWidth {
        wanted: LaneWidth,
        available: LaneWidth,
    },

    /// The CPU reports enough width but lacks the extension this build
    /// uses for it (or the target has no kernel of that width).
    #[error("{isa} instructions for {lanes}-byte lanes are not available")]
    MissingInstructions { lanes: LaneWidth, isa: &'static str },
}

impl DispatchError {
    /// Exit status the CLI reports for this failure.
    pub fn exit_code(&self) -> i32 {
        3
    }
}

/// A kernel bound to the constants of one direction.
struct Binding {
    kernel: KernelFn,
    constants: LaneConstants,
}

impl Binding {
    fn bind<const LOWER: bool>(
        lanes: LaneWidth,
        range: CaseRange,
    ) -> Result<Binding, DispatchError> {
        let kernel = kernel_for::<LOWER>(lanes).ok_or(DispatchError::MissingInstructions {
            lanes,
            isa: lanes.isa(),
        })?;
        Ok(Binding {
            kernel,
            constants: LaneConstants::new(range),
        })
    }

    #[inline(always)]
    fn run(&self, line: &mut [u8]) {
        // SAFETY: kernel_for only returns kernels whose instructions were
        // detected on this CPU.
        unsafe { (self.kernel)(line, &self.constants) }
    }
}

/// The active case conversion, chosen once per process.
///
/// `prepare` checks the requested lane width against the CPU, builds the
/// broadcast constants, and binds both entry points to the vector kernel of
/// that width (or the scalar kernel for [`LaneWidth::Scalar`]). Every call
/// afterwards forwards straight to the bound kernel.
pub struct CaseConverter {
    mode: Mode,
    lanes: LaneWidth,
    upper: Binding,
    lower: Binding,
}

impl CaseConverter {
    /// Bind `mode` to the kernel for `lanes`.
    ///
    /// Fails if `lanes` is wider than [`width::detect`] reports, so an
    /// unsupported instruction never runs. The prober is not consulted for
    /// [`LaneWidth::Scalar`].
    pub fn prepare(mode: Mode, lanes: LaneWidth) -> Result<CaseConverter, DispatchError> {
        Self::prepare_with(mode, lanes, width::detect)
    }

    /// Bind `mode` to the width this crate was built for.
    pub fn prepare_compiled(mode: Mode) -> Result<CaseConverter, DispatchError> {
        Self::prepare(mode, LaneWidth::COMPILED)
    }

    /// Bind `mode` to the widest width the CPU supports.
    pub fn prepare_detected(mode: Mode) -> Result<CaseConverter, DispatchError> {
        Self::prepare(mode, width::detect())
    }

    pub(crate) fn prepare_with(
        mode: Mode,
        lanes: LaneWidth,
        probe: impl FnOnce() -> LaneWidth,
    ) -> Result<CaseConverter, DispatchError> {
        if lanes != LaneWidth::Scalar {
            let available = probe();
            if available < lanes {
                return Err(DispatchError::UnsupportedWidth {
                    wanted: lanes,
                    available,
                });
            }
        }
        Ok(CaseConverter {
            mode,
            lanes,
            upper: Binding::bind::<false>(lanes, CaseRange::LOWER_LETTERS)?,
            lower: Binding::bind::<true>(lanes, CaseRange::UPPER_LETTERS)?,
        })
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn lanes(&self) -> LaneWidth {
        self.lanes
    }

    /// Upper-case `line` in place.
    #[inline]
    pub fn to_upper_line(&self, line: &mut [u8]) {
        self.upper.run(line);
    }

    /// Lower-case `line` in place.
    #[inline]
    pub fn to_lower_line(&self, line: &mut [u8]) {
        self.lower.run(line);
    }

    /// Convert `line` in place in the prepared mode.
    #[inline]
    pub fn convert_line(&self, line: &mut [u8]) {
        match self.mode {
            Mode::ToUpper => self.upper.run(line),
            Mode::ToLower => self.lower.run(line),
        }
    }
}

impl fmt::Debug for CaseConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseConverter")
            .field("mode", &self.mode)
            .field("lanes", &self.lanes)
            .finish()
    }
}
