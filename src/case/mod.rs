mod dispatch;
mod driver;
mod range;
pub mod scalar;
mod vector;
mod width;


pub use self::dispatch::{CaseConverter, DispatchError};
pub use self::driver::{convert_bytes, convert_stream};
pub use self::range::{
    CaseRange, DELTA, LOWER_BASE, LOWER_TOP, Mode, SWITCH_LOWERCASE, SWITCH_UPPERCASE,
    UPPER_BASE, UPPER_TOP,
};
pub use self::vector::LaneConstants;
pub use self::width::{LaneWidth, detect};
