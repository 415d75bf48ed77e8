use super::range::{CaseRange, DELTA};

/// Shift one byte by [`DELTA`] if it lies in `range`.
///
/// Branchless: the shift is multiplied by the 0/1 result of the range test,
/// so there is no data-dependent branch in the loops that call this.
/// `LOWER` picks the sign at compile time (add when lower-casing).
#[inline(always)]
pub(crate) fn shift_byte<const LOWER: bool>(b: u8, range: CaseRange) -> u8 {
    let step = DELTA * range.contains(b) as u8;
    if LOWER {
        b.wrapping_add(step)
    } else {
        b.wrapping_sub(step)
    }
}

/// Convert `buf` in place one byte at a time.
#[inline]
pub fn convert<const LOWER: bool>(buf: &mut [u8], range: CaseRange) {
    for b in buf.iter_mut() {
        *b = shift_byte::<LOWER>(*b, range);
    }
}

/// Upper-case `buf` in place without vector instructions.
pub fn to_upper(buf: &mut [u8]) {
    convert::<false>(buf, CaseRange::LOWER_LETTERS);
}

/// Lower-case `buf` in place without vector instructions.
pub fn to_lower(buf: &mut [u8]) {
    convert::<true>(buf, CaseRange::UPPER_LETTERS);
}
