use std::fmt;

use super::range::{CaseRange, DELTA};
use super::scalar;
use super::width::LaneWidth;

/// A bound conversion routine. Callers must only invoke a kernel obtained
/// from [`kernel_for`], which verified the CPU supports its instructions.
pub(crate) type KernelFn = unsafe fn(&mut [u8], &LaneConstants);

/// One byte broadcast across the widest register, aligned for aligned loads.
#[repr(C, align(64))]
#[derive(Clone, Copy)]
struct Splat([u8; 64]);

#[cfg_attr(
    not(any(target_arch = "x86_64", target_arch = "aarch64")),
    allow(dead_code)
)]
impl Splat {
    const fn new(b: u8) -> Splat {
        Splat([b; 64])
    }

    #[inline(always)]
    fn as_ptr(&self) -> *const u8 {
        self.0.as_ptr()
    }
}

const LSB: u64 = 0x0101_0101_0101_0101;
const MSB: u64 = 0x8080_8080_8080_8080;

/// Broadcast constants read by every kernel call.
///
/// Built once when the converter is prepared and never mutated afterwards,
/// so kernels only ever borrow them.
#[cfg_attr(
    not(any(target_arch = "x86_64", target_arch = "aarch64")),
    allow(dead_code)
)]
pub struct LaneConstants {
    range: CaseRange,
    delta: Splat,
    base: Splat,
    top: Splat,
    ones: Splat,
    // Packed u64 forms for the 8-byte kernel.
    base_bias: u64,
    top_bias: u64,
    delta_word: u64,
    ones_word: u64,
}

impl LaneConstants {
    pub fn new(range: CaseRange) -> LaneConstants {
        LaneConstants {
            range,
            delta: Splat::new(DELTA),
            base: Splat::new(range.base),
            top: Splat::new(range.top),
            ones: Splat::new(0xFF),
            base_bias: LSB * u64::from(0x7F - range.base),
            top_bias: LSB * u64::from(0x7F - range.top),
            delta_word: LSB * u64::from(DELTA),
            ones_word: u64::MAX,
        }
    }

    #[inline]
    pub fn range(&self) -> CaseRange {
        self.range
    }
}

impl fmt::Debug for LaneConstants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaneConstants")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

/// Pick the kernel for `lanes`, or `None` if this CPU (or target) cannot
/// run it. The feature is re-checked here even after the capability
/// report, so an unsupported instruction is never reachable.
pub(crate) fn kernel_for<const LOWER: bool>(lanes: LaneWidth) -> Option<KernelFn> {
    match lanes {
        LaneWidth::Scalar => Some(convert_scalar::<LOWER> as KernelFn),
        LaneWidth::W8 => Some(convert_swar::<LOWER> as KernelFn),
        #[cfg(target_arch = "x86_64")]
        LaneWidth::W16 if is_x86_feature_detected!("sse4.1") => {
            Some(convert_sse41::<LOWER> as KernelFn)
        }
        #[cfg(target_arch = "aarch64")]
        LaneWidth::W16 if std::arch::is_aarch64_feature_detected!("neon") => {
            Some(convert_neon::<LOWER> as KernelFn)
        }
        #[cfg(target_arch = "x86_64")]
        LaneWidth::W32 if is_x86_feature_detected!("avx2") => {
            Some(convert_avx2::<LOWER> as KernelFn)
        }
        #[cfg(target_arch = "x86_64")]
        LaneWidth::W64
            if is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx512bw") =>
        {
            Some(convert_avx512::<LOWER> as KernelFn)
        }
        _ => None,
    }
}

fn convert_scalar<const LOWER: bool>(buf: &mut [u8], k: &LaneConstants) {
    scalar::convert::<LOWER>(buf, k.range);
}

// ============================================================================
// 8-byte lanes: SIMD within a u64 register
// ============================================================================

/// Lane-isolated wrapping add: no carry crosses a byte boundary.
#[inline(always)]
fn add_lanes(x: u64, y: u64) -> u64 {
    ((x & !MSB) + (y & !MSB)) ^ ((x ^ y) & MSB)
}

/// Lane-isolated wrapping subtract: no borrow crosses a byte boundary.
#[inline(always)]
fn sub_lanes(x: u64, y: u64) -> u64 {
    ((x | MSB) - (y & !MSB)) ^ ((x ^ !y) & MSB)
}

#[inline(always)]
fn swar_word<const LOWER: bool>(x: u64, k: &LaneConstants) -> u64 {
    // With the top bit cleared, v + (0x7F - bound) reaches 0x80 exactly when
    // v > bound, and never carries out of the byte.
    let low7 = x & !MSB;
    let gt_base = (low7 + k.base_bias) & MSB;
    let gt_top = (low7 + k.top_bias) & MSB;
    let le_top = gt_top ^ k.ones_word;
    // Bytes >= 0x80 are never letters.
    let in_range = gt_base & le_top & !x;
    let mask = (in_range >> 7) * 0xFF;

    let shifted = if LOWER {
        add_lanes(x, k.delta_word)
    } else {
        sub_lanes(x, k.delta_word)
    };
    (x & !mask) | (shifted & mask)
}

fn convert_swar<const LOWER: bool>(buf: &mut [u8], k: &LaneConstants) {
    let mut chunks = buf.chunks_exact_mut(8);
    for chunk in &mut chunks {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        let out = swar_word::<LOWER>(u64::from_ne_bytes(word), k);
        chunk.copy_from_slice(&out.to_ne_bytes());
    }
    scalar::convert::<LOWER>(chunks.into_remainder(), k.range);
}

// ============================================================================
// x86_64: SSE4.1 (16), AVX2 (32), AVX-512BW (64)
// ============================================================================
//
// All three run the same shape per window: two compares against the bounds,
// invert the upper compare with an all-ones XOR, AND into the in-range mask,
// shift a copy unconditionally, blend by mask, store. The compares are
// signed, so bytes >= 0x80 read as negative and never pass `> base`.

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2,sse4.1")]
unsafe fn convert_sse41<const LOWER: bool>(buf: &mut [u8], k: &LaneConstants) {
    unsafe {
        use std::arch::x86_64::*;
        let delta = _mm_load_si128(k.delta.as_ptr() as *const __m128i);
        let base = _mm_load_si128(k.base.as_ptr() as *const __m128i);
        let top = _mm_load_si128(k.top.as_ptr() as *const __m128i);
        let ones = _mm_load_si128(k.ones.as_ptr() as *const __m128i);

        let ptr = buf.as_mut_ptr();
        let len = buf.len();
        let mut i = 0;
        while i + 16 <= len {
            let data = _mm_loadu_si128(ptr.add(i) as *const __m128i);
            let gt_base = _mm_cmpgt_epi8(data, base);
            let le_top = _mm_xor_si128(_mm_cmpgt_epi8(data, top), ones);
            let in_range = _mm_and_si128(gt_base, le_top);
            let shifted = if LOWER {
                _mm_add_epi8(data, delta)
            } else {
                _mm_sub_epi8(data, delta)
            };
            _mm_storeu_si128(
                ptr.add(i) as *mut __m128i,
                _mm_blendv_epi8(data, shifted, in_range),
            );
            i += 16;
        }
        scalar::convert::<LOWER>(&mut buf[i..], k.range);
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn convert_avx2<const LOWER: bool>(buf: &mut [u8], k: &LaneConstants) {
    unsafe {
        use std::arch::x86_64::*;
        let delta = _mm256_load_si256(k.delta.as_ptr() as *const __m256i);
        let base = _mm256_load_si256(k.base.as_ptr() as *const __m256i);
        let top = _mm256_load_si256(k.top.as_ptr() as *const __m256i);
        let ones = _mm256_load_si256(k.ones.as_ptr() as *const __m256i);

        let ptr = buf.as_mut_ptr();
        let len = buf.len();
        let mut i = 0;
        while i + 32 <= len {
            let data = _mm256_loadu_si256(ptr.add(i) as *const __m256i);
            let gt_base = _mm256_cmpgt_epi8(data, base);
            let le_top = _mm256_xor_si256(_mm256_cmpgt_epi8(data, top), ones);
            let in_range = _mm256_and_si256(gt_base, le_top);
            let shifted = if LOWER {
                _mm256_add_epi8(data, delta)
            } else {
                _mm256_sub_epi8(data, delta)
            };
            _mm256_storeu_si256(
                ptr.add(i) as *mut __m256i,
                _mm256_blendv_epi8(data, shifted, in_range),
            );
            i += 32;
        }
        scalar::convert::<LOWER>(&mut buf[i..], k.range);
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx512f,avx512bw")]
unsafe fn convert_avx512<const LOWER: bool>(buf: &mut [u8], k: &LaneConstants) {
    unsafe {
        use std::arch::x86_64::*;
        let delta = _mm512_loadu_epi8(k.delta.as_ptr() as *const i8);
        let base = _mm512_loadu_epi8(k.base.as_ptr() as *const i8);
        let top = _mm512_loadu_epi8(k.top.as_ptr() as *const i8);
        // Compares produce k-masks here, so the inversion operand is a mask too.
        let ones: __mmask64 = k.ones_word;

        let ptr = buf.as_mut_ptr();
        let len = buf.len();
        let mut i = 0;
        while i + 64 <= len {
            let data = _mm512_loadu_epi8(ptr.add(i) as *const i8);
            let gt_base = _mm512_cmpgt_epi8_mask(data, base);
            let le_top = _mm512_cmpgt_epi8_mask(data, top) ^ ones;
            let in_range = gt_base & le_top;
            let shifted = if LOWER {
                _mm512_add_epi8(data, delta)
            } else {
                _mm512_sub_epi8(data, delta)
            };
            _mm512_storeu_epi8(
                ptr.add(i) as *mut i8,
                _mm512_mask_blend_epi8(in_range, data, shifted),
            );
            i += 64;
        }
        scalar::convert::<LOWER>(&mut buf[i..], k.range);
    }
}

// ============================================================================
// aarch64: NEON (16)
// ============================================================================

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn convert_neon<const LOWER: bool>(buf: &mut [u8], k: &LaneConstants) {
    unsafe {
        use std::arch::aarch64::*;
        let delta = vld1q_u8(k.delta.as_ptr());
        let base = vld1q_u8(k.base.as_ptr());
        let top = vld1q_u8(k.top.as_ptr());
        let ones = vld1q_u8(k.ones.as_ptr());

        let ptr = buf.as_mut_ptr();
        let len = buf.len();
        let mut i = 0;
        while i + 16 <= len {
            let data = vld1q_u8(ptr.add(i));
            let gt_base = vcgtq_u8(data, base);
            let le_top = veorq_u8(vcgtq_u8(data, top), ones);
            let in_range = vandq_u8(gt_base, le_top);
            let shifted = if LOWER {
                vaddq_u8(data, delta)
            } else {
                vsubq_u8(data, delta)
            };
            vst1q_u8(ptr.add(i), vbslq_u8(in_range, shifted, data));
            i += 16;
        }
        scalar::convert::<LOWER>(&mut buf[i..], k.range);
    }
}
