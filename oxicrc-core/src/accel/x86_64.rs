//! x86_64 backend: SSE4.2 `crc32` and PCLMULQDQ.

use super::StreamConfig;
use super::kernel;
use super::ops::Ops;
use core::arch::x86_64::*;

/// Check if SSE4.2 and PCLMULQDQ are available at runtime.
#[inline]
pub(super) fn is_supported() -> bool {
    #[cfg(all(target_feature = "sse4.2", target_feature = "pclmulqdq"))]
    {
        true
    }
    #[cfg(not(all(target_feature = "sse4.2", target_feature = "pclmulqdq")))]
    {
        is_x86_feature_detected!("sse4.2") && is_x86_feature_detected!("pclmulqdq")
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Sse42Pclmul;

impl Ops for Sse42Pclmul {
    type V128 = __m128i;

    #[inline(always)]
    unsafe fn crc_u8(crc: u32, value: u8) -> u32 {
        unsafe { _mm_crc32_u8(crc, value) }
    }

    #[inline(always)]
    unsafe fn crc_u16(crc: u32, value: u16) -> u32 {
        unsafe { _mm_crc32_u16(crc, value) }
    }

    #[inline(always)]
    unsafe fn crc_u32(crc: u32, value: u32) -> u32 {
        unsafe { _mm_crc32_u32(crc, value) }
    }

    #[inline(always)]
    unsafe fn crc_u64(crc: u32, value: u64) -> u32 {
        unsafe { _mm_crc32_u64(crc as u64, value) as u32 }
    }

    #[inline(always)]
    unsafe fn load(ptr: *const u8) -> __m128i {
        unsafe { _mm_loadu_si128(ptr.cast()) }
    }

    #[inline(always)]
    unsafe fn set(low: u64, high: u64) -> __m128i {
        unsafe { _mm_set_epi64x(high as i64, low as i64) }
    }

    #[inline(always)]
    unsafe fn zero() -> __m128i {
        unsafe { _mm_setzero_si128() }
    }

    #[inline(always)]
    unsafe fn clmul_low(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_clmulepi64_si128::<0x00>(a, b) }
    }

    #[inline(always)]
    unsafe fn clmul_high(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_clmulepi64_si128::<0x11>(a, b) }
    }

    #[inline(always)]
    unsafe fn clmul_01(a: __m128i, b: __m128i) -> __m128i {
        // imm bit 0 picks the high qword of `a`, bit 4 the low qword of `b`
        unsafe { _mm_clmulepi64_si128::<0x01>(a, b) }
    }

    #[inline(always)]
    unsafe fn xor(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_xor_si128(a, b) }
    }

    #[inline(always)]
    unsafe fn and(a: __m128i, b: __m128i) -> __m128i {
        unsafe { _mm_and_si128(a, b) }
    }

    #[inline(always)]
    unsafe fn shr_4_bytes(v: __m128i) -> __m128i {
        unsafe { _mm_srli_si128::<4>(v) }
    }

    #[inline(always)]
    unsafe fn shr_8_bytes(v: __m128i) -> __m128i {
        unsafe { _mm_srli_si128::<8>(v) }
    }

    #[inline(always)]
    unsafe fn low_u64(v: __m128i) -> u64 {
        unsafe { _mm_cvtsi128_si64(v) as u64 }
    }
}

/// Multi-stream extend.
///
/// # Safety
///
/// The CPU must support SSE4.2 and PCLMULQDQ; see [`is_supported`].
#[target_feature(enable = "sse4.2,pclmulqdq")]
pub(super) unsafe fn extend(config: StreamConfig, crc: u32, data: &[u8]) -> u32 {
    unsafe { kernel::extend::<Sse42Pclmul>(config, crc, data) }
}

/// Zero extension by carry-less multiplication.
///
/// # Safety
///
/// The CPU must support SSE4.2 and PCLMULQDQ; see [`is_supported`].
#[target_feature(enable = "sse4.2,pclmulqdq")]
pub(super) unsafe fn extend_by_zeroes(crc: u32, length: usize) -> u32 {
    unsafe { kernel::extend_by_zeroes::<Sse42Pclmul>(crc, length) }
}

/// `a * b mod P`.
///
/// # Safety
///
/// The CPU must support SSE4.2 and PCLMULQDQ; see [`is_supported`].
#[cfg(test)]
#[target_feature(enable = "sse4.2,pclmulqdq")]
pub(super) unsafe fn multiply(a: u32, b: u32) -> u32 {
    unsafe { kernel::multiply::<Sse42Pclmul>(a, b) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::CRC32C_POWERS;
    use crate::generic;
    use crate::tables::{CRC32C_POLY, poly_multiply};

    #[test]
    fn test_multiply_matches_table_multiply() {
        if !is_supported() {
            return;
        }
        let mut a = 0x1234_5678u32;
        let mut b = 0x9ABC_DEF0u32;
        for _ in 0..1000 {
            // SAFETY: support checked above
            let got = unsafe { multiply(a, b) };
            assert_eq!(got, poly_multiply(a, b, CRC32C_POLY));
            a = a.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            b = b.rotate_left(7) ^ a;
        }
        // SAFETY: support checked above
        let squared = unsafe { multiply(CRC32C_POWERS[0], CRC32C_POWERS[0]) };
        assert_eq!(squared, CRC32C_POWERS[1]);
    }

    #[test]
    fn test_extend_by_zeroes_matches_generic() {
        if !is_supported() {
            return;
        }
        for length in (0..200).chain([1023, 1024, 1 << 20, (1 << 40) + 3, usize::MAX]) {
            let crc = 0xA5A5_5A5A ^ length as u32;
            // SAFETY: support checked above
            let got = unsafe { extend_by_zeroes(crc, length) };
            assert_eq!(got, generic::extend_by_zeroes(crc, length), "length {length}");
        }
    }

    #[test]
    fn test_hardware_step_matches_table() {
        if !is_supported() {
            return;
        }
        let data = b"123456789";
        let mut crc = CRC32C_POLY;
        for &byte in data {
            // SAFETY: support checked above
            crc = unsafe { _mm_crc32_u8(crc, byte) };
        }
        assert_eq!(crc, generic::extend(CRC32C_POLY, data));
    }
}
