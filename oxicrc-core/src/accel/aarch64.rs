//! aarch64 backend: ARMv8 CRC32C instructions and PMULL.

use super::StreamConfig;
use super::kernel;
use super::ops::Ops;
use core::arch::aarch64::*;

/// Check if the CRC and PMULL extensions are available at runtime.
#[inline]
pub(super) fn is_supported() -> bool {
    #[cfg(all(target_feature = "crc", target_feature = "aes"))]
    {
        true
    }
    #[cfg(not(all(target_feature = "crc", target_feature = "aes")))]
    {
        std::arch::is_aarch64_feature_detected!("crc")
            && std::arch::is_aarch64_feature_detected!("aes")
            && std::arch::is_aarch64_feature_detected!("pmull")
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct CrcPmull;

impl CrcPmull {
    #[inline(always)]
    unsafe fn from_p128(product: p128) -> uint64x2_t {
        unsafe { vcombine_u64(vcreate_u64(product as u64), vcreate_u64((product >> 64) as u64)) }
    }
}

impl Ops for CrcPmull {
    type V128 = uint64x2_t;

    #[inline(always)]
    unsafe fn crc_u8(crc: u32, value: u8) -> u32 {
        unsafe { __crc32cb(crc, value) }
    }

    #[inline(always)]
    unsafe fn crc_u16(crc: u32, value: u16) -> u32 {
        unsafe { __crc32ch(crc, value) }
    }

    #[inline(always)]
    unsafe fn crc_u32(crc: u32, value: u32) -> u32 {
        unsafe { __crc32cw(crc, value) }
    }

    #[inline(always)]
    unsafe fn crc_u64(crc: u32, value: u64) -> u32 {
        unsafe { __crc32cd(crc, value) }
    }

    #[inline(always)]
    unsafe fn load(ptr: *const u8) -> uint64x2_t {
        unsafe { vreinterpretq_u64_u8(vld1q_u8(ptr)) }
    }

    #[inline(always)]
    unsafe fn set(low: u64, high: u64) -> uint64x2_t {
        unsafe { vcombine_u64(vcreate_u64(low), vcreate_u64(high)) }
    }

    #[inline(always)]
    unsafe fn zero() -> uint64x2_t {
        unsafe { vdupq_n_u64(0) }
    }

    #[inline(always)]
    unsafe fn clmul_low(a: uint64x2_t, b: uint64x2_t) -> uint64x2_t {
        unsafe {
            Self::from_p128(vmull_p64(
                vgetq_lane_u64::<0>(a),
                vgetq_lane_u64::<0>(b),
            ))
        }
    }

    #[inline(always)]
    unsafe fn clmul_high(a: uint64x2_t, b: uint64x2_t) -> uint64x2_t {
        unsafe {
            Self::from_p128(vmull_p64(
                vgetq_lane_u64::<1>(a),
                vgetq_lane_u64::<1>(b),
            ))
        }
    }

    #[inline(always)]
    unsafe fn clmul_01(a: uint64x2_t, b: uint64x2_t) -> uint64x2_t {
        unsafe {
            Self::from_p128(vmull_p64(
                vgetq_lane_u64::<1>(a),
                vgetq_lane_u64::<0>(b),
            ))
        }
    }

    #[inline(always)]
    unsafe fn xor(a: uint64x2_t, b: uint64x2_t) -> uint64x2_t {
        unsafe { veorq_u64(a, b) }
    }

    #[inline(always)]
    unsafe fn and(a: uint64x2_t, b: uint64x2_t) -> uint64x2_t {
        unsafe { vandq_u64(a, b) }
    }

    #[inline(always)]
    unsafe fn shr_4_bytes(v: uint64x2_t) -> uint64x2_t {
        unsafe { vreinterpretq_u64_u8(vextq_u8::<4>(vreinterpretq_u8_u64(v), vdupq_n_u8(0))) }
    }

    #[inline(always)]
    unsafe fn shr_8_bytes(v: uint64x2_t) -> uint64x2_t {
        unsafe { vreinterpretq_u64_u8(vextq_u8::<8>(vreinterpretq_u8_u64(v), vdupq_n_u8(0))) }
    }

    #[inline(always)]
    unsafe fn low_u64(v: uint64x2_t) -> u64 {
        unsafe { vgetq_lane_u64::<0>(v) }
    }
}

/// Multi-stream extend.
///
/// # Safety
///
/// The CPU must support CRC and PMULL; see [`is_supported`].
#[target_feature(enable = "crc,aes,neon")]
pub(super) unsafe fn extend(config: StreamConfig, crc: u32, data: &[u8]) -> u32 {
    unsafe { kernel::extend::<CrcPmull>(config, crc, data) }
}

/// Zero extension by carry-less multiplication.
///
/// # Safety
///
/// The CPU must support CRC and PMULL; see [`is_supported`].
#[target_feature(enable = "crc,aes,neon")]
pub(super) unsafe fn extend_by_zeroes(crc: u32, length: usize) -> u32 {
    unsafe { kernel::extend_by_zeroes::<CrcPmull>(crc, length) }
}

/// `a * b mod P`.
///
/// # Safety
///
/// The CPU must support CRC and PMULL; see [`is_supported`].
#[cfg(test)]
#[target_feature(enable = "crc,aes,neon")]
pub(super) unsafe fn multiply(a: u32, b: u32) -> u32 {
    unsafe { kernel::multiply::<CrcPmull>(a, b) }
}
