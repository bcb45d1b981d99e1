//! SIMD primitives used by the accelerated kernel.
//!
//! Each architecture implements [`Ops`] on a zero-sized type. Every method is
//! `#[inline(always)]` so that it is compiled inside the caller's
//! `#[target_feature]` entry point.

/// Hardware CRC32C steps plus 128-bit carry-less multiply helpers.
///
/// # Safety
///
/// All methods require the CPU features of the implementing architecture.
/// Pointer arguments must be valid for the number of bytes read.
pub(super) trait Ops {
    /// A 128-bit vector viewed as two 64-bit lanes `[low, high]`.
    type V128: Copy;

    unsafe fn crc_u8(crc: u32, value: u8) -> u32;
    unsafe fn crc_u16(crc: u32, value: u16) -> u32;
    unsafe fn crc_u32(crc: u32, value: u32) -> u32;
    unsafe fn crc_u64(crc: u32, value: u64) -> u32;

    /// Unaligned 16-byte load.
    unsafe fn load(ptr: *const u8) -> Self::V128;
    unsafe fn set(low: u64, high: u64) -> Self::V128;
    unsafe fn zero() -> Self::V128;

    /// `a.low * b.low`
    unsafe fn clmul_low(a: Self::V128, b: Self::V128) -> Self::V128;
    /// `a.high * b.high`
    unsafe fn clmul_high(a: Self::V128, b: Self::V128) -> Self::V128;
    /// `a.high * b.low`
    unsafe fn clmul_01(a: Self::V128, b: Self::V128) -> Self::V128;

    unsafe fn xor(a: Self::V128, b: Self::V128) -> Self::V128;
    unsafe fn and(a: Self::V128, b: Self::V128) -> Self::V128;

    /// Logical right shift of the whole vector by 4 bytes.
    unsafe fn shr_4_bytes(v: Self::V128) -> Self::V128;
    /// Logical right shift of the whole vector by 8 bytes.
    unsafe fn shr_8_bytes(v: Self::V128) -> Self::V128;

    /// The low 64-bit lane.
    unsafe fn low_u64(v: Self::V128) -> u64;

    /// Bits 32..64 of the low lane.
    #[inline(always)]
    unsafe fn extract_u32_1(v: Self::V128) -> u32 {
        unsafe { (Self::low_u64(v) >> 32) as u32 }
    }
}

/// Read a little-endian `u64` at any alignment.
#[inline(always)]
pub(super) unsafe fn read_u64(ptr: *const u8) -> u64 {
    unsafe { u64::from_le(ptr.cast::<u64>().read_unaligned()) }
}

/// Read a little-endian `u32` at any alignment.
#[inline(always)]
pub(super) unsafe fn read_u32(ptr: *const u8) -> u32 {
    unsafe { u32::from_le(ptr.cast::<u32>().read_unaligned()) }
}

/// Read a little-endian `u16` at any alignment.
#[inline(always)]
pub(super) unsafe fn read_u16(ptr: *const u8) -> u16 {
    unsafe { u16::from_le(ptr.cast::<u16>().read_unaligned()) }
}
