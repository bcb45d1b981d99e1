//! Software prefetch hints.
//!
//! Prefetches never fault, so the pointer may point past the end of the
//! buffer. Callers compute it with `wrapping_add`.

/// Prefetch for a single streaming read (non-temporal).
#[inline(always)]
pub(crate) fn prefetch_nta(ptr: *const u8) {
    #[cfg(target_arch = "x86_64")]
    // SAFETY: prefetch is a hint and ignores invalid addresses.
    unsafe {
        use core::arch::x86_64::{_MM_HINT_NTA, _mm_prefetch};
        _mm_prefetch::<_MM_HINT_NTA>(ptr.cast::<i8>());
    }

    #[cfg(target_arch = "aarch64")]
    // SAFETY: PRFM is a hint and ignores invalid addresses.
    unsafe {
        core::arch::asm!(
            "prfm pldl1strm, [{ptr}]",
            ptr = in(reg) ptr,
            options(nostack, preserves_flags, readonly)
        );
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    let _ = ptr;
}

/// Prefetch into the local (L1) cache.
#[cfg(all(feature = "accel", any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
pub(crate) fn prefetch_local(ptr: *const u8) {
    #[cfg(target_arch = "x86_64")]
    // SAFETY: prefetch is a hint and ignores invalid addresses.
    unsafe {
        use core::arch::x86_64::{_MM_HINT_T0, _mm_prefetch};
        _mm_prefetch::<_MM_HINT_T0>(ptr.cast::<i8>());
    }

    #[cfg(target_arch = "aarch64")]
    // SAFETY: PRFM is a hint and ignores invalid addresses.
    unsafe {
        core::arch::asm!(
            "prfm pldl1keep, [{ptr}]",
            ptr = in(reg) ptr,
            options(nostack, preserves_flags, readonly)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefetch_past_end_is_harmless() {
        let data = [0u8; 32];
        prefetch_nta(data.as_ptr());
        prefetch_nta(data.as_ptr().wrapping_add(4096));
        prefetch_nta(core::ptr::null());
    }
}
