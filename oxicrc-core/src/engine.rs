//! The checksum engine interface.
//!
//! Every backend implements [`ChecksumEngine`]. The trait is sealed and the
//! concrete engines have no public constructors: engines are obtained from
//! the factory functions in [`crate::dispatch`] or through
//! [`crate::dispatch::singleton`].
//!
//! The accumulator is always owned by the caller. Engines are immutable and
//! may be shared freely between threads.

use crate::accel::StreamConfig;
use crate::tables::CRC32C_POLY;
use std::fmt;

/// Low half of the scrambling constant (fractional bits of the golden ratio).
pub const SCRAMBLE_LO: u64 = 0xf9ce_6030_2e76_e41b;

/// Rotation applied by [`ChecksumEngine::scramble`]. Never a divisor of 32.
pub const SCRAMBLE_ROTATE: u32 = 32 / 2 + 1;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Which implementation backs an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Portable table-driven engine.
    Generic,
    /// Hardware engine with the given lane layout.
    Accelerated(StreamConfig),
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Generic => write!(f, "generic"),
            Backend::Accelerated(config) => write!(f, "accelerated({})", config),
        }
    }
}

/// A CRC32C engine.
///
/// All operations are total. Every engine returns bit-identical results for
/// identical input, regardless of backend.
///
/// # Example
///
/// ```
/// use oxicrc_core::dispatch::singleton;
///
/// let engine = singleton();
/// let mut crc = engine.empty();
/// engine.extend(&mut crc, b"hello ");
/// let mut tail = engine.empty();
/// engine.extend(&mut tail, b"world");
/// engine.concat(&mut crc, tail, 5);
///
/// let mut whole = engine.empty();
/// engine.extend(&mut whole, b"hello world");
/// assert_eq!(crc, whole);
/// ```
pub trait ChecksumEngine: sealed::Sealed + Send + Sync + fmt::Debug {
    /// Baseline accumulator for a fresh checksum.
    ///
    /// This is the polynomial itself rather than zero, so that runs of zero
    /// bytes do not hash to zero.
    #[inline]
    fn empty(&self) -> u32 {
        CRC32C_POLY
    }

    /// Advance `crc` over `data`.
    fn extend(&self, crc: &mut u32, data: &[u8]);

    /// Advance `crc` over `length` zero bytes.
    fn extend_by_zeroes(&self, crc: &mut u32, length: usize);

    /// Undo [`extend_by_zeroes`](Self::extend_by_zeroes) over `length` bytes.
    fn unextend_by_zeroes(&self, crc: &mut u32, length: usize);

    /// Replace `crc_a` with the checksum of `a ++ b`.
    ///
    /// Both checksums must have been started from [`empty`](Self::empty).
    fn concat(&self, crc_a: &mut u32, crc_b: u32, length_b: usize) {
        let mut tmp = *crc_a ^ self.empty();
        self.extend_by_zeroes(&mut tmp, length_b);
        *crc_a = tmp ^ crc_b;
    }

    /// Apply the fixed reversible scrambling transform.
    ///
    /// The constant and rotation are part of the stored format and must not
    /// change.
    #[inline]
    fn scramble(&self, crc: &mut u32) {
        *crc = scramble(*crc);
    }

    /// Invert [`scramble`](Self::scramble).
    #[inline]
    fn unscramble(&self, crc: &mut u32) {
        *crc = unscramble(*crc);
    }

    /// The backend implementing this engine.
    fn backend(&self) -> Backend;
}

#[inline(always)]
pub(crate) fn scramble(crc: u32) -> u32 {
    crc.wrapping_add(SCRAMBLE_LO as u32)
        .rotate_right(SCRAMBLE_ROTATE)
}

#[inline(always)]
pub(crate) fn unscramble(crc: u32) -> u32 {
    crc.rotate_left(SCRAMBLE_ROTATE)
        .wrapping_sub(SCRAMBLE_LO as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::CutoffStrategy;

    #[test]
    fn test_scramble_known_values() {
        assert_eq!(scramble(0), 0x720D_973B);
        assert_eq!(scramble(CRC32C_POLY), 0x8FC9_D8B6);
    }

    #[test]
    fn test_scramble_round_trip() {
        let mut x = 0x1234_5678u32;
        for _ in 0..10_000 {
            assert_eq!(unscramble(scramble(x)), x);
            assert_eq!(scramble(unscramble(x)), x);
            x = x.wrapping_mul(0x9E37_79B9).wrapping_add(1);
        }
    }

    #[test]
    fn test_scramble_is_not_identity() {
        let fixed = (0u32..1 << 16).filter(|&x| scramble(x) == x).count();
        assert_eq!(fixed, 0);
        // Not its own inverse
        assert_ne!(scramble(scramble(0x0BAD_F00D)), 0x0BAD_F00D);
    }

    #[test]
    fn test_scramble_rotation() {
        assert_eq!(SCRAMBLE_ROTATE, 17);
        assert_ne!(32 % SCRAMBLE_ROTATE, 0);
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(Backend::Generic.to_string(), "generic");
        let config = StreamConfig::new(3, 1, CutoffStrategy::Fold3).expect("valid config");
        assert_eq!(
            Backend::Accelerated(config).to_string(),
            "accelerated(3+1/fold3)"
        );
    }
}
