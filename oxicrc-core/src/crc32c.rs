//! Standard CRC-32C (iSCSI) checksums.
//!
//! [`Crc32c`] frames the engine register the conventional way and is
//! compatible with iSCSI, ext4, SCTP and the SSE4.2 `crc32` instruction
//! used with the usual inversion.
//!
//! - Polynomial: 0x1EDC6F41 (reflected: 0x82F63B78)
//! - Initial value: 0xFFFFFFFF
//! - Final XOR: 0xFFFFFFFF
//! - Reflected input: Yes
//! - Reflected output: Yes
//!
//! The framing is applied outside the engines, so every backend serves both
//! these checksums and the raw [`ChecksumEngine::empty`] domain.

use crate::dispatch::singleton;
use crate::engine::ChecksumEngine;
use std::io;

const INIT: u32 = 0xFFFF_FFFF;
const XOR_OUT: u32 = 0xFFFF_FFFF;

/// CRC-32C calculator.
///
/// # Example
///
/// ```
/// use oxicrc_core::Crc32c;
///
/// let mut crc = Crc32c::new();
/// crc.update(b"123456789");
/// assert_eq!(crc.finalize(), 0xE3069283);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32c {
    crc: u32,
    engine: &'static dyn ChecksumEngine,
}

impl Crc32c {
    /// Create a new CRC-32C calculator on the process-wide engine.
    pub fn new() -> Self {
        Self::with_engine(singleton())
    }

    /// Create a calculator that runs on a specific engine.
    pub fn with_engine(engine: &'static dyn ChecksumEngine) -> Self {
        Self { crc: INIT, engine }
    }

    /// Continue a checksum from a previously finalized value.
    pub fn resume(crc: u32) -> Self {
        Self {
            crc: crc ^ XOR_OUT,
            engine: singleton(),
        }
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = INIT;
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.engine.extend(&mut self.crc, data);
    }

    /// Update the CRC as if `length` zero bytes were appended.
    pub fn update_zeroes(&mut self, length: usize) {
        self.engine.extend_by_zeroes(&mut self.crc, length);
    }

    /// Get the current CRC value (without finalizing).
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc ^ XOR_OUT
    }

    /// Finalize and return the CRC value.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        self.crc ^ XOR_OUT
    }

    /// Compute CRC-32C for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }

    /// CRC-32C of `a ++ b` from the checksums of `a` and `b`.
    ///
    /// # Example
    ///
    /// ```
    /// use oxicrc_core::Crc32c;
    ///
    /// let a = Crc32c::compute(b"12345");
    /// let b = Crc32c::compute(b"6789");
    /// assert_eq!(Crc32c::combine(a, b, 4), Crc32c::compute(b"123456789"));
    /// ```
    pub fn combine(crc_a: u32, crc_b: u32, length_b: usize) -> u32 {
        let mut crc = crc_a;
        singleton().extend_by_zeroes(&mut crc, length_b);
        crc ^ crc_b
    }
}

impl Default for Crc32c {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for Crc32c {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
