//! Parallel CRC32C over large buffers (requires `parallel` feature).
//!
//! The input is split into chunks that are checksummed independently on the
//! rayon thread pool. The chunk checksums are then folded in order with
//! [`ChecksumEngine::concat`], which only costs a zero extension per chunk,
//! so the result is identical to a sequential extend.

use crate::crc32c::Crc32c;
use crate::dispatch::singleton;
use crate::engine::ChecksumEngine;
use crate::error::{OxiCrcError, Result};
use log::trace;
use rayon::prelude::*;

/// Default chunk size for parallel checksums (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// CRC-32C of the concatenation of `chunks`, computed sequentially.
///
/// # Example
///
/// ```
/// use oxicrc_core::Crc32c;
/// use oxicrc_core::parallel::checksum_chunks;
///
/// let crc = checksum_chunks(&[b"1234", b"56789"]);
/// assert_eq!(crc, Crc32c::compute(b"123456789"));
/// ```
pub fn checksum_chunks(chunks: &[&[u8]]) -> u32 {
    chunks.iter().fold(0, |crc, chunk| {
        Crc32c::combine(crc, Crc32c::compute(chunk), chunk.len())
    })
}

/// Extend the raw register `crc` by `data`, checksumming `chunk_size`
/// pieces in parallel on `engine`.
///
/// Gives the same result as `engine.extend(crc, data)`.
///
/// # Errors
///
/// Returns [`OxiCrcError::InvalidChunkSize`] if `chunk_size` is zero.
pub fn extend_parallel(
    engine: &dyn ChecksumEngine,
    crc: &mut u32,
    data: &[u8],
    chunk_size: usize,
) -> Result<()> {
    if chunk_size == 0 {
        return Err(OxiCrcError::InvalidChunkSize);
    }
    if data.len() <= chunk_size {
        engine.extend(crc, data);
        return Ok(());
    }

    // Checksum chunks in parallel
    let partials: Vec<(u32, usize)> = data
        .par_chunks(chunk_size)
        .map(|chunk| {
            let mut chunk_crc = engine.empty();
            engine.extend(&mut chunk_crc, chunk);
            (chunk_crc, chunk.len())
        })
        .collect();
    trace!("combining {} chunk checksums", partials.len());

    // Fold in input order
    for (chunk_crc, len) in partials {
        engine.concat(crc, chunk_crc, len);
    }
    Ok(())
}

/// CRC-32C of `data`, checksumming `chunk_size` pieces in parallel.
///
/// # Errors
///
/// Returns [`OxiCrcError::InvalidChunkSize`] if `chunk_size` is zero.
pub fn compute_parallel(data: &[u8], chunk_size: usize) -> Result<u32> {
    let mut crc = !0u32;
    extend_parallel(singleton(), &mut crc, data, chunk_size)?;
    Ok(!crc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{new_all_accelerated, new_generic};

    fn test_data(len: usize) -> Vec<u8> {
        let mut state = 0x1234_5678u32;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
                (state >> 16) as u8
            })
            .collect()
    }

    #[test]
    fn test_checksum_chunks() {
        let data = test_data(10_000);
        let chunks: Vec<&[u8]> = data.chunks(777).collect();
        assert_eq!(checksum_chunks(&chunks), Crc32c::compute(&data));
    }

    #[test]
    fn test_checksum_chunks_empty() {
        assert_eq!(checksum_chunks(&[]), 0);
        assert_eq!(checksum_chunks(&[b"", b"123456789", b""]), 0xE306_9283);
    }

    #[test]
    fn test_compute_parallel_matches_sequential() {
        let data = test_data(300_000);
        let expected = Crc32c::compute(&data);
        for chunk_size in [1, 7, 4096, 65_536, DEFAULT_CHUNK_SIZE] {
            let crc = compute_parallel(&data, chunk_size).expect("valid chunk size");
            assert_eq!(crc, expected, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn test_extend_parallel_raw_register() {
        let data = test_data(100_000);
        let mut engines = vec![new_generic()];
        engines.extend(new_all_accelerated());
        for engine in &engines {
            for start in [engine.empty(), 0, 0x0BAD_F00D] {
                let mut expected = start;
                engine.extend(&mut expected, &data);
                let mut crc = start;
                extend_parallel(engine.as_ref(), &mut crc, &data, 3000).expect("valid chunk size");
                assert_eq!(crc, expected, "{}", engine.backend());
            }
        }
    }

    #[test]
    fn test_compute_parallel_empty() {
        assert_eq!(compute_parallel(&[], 16).expect("valid chunk size"), 0);
    }

    #[test]
    fn test_compute_parallel_zero_chunk_size() {
        let result = compute_parallel(b"abc", 0);
        assert!(matches!(result, Err(OxiCrcError::InvalidChunkSize)));
        let mut crc = 0;
        let result = extend_parallel(singleton(), &mut crc, b"", 0);
        assert!(matches!(result, Err(OxiCrcError::InvalidChunkSize)));
    }
}
