//! Portable table-driven CRC32C engine.
//!
//! Long inputs are processed as 16-byte swaths of four 32-bit lanes, each
//! lane staggered by one word. The lanes have no data dependency on each
//! other, so the CPU can advance all four in parallel. At the end the lanes
//! are folded back into a single register through the byte table.
//!
//! Zero extension uses the base-16 tables: each non-zero digit of the length
//! costs one 32x32 carry-less multiply done with 2-bit lookups.

use crate::engine::{Backend, ChecksumEngine, sealed};
use crate::prefetch::prefetch_nta;
use crate::tables::{CRC32C_TABLES, ZEROES_BASE, ZEROES_BASE_LG, reverse_bits};

/// Bytes processed per iteration of the four-lane loop.
const STRIDE: usize = 16;

/// Distance ahead of the read position for software prefetch.
const PREFETCH_HORIZON: usize = 256;

/// The table-driven engine.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct GenericEngine {
    _private: (),
}

impl GenericEngine {
    pub(crate) const fn new() -> Self {
        Self { _private: () }
    }
}

impl sealed::Sealed for GenericEngine {}

impl ChecksumEngine for GenericEngine {
    #[inline]
    fn extend(&self, crc: &mut u32, data: &[u8]) {
        *crc = extend(*crc, data);
    }

    fn extend_by_zeroes(&self, crc: &mut u32, length: usize) {
        *crc = extend_by_zeroes(*crc, length);
    }

    fn unextend_by_zeroes(&self, crc: &mut u32, length: usize) {
        *crc = unextend_by_zeroes(*crc, length);
    }

    fn backend(&self) -> Backend {
        Backend::Generic
    }
}

#[inline(always)]
fn load_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[inline(always)]
fn step_byte(crc: u32, byte: u8) -> u32 {
    CRC32C_TABLES.table0[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8)
}

/// Move one lane a full swath forward and xor in its next word.
#[inline(always)]
fn step_word(lane: u32, next: u32) -> u32 {
    let t = &CRC32C_TABLES.word;
    next ^ t[3][(lane & 0xFF) as usize]
        ^ t[2][((lane >> 8) & 0xFF) as usize]
        ^ t[1][((lane >> 16) & 0xFF) as usize]
        ^ t[0][(lane >> 24) as usize]
}

#[inline(always)]
fn step_stride(lanes: &mut [u32; 4], stride: &[u8]) {
    for (k, lane) in lanes.iter_mut().enumerate() {
        *lane = step_word(*lane, load_u32(&stride[4 * k..]));
    }
}

/// Fold a lane into the register four bytes at a time.
#[inline(always)]
fn combine_word(crc: u32, word: u32) -> u32 {
    let mut c = crc ^ word;
    for _ in 0..4 {
        c = (c >> 8) ^ CRC32C_TABLES.table0[(c & 0xFF) as usize];
    }
    c
}

/// Advance `crc` over `data` with the table-driven algorithm.
///
/// Loads go through `from_le_bytes`, which is valid at any alignment, so
/// there is no alignment prologue.
pub(crate) fn extend(crc: u32, data: &[u8]) -> u32 {
    let mut l = crc;
    let mut rest = data;

    if rest.len() >= STRIDE {
        let mut lanes = [
            load_u32(rest) ^ l,
            load_u32(&rest[4..]),
            load_u32(&rest[8..]),
            load_u32(&rest[12..]),
        ];
        rest = &rest[STRIDE..];

        while rest.len() > PREFETCH_HORIZON {
            prefetch_nta(rest.as_ptr().wrapping_add(PREFETCH_HORIZON));
            for stride in rest[..4 * STRIDE].chunks_exact(STRIDE) {
                step_stride(&mut lanes, stride);
            }
            rest = &rest[4 * STRIDE..];
        }

        let mut strides = rest.chunks_exact(STRIDE);
        for stride in &mut strides {
            step_stride(&mut lanes, stride);
        }
        rest = strides.remainder();

        // Rotate the lanes one word at a time
        let mut words = rest.chunks_exact(4);
        for word in &mut words {
            let next = step_word(lanes[0], load_u32(word));
            lanes = [lanes[1], lanes[2], lanes[3], next];
        }
        rest = words.remainder();

        l = 0;
        for lane in lanes {
            l = combine_word(l, lane);
        }
    }

    for &byte in rest {
        l = step_byte(l, byte);
    }
    l
}

fn extend_by_zeroes_with(
    crc: u32,
    length: usize,
    zeroes: &[u32; 256],
    byte_table: &[u32; 256],
) -> u32 {
    let mut l = crc;
    let mut length = length;
    let mut i = 0usize;
    while length != 0 {
        let digit = length & (ZEROES_BASE - 1);
        if digit != 0 {
            // 2-bit multiplication table for the digit's multiplier
            let m = (zeroes[digit + i - 1] as u64) << 1;
            let m2 = m << 1;
            let mul = [0, m, m2, m2 ^ m];
            let mut v = l;
            let mut r = 0u64;
            for _ in 0..4 {
                r ^= mul[(v & 3) as usize]
                    ^ (mul[((v >> 2) & 3) as usize] << 2)
                    ^ (mul[((v >> 4) & 3) as usize] << 4)
                    ^ (mul[((v >> 6) & 3) as usize] << 6);
                v >>= 8;
                r = (r >> 8) ^ byte_table[(r & 0xFF) as usize] as u64;
            }
            l = r as u32;
        }
        i += ZEROES_BASE - 1;
        length >>= ZEROES_BASE_LG;
    }
    l
}

/// Advance `crc` over `length` zero bytes.
pub(crate) fn extend_by_zeroes(crc: u32, length: usize) -> u32 {
    extend_by_zeroes_with(crc, length, &CRC32C_TABLES.zeroes, &CRC32C_TABLES.table0)
}

/// Undo `length` zero bytes, via the bit-reversed unextension tables.
pub(crate) fn unextend_by_zeroes(crc: u32, length: usize) -> u32 {
    reverse_bits(extend_by_zeroes_with(
        reverse_bits(crc),
        length,
        &CRC32C_TABLES.reverse_zeroes,
        &CRC32C_TABLES.reverse_table0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::CRC32C_POLY;

    fn bytewise(mut crc: u32, data: &[u8]) -> u32 {
        for &byte in data {
            crc = step_byte(crc, byte);
        }
        crc
    }

    fn pseudo_random(len: usize, seed: u64) -> Vec<u8> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (state >> 33) as u8
            })
            .collect()
    }

    #[test]
    fn test_raw_check_value() {
        let engine = GenericEngine::new();
        let mut crc = engine.empty();
        engine.extend(&mut crc, b"123456789");
        assert_eq!(crc, 0x22FC_9104);

        let mut crc = 0xFFFF_FFFF;
        engine.extend(&mut crc, b"123456789");
        assert_eq!(crc ^ 0xFFFF_FFFF, 0xE306_9283);
    }

    #[test]
    fn test_empty_input_is_unchanged() {
        let engine = GenericEngine::new();
        let mut crc = engine.empty();
        engine.extend(&mut crc, b"");
        assert_eq!(crc, CRC32C_POLY);
    }

    #[test]
    fn test_lanes_match_bytewise() {
        for len in (0..600).chain([1023, 1024, 1025, 4096, 10_000]) {
            let data = pseudo_random(len, len as u64);
            let seed = 0xDEAD_BEEF ^ len as u32;
            assert_eq!(extend(seed, &data), bytewise(seed, &data), "len {len}");
        }
    }

    #[test]
    fn test_unaligned_input() {
        let data = pseudo_random(1000, 7);
        for offset in 0..8 {
            let slice = &data[offset..];
            assert_eq!(extend(1, slice), bytewise(1, slice));
        }
    }

    #[test]
    fn test_extend_by_zeroes_matches_zero_bytes() {
        let zeros = vec![0u8; 5000];
        for len in (0..300).chain([511, 512, 4095, 4096, 4097, 5000]) {
            let crc = 0x1234_5678u32.rotate_left(len as u32);
            assert_eq!(
                extend_by_zeroes(crc, len),
                bytewise(crc, &zeros[..len]),
                "len {len}"
            );
        }
    }

    #[test]
    fn test_extend_by_zeroes_known_value() {
        assert_eq!(extend_by_zeroes(CRC32C_POLY, 10), 0xE75D_06AA);
        assert_eq!(extend_by_zeroes(0, 1 << 40), 0);
    }

    #[test]
    fn test_unextend_round_trip() {
        for len in [0usize, 1, 2, 3, 15, 16, 17, 255, 4096, 1 << 20, 1 << 33, usize::MAX] {
            for crc in [0u32, 1, CRC32C_POLY, 0xFFFF_FFFF, 0x0BAD_F00D] {
                assert_eq!(unextend_by_zeroes(extend_by_zeroes(crc, len), len), crc);
                assert_eq!(extend_by_zeroes(unextend_by_zeroes(crc, len), len), crc);
            }
        }
    }

    #[test]
    fn test_concat() {
        let engine = GenericEngine::new();
        let data = pseudo_random(777, 3);
        let mut whole = engine.empty();
        engine.extend(&mut whole, &data);
        for split in [0, 1, 100, 388, 776, 777] {
            let (a, b) = data.split_at(split);
            let mut crc_a = engine.empty();
            engine.extend(&mut crc_a, a);
            let mut crc_b = engine.empty();
            engine.extend(&mut crc_b, b);
            engine.concat(&mut crc_a, crc_b, b.len());
            assert_eq!(crc_a, whole, "split {split}");
        }
    }

    #[test]
    fn test_backend() {
        assert_eq!(GenericEngine::new().backend(), Backend::Generic);
    }
}
