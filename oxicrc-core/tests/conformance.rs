//! Every available engine must agree with a bitwise reference CRC on every
//! length class the kernels distinguish.

use oxicrc_core::dispatch::{new_all_accelerated, new_generic, singleton};
use oxicrc_core::{CRC32C_POLY, ChecksumEngine};

/// Bitwise reference in the raw register domain.
fn reference(mut crc: u32, data: &[u8]) -> u32 {
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ CRC32C_POLY
            } else {
                crc >> 1
            };
        }
    }
    crc
}

fn test_data(len: usize) -> Vec<u8> {
    let mut seed: u64 = 0x1234_5678_9ABC_DEF0;
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            (seed >> 32) as u8
        })
        .collect()
}

fn engines() -> Vec<Box<dyn ChecksumEngine>> {
    let mut engines = vec![new_generic()];
    engines.extend(new_all_accelerated());
    engines
}

/// Lengths around every path boundary of the kernels.
fn interesting_lengths() -> Vec<usize> {
    let mut lengths: Vec<usize> = (0..=1100).collect();
    for boundary in [2048, 4096, 8192] {
        lengths.extend(boundary - 17..=boundary + 17);
    }
    lengths.extend((1100..=10_000).step_by(37));
    lengths.push(10_000);
    lengths
}

#[test]
fn test_extend_matches_reference() {
    let data = test_data(10_000);
    let mut prefix = Vec::with_capacity(data.len() + 1);
    let mut crc = CRC32C_POLY;
    prefix.push(crc);
    for &byte in &data {
        crc = reference(crc, &[byte]);
        prefix.push(crc);
    }

    for engine in engines() {
        for &len in &interesting_lengths() {
            let mut crc = engine.empty();
            engine.extend(&mut crc, &data[..len]);
            assert_eq!(crc, prefix[len], "{} length {}", engine.backend(), len);
        }
    }
}

#[test]
fn test_extend_misaligned() {
    let data = test_data(5000);
    for engine in engines() {
        for offset in 1..16 {
            for len in [3, 64, 255, 257, 1000, 2049, 4000] {
                let slice = &data[offset..offset + len];
                let mut crc = engine.empty();
                engine.extend(&mut crc, slice);
                assert_eq!(
                    crc,
                    reference(CRC32C_POLY, slice),
                    "{} offset {} length {}",
                    engine.backend(),
                    offset,
                    len
                );
            }
        }
    }
}

#[test]
fn test_extend_by_zeroes_matches_data() {
    let zeroes = vec![0u8; 5000];
    for engine in engines() {
        for len in [0, 1, 3, 4, 15, 16, 17, 255, 256, 1000, 4096, 5000] {
            let start = 0xDEAD_BEEF ^ len as u32;
            let mut by_zeroes = start;
            engine.extend_by_zeroes(&mut by_zeroes, len);
            let mut by_data = start;
            engine.extend(&mut by_data, &zeroes[..len]);
            assert_eq!(by_zeroes, by_data, "{} length {}", engine.backend(), len);

            engine.unextend_by_zeroes(&mut by_zeroes, len);
            assert_eq!(by_zeroes, start, "{} length {}", engine.backend(), len);
        }
    }
}

#[test]
fn test_concat_every_engine() {
    let data = test_data(3000);
    for engine in engines() {
        let mut whole = engine.empty();
        engine.extend(&mut whole, &data);
        for split in [0, 1, 100, 1500, 2999, 3000] {
            let (a, b) = data.split_at(split);
            let mut crc_a = engine.empty();
            engine.extend(&mut crc_a, a);
            let mut crc_b = engine.empty();
            engine.extend(&mut crc_b, b);
            engine.concat(&mut crc_a, crc_b, b.len());
            assert_eq!(
                crc_a, whole,
                "{} split {}",
                engine.backend(),
                split
            );
        }
    }
}

#[test]
fn test_engines_agree_on_huge_zero_extension() {
    let generic = new_generic();
    for engine in new_all_accelerated() {
        for len in [1 << 30, usize::MAX / 3, usize::MAX] {
            let mut a = 0x0BAD_F00D;
            let mut b = 0x0BAD_F00D;
            generic.extend_by_zeroes(&mut a, len);
            engine.extend_by_zeroes(&mut b, len);
            assert_eq!(a, b, "{} length {}", engine.backend(), len);
        }
    }
}

#[test]
fn test_singleton_check_value() {
    let engine = singleton();
    let mut crc = engine.empty();
    engine.extend(&mut crc, b"123456789");
    assert_eq!(crc, 0x22FC_9104);
}
