//! Concat command implementation.

use crate::utils::format_crc;
use oxicrc_core::{ChecksumEngine, Crc32c, singleton};

pub fn cmd_concat(
    crc_a: u32,
    crc_b: u32,
    len_b: usize,
    raw: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", format_crc(concat(crc_a, crc_b, len_b, raw)));
    Ok(())
}

fn concat(crc_a: u32, crc_b: u32, len_b: usize, raw: bool) -> u32 {
    if raw {
        let mut crc = crc_a;
        singleton().concat(&mut crc, crc_b, len_b);
        crc
    } else {
        Crc32c::combine(crc_a, crc_b, len_b)
    }
}
