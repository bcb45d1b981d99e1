//! Zeroes command implementation.

use crate::utils::format_crc;
use oxicrc_core::{ChecksumEngine, singleton};

pub fn cmd_zeroes(crc: u32, length: usize, undo: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut value = crc;
    if undo {
        singleton().unextend_by_zeroes(&mut value, length);
    } else {
        singleton().extend_by_zeroes(&mut value, length);
    }
    println!("{}", format_crc(value));
    Ok(())
}
