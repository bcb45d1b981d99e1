//! Scramble command implementation.

use crate::utils::format_crc;
use oxicrc_core::{ChecksumEngine, singleton};

pub fn cmd_scramble(crc: u32, undo: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut value = crc;
    if undo {
        singleton().unscramble(&mut value);
    } else {
        singleton().scramble(&mut value);
    }
    println!("{}", format_crc(value));
    Ok(())
}
