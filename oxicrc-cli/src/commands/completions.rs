//! Completions command implementation.

use clap::Command;
use clap_complete::{Shell, generate};
use std::io;

pub fn cmd_completions(shell: Shell, cmd: &mut Command) -> Result<(), Box<dyn std::error::Error>> {
    let name = cmd.get_name().to_string();
    generate(shell, cmd, name, &mut io::stdout());
    Ok(())
}
