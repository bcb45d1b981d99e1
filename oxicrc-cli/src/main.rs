//! OxiCRC CLI - CRC32C checksums from the command line
//!
//! A Pure Rust CRC32C utility with hardware-accelerated backends.

mod commands;
mod utils;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use commands::{
    SumOptions, cmd_backends, cmd_completions, cmd_concat, cmd_scramble, cmd_sum, cmd_zeroes,
};
use oxicrc_core::BackendChoice;
use std::path::PathBuf;
use utils::parse_crc;

#[derive(Parser)]
#[command(name = "oxicrc")]
#[command(author, version, about = "CRC32C (Castagnoli) checksum utility")]
#[command(long_about = "
OxiCRC computes CRC32C checksums using SSE4.2/PCLMULQDQ on x86_64 or
CRC/PMULL on aarch64, falling back to a table-driven engine elsewhere.

CRC values are read and printed as hexadecimal (an optional 0x prefix is
accepted).

Examples:
  oxicrc sum file.bin
  cat file.bin | oxicrc sum
  oxicrc sum --parallel --json disk.img
  oxicrc sum --backend generic file.bin
  oxicrc concat e3069283 1f3a2b4c 4096
  oxicrc zeroes 82f63b78 1048576
  oxicrc scramble 22fc9104
  oxicrc backends --verify
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute CRC32C of files (or stdin)
    #[command(alias = "s")]
    Sum {
        /// Files to checksum ("-" or none for stdin)
        files: Vec<PathBuf>,

        /// Print the raw engine register instead of the standard CRC-32C
        #[arg(short, long)]
        raw: bool,

        /// Scramble each result before printing
        #[arg(long)]
        scramble: bool,

        /// Backend: auto, generic, or a lane layout such as 3+1/fold3
        #[arg(short, long, default_value = "auto")]
        backend: BackendChoice,

        /// Checksum large inputs in parallel chunks
        #[arg(short, long)]
        parallel: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Combine the CRCs of two adjacent pieces into the CRC of both
    #[command(alias = "c")]
    Concat {
        /// CRC of the first piece
        #[arg(value_parser = parse_crc)]
        crc_a: u32,

        /// CRC of the second piece
        #[arg(value_parser = parse_crc)]
        crc_b: u32,

        /// Length of the second piece in bytes
        len_b: usize,

        /// Values are raw engine registers instead of standard CRC-32C
        #[arg(short, long)]
        raw: bool,
    },

    /// Extend a raw register by zero bytes
    #[command(alias = "z")]
    Zeroes {
        /// Raw register value
        #[arg(value_parser = parse_crc)]
        crc: u32,

        /// Number of zero bytes
        length: usize,

        /// Remove the zero bytes instead of appending them
        #[arg(short, long)]
        undo: bool,
    },

    /// Apply the reversible scrambling transform
    Scramble {
        /// Value to scramble
        #[arg(value_parser = parse_crc)]
        crc: u32,

        /// Unscramble instead
        #[arg(short, long)]
        undo: bool,
    },

    /// Show the detected CPU and available backends
    #[command(alias = "b")]
    Backends {
        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Cross-check every backend on pseudo-random data
        #[arg(short, long)]
        verify: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn main() {
    pretty_env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sum {
            files,
            raw,
            scramble,
            backend,
            parallel,
            json,
            progress,
        } => cmd_sum(
            &files,
            &SumOptions {
                raw,
                scramble,
                backend,
                parallel,
                json,
                progress,
            },
        ),
        Commands::Concat {
            crc_a,
            crc_b,
            len_b,
            raw,
        } => cmd_concat(crc_a, crc_b, len_b, raw),
        Commands::Zeroes { crc, length, undo } => cmd_zeroes(crc, length, undo),
        Commands::Scramble { crc, undo } => cmd_scramble(crc, undo),
        Commands::Backends { json, verify } => cmd_backends(json, verify),
        Commands::Completions { shell } => cmd_completions(shell, &mut Cli::command()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
