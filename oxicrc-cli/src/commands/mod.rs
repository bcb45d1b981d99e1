//! Command implementations for OxiCRC CLI.

pub mod backends;
pub mod completions;
pub mod concat;
pub mod scramble;
pub mod sum;
pub mod zeroes;

pub use backends::cmd_backends;
pub use completions::cmd_completions;
pub use concat::cmd_concat;
pub use scramble::cmd_scramble;
pub use sum::{SumOptions, cmd_sum};
pub use zeroes::cmd_zeroes;
