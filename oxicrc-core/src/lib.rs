//! # OxiCRC Core
//!
//! CRC32C (Castagnoli) checksums with runtime-selected hardware backends.
//!
//! This crate provides:
//!
//! - [`engine`]: The [`ChecksumEngine`] trait (extend, zero extension,
//!   unextension, concatenation, scrambling)
//! - [`tables`]: Compile-time lookup tables for the portable engine
//! - [`accel`]: Multi-stream kernels on SSE4.2/PCLMULQDQ and ARMv8 CRC/PMULL
//! - [`cpu`]: Microarchitecture detection
//! - [`dispatch`]: Engine selection and the process-wide [`singleton`]
//! - [`crc32c`]: The standard framed [`Crc32c`] checksum
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Framing                                             │
//! │     Crc32c (init/xorout), parallel chunks, mmap files   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Dispatch                                            │
//! │     CPU detection, lane layout choice, singleton        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Engines                                             │
//! │     Generic (tables) | Accelerated (crc32 + clmul)      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxicrc_core::{ChecksumEngine, Crc32c, singleton};
//!
//! // Raw engine domain
//! let engine = singleton();
//! let mut crc = engine.empty();
//! engine.extend(&mut crc, b"123456789");
//! assert_eq!(crc, 0x22FC9104);
//!
//! // Standard CRC-32C
//! assert_eq!(Crc32c::compute(b"123456789"), 0xE3069283);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod accel;
pub mod cpu;
pub mod crc32c;
pub mod dispatch;
pub mod engine;
pub mod error;
mod generic;
#[cfg(feature = "mmap")]
pub mod mmap;
#[cfg(feature = "parallel")]
pub mod parallel;
mod prefetch;
pub mod tables;

// Re-exports for convenience
pub use accel::{CutoffStrategy, StreamConfig};
pub use cpu::CpuType;
pub use crc32c::Crc32c;
pub use dispatch::{BackendChoice, singleton};
pub use engine::{Backend, ChecksumEngine};
pub use error::{OxiCrcError, Result};
pub use tables::CRC32C_POLY;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::crc32c::Crc32c;
    pub use crate::dispatch::{BackendChoice, singleton};
    pub use crate::engine::{Backend, ChecksumEngine};
    pub use crate::error::{OxiCrcError, Result};
}
