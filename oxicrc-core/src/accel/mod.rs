//! Hardware-accelerated CRC32C engines.
//!
//! The accelerated engines combine two instruction families:
//!
//! - hardware CRC32C steps (`crc32` on x86_64 SSE4.2, `crc32c*` on aarch64)
//! - 64x64 carry-less multiplication (`pclmulqdq` on x86_64, `pmull` on aarch64)
//!
//! A single kernel handles every lane layout. Its shape is described by a
//! [`StreamConfig`]: the number of hardware-CRC lanes, the number of
//! carry-less-multiply fold lanes, and the strategy used for medium inputs.
//!
//! ```text
//!   length <  256   sequential 16-byte CRC steps       (except Unroll64Crc)
//!   length < 2048   Fold3: three CRC lanes + one clmul combine
//!                   Unroll64Crc: sequential 64-byte unrolled CRC steps
//!   otherwise       crc_streams + pclmul_streams lanes in lock-step,
//!                   recombined by multiplying in a zero constant
//! ```
//!
//! Every configuration produces results identical to the generic engine.

use crate::error::{OxiCrcError, Result};
use crate::tables::{CRC32C_POLY, poly_multiply, xpow_mod};
use std::fmt;
use std::str::FromStr;

#[cfg(all(feature = "accel", any(target_arch = "x86_64", target_arch = "aarch64")))]
mod kernel;
#[cfg(all(feature = "accel", any(target_arch = "x86_64", target_arch = "aarch64")))]
mod ops;

#[cfg(all(feature = "accel", target_arch = "x86_64"))]
mod x86_64;
#[cfg(all(feature = "accel", target_arch = "x86_64"))]
use self::x86_64 as arch;

#[cfg(all(feature = "accel", target_arch = "aarch64"))]
mod aarch64;
#[cfg(all(feature = "accel", target_arch = "aarch64"))]
use self::aarch64 as arch;

/// Inputs below this length skip lane setup entirely.
pub const SMALL_CUTOFF: usize = 256;

/// Inputs below this length use the medium strategy.
pub const MEDIUM_CUTOFF: usize = 2048;

/// Prefetch distance for the large multi-lane loop.
pub const PREFETCH_HORIZON: usize = 256;

/// Prefetch distance for the Fold3 loop.
pub const PREFETCH_HORIZON_MEDIUM: usize = 64;

/// Maximum number of hardware-CRC lanes.
pub const MAX_CRC_STREAMS: usize = 3;

/// Maximum number of carry-less-multiply lanes.
pub const MAX_PCLMUL_STREAMS: usize = 3;

/// `x^(32 * 2^i) mod P`: the multiplier for `4 * 2^i` zero bytes.
pub const CRC32C_POWERS: [u32; 64] = {
    let mut powers = [0u32; 64];
    let mut power = CRC32C_POLY; // x^32
    let mut i = 0;
    while i < 64 {
        powers[i] = power;
        power = poly_multiply(power, power, CRC32C_POLY);
        i += 1;
    }
    powers
};

/// Largest Fold3 block count: `(MEDIUM_CUTOFF - 1) / 3 / 32`.
const FOLD3_MAX_BLOCKS: usize = (MEDIUM_CUTOFF - 1) / 3 / 32;

/// Fold3 combine multipliers, indexed by block count minus one.
///
/// With `L = 32 * blocks` bytes per lane, lane 0 is shifted by `16 * L` bits
/// and lane 1 by `8 * L` bits into the last word of lane 2. The extra `-33`
/// accounts for the 64-bit word and the one-bit offset of a reflected
/// carry-less product.
pub const FOLD3_CONSTANTS: [[u64; 2]; FOLD3_MAX_BLOCKS] = {
    let mut constants = [[0u64; 2]; FOLD3_MAX_BLOCKS];
    let mut i = 0;
    while i < FOLD3_MAX_BLOCKS {
        let lane_bytes = 32 * (i as u64 + 1);
        constants[i][0] = xpow_mod(16 * lane_bytes - 33, CRC32C_POLY) as u64;
        constants[i][1] = xpow_mod(8 * lane_bytes - 33, CRC32C_POLY) as u64;
        i += 1;
    }
    constants
};

/// Reduction constants for the four-lane 128-bit fold, as `[low, high]` lanes.
pub mod reduction {
    /// Fold 64 bytes forward.
    pub const K1K2: [u64; 2] = [0x0740_eef02, 0x09e4_addf8];
    /// Fold 32 bytes forward.
    pub const K3K4: [u64; 2] = [0x1384_aa63a, 0x0ba4_fc28e];
    /// Fold 16 bytes forward, then 8.
    pub const K5K6: [u64; 2] = [0x0f20_c0dfe, 0x14cd_00bd6];
    /// Fold the last 4 bytes.
    pub const K7K0: [u64; 2] = [0x0dd4_5aab8, 0];
    /// Barrett reduction: quotient constant and polynomial.
    pub const KPOLY: [u64; 2] = [0x105e_c76f0, 0x0dea_713f1];
    /// Low 32 bits of each 64-bit lane.
    pub const KMASK: [u64; 2] = [0x0000_0000_ffff_ffff, 0x0000_0000_ffff_ffff];
}

/// How medium-sized inputs are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CutoffStrategy {
    /// Three CRC lanes folded together with one carry-less multiply.
    Fold3,
    /// Sequential hardware CRC unrolled to 64 bytes, also used below the
    /// small cutoff.
    Unroll64Crc,
}

impl CutoffStrategy {
    /// Both strategies.
    pub const ALL: [CutoffStrategy; 2] = [CutoffStrategy::Fold3, CutoffStrategy::Unroll64Crc];

    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            CutoffStrategy::Fold3 => "fold3",
            CutoffStrategy::Unroll64Crc => "unroll64",
        }
    }
}

impl fmt::Display for CutoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CutoffStrategy {
    type Err = OxiCrcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fold3" => Ok(CutoffStrategy::Fold3),
            "unroll64" | "unroll64crc" => Ok(CutoffStrategy::Unroll64Crc),
            _ => Err(OxiCrcError::unknown_strategy(s)),
        }
    }
}

/// Lane layout of an accelerated engine.
///
/// Written as `<crc>+<pclmul>/<strategy>`, e.g. `3+1/fold3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamConfig {
    crc_streams: usize,
    pclmul_streams: usize,
    strategy: CutoffStrategy,
}

impl StreamConfig {
    /// Validate and build a configuration.
    pub fn new(crc_streams: usize, pclmul_streams: usize, strategy: CutoffStrategy) -> Result<Self> {
        if !(1..=MAX_CRC_STREAMS).contains(&crc_streams) {
            return Err(OxiCrcError::invalid_stream_count(
                "crc",
                crc_streams,
                1,
                MAX_CRC_STREAMS,
            ));
        }
        if pclmul_streams > MAX_PCLMUL_STREAMS {
            return Err(OxiCrcError::invalid_stream_count(
                "pclmul",
                pclmul_streams,
                0,
                MAX_PCLMUL_STREAMS,
            ));
        }
        Ok(Self {
            crc_streams,
            pclmul_streams,
            strategy,
        })
    }

    pub(crate) const fn new_unchecked(
        crc_streams: usize,
        pclmul_streams: usize,
        strategy: CutoffStrategy,
    ) -> Self {
        Self {
            crc_streams,
            pclmul_streams,
            strategy,
        }
    }

    /// Number of hardware-CRC lanes.
    #[inline]
    pub fn crc_streams(&self) -> usize {
        self.crc_streams
    }

    /// Number of carry-less-multiply lanes.
    #[inline]
    pub fn pclmul_streams(&self) -> usize {
        self.pclmul_streams
    }

    /// Medium-input strategy.
    #[inline]
    pub fn strategy(&self) -> CutoffStrategy {
        self.strategy
    }

    /// Every legal configuration, 24 in total.
    pub fn all() -> impl Iterator<Item = StreamConfig> {
        (1..=MAX_CRC_STREAMS).flat_map(|crc| {
            (0..=MAX_PCLMUL_STREAMS).flat_map(move |pclmul| {
                CutoffStrategy::ALL
                    .into_iter()
                    .map(move |strategy| StreamConfig::new_unchecked(crc, pclmul, strategy))
            })
        })
    }
}

impl fmt::Display for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{}/{}",
            self.crc_streams, self.pclmul_streams, self.strategy
        )
    }
}

impl FromStr for StreamConfig {
    type Err = OxiCrcError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || OxiCrcError::invalid_backend(s);
        let (streams, strategy) = s.trim().split_once('/').ok_or_else(invalid)?;
        let (crc, pclmul) = streams.split_once('+').ok_or_else(invalid)?;
        let crc = crc.trim().parse::<usize>().map_err(|_| invalid())?;
        let pclmul = pclmul.trim().parse::<usize>().map_err(|_| invalid())?;
        let strategy = strategy.trim().parse::<CutoffStrategy>()?;
        StreamConfig::new(crc, pclmul, strategy)
    }
}

/// Whether this CPU and build can run the accelerated engines.
pub fn is_supported() -> bool {
    #[cfg(all(feature = "accel", any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        arch::is_supported()
    }
    #[cfg(not(all(feature = "accel", any(target_arch = "x86_64", target_arch = "aarch64"))))]
    {
        false
    }
}

/// An accelerated engine with a fixed lane layout.
#[cfg(all(feature = "accel", any(target_arch = "x86_64", target_arch = "aarch64")))]
#[derive(Debug, Clone, Copy)]
pub(crate) struct AcceleratedEngine {
    config: StreamConfig,
}

#[cfg(all(feature = "accel", any(target_arch = "x86_64", target_arch = "aarch64")))]
mod engine_impl {
    use super::{AcceleratedEngine, StreamConfig, arch};
    use crate::engine::{Backend, ChecksumEngine, sealed};
    use crate::generic;

    impl AcceleratedEngine {
        /// Returns `None` when the required instructions are missing.
        pub(crate) fn try_new(config: StreamConfig) -> Option<Self> {
            arch::is_supported().then_some(Self { config })
        }
    }

    impl sealed::Sealed for AcceleratedEngine {}

    impl ChecksumEngine for AcceleratedEngine {
        #[inline]
        fn extend(&self, crc: &mut u32, data: &[u8]) {
            // SAFETY: `try_new` only succeeds when the CPU has the features.
            *crc = unsafe { arch::extend(self.config, *crc, data) };
        }

        fn extend_by_zeroes(&self, crc: &mut u32, length: usize) {
            // SAFETY: `try_new` only succeeds when the CPU has the features.
            *crc = unsafe { arch::extend_by_zeroes(*crc, length) };
        }

        fn unextend_by_zeroes(&self, crc: &mut u32, length: usize) {
            *crc = generic::unextend_by_zeroes(*crc, length);
        }

        fn backend(&self) -> Backend {
            Backend::Accelerated(self.config)
        }
    }
}

/// Build an accelerated engine for `config`, if this CPU supports it.
pub(crate) fn try_new_engine(config: StreamConfig) -> Option<Box<dyn crate::ChecksumEngine>> {
    #[cfg(all(feature = "accel", any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        AcceleratedEngine::try_new(config)
            .map(|engine| Box::new(engine) as Box<dyn crate::ChecksumEngine>)
    }
    #[cfg(not(all(feature = "accel", any(target_arch = "x86_64", target_arch = "aarch64"))))]
    {
        let _ = config;
        None
    }
}
