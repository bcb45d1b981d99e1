//! Engine selection.
//!
//! The dispatcher maps the detected [`CpuType`] to a tuned
//! [`StreamConfig`] and builds the matching accelerated engine, falling back
//! to the generic engine when the required instructions are missing.
//!
//! The process-wide [`singleton`] is built once on first use. Setting
//! `OXICRC_FORCE_BACKEND` to `generic`, `auto` or a lane layout such as
//! `3+1/fold3` overrides the automatic choice.

use crate::accel::{self, CutoffStrategy, StreamConfig};
use crate::cpu::{self, CpuType};
use crate::engine::ChecksumEngine;
use crate::error::{OxiCrcError, Result};
use crate::generic::GenericEngine;
use log::{debug, warn};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Environment variable read when the singleton is first built.
pub const FORCE_BACKEND_ENV: &str = "OXICRC_FORCE_BACKEND";

/// A requested backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendChoice {
    /// Best engine for this CPU.
    #[default]
    Auto,
    /// Always the table-driven engine.
    Generic,
    /// A specific accelerated lane layout.
    Accelerated(StreamConfig),
}

impl fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendChoice::Auto => f.write_str("auto"),
            BackendChoice::Generic => f.write_str("generic"),
            BackendChoice::Accelerated(config) => write!(f, "{}", config),
        }
    }
}

impl FromStr for BackendChoice {
    type Err = OxiCrcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(BackendChoice::Auto),
            "generic" | "table" => Ok(BackendChoice::Generic),
            other => other.parse().map(BackendChoice::Accelerated),
        }
    }
}

/// The tuned lane layout for `cpu`, or `None` on targets without a kernel.
pub fn config_for_cpu(cpu: CpuType) -> Option<StreamConfig> {
    use CutoffStrategy::{Fold3, Unroll64Crc};

    let (crc, pclmul, strategy) = match cpu {
        CpuType::IntelHaswell | CpuType::AmdRome | CpuType::AmdNaples | CpuType::AmdMilan => {
            (3, 1, Fold3)
        }
        CpuType::IntelCascadelakeXeon
        | CpuType::IntelSkylakeXeon
        | CpuType::IntelBroadwell
        | CpuType::IntelSkylake => (3, 2, Fold3),
        CpuType::IntelIvybridge | CpuType::IntelSandybridge | CpuType::IntelWestmere => {
            (3, 0, Fold3)
        }
        CpuType::ArmNeoverseN1 | CpuType::ArmNeoverseN2 | CpuType::ArmNeoverseV1 => {
            (1, 1, Unroll64Crc)
        }
        CpuType::AmpereSiryn => (3, 2, Fold3),
        CpuType::ArmNeoverseV2 => (1, 2, Unroll64Crc),
        CpuType::AmdGenoa | CpuType::AmdRyzenV3000 | CpuType::Unknown => default_layout()?,
    };
    Some(StreamConfig::new_unchecked(crc, pclmul, strategy))
}

#[cfg(target_arch = "x86_64")]
fn default_layout() -> Option<(usize, usize, CutoffStrategy)> {
    Some((3, 0, CutoffStrategy::Fold3))
}

#[cfg(target_arch = "aarch64")]
fn default_layout() -> Option<(usize, usize, CutoffStrategy)> {
    Some((1, 1, CutoffStrategy::Unroll64Crc))
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn default_layout() -> Option<(usize, usize, CutoffStrategy)> {
    None
}

/// The portable table-driven engine.
pub fn new_generic() -> Box<dyn ChecksumEngine> {
    Box::new(GenericEngine::new())
}

/// The accelerated engine tuned for this CPU.
///
/// Returns `None` when the instruction set is missing, the target has no
/// accelerated kernel, or the `accel` feature is disabled.
pub fn try_new_accelerated() -> Option<Box<dyn ChecksumEngine>> {
    if !accel::is_supported() {
        debug!("accelerated CRC32C not supported on this CPU");
        return None;
    }
    let cpu = cpu::detect();
    let config = config_for_cpu(cpu)?;
    debug!("selected lane layout {} for {}", config, cpu);
    accel::try_new_engine(config)
}

/// An accelerated engine with an explicit lane layout.
pub fn new_with_config(config: StreamConfig) -> Result<Box<dyn ChecksumEngine>> {
    accel::try_new_engine(config).ok_or_else(|| OxiCrcError::unsupported_backend(config))
}

/// Every accelerated lane layout, for cross-checking backends.
///
/// Empty when acceleration is unavailable.
pub fn new_all_accelerated() -> Vec<Box<dyn ChecksumEngine>> {
    StreamConfig::all().filter_map(accel::try_new_engine).collect()
}

/// The best available engine: accelerated if possible, otherwise generic.
pub fn new_best() -> Box<dyn ChecksumEngine> {
    try_new_accelerated().unwrap_or_else(new_generic)
}

/// Build the engine for a [`BackendChoice`].
pub fn new_engine(choice: BackendChoice) -> Result<Box<dyn ChecksumEngine>> {
    match choice {
        BackendChoice::Auto => Ok(new_best()),
        BackendChoice::Generic => Ok(new_generic()),
        BackendChoice::Accelerated(config) => new_with_config(config),
    }
}

fn forced_engine(value: &str) -> Result<Box<dyn ChecksumEngine>> {
    let choice: BackendChoice = value.parse()?;
    new_engine(choice)
}

fn build_singleton() -> Box<dyn ChecksumEngine> {
    let engine = match std::env::var(FORCE_BACKEND_ENV) {
        Ok(value) => forced_engine(&value).unwrap_or_else(|err| {
            warn!("ignoring {}={:?}: {}", FORCE_BACKEND_ENV, value, err);
            new_best()
        }),
        Err(_) => new_best(),
    };
    debug!("CRC32C engine: {}", engine.backend());
    engine
}

/// The process-wide engine.
pub fn singleton() -> &'static dyn ChecksumEngine {
    static ENGINE: OnceLock<Box<dyn ChecksumEngine>> = OnceLock::new();
    ENGINE.get_or_init(build_singleton).as_ref()
}
