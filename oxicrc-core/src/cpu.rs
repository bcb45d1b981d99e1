//! CPU microarchitecture detection.
//!
//! Only the microarchitectures that have a tuned lane layout are recognised;
//! everything else is [`CpuType::Unknown`]. Classification is split from the
//! raw register reads so it can be tested on any host.

use log::debug;
use std::fmt;

/// Microarchitectures with a tuned CRC32C lane layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuType {
    /// Intel Haswell.
    IntelHaswell,
    /// Intel Broadwell.
    IntelBroadwell,
    /// Intel Skylake client.
    IntelSkylake,
    /// Intel Skylake server.
    IntelSkylakeXeon,
    /// Intel Cascade Lake server.
    IntelCascadelakeXeon,
    /// Intel Ivy Bridge.
    IntelIvybridge,
    /// Intel Sandy Bridge.
    IntelSandybridge,
    /// Intel Westmere.
    IntelWestmere,
    /// AMD Zen 1 server.
    AmdNaples,
    /// AMD Zen 2 server.
    AmdRome,
    /// AMD Zen 3 server.
    AmdMilan,
    /// AMD Zen 4 server.
    AmdGenoa,
    /// AMD Ryzen V3000.
    AmdRyzenV3000,
    /// Arm Neoverse N1.
    ArmNeoverseN1,
    /// Arm Neoverse N2.
    ArmNeoverseN2,
    /// Arm Neoverse V1.
    ArmNeoverseV1,
    /// Arm Neoverse V2.
    ArmNeoverseV2,
    /// AmpereOne (Siryn).
    AmpereSiryn,
    /// Anything else.
    Unknown,
}

impl fmt::Display for CpuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CpuType::IntelHaswell => "Intel Haswell",
            CpuType::IntelBroadwell => "Intel Broadwell",
            CpuType::IntelSkylake => "Intel Skylake",
            CpuType::IntelSkylakeXeon => "Intel Skylake Xeon",
            CpuType::IntelCascadelakeXeon => "Intel Cascade Lake Xeon",
            CpuType::IntelIvybridge => "Intel Ivy Bridge",
            CpuType::IntelSandybridge => "Intel Sandy Bridge",
            CpuType::IntelWestmere => "Intel Westmere",
            CpuType::AmdNaples => "AMD Naples",
            CpuType::AmdRome => "AMD Rome",
            CpuType::AmdMilan => "AMD Milan",
            CpuType::AmdGenoa => "AMD Genoa",
            CpuType::AmdRyzenV3000 => "AMD Ryzen V3000",
            CpuType::ArmNeoverseN1 => "Arm Neoverse N1",
            CpuType::ArmNeoverseN2 => "Arm Neoverse N2",
            CpuType::ArmNeoverseV1 => "Arm Neoverse V1",
            CpuType::ArmNeoverseV2 => "Arm Neoverse V2",
            CpuType::AmpereSiryn => "Ampere Siryn",
            CpuType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Family and model from a CPUID leaf 1 signature (`eax`).
fn family_model(signature: u32) -> (u32, u32) {
    let base_family = (signature >> 8) & 0x0F;
    let base_model = (signature >> 4) & 0x0F;
    let ext_family = (signature >> 20) & 0xFF;
    let ext_model = (signature >> 16) & 0x0F;

    let mut family = base_family;
    let mut model = base_model;
    if base_family == 0x0F {
        family += ext_family;
    }
    if base_family == 0x06 || base_family == 0x0F {
        model += ext_model << 4;
    }
    (family, model)
}

/// Classify an x86 CPU from its vendor string and CPUID leaf 1 `eax`.
pub fn classify_x86(vendor: &[u8; 12], signature: u32) -> CpuType {
    let (family, model) = family_model(signature);
    let stepping = signature & 0x0F;

    match vendor {
        b"GenuineIntel" => match (family, model) {
            (0x06, 0x2C) => CpuType::IntelWestmere,
            (0x06, 0x2D) => CpuType::IntelSandybridge,
            (0x06, 0x3E) => CpuType::IntelIvybridge,
            (0x06, 0x3C | 0x3F) => CpuType::IntelHaswell,
            (0x06, 0x4F | 0x56) => CpuType::IntelBroadwell,
            (0x06, 0x55) if stepping < 5 => CpuType::IntelSkylakeXeon,
            (0x06, 0x55) => CpuType::IntelCascadelakeXeon,
            (0x06, 0x5E) => CpuType::IntelSkylake,
            _ => CpuType::Unknown,
        },
        b"AuthenticAMD" => match (family, model) {
            (0x17, 0x00 | 0x01) => CpuType::AmdNaples,
            (0x17, 0x30 | 0x31) => CpuType::AmdRome,
            (0x19, 0x00 | 0x01) => CpuType::AmdMilan,
            (0x19, 0x10 | 0x11) => CpuType::AmdGenoa,
            (0x19, 0x44) => CpuType::AmdRyzenV3000,
            _ => CpuType::Unknown,
        },
        _ => CpuType::Unknown,
    }
}

/// Classify an Arm CPU from its `MIDR_EL1` value.
pub fn classify_midr(midr: u64) -> CpuType {
    let implementer = (midr >> 24) & 0xFF;
    let part = (midr >> 4) & 0xFFF;
    match (implementer, part) {
        (0x41, 0xD0C) => CpuType::ArmNeoverseN1,
        (0x41, 0xD40) => CpuType::ArmNeoverseV1,
        (0x41, 0xD49) => CpuType::ArmNeoverseN2,
        (0x41, 0xD4F) => CpuType::ArmNeoverseV2,
        (0xC0, 0xAC3) => CpuType::AmpereSiryn,
        _ => CpuType::Unknown,
    }
}

/// Parse the sysfs `midr_el1` file contents (e.g. `0x00000000413fd0c1`).
pub fn parse_midr(text: &str) -> Option<u64> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).ok()
}

#[cfg(target_arch = "x86_64")]
fn detect_raw() -> CpuType {
    use core::arch::x86_64::__cpuid;

    // SAFETY: CPUID is available on every x86_64 CPU.
    let leaf0 = unsafe { __cpuid(0) };
    let mut vendor = [0u8; 12];
    vendor[..4].copy_from_slice(&leaf0.ebx.to_le_bytes());
    vendor[4..8].copy_from_slice(&leaf0.edx.to_le_bytes());
    vendor[8..].copy_from_slice(&leaf0.ecx.to_le_bytes());
    if leaf0.eax < 1 {
        return CpuType::Unknown;
    }
    // SAFETY: leaf 1 exists, checked above.
    let leaf1 = unsafe { __cpuid(1) };
    classify_x86(&vendor, leaf1.eax)
}

#[cfg(all(target_arch = "aarch64", target_os = "linux"))]
fn detect_raw() -> CpuType {
    const MIDR_PATH: &str = "/sys/devices/system/cpu/cpu0/regs/identification/midr_el1";
    match std::fs::read_to_string(MIDR_PATH) {
        Ok(text) => parse_midr(&text).map_or(CpuType::Unknown, classify_midr),
        Err(err) => {
            debug!("cannot read {}: {}", MIDR_PATH, err);
            CpuType::Unknown
        }
    }
}

#[cfg(not(any(target_arch = "x86_64", all(target_arch = "aarch64", target_os = "linux"))))]
fn detect_raw() -> CpuType {
    CpuType::Unknown
}

/// Detect the microarchitecture of the running CPU.
pub fn detect() -> CpuType {
    let cpu = detect_raw();
    debug!("detected CPU type: {}", cpu);
    cpu
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTEL: &[u8; 12] = b"GenuineIntel";
    const AMD: &[u8; 12] = b"AuthenticAMD";

    #[test]
    fn test_family_model() {
        // Haswell client, family 6 model 0x3C
        assert_eq!(family_model(0x0003_06C3), (0x06, 0x3C));
        // Zen 2: base family 0xF + ext family 0x8
        assert_eq!(family_model(0x0083_0F10), (0x17, 0x31));
    }

    #[test]
    fn test_classify_intel() {
        assert_eq!(classify_x86(INTEL, 0x0003_06C3), CpuType::IntelHaswell);
        assert_eq!(classify_x86(INTEL, 0x0003_06F2), CpuType::IntelHaswell);
        assert_eq!(classify_x86(INTEL, 0x0004_06F1), CpuType::IntelBroadwell);
        assert_eq!(classify_x86(INTEL, 0x0005_0654), CpuType::IntelSkylakeXeon);
        assert_eq!(classify_x86(INTEL, 0x0005_0657), CpuType::IntelCascadelakeXeon);
        assert_eq!(classify_x86(INTEL, 0x0005_06E3), CpuType::IntelSkylake);
        assert_eq!(classify_x86(INTEL, 0x0003_06E4), CpuType::IntelIvybridge);
        assert_eq!(classify_x86(INTEL, 0x0002_06D7), CpuType::IntelSandybridge);
        assert_eq!(classify_x86(INTEL, 0x0002_06C2), CpuType::IntelWestmere);
        // Ice Lake server is not tuned
        assert_eq!(classify_x86(INTEL, 0x0006_06A6), CpuType::Unknown);
    }

    #[test]
    fn test_classify_amd() {
        assert_eq!(classify_x86(AMD, 0x0080_0F12), CpuType::AmdNaples);
        assert_eq!(classify_x86(AMD, 0x0083_0F10), CpuType::AmdRome);
        assert_eq!(classify_x86(AMD, 0x00A0_0F11), CpuType::AmdMilan);
        assert_eq!(classify_x86(AMD, 0x00A1_0F11), CpuType::AmdGenoa);
        assert_eq!(classify_x86(AMD, 0x00A4_0F41), CpuType::AmdRyzenV3000);
        assert_eq!(classify_x86(AMD, 0x0060_0F20), CpuType::Unknown);
    }

    #[test]
    fn test_classify_other_vendor() {
        assert_eq!(classify_x86(b"HygonGenuine", 0x0090_0F01), CpuType::Unknown);
    }

    #[test]
    fn test_classify_midr() {
        assert_eq!(classify_midr(0x413F_D0C1), CpuType::ArmNeoverseN1);
        assert_eq!(classify_midr(0x410F_D401), CpuType::ArmNeoverseV1);
        assert_eq!(classify_midr(0x410F_D490), CpuType::ArmNeoverseN2);
        assert_eq!(classify_midr(0x410F_D4F0), CpuType::ArmNeoverseV2);
        assert_eq!(classify_midr(0xC00F_AC30), CpuType::AmpereSiryn);
        // Cortex-A72
        assert_eq!(classify_midr(0x410F_D083), CpuType::Unknown);
    }

    #[test]
    fn test_parse_midr() {
        assert_eq!(parse_midr("0x00000000413fd0c1\n"), Some(0x413F_D0C1));
        assert_eq!(parse_midr("413fd0c1"), Some(0x413F_D0C1));
        assert_eq!(parse_midr("not hex"), None);
    }

    #[test]
    fn test_detect_does_not_panic() {
        let cpu = detect();
        assert!(!cpu.to_string().is_empty());
    }
}
