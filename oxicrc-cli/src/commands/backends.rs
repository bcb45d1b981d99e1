//! Backends command implementation.

use oxicrc_core::dispatch::{new_generic, new_with_config, singleton};
use oxicrc_core::{ChecksumEngine, StreamConfig, accel, cpu};
use serde::{Deserialize, Serialize};

/// Lengths cross-checked by `--verify`, covering every kernel path.
const VERIFY_LENGTHS: [usize; 12] = [0, 1, 7, 15, 64, 255, 256, 1000, 2047, 2048, 4096, 65_539];

/// JSON output for one backend.
#[derive(Debug, Serialize, Deserialize)]
struct BackendJson {
    name: String,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    verified: Option<bool>,
}

/// JSON output for the backend report.
#[derive(Debug, Serialize, Deserialize)]
struct BackendsJson {
    cpu: String,
    accelerated: bool,
    selected: String,
    backends: Vec<BackendJson>,
}

pub fn cmd_backends(json: bool, verify: bool) -> Result<(), Box<dyn std::error::Error>> {
    let reference = new_generic();
    let data = test_data(VERIFY_LENGTHS[VERIFY_LENGTHS.len() - 1]);

    let mut backends = vec![BackendJson {
        name: reference.backend().to_string(),
        available: true,
        verified: verify.then_some(true),
    }];
    for config in StreamConfig::all() {
        let engine = new_with_config(config).ok();
        let verified = match (&engine, verify) {
            (Some(engine), true) => Some(agrees(reference.as_ref(), engine.as_ref(), &data)),
            _ => None,
        };
        backends.push(BackendJson {
            name: config.to_string(),
            available: engine.is_some(),
            verified,
        });
    }

    let report = BackendsJson {
        cpu: cpu::detect().to_string(),
        accelerated: accel::is_supported(),
        selected: singleton().backend().to_string(),
        backends,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    let failed = report
        .backends
        .iter()
        .filter(|b| b.verified == Some(false))
        .count();
    if failed > 0 {
        return Err(format!("{} backend(s) disagree with the generic engine", failed).into());
    }
    Ok(())
}

fn print_report(report: &BackendsJson) {
    println!("CPU: {}", report.cpu);
    println!(
        "Accelerated: {}",
        if report.accelerated { "yes" } else { "no" }
    );
    println!("Selected: {}", report.selected);
    println!();
    println!("{:<16} {:<12} Verified", "Backend", "Available");
    println!("{}", "-".repeat(40));
    for backend in &report.backends {
        let verified = match backend.verified {
            Some(true) => "ok",
            Some(false) => "MISMATCH",
            None => "-",
        };
        println!(
            "{:<16} {:<12} {}",
            backend.name,
            if backend.available { "yes" } else { "no" },
            verified
        );
    }
}

/// Whether `engine` matches `reference` on every verify length and on zero
/// extension.
fn agrees(reference: &dyn ChecksumEngine, engine: &dyn ChecksumEngine, data: &[u8]) -> bool {
    let extend_ok = VERIFY_LENGTHS.iter().all(|&len| {
        let mut expected = reference.empty();
        reference.extend(&mut expected, &data[..len]);
        let mut actual = engine.empty();
        engine.extend(&mut actual, &data[..len]);
        expected == actual
    });
    let zeroes_ok = VERIFY_LENGTHS.iter().all(|&len| {
        let mut expected = 0x0BAD_F00D;
        reference.extend_by_zeroes(&mut expected, len);
        let mut actual = 0x0BAD_F00D;
        engine.extend_by_zeroes(&mut actual, len);
        expected == actual
    });
    extend_ok && zeroes_ok
}

fn test_data(size: usize) -> Vec<u8> {
    let mut seed: u64 = 0x123456789ABCDEF0;
    (0..size)
        .map(|_| {
            // Linear congruential generator
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            (seed >> 32) as u8
        })
        .collect()
}
