//! Sum command implementation.

use crate::utils::{create_progress_bar, format_crc};
use log::debug;
use oxicrc_core::dispatch::{new_engine, singleton};
use oxicrc_core::mmap::MappedFile;
use oxicrc_core::parallel::{DEFAULT_CHUNK_SIZE, extend_parallel};
use oxicrc_core::{BackendChoice, ChecksumEngine};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Options for the sum command.
pub struct SumOptions {
    pub raw: bool,
    pub scramble: bool,
    pub backend: BackendChoice,
    pub parallel: bool,
    pub json: bool,
    pub progress: bool,
}

/// JSON output for one input.
#[derive(Debug, Serialize, Deserialize)]
struct SumJson {
    file: String,
    crc: String,
    length: usize,
}

/// JSON output for the whole run.
#[derive(Debug, Serialize, Deserialize)]
struct SumReportJson {
    backend: String,
    raw: bool,
    scrambled: bool,
    results: Vec<SumJson>,
}

pub fn cmd_sum(files: &[PathBuf], options: &SumOptions) -> Result<(), Box<dyn std::error::Error>> {
    let owned;
    let engine: &dyn ChecksumEngine = match options.backend {
        BackendChoice::Auto => singleton(),
        choice => {
            owned = new_engine(choice)?;
            &*owned
        }
    };
    debug!("checksumming with {}", engine.backend());

    let stdin_only = files.is_empty();
    let pb = create_progress_bar(files.len() as u64, options.progress && !stdin_only);
    let mut results = Vec::new();

    if stdin_only {
        let mut data = Vec::new();
        io::stdin().lock().read_to_end(&mut data)?;
        let crc = checksum(engine, &data, options)?;
        results.push(("-".to_string(), crc, data.len()));
    }

    for path in files {
        pb.set_message(path.display().to_string());
        let (crc, length) = if is_stdin(path) {
            let mut data = Vec::new();
            io::stdin().lock().read_to_end(&mut data)?;
            (checksum(engine, &data, options)?, data.len())
        } else {
            let mapped = MappedFile::open(path)?;
            (checksum(engine, mapped.as_bytes(), options)?, mapped.len())
        };
        results.push((path.display().to_string(), crc, length));
        pb.inc(1);
    }
    pb.finish_and_clear();

    if options.json {
        let report = SumReportJson {
            backend: engine.backend().to_string(),
            raw: options.raw,
            scrambled: options.scramble,
            results: results
                .into_iter()
                .map(|(file, crc, length)| SumJson {
                    file,
                    crc: format_crc(crc),
                    length,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (file, crc, _) in results {
            println!("{}  {}", format_crc(crc), file);
        }
    }

    Ok(())
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Checksum one input according to the options.
fn checksum(
    engine: &dyn ChecksumEngine,
    data: &[u8],
    options: &SumOptions,
) -> oxicrc_core::Result<u32> {
    let mut crc = if options.raw { engine.empty() } else { !0 };
    if options.parallel {
        extend_parallel(engine, &mut crc, data, DEFAULT_CHUNK_SIZE)?;
    } else {
        engine.extend(&mut crc, data);
    }
    if !options.raw {
        crc = !crc;
    }
    if options.scramble {
        engine.scramble(&mut crc);
    }
    Ok(crc)
}
