//! Memory-mapped file checksums (requires `mmap` feature).
//!
//! Mapping a file lets the engines stream over the page cache directly
//! instead of copying through a read buffer.
//!
//! # Example
//!
//! ```no_run
//! use oxicrc_core::mmap::checksum_file;
//!
//! let crc = checksum_file("disk.img")?;
//! println!("{:08x}", crc);
//! # Ok::<(), oxicrc_core::error::OxiCrcError>(())
//! ```
//!
//! # Safety
//!
//! The mapping is read-only. If another process truncates or rewrites the
//! file while it is mapped, the checksum is meaningless and reads past the
//! new end may fault.

use crate::crc32c::Crc32c;
use crate::error::Result;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// A read-only memory-mapped file.
#[derive(Debug)]
pub struct MappedFile {
    /// `None` for empty files, which cannot be mapped on every platform.
    mmap: Option<Mmap>,
}

impl MappedFile {
    /// Open and map the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::OxiCrcError::Io`] if the file cannot be
    /// opened or mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_file(&file)
    }

    /// Map an already-open file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::OxiCrcError::Io`] if memory mapping fails.
    pub fn from_file(file: &File) -> Result<Self> {
        if file.metadata()?.len() == 0 {
            return Ok(Self { mmap: None });
        }
        // SAFETY: Read-only mapping; the caller is responsible for the file
        // not being modified while mapped.
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap: Some(mmap) })
    }

    /// The mapped contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Length of the mapped file in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Check if the mapped file is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// CRC-32C of the whole file.
    pub fn checksum(&self) -> u32 {
        Crc32c::compute(self.as_bytes())
    }
}

/// CRC-32C of the file at `path`, read through a memory mapping.
///
/// # Errors
///
/// Returns [`crate::error::OxiCrcError::Io`] if the file cannot be opened or
/// mapped.
pub fn checksum_file<P: AsRef<Path>>(path: P) -> Result<u32> {
    Ok(MappedFile::open(path)?.checksum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OxiCrcError;
    use std::io::{self, Write};

    /// Create a temporary file with the given contents and return its path.
    fn create_temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
        let temp_dir = std::env::temp_dir();
        let path = temp_dir.join(format!("oxicrc_mmap_test_{}_{}", std::process::id(), name));
        let mut file = File::create(&path).expect("Failed to create temp file");
        file.write_all(contents)
            .expect("Failed to write to temp file");
        file.sync_all().expect("Failed to sync temp file");
        path
    }

    /// Remove a temporary file.
    fn remove_temp_file(path: &Path) {
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_checksum_file() {
        let path = create_temp_file("check", b"123456789");

        let crc = checksum_file(&path).expect("checksum failed");
        assert_eq!(crc, 0xE306_9283);

        remove_temp_file(&path);
    }

    #[test]
    fn test_empty_file() {
        let path = create_temp_file("empty", b"");

        let mapped = MappedFile::open(&path).expect("Open failed");
        assert!(mapped.is_empty());
        assert_eq!(mapped.len(), 0);
        assert_eq!(mapped.checksum(), 0);

        remove_temp_file(&path);
    }

    #[test]
    fn test_large_file() {
        let size = 1024 * 1024 + 13;
        let contents: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        let path = create_temp_file("large", &contents);

        let mapped = MappedFile::open(&path).expect("Open failed");
        assert_eq!(mapped.len(), size);
        assert_eq!(mapped.as_bytes(), &contents[..]);
        assert_eq!(mapped.checksum(), Crc32c::compute(&contents));

        remove_temp_file(&path);
    }

    #[test]
    fn test_from_file() {
        let path = create_temp_file("from_file", b"From file test");

        let file = File::open(&path).expect("File open failed");
        let mapped = MappedFile::from_file(&file).expect("from_file failed");
        assert_eq!(mapped.as_bytes(), b"From file test");

        remove_temp_file(&path);
    }

    #[test]
    fn test_file_not_found() {
        let result = checksum_file("/nonexistent/path/to/file.dat");

        if let Err(OxiCrcError::Io(io_err)) = result {
            assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
        } else {
            panic!("Expected Io error with NotFound kind");
        }
    }
}
