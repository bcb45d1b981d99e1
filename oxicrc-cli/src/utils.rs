//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

/// Parse a CRC value written in hexadecimal, with or without `0x`.
pub fn parse_crc(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let valid = !digits.is_empty()
        && digits.len() <= 8
        && digits.bytes().all(|b| b.is_ascii_hexdigit());
    if !valid {
        return Err(format!("invalid CRC value '{}': expected up to 8 hex digits", s));
    }
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid CRC value '{}': {}", s, e))
}

/// Format a CRC the way every command prints it.
pub fn format_crc(crc: u32) -> String {
    format!("{:08x}", crc)
}
