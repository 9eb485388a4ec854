//! Plain-text error log artifact.
//!
//! Every batch run that collects errors leaves a timestamped log next to the
//! audio files so non-technical users can see what went wrong after the run.

use crate::error::Result;
use chrono::Local;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes collected batch errors to `error_log_<timestamp>.txt` in the given
/// folder and returns the log path.
pub fn write_error_log(folder: &Path, errors: &[String]) -> Result<PathBuf> {
    let now = Local::now();
    let log_path = folder.join(format!("error_log_{}.txt", now.format("%Y%m%d_%H%M%S")));

    let mut contents = String::new();
    let _ = writeln!(contents, "Error Log - {}", now.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(contents, "{}", "=".repeat(50));
    contents.push('\n');
    for error in errors {
        let _ = writeln!(contents, "• {}", error);
    }

    fs::write(&log_path, contents)?;
    Ok(log_path)
}
