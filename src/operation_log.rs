use anyhow::Result;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Log file name
const OPERATION_LOG_FILE: &str = "operation_log.txt";

/// Get the directory where app data is stored (same as settings)
fn app_data_dir() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        let app_dir = config_dir.join("balanced-wallet");
        if !app_dir.exists() {
            let _ = fs::create_dir_all(&app_dir);
        }
        app_dir
    } else {
        PathBuf::from(".")
    }
}

/// Append-only text log of submitted operations.
#[derive(Debug, Clone)]
pub struct OperationLog {
    path: PathBuf,
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new(app_data_dir().join(OPERATION_LOG_FILE))
    }
}

impl OperationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a structured entry describing a user-requested operation.
    pub fn append(&self, operation: &str, nid: u64, details: impl AsRef<str>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let timestamp = Utc::now().to_rfc3339();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(file, "[{}] nid={} operation={}", timestamp, nid, operation)?;

        let body = details.as_ref();
        if body.trim().is_empty() {
            writeln!(file, "  (no additional details)")?;
        } else {
            for line in body.lines() {
                if line.trim().is_empty() {
                    writeln!(file)?;
                } else {
                    writeln!(file, "  {}", line)?;
                }
            }
        }

        writeln!(file)?;
        Ok(())
    }

    /// Read the entire log file content
    pub fn read(&self) -> Result<String> {
        if self.path.exists() {
            Ok(fs::read_to_string(&self.path)?)
        } else {
            Ok(String::new())
        }
    }
}
