use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use harvester_core::{HarvestEntry, HarvestRun};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const DEFAULT_OUTPUT_FILE: &str = "faq_data.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("failed to encode entries: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Durable destination for a finished run.
pub trait Sink: Send + Sync {
    fn persist(&self, run: &HarvestRun) -> Result<(), PersistError>;
}

/// Writes the run's entries as a pretty-printed JSON array.
///
/// The file is written to a temp file in the same directory and renamed into
/// place, so readers never observe a partial file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
    filename: String,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            filename: filename.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.filename)
    }
}

impl Sink for JsonFileSink {
    fn persist(&self, run: &HarvestRun) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(run.entries())?;
        write_atomic(&self.dir, &self.filename, &content)?;
        Ok(())
    }
}

/// Load entries written by [`JsonFileSink`].
pub fn read_entries(path: &Path) -> Result<Vec<HarvestEntry>, PersistError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

fn write_atomic(dir: &Path, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
    ensure_output_dir(dir)?;

    let target = dir.join(filename);
    let mut tmp =
        NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;

    tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
    Ok(target)
}
