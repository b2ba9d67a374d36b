#![deny(warnings)]

//! Simulation record snapshots on disk.
//!
//! The format follows the file extension: `.json` is pretty-printed JSON for
//! inspection, `.bin` is compact bincode.

use sim_runtime::SimulationRecord;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("json snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bincode snapshot: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("unsupported snapshot extension for {0} (use .json or .bin)")]
    UnsupportedFormat(PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Bincode,
}

impl SnapshotFormat {
    pub fn from_path(path: &Path) -> Result<Self, PersistenceError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("bin") => Ok(Self::Bincode),
            _ => Err(PersistenceError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PersistenceError + '_ {
    move |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `record` to `path`, creating parent directories as needed.
pub fn save_record(path: impl AsRef<Path>, record: &SimulationRecord) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    let format = SnapshotFormat::from_path(path)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err(path))?;
    }
    let mut out = BufWriter::new(File::create(path).map_err(io_err(path))?);
    match format {
        SnapshotFormat::Json => serde_json::to_writer_pretty(&mut out, record)?,
        SnapshotFormat::Bincode => bincode::serialize_into(&mut out, record)?,
    }
    out.flush().map_err(io_err(path))?;
    info!(path = %path.display(), ?format, steps = record.rows.len(), "record saved");
    Ok(())
}

pub fn load_record(path: impl AsRef<Path>) -> Result<SimulationRecord, PersistenceError> {
    let path = path.as_ref();
    let format = SnapshotFormat::from_path(path)?;
    let input = BufReader::new(File::open(path).map_err(io_err(path))?);
    let record = match format {
        SnapshotFormat::Json => serde_json::from_reader(input)?,
        SnapshotFormat::Bincode => bincode::deserialize_from(input)?,
    };
    info!(path = %path.display(), ?format, "record loaded");
    Ok(record)
}
