//! Install markers.
//!
//! A marker sits next to every installed package and records the fingerprint
//! of the sources it was built from.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MARKER_SUFFIX;

/// Marker format version.
pub const MARKER_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallMarker {
  pub version: u32,
  pub import_path: String,
  /// Full 64-character SHA-256 fingerprint of the unit's inputs.
  pub fingerprint: String,
}

impl InstallMarker {
  pub fn new(import_path: impl Into<String>, fingerprint: impl Into<String>) -> Self {
    Self {
      version: MARKER_VERSION,
      import_path: import_path.into(),
      fingerprint: fingerprint.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
  #[error("failed to read marker {path}: {message}")]
  Read { path: String, message: String },

  #[error("failed to parse marker {path}: {message}")]
  Parse { path: String, message: String },

  #[error("failed to write marker {path}: {message}")]
  Write { path: String, message: String },

  #[error("cannot fingerprint {0}")]
  Fingerprint(String),
}

/// `<pkgfile>.grist`
pub fn marker_path(pkgfile: &Path) -> PathBuf {
  let mut path = OsString::from(pkgfile.as_os_str());
  path.push(".");
  path.push(MARKER_SUFFIX);
  PathBuf::from(path)
}

/// Read a marker. Returns `None` if it doesn't exist.
pub fn read_marker(path: &Path) -> Result<Option<InstallMarker>, MarkerError> {
  if !path.exists() {
    return Ok(None);
  }

  let content = fs::read_to_string(path).map_err(|e| MarkerError::Read {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;
  let marker = serde_json::from_str(&content).map_err(|e| MarkerError::Parse {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;
  Ok(Some(marker))
}

pub fn write_marker(path: &Path, marker: &InstallMarker) -> Result<(), MarkerError> {
  let write_err = |message: String| MarkerError::Write {
    path: path.display().to_string(),
    message,
  };

  let content = serde_json::to_string(marker).map_err(|e| write_err(e.to_string()))?;
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
  }
  fs::write(path, format!("{}\n", content)).map_err(|e| write_err(e.to_string()))
}
