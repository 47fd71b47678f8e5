//! Hashing utilities for build fingerprints.
//!
//! This module provides:
//! - `ContentHash`: A full 64-character SHA-256 hash
//! - `hash_file()`: Single file hashing
//! - `hash_bytes()`: Arbitrary byte hashing
//! - `hash_lines()`: Order-sensitive hashing of entry lines

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A full 64-character SHA-256 hash, lowercase hexadecimal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Error while hashing a file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to read file {path}: {message}")]
pub struct HashError {
  pub path: String,
  pub message: String,
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> Result<ContentHash, HashError> {
  let read_err = |e: std::io::Error| HashError {
    path: path.display().to_string(),
    message: e.to_string(),
  };

  let mut file = fs::File::open(path).map_err(read_err)?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(read_err)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(format!("{:x}", hasher.finalize()))
}

/// Hash a sequence of entry lines. Order matters.
pub fn hash_lines<I, S>(lines: I) -> ContentHash
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut hasher = Sha256::new();
  for line in lines {
    hasher.update(line.as_ref().as_bytes());
    hasher.update(b"\n");
  }
  ContentHash(format!("{:x}", hasher.finalize()))
}
