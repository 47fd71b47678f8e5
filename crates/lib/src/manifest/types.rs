use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::toolchain::{TemplateError, ToolchainConfig};

/// Contents of a workspace's `grist.json`.
///
/// ```json
/// {
///   "workdir": "_build/obj",
///   "pkgdir": "_build/pkg",
///   "stdlib": ["fmt"],
///   "packages": {
///     "example.com/app": { "dir": "src/app", "files": ["main.c"], "imports": ["example.com/lib"], "command": true },
///     "example.com/lib": { "dir": "src/lib", "files": ["lib.c"], "sfiles": ["fast.s"] }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceManifest {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub workdir: Option<PathBuf>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pkgdir: Option<PathBuf>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub include_paths: Vec<PathBuf>,
  /// Imports assumed pre-built.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub stdlib: Vec<String>,
  #[serde(default)]
  pub toolchain: ToolchainConfig,
  /// Packages keyed by import path.
  #[serde(default)]
  pub packages: BTreeMap<String, PackageDef>,
}

/// One package in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageDef {
  /// Source directory, relative to the workspace root.
  pub dir: PathBuf,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub files: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub sfiles: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub imports: Vec<String>,
  #[serde(default)]
  pub command: bool,
  /// Defaults to true when the package has no assembly files.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub complete: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("no {file} found in {dir}")]
  NotFound { file: &'static str, dir: String },

  #[error("failed to read {path}: {message}")]
  Read { path: String, message: String },

  #[error("failed to parse {path}: {message}")]
  Parse { path: String, message: String },

  #[error("invalid toolchain template: {0}")]
  Toolchain(#[from] TemplateError),

  #[error("package {import_path}: {message}")]
  InvalidPackage { import_path: String, message: String },
}
