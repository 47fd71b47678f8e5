//! Workspace manifest loading and package resolution.
//!
//! A workspace is a directory containing `grist.json`. Paths in the manifest
//! are relative to that directory. `GRIST_WORKDIR` and `GRIST_PKGDIR`
//! override the manifest's output directories.

mod types;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::build::store::testobjdir;
use crate::consts::{DEFAULT_PKGDIR, DEFAULT_WORKDIR, MANIFEST_FILENAME, PKGDIR_ENV, WORKDIR_ENV};
use crate::context::BuildConfig;
use crate::unit::{CompilationUnit, ResolveError, Resolver, Scope, StdLib};

pub use types::*;

/// A loaded workspace with its output directories resolved.
#[derive(Debug, Clone)]
pub struct Workspace {
  root: PathBuf,
  manifest: WorkspaceManifest,
  workdir: PathBuf,
  pkgdir: PathBuf,
}

/// Load the workspace rooted at `root`.
pub fn load(root: &Path) -> Result<Workspace, ManifestError> {
  let root = dunce::canonicalize(root).map_err(|e| ManifestError::Read {
    path: root.display().to_string(),
    message: e.to_string(),
  })?;
  let path = root.join(MANIFEST_FILENAME);
  if !path.exists() {
    return Err(ManifestError::NotFound {
      file: MANIFEST_FILENAME,
      dir: root.display().to_string(),
    });
  }

  let content = fs::read_to_string(&path).map_err(|e| ManifestError::Read {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;
  let manifest: WorkspaceManifest = serde_json::from_str(&content).map_err(|e| ManifestError::Parse {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;

  Workspace::new(root, manifest)
}

/// `env` if set, else `configured`, else `default`; relative paths are taken
/// from `root`.
fn output_dir(root: &Path, env: &str, configured: Option<&Path>, default: &str) -> PathBuf {
  let dir = std::env::var_os(env)
    .filter(|v| !v.is_empty())
    .map(PathBuf::from)
    .or_else(|| configured.map(Path::to_path_buf))
    .unwrap_or_else(|| PathBuf::from(default));
  root.join(dir)
}

impl Workspace {
  /// Validate `manifest` and resolve its directories against `root`.
  pub fn new(root: PathBuf, manifest: WorkspaceManifest) -> Result<Self, ManifestError> {
    manifest.toolchain.validate()?;
    for (import_path, def) in &manifest.packages {
      if import_path.is_empty() || import_path.starts_with('/') || import_path.ends_with('/') {
        return Err(ManifestError::InvalidPackage {
          import_path: import_path.clone(),
          message: "malformed import path".to_string(),
        });
      }
      if def.imports.iter().any(|i| i == import_path) {
        return Err(ManifestError::InvalidPackage {
          import_path: import_path.clone(),
          message: "package imports itself".to_string(),
        });
      }
    }

    let workdir = output_dir(&root, WORKDIR_ENV, manifest.workdir.as_deref(), DEFAULT_WORKDIR);
    let pkgdir = output_dir(&root, PKGDIR_ENV, manifest.pkgdir.as_deref(), DEFAULT_PKGDIR);
    debug!(root = ?root, workdir = ?workdir, pkgdir = ?pkgdir, packages = manifest.packages.len(), "loaded workspace");

    Ok(Self {
      root,
      manifest,
      workdir,
      pkgdir,
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn manifest(&self) -> &WorkspaceManifest {
    &self.manifest
  }

  pub fn workdir(&self) -> &Path {
    &self.workdir
  }

  pub fn pkgdir(&self) -> &Path {
    &self.pkgdir
  }

  pub fn stdlib(&self) -> StdLib {
    StdLib::new(self.manifest.stdlib.iter().cloned())
  }

  pub fn build_config(&self) -> BuildConfig {
    let mut config = BuildConfig::new(&self.workdir, &self.pkgdir);
    config.include_paths = self.manifest.include_paths.iter().map(|p| self.root.join(p)).collect();
    config.stdlib = self.stdlib();
    config
  }

  pub fn resolver(&self) -> ManifestResolver {
    ManifestResolver {
      root: self.root.clone(),
      workdir: self.workdir.clone(),
      packages: self.manifest.packages.clone(),
    }
  }

  /// Import paths of every command package, sorted.
  pub fn commands(&self) -> Vec<String> {
    self
      .manifest
      .packages
      .iter()
      .filter(|(_, def)| def.command)
      .map(|(path, _)| path.clone())
      .collect()
  }
}

/// Resolves import paths against the packages of a manifest.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
  root: PathBuf,
  workdir: PathBuf,
  packages: BTreeMap<String, PackageDef>,
}

impl Resolver for ManifestResolver {
  fn resolve(&self, import_path: &str, scope: Scope) -> Result<CompilationUnit, ResolveError> {
    let def = self
      .packages
      .get(import_path)
      .ok_or_else(|| ResolveError::NotFound(import_path.to_string()))?;

    let dir = self.root.join(&def.dir);
    let missing = def
      .files
      .iter()
      .chain(&def.sfiles)
      .map(|file| dir.join(file))
      .find(|path| !path.is_file());

    let mut unit = CompilationUnit::new(import_path, dir)
      .with_scope(scope)
      .with_files(def.files.iter().cloned())
      .with_sfiles(def.sfiles.iter().cloned())
      .with_imports(def.imports.iter().cloned())
      .with_command(def.command)
      .with_complete(def.complete.unwrap_or(def.sfiles.is_empty()));

    if scope == Scope::Test {
      let extra = testobjdir(&self.workdir, &unit);
      unit = unit.with_extra_includes(extra);
    }
    if let Some(path) = missing {
      unit = unit.with_metadata(Err(ResolveError::MissingSource { path }));
    }
    Ok(unit)
  }
}
