//! Staleness decisions for installed packages.
//!
//! The build core never decides on its own whether a unit must be rebuilt; it
//! asks a [`StaleCheck`]. [`FingerprintCache`] is the default oracle: a unit is
//! reusable when its installed package exists and the install marker's
//! fingerprint matches the unit's current inputs.
//!
//! A unit's fingerprint covers its identity, its source file names and
//! contents, and the fingerprints of its non-stdlib imports, so a change in a
//! dependency's sources makes every dependent stale as well.

pub mod marker;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::build::store::pkgfile_path;
use crate::unit::{CompilationUnit, Resolver, Scope, StdLib};
use crate::util::hash::{ContentHash, hash_file, hash_lines};

pub use marker::{InstallMarker, MarkerError, marker_path, read_marker, write_marker};

/// Decides whether a unit's previously installed output can be reused.
pub trait StaleCheck: Send + Sync {
  fn is_stale(&self, unit: &CompilationUnit) -> bool;

  /// Called after `unit` was installed at `pkgfile`.
  fn installed(&self, _unit: &CompilationUnit, _pkgfile: &Path) -> Result<(), MarkerError> {
    Ok(())
  }
}

/// Content fingerprint staleness oracle backed by install markers.
pub struct FingerprintCache {
  pkgdir: PathBuf,
  stdlib: StdLib,
  resolver: Arc<dyn Resolver>,
  force: bool,
  fingerprints: Mutex<HashMap<String, Option<ContentHash>>>,
  stale: Mutex<HashMap<String, bool>>,
}

impl FingerprintCache {
  pub fn new(pkgdir: impl Into<PathBuf>, stdlib: StdLib, resolver: Arc<dyn Resolver>) -> Self {
    Self {
      pkgdir: pkgdir.into(),
      stdlib,
      resolver,
      force: false,
      fingerprints: Mutex::new(HashMap::new()),
      stale: Mutex::new(HashMap::new()),
    }
  }

  /// Treat every unit as stale.
  pub fn with_force(mut self, force: bool) -> Self {
    self.force = force;
    self
  }

  /// Current fingerprint of `unit`, or `None` if an input cannot be read.
  pub fn fingerprint(&self, unit: &CompilationUnit) -> Option<ContentHash> {
    let mut lines = vec![
      format!("unit:{}", unit.import_path),
      format!("scope:{}", unit.scope),
      format!("complete:{}", unit.complete),
    ];

    for (tag, files) in [("F", &unit.files), ("S", &unit.sfiles)] {
      for file in files {
        match hash_file(&unit.dir.join(file)) {
          Ok(hash) => lines.push(format!("{}:{}:{}", tag, file, hash)),
          Err(e) => {
            debug!(unit = %unit.import_path, error = %e, "cannot fingerprint source");
            return None;
          }
        }
      }
    }

    for import in &unit.imports {
      if self.stdlib.contains(import) {
        lines.push(format!("I:{}", import));
        continue;
      }
      let dep = self.dependency_fingerprint(import)?;
      lines.push(format!("D:{}:{}", import, dep));
    }

    Some(hash_lines(lines))
  }

  fn dependency_fingerprint(&self, import_path: &str) -> Option<ContentHash> {
    {
      let mut memo = self.fingerprints.lock().unwrap_or_else(PoisonError::into_inner);
      if let Some(known) = memo.get(import_path) {
        return known.clone();
      }
      // Provisional entry; an import cycle fingerprints as unreadable.
      memo.insert(import_path.to_string(), None);
    }

    let fingerprint = self
      .resolver
      .resolve(import_path, Scope::Normal)
      .ok()
      .filter(|unit| unit.metadata.is_ok())
      .and_then(|unit| self.fingerprint(&unit));

    self
      .fingerprints
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(import_path.to_string(), fingerprint.clone());
    fingerprint
  }

  fn dependency_stale(&self, import_path: &str) -> bool {
    {
      let mut memo = self.stale.lock().unwrap_or_else(PoisonError::into_inner);
      if let Some(&known) = memo.get(import_path) {
        return known;
      }
      memo.insert(import_path.to_string(), true);
    }

    let stale = match self.resolver.resolve(import_path, Scope::Normal) {
      Ok(unit) => self.check(&unit),
      Err(_) => true,
    };

    self
      .stale
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(import_path.to_string(), stale);
    stale
  }

  fn check(&self, unit: &CompilationUnit) -> bool {
    if self.force {
      debug!(unit = %unit, "stale: forced rebuild");
      return true;
    }
    if unit.is_test() {
      debug!(unit = %unit, "stale: test scope");
      return true;
    }
    if unit.metadata.is_err() {
      return true;
    }

    let pkgfile = pkgfile_path(&self.pkgdir, unit);
    if !pkgfile.exists() {
      debug!(unit = %unit, path = ?pkgfile, "stale: package not installed");
      return true;
    }

    let marker = match read_marker(&marker_path(&pkgfile)) {
      Ok(Some(marker)) => marker,
      Ok(None) => {
        debug!(unit = %unit, "stale: no install marker");
        return true;
      }
      Err(e) => {
        warn!(unit = %unit, error = %e, "invalid install marker, will rebuild");
        return true;
      }
    };

    match self.fingerprint(unit) {
      Some(current) if current.0 == marker.fingerprint => {}
      _ => {
        debug!(unit = %unit, "stale: inputs changed");
        return true;
      }
    }

    if let Some(dep) = unit
      .imports
      .iter()
      .filter(|import| !self.stdlib.contains(import))
      .find(|import| self.dependency_stale(import))
    {
      debug!(unit = %unit, dependency = %dep, "stale: dependency is stale");
      return true;
    }

    false
  }
}

impl StaleCheck for FingerprintCache {
  fn is_stale(&self, unit: &CompilationUnit) -> bool {
    self.check(unit)
  }

  fn installed(&self, unit: &CompilationUnit, pkgfile: &Path) -> Result<(), MarkerError> {
    let fingerprint = self
      .fingerprint(unit)
      .ok_or_else(|| MarkerError::Fingerprint(unit.import_path.clone()))?;
    write_marker(&marker_path(pkgfile), &InstallMarker::new(&unit.import_path, fingerprint.0))?;

    if unit.scope == Scope::Normal {
      self
        .stale
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(unit.import_path.clone(), false);
    }
    Ok(())
  }
}
