//! Test doubles for the build core.
//!
//! - [`RecordingToolchain`] records every call and writes placeholder outputs
//! - [`MapResolver`] resolves from an in-memory set of units
//! - [`FixedStale`] marks a fixed set of import paths as up to date

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::cache::StaleCheck;
use crate::context::{BuildConfig, BuildContext};
use crate::toolchain::{Toolchain, ToolchainError};
use crate::unit::{CompilationUnit, ResolveError, Resolver, Scope, StdLib};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  Compile {
    includes: Vec<PathBuf>,
    import_path: String,
    dir: PathBuf,
    out: PathBuf,
    files: Vec<String>,
    complete: bool,
  },
  Assemble {
    dir: PathBuf,
    out: PathBuf,
    src: PathBuf,
  },
  Archive {
    out: PathBuf,
    objects: Vec<PathBuf>,
  },
  Link {
    includes: Vec<PathBuf>,
    out: PathBuf,
    archive: PathBuf,
  },
}

/// Toolchain that records calls and writes a small file at every output path.
#[derive(Debug, Default)]
pub struct RecordingToolchain {
  calls: Mutex<Vec<Call>>,
  failing: Mutex<BTreeSet<String>>,
}

impl RecordingToolchain {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
    self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
  }

  /// Number of compile calls for `import_path`.
  pub fn compiles(&self, import_path: &str) -> usize {
    self.count(|c| matches!(c, Call::Compile { import_path: p, .. } if p == import_path))
  }

  pub fn assembles(&self) -> usize {
    self.count(|c| matches!(c, Call::Assemble { .. }))
  }

  pub fn archives(&self) -> usize {
    self.count(|c| matches!(c, Call::Archive { .. }))
  }

  pub fn links(&self) -> usize {
    self.count(|c| matches!(c, Call::Link { .. }))
  }

  /// Make compiling `import_path` fail.
  pub fn fail_compile(&self, import_path: &str) {
    self.failing.lock().unwrap().insert(format!("compile:{}", import_path));
  }

  /// Make assembling any source named `sfile` fail.
  pub fn fail_assemble(&self, sfile: &str) {
    self.failing.lock().unwrap().insert(format!("asm:{}", sfile));
  }

  fn record(&self, call: Call, key: String, out: &Path) -> Result<(), ToolchainError> {
    self.calls.lock().unwrap().push(call);
    if self.failing.lock().unwrap().contains(&key) {
      return Err(ToolchainError::CmdFailed { cmd: key, code: Some(1) });
    }
    if let Some(parent) = out.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, format!("{}\n", key))?;
    Ok(())
  }
}

#[async_trait]
impl Toolchain for RecordingToolchain {
  async fn compile(
    &self,
    includes: &[PathBuf],
    import_path: &str,
    dir: &Path,
    out: &Path,
    files: &[String],
    complete: bool,
  ) -> Result<(), ToolchainError> {
    let call = Call::Compile {
      includes: includes.to_vec(),
      import_path: import_path.to_string(),
      dir: dir.to_path_buf(),
      out: out.to_path_buf(),
      files: files.to_vec(),
      complete,
    };
    self.record(call, format!("compile:{}", import_path), out)
  }

  async fn assemble(&self, dir: &Path, out: &Path, src: &Path) -> Result<(), ToolchainError> {
    let name = src.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let call = Call::Assemble {
      dir: dir.to_path_buf(),
      out: out.to_path_buf(),
      src: src.to_path_buf(),
    };
    self.record(call, format!("asm:{}", name), out)
  }

  async fn archive(&self, out: &Path, objects: &[PathBuf]) -> Result<(), ToolchainError> {
    let call = Call::Archive {
      out: out.to_path_buf(),
      objects: objects.to_vec(),
    };
    self.record(call, format!("pack:{}", out.display()), out)
  }

  async fn link(&self, includes: &[PathBuf], out: &Path, archive: &Path) -> Result<(), ToolchainError> {
    let call = Call::Link {
      includes: includes.to_vec(),
      out: out.to_path_buf(),
      archive: archive.to_path_buf(),
    };
    self.record(call, format!("link:{}", out.display()), out)
  }
}

/// Resolver over units registered with [`MapResolver::insert`].
///
/// Test-scope requests return the normal unit with its scope switched.
#[derive(Debug, Default)]
pub struct MapResolver {
  units: Mutex<HashMap<String, CompilationUnit>>,
}

impl MapResolver {
  pub fn new(units: impl IntoIterator<Item = CompilationUnit>) -> Self {
    let resolver = Self::default();
    for unit in units {
      resolver.insert(unit);
    }
    resolver
  }

  pub fn insert(&self, unit: CompilationUnit) {
    self.units.lock().unwrap().insert(unit.import_path.clone(), unit);
  }

  pub fn get(&self, import_path: &str) -> Option<CompilationUnit> {
    self.units.lock().unwrap().get(import_path).cloned()
  }
}

impl Resolver for MapResolver {
  fn resolve(&self, import_path: &str, scope: Scope) -> Result<CompilationUnit, ResolveError> {
    self
      .get(import_path)
      .map(|unit| unit.with_scope(scope))
      .ok_or_else(|| ResolveError::NotFound(import_path.to_string()))
  }
}

/// Every unit is stale except the listed import paths.
#[derive(Debug, Default)]
pub struct FixedStale {
  fresh: BTreeSet<String>,
}

impl FixedStale {
  pub fn fresh<I, S>(paths: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      fresh: paths.into_iter().map(Into::into).collect(),
    }
  }
}

impl StaleCheck for FixedStale {
  fn is_stale(&self, unit: &CompilationUnit) -> bool {
    !self.fresh.contains(&unit.import_path)
  }
}

/// A context rooted at `root` with an empty resolver and nothing up to date.
pub fn test_context(root: &Path) -> (Arc<BuildContext>, Arc<RecordingToolchain>) {
  test_context_with(root, MapResolver::default(), FixedStale::default(), StdLib::default())
}

pub fn test_context_with(
  root: &Path,
  resolver: MapResolver,
  stale: FixedStale,
  stdlib: StdLib,
) -> (Arc<BuildContext>, Arc<RecordingToolchain>) {
  let toolchain = Arc::new(RecordingToolchain::new());
  let mut config = BuildConfig::new(root.join("obj"), root.join("pkg"));
  config.stdlib = stdlib;
  let ctx = BuildContext::new(config, toolchain.clone(), Arc::new(resolver), Arc::new(stale));
  (ctx, toolchain)
}
