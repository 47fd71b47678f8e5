//! Build context shared by every target of one build session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::StaleCheck;
use crate::registry::Registry;
use crate::toolchain::Toolchain;
use crate::unit::{Resolver, StdLib};

/// Directory layout and graph pruning for a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
  /// Root of intermediate objects and linked binaries.
  pub workdir: PathBuf,
  /// Root of installed packages.
  pub pkgdir: PathBuf,
  /// Include directories searched after `workdir` and `pkgdir`.
  pub include_paths: Vec<PathBuf>,
  /// Imports excluded from graph construction.
  pub stdlib: StdLib,
}

impl BuildConfig {
  pub fn new(workdir: impl Into<PathBuf>, pkgdir: impl Into<PathBuf>) -> Self {
    Self {
      workdir: workdir.into(),
      pkgdir: pkgdir.into(),
      include_paths: Vec::new(),
      stdlib: StdLib::default(),
    }
  }
}

/// Everything the graph builder and stage targets need, plus the registry that
/// deduplicates unit builds. Shared behind an `Arc` so stage tasks can hold it.
pub struct BuildContext {
  config: BuildConfig,
  toolchain: Arc<dyn Toolchain>,
  resolver: Arc<dyn Resolver>,
  stale: Arc<dyn StaleCheck>,
  registry: Registry,
}

impl BuildContext {
  pub fn new(
    config: BuildConfig,
    toolchain: Arc<dyn Toolchain>,
    resolver: Arc<dyn Resolver>,
    stale: Arc<dyn StaleCheck>,
  ) -> Arc<Self> {
    Arc::new(Self {
      config,
      toolchain,
      resolver,
      stale,
      registry: Registry::new(),
    })
  }

  pub fn config(&self) -> &BuildConfig {
    &self.config
  }

  pub fn workdir(&self) -> &Path {
    &self.config.workdir
  }

  pub fn pkgdir(&self) -> &Path {
    &self.config.pkgdir
  }

  pub fn stdlib(&self) -> &StdLib {
    &self.config.stdlib
  }

  /// Include directories passed to every compile and link.
  pub fn include_paths(&self) -> Vec<PathBuf> {
    let mut includes = vec![self.config.workdir.clone(), self.config.pkgdir.clone()];
    includes.extend(self.config.include_paths.iter().cloned());
    includes
  }

  pub fn toolchain(&self) -> &Arc<dyn Toolchain> {
    &self.toolchain
  }

  pub fn resolver(&self) -> &Arc<dyn Resolver> {
    &self.resolver
  }

  pub fn stale(&self) -> &Arc<dyn StaleCheck> {
    &self.stale
  }

  pub fn registry(&self) -> &Registry {
    &self.registry
  }
}

impl std::fmt::Debug for BuildContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BuildContext")
      .field("config", &self.config)
      .field("registry", &self.registry)
      .finish_non_exhaustive()
  }
}
