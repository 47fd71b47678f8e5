mod build;
mod clean;
mod plan;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use plan::cmd_plan;

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use grist_lib::consts::MANIFEST_FILENAME;
use grist_lib::manifest::{ManifestResolver, Workspace};
use grist_lib::unit::{CompilationUnit, Resolver, Scope};

/// Resolve the requested roots, or every command package when none are given.
fn resolve_roots(ws: &Workspace, resolver: &Arc<ManifestResolver>, paths: &[String], scope: Scope) -> Result<Vec<CompilationUnit>> {
  let paths = if paths.is_empty() { ws.commands() } else { paths.to_vec() };
  if paths.is_empty() {
    bail!("Nothing to build: no command packages in {}", MANIFEST_FILENAME);
  }

  paths
    .iter()
    .map(|path| {
      resolver
        .resolve(path, scope)
        .with_context(|| format!("Failed to resolve package: {}", path))
    })
    .collect()
}
