//! Implementation of the `grist plan` command.
//!
//! Resolves the import graph of the requested packages and prints the waves
//! they would be built in, marking what is out of date. Nothing is built.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use grist_lib::cache::FingerprintCache;
use grist_lib::manifest::load;
use grist_lib::plan::ImportGraph;
use grist_lib::unit::Scope;

use super::resolve_roots;
use crate::output::{OutputFormat, print_info, print_json, print_stat, print_unit};

pub fn cmd_plan(root: &Path, paths: &[String], output: OutputFormat) -> Result<()> {
  let ws = load(root).with_context(|| format!("Failed to load workspace: {}", root.display()))?;
  let resolver = Arc::new(ws.resolver());
  let units = resolve_roots(&ws, &resolver, paths, Scope::Normal)?;

  let graph = ImportGraph::from_roots(resolver.as_ref(), &ws.stdlib(), &units).context("Failed to plan build")?;
  let stale = FingerprintCache::new(ws.pkgdir(), ws.stdlib(), resolver.clone());
  let plan = graph.plan(&stale).context("Failed to plan build")?;

  if output.is_json() {
    return print_json(&plan);
  }

  for (i, wave) in plan.waves.iter().enumerate() {
    print_info(&format!("Wave {}", i + 1));
    for unit in wave {
      let note = match (&unit.error, unit.stale, unit.command) {
        (Some(error), _, _) => format!("({})", error),
        (None, true, true) => "(build, link)".to_string(),
        (None, true, false) => "(build)".to_string(),
        (None, false, _) => "(up to date)".to_string(),
      };
      print_unit(unit.stale, &unit.import_path, &note);
    }
  }
  println!();
  print_stat("Packages", &plan.unit_count().to_string());
  print_stat("To build", &plan.stale_count().to_string());

  Ok(())
}
