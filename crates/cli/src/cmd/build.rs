//! Implementation of the `grist build` command.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::debug;

use grist_lib::build::{build_all, build_command};
use grist_lib::cache::FingerprintCache;
use grist_lib::context::BuildContext;
use grist_lib::manifest::load;
use grist_lib::plan::{ImportGraph, PlanError};
use grist_lib::toolchain::CmdToolchain;
use grist_lib::unit::Scope;

use super::resolve_roots;
use crate::output::{OutputFormat, format_duration, print_error, print_json, print_stat, print_success, symbols};

#[derive(Debug, Serialize)]
struct BuildReport {
  import_path: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  artifact: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

pub fn cmd_build(root: &Path, paths: &[String], force: bool, test: bool, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let ws = load(root).with_context(|| format!("Failed to load workspace: {}", root.display()))?;
  let resolver = Arc::new(ws.resolver());
  let scope = if test { Scope::Test } else { Scope::Normal };
  let units = resolve_roots(&ws, &resolver, paths, scope)?;
  debug!(roots = units.len(), scope = %scope, force, "starting build");

  // Walks from different roots can wait on each other inside a cycle.
  // Unresolvable imports are left to the build to report.
  if let Err(err @ PlanError::Cycle(_)) = ImportGraph::from_roots(resolver.as_ref(), &ws.stdlib(), &units) {
    bail!(err);
  }

  let stale = Arc::new(FingerprintCache::new(ws.pkgdir(), ws.stdlib(), resolver.clone()).with_force(force));
  let toolchain = Arc::new(CmdToolchain::new(ws.manifest().toolchain.clone()));
  let ctx = BuildContext::new(ws.build_config(), toolchain, resolver, stale);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let reports: Vec<BuildReport> = rt.block_on(async {
    let names: Vec<String> = units.iter().map(|u| u.import_path.clone()).collect();
    let targets = if test {
      units
        .into_iter()
        .map(|unit| build_command(&ctx, unit.with_command(true)))
        .collect()
    } else {
      build_all(&ctx, units)
    };

    let mut reports = Vec::with_capacity(targets.len());
    for (import_path, target) in names.into_iter().zip(targets) {
      let outcome = target.result().await;
      reports.push(BuildReport {
        import_path,
        artifact: outcome.as_ref().ok().map(ToString::to_string),
        error: outcome.as_ref().err().map(ToString::to_string),
      });
    }
    reports
  });

  let failed = reports.iter().filter(|r| r.error.is_some()).count();

  if output.is_json() {
    print_json(&reports)?;
  } else {
    for report in &reports {
      match (&report.artifact, &report.error) {
        (_, Some(error)) => print_error(&format!("{}: {}", report.import_path, error)),
        (Some(artifact), None) => print_success(&format!("{} {} {}", report.import_path, symbols::ARROW, artifact)),
        (None, None) => print_success(&report.import_path),
      }
    }
    println!();
    print_stat("Targets", &reports.len().to_string());
    print_stat("Duration", &format_duration(start.elapsed()));
  }

  if failed > 0 {
    bail!("{} of {} target(s) failed", failed, reports.len());
  }
  Ok(())
}
