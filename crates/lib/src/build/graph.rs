//! Graph builder and compile orchestrator.
//!
//! The import graph of a unit is walked depth-first on the calling thread. Each
//! reachable unit gets one package target from the context's registry; only the
//! stage targets themselves run concurrently.
//!
//! For one unit, the orchestrator decides:
//!
//! 1. Invalid metadata: a failed target, no stages.
//! 2. Already in the registry: the existing target.
//! 3. Up to date: the installed package, no stages.
//! 4. Otherwise: compile and assemble, pack unless the unit is complete with a
//!    single object, then install.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::build::BuildError;
use crate::build::stages;
use crate::build::store::{cached_package, install};
use crate::context::BuildContext;
use crate::target::Target;
use crate::unit::{CompilationUnit, ResolveError, Scope, UnitKey};

/// Build `unit` and its dependencies. Commands are linked as well.
///
/// Returns without waiting; the target resolves to the final artifact.
pub fn build(ctx: &Arc<BuildContext>, unit: CompilationUnit) -> Target {
  let unit = Arc::new(unit);
  let pkg = build_package(ctx, &unit, &mut ImportStack::default());
  if unit.command {
    stages::linker(ctx, &unit, pkg)
  } else {
    pkg
  }
}

/// Build several roots against the same registry.
pub fn build_all<I>(ctx: &Arc<BuildContext>, units: I) -> Vec<Target>
where
  I: IntoIterator<Item = CompilationUnit>,
{
  units.into_iter().map(|unit| build(ctx, unit)).collect()
}

/// Compile and link `unit` as a command.
///
/// The unit itself skips the registry and the staleness check and is never
/// installed; its dependencies are built as usual.
pub fn build_command(ctx: &Arc<BuildContext>, unit: CompilationUnit) -> Target {
  let unit = Arc::new(unit);
  if let Err(err) = &unit.metadata {
    return failure_marker(&unit, err);
  }

  let mut stack = ImportStack::default();
  stack.push(unit.key());
  let deps = build_dependencies(ctx, &unit, &mut stack);

  debug!(unit = %unit, deps = deps.len(), "wiring command");
  let objs = stages::objects(ctx, &unit, deps);
  let pkg = stages::archive_or_passthrough(ctx, &unit, objs);
  stages::linker(ctx, &unit, pkg)
}

/// The package target for `unit` with `deps` as the compiler's upstreams.
///
/// Registered under the unit's key; if a target already exists for it, that
/// target is returned and `deps` are ignored.
pub fn compile(ctx: &Arc<BuildContext>, unit: &Arc<CompilationUnit>, deps: Vec<Target>) -> Target {
  if let Err(err) = &unit.metadata {
    return failure_marker(unit, err);
  }
  ctx
    .registry()
    .get_or_create(unit.key(), || compile_package(ctx, unit, deps))
}

fn build_package(ctx: &Arc<BuildContext>, unit: &Arc<CompilationUnit>, stack: &mut ImportStack) -> Target {
  if let Err(err) = &unit.metadata {
    return failure_marker(unit, err);
  }
  ctx.registry().get_or_create(unit.key(), || {
    stack.push(unit.key());
    let deps = build_dependencies(ctx, unit, stack);
    stack.pop();
    compile_package(ctx, unit, deps)
  })
}

fn compile_package(ctx: &Arc<BuildContext>, unit: &Arc<CompilationUnit>, deps: Vec<Target>) -> Target {
  if !ctx.stale().is_stale(unit) {
    return cached_package(ctx, unit);
  }

  debug!(unit = %unit, deps = deps.len(), sfiles = unit.sfiles.len(), "wiring package");
  let objs = stages::objects(ctx, unit, deps);
  let pkg = stages::archive_or_passthrough(ctx, unit, objs);
  install(ctx, unit, pkg)
}

/// Package targets for every non-stdlib import of `unit`, in import order.
fn build_dependencies(ctx: &Arc<BuildContext>, unit: &CompilationUnit, stack: &mut ImportStack) -> Vec<Target> {
  let mut deps = Vec::with_capacity(unit.imports.len());
  for import in &unit.imports {
    if ctx.stdlib().contains(import) {
      continue;
    }

    let key = UnitKey::new(Scope::Normal, import.as_str());
    if let Some(cycle) = stack.cycle(&key) {
      deps.push(Target::failed(
        format!("compile {}", import),
        BuildError::ImportCycle(cycle),
      ));
      continue;
    }

    if let Some(existing) = ctx.registry().get(&key) {
      trace!(unit = %unit, import = %import, "dependency already wired");
      deps.push(existing);
      continue;
    }

    let dep = Arc::new(resolve(ctx, import));
    deps.push(build_package(ctx, &dep, stack));
  }
  deps
}

/// Resolve a dependency. Failures become a unit carrying the error so the
/// walk can continue.
fn resolve(ctx: &BuildContext, import_path: &str) -> CompilationUnit {
  match ctx.resolver().resolve(import_path, Scope::Normal) {
    Ok(unit) => unit,
    Err(err) => {
      debug!(import = %import_path, error = %err, "cannot resolve import");
      CompilationUnit::unresolved(import_path, err)
    }
  }
}

/// A target that failed before any work was wired.
fn failure_marker(unit: &CompilationUnit, err: &ResolveError) -> Target {
  Target::failed(
    format!("compile {}", unit),
    BuildError::Metadata {
      import_path: unit.import_path.clone(),
      source: err.clone(),
    },
  )
}

/// Units currently being wired by one walk, outermost first.
#[derive(Debug, Default)]
struct ImportStack(Vec<UnitKey>);

impl ImportStack {
  fn push(&mut self, key: UnitKey) {
    self.0.push(key);
  }

  fn pop(&mut self) {
    self.0.pop();
  }

  /// The import paths from `key`'s first appearance back to `key`, if it is
  /// already on the stack.
  fn cycle(&self, key: &UnitKey) -> Option<Vec<String>> {
    let start = self.0.iter().position(|k| k == key)?;
    let mut cycle: Vec<String> = self.0[start..].iter().map(|k| k.import_path.clone()).collect();
    cycle.push(key.import_path.clone());
    Some(cycle)
  }
}
