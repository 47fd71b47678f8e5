//! Stage targets.
//!
//! Each stage is a [`Target`] around exactly one [`Toolchain`] call. Output
//! paths are derived from the unit's identity and scope only, so the same unit
//! always writes to the same files.
//!
//! [`Toolchain`]: crate::toolchain::Toolchain

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::build::BuildError;
use crate::build::store::{objdir, testobjdir, unitdir};
use crate::consts::{ARCHIVE_EXT, OBJECT_EXT, TEST_BINARY_SUFFIX};
use crate::context::BuildContext;
use crate::target::{Artifact, Target};
use crate::unit::{CompilationUnit, Scope};

/// Include paths for compile and link stages of `unit`.
fn includes(ctx: &BuildContext, unit: &CompilationUnit) -> Vec<PathBuf> {
  let mut includes = ctx.include_paths();
  if unit.is_test() {
    includes.extend(unit.extra_includes.iter().cloned());
  }
  includes
}

/// `<objdir>/<name>.a`, written by the compiler and, when needed, the archiver.
pub fn package_object(workdir: &Path, unit: &CompilationUnit) -> PathBuf {
  objdir(workdir, unit).join(format!("{}.{}", unit.name(), ARCHIVE_EXT))
}

/// Object file for one assembly source of `unit`, under the unit's
/// intermediate directory rather than beside its binary.
pub fn assembly_object(workdir: &Path, unit: &CompilationUnit, sfile: &str) -> PathBuf {
  let stem = Path::new(sfile)
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_else(|| sfile.to_string());
  let dir = match unit.scope {
    Scope::Normal => unitdir(workdir, unit),
    Scope::Test => testobjdir(workdir, unit),
  };
  dir.join(format!("{}.{}", stem, OBJECT_EXT))
}

/// Binary produced by linking `unit`.
pub fn executable_path(workdir: &Path, unit: &CompilationUnit) -> PathBuf {
  let name = match unit.scope {
    Scope::Normal => unit.name().to_string(),
    Scope::Test => format!("{}{}", unit.name(), TEST_BINARY_SUFFIX),
  };
  objdir(workdir, unit).join(name)
}

/// Compile the unit's primary sources once every target in `deps` succeeded.
pub fn compiler(ctx: &Arc<BuildContext>, unit: &Arc<CompilationUnit>, deps: Vec<Target>) -> Target {
  let label = format!("compile {}", unit);
  let out = package_object(ctx.workdir(), unit);
  let ctx = ctx.clone();
  let unit = unit.clone();

  Target::spawn(label.clone(), deps, move |_| async move {
    info!(unit = %unit, files = ?unit.files, "compile");
    ctx
      .toolchain()
      .compile(
        &includes(&ctx, &unit),
        &unit.import_path,
        &unit.dir,
        &out,
        &unit.files,
        unit.complete,
      )
      .await
      .map_err(|e| BuildError::stage(label, e))?;
    Ok(Artifact::object(out))
  })
}

/// Assemble a single assembly source. Has no upstream targets.
pub fn assembler(ctx: &Arc<BuildContext>, unit: &Arc<CompilationUnit>, sfile: &str) -> Target {
  let label = format!("asm {} {}", unit, sfile);
  let out = assembly_object(ctx.workdir(), unit, sfile);
  let src = unit.dir.join(sfile);
  let ctx = ctx.clone();
  let unit = unit.clone();

  Target::spawn(label.clone(), Vec::new(), move |_| async move {
    info!(unit = %unit, src = ?src, "asm");
    ctx
      .toolchain()
      .assemble(&unit.dir, &out, &src)
      .await
      .map_err(|e| BuildError::stage(label, e))?;
    Ok(Artifact::object(out))
  })
}

/// Pack every object in `objs` into the unit's archive.
///
/// Inputs are read in order and the first failure among them is reported;
/// nothing is archived unless all of them succeeded.
pub fn archiver(ctx: &Arc<BuildContext>, unit: &Arc<CompilationUnit>, objs: Vec<Target>) -> Target {
  let label = format!("pack {}", unit);
  let out = package_object(ctx.workdir(), unit);
  let ctx = ctx.clone();
  let unit = unit.clone();

  Target::spawn(label.clone(), objs, move |inputs| async move {
    debug!(unit = %unit, objects = inputs.len(), "pack");
    let objects: Vec<PathBuf> = inputs.into_iter().map(|a| a.path).collect();
    ctx
      .toolchain()
      .archive(&out, &objects)
      .await
      .map_err(|e| BuildError::stage(label, e))?;
    Ok(Artifact::archive(out))
  })
}

/// Link the unit's final archive into an executable.
pub fn linker(ctx: &Arc<BuildContext>, unit: &Arc<CompilationUnit>, pkg: Target) -> Target {
  let label = format!("link {}", unit);
  let out = executable_path(ctx.workdir(), unit);
  let ctx = ctx.clone();
  let unit = unit.clone();

  Target::spawn(label.clone(), vec![pkg], move |inputs| async move {
    let archive = inputs
      .into_iter()
      .next()
      .map(|a| a.path)
      .ok_or_else(|| BuildError::Abandoned { label: label.clone() })?;
    info!(unit = %unit, out = ?out, archive = ?archive, "link");
    ctx
      .toolchain()
      .link(&includes(&ctx, &unit), &out, &archive)
      .await
      .map_err(|e| BuildError::stage(label, e))?;
    Ok(Artifact::executable(out))
  })
}

/// Object targets for `unit`: the compiler output first, then one per
/// assembly file in order.
///
/// A unit with assembly files but no primary sources has no compiler stage.
pub fn objects(ctx: &Arc<BuildContext>, unit: &Arc<CompilationUnit>, deps: Vec<Target>) -> Vec<Target> {
  let mut objs = Vec::with_capacity(unit.sfiles.len() + 1);
  if !unit.files.is_empty() || unit.sfiles.is_empty() {
    objs.push(compiler(ctx, unit, deps));
  }
  objs.extend(unit.sfiles.iter().map(|sfile| assembler(ctx, unit, sfile)));
  objs
}

/// The unit's package target: its lone object when the unit is complete,
/// otherwise an archive of all objects.
pub fn archive_or_passthrough(ctx: &Arc<BuildContext>, unit: &Arc<CompilationUnit>, mut objs: Vec<Target>) -> Target {
  if unit.complete && objs.len() == 1 {
    if let Some(obj) = objs.pop() {
      debug!(unit = %unit, "complete, skipping pack");
      return obj;
    }
  }
  archiver(ctx, unit, objs)
}
