//! Output layout and installed packages.
//!
//! Every `(scope, import path)` pair maps to exactly one object directory under
//! the work directory. Normal-scope packages are installed into the package
//! directory as `<pkgdir>/<import path>.a`; test-scope packages never are.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::build::BuildError;
use crate::consts::{ARCHIVE_EXT, TEST_OBJDIR, UNIT_OBJDIR};
use crate::context::BuildContext;
use crate::target::{Artifact, Target};
use crate::unit::{CompilationUnit, Scope};

/// Directory holding a unit's compiled objects and linked binary.
pub fn objdir(workdir: &Path, unit: &CompilationUnit) -> PathBuf {
  let parent = import_dir(&unit.import_path);
  match unit.scope {
    Scope::Normal => workdir.join(parent),
    Scope::Test => testobjdir(workdir, unit).join(parent),
  }
}

/// `<workdir>/_obj/<import path>`, holding a unit's intermediate objects.
pub fn unitdir(workdir: &Path, unit: &CompilationUnit) -> PathBuf {
  workdir.join(UNIT_OBJDIR).join(&unit.import_path)
}

/// `<workdir>/_obj/<import path>/_test`
pub fn testobjdir(workdir: &Path, unit: &CompilationUnit) -> PathBuf {
  unitdir(workdir, unit).join(TEST_OBJDIR)
}

/// Where the installed package for `unit` lives.
pub fn pkgfile_path(pkgdir: &Path, unit: &CompilationUnit) -> PathBuf {
  pkgdir.join(format!("{}.{}", unit.import_path, ARCHIVE_EXT))
}

fn import_dir(import_path: &str) -> &str {
  import_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Install the artifact of `target` into the package directory.
///
/// Test-scope units are not installed; `target` is returned as is.
pub fn install(ctx: &Arc<BuildContext>, unit: &Arc<CompilationUnit>, target: Target) -> Target {
  if unit.is_test() {
    return target;
  }

  let label = format!("install {}", unit);
  let pkgfile = pkgfile_path(ctx.pkgdir(), unit);
  let ctx = ctx.clone();
  let unit = unit.clone();

  Target::spawn(label, vec![target], move |inputs| async move {
    let install_err = |message: String| BuildError::Install {
      import_path: unit.import_path.clone(),
      message,
    };

    let Some(built) = inputs.first() else {
      return Err(install_err("nothing to install".to_string()));
    };

    if let Some(parent) = pkgfile.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| install_err(format!("failed to create {}: {}", parent.display(), e)))?;
    }
    tokio::fs::copy(built.path(), &pkgfile)
      .await
      .map_err(|e| install_err(format!("failed to copy {}: {}", built.path().display(), e)))?;

    ctx
      .stale()
      .installed(&unit, &pkgfile)
      .map_err(|e| install_err(e.to_string()))?;

    info!(unit = %unit, path = ?pkgfile, "installed");
    Ok(Artifact::archive(pkgfile))
  })
}

/// A target already resolved to the installed package of `unit`.
pub fn cached_package(ctx: &BuildContext, unit: &CompilationUnit) -> Target {
  let pkgfile = pkgfile_path(ctx.pkgdir(), unit);
  debug!(unit = %unit, path = ?pkgfile, "up to date");
  Target::ready(format!("cached {}", unit), Artifact::archive(pkgfile))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::target::ArtifactKind;
  use crate::util::testutil::test_context;
  use tempfile::TempDir;

  fn unit(path: &str) -> CompilationUnit {
    CompilationUnit::new(path, "/src")
  }

  #[test]
  fn objdir_normal_scope_is_import_parent() {
    let workdir = Path::new("/w");
    assert_eq!(objdir(workdir, &unit("example.com/lib")), PathBuf::from("/w/example.com"));
    assert_eq!(objdir(workdir, &unit("app")), PathBuf::from("/w"));
  }

  #[test]
  fn objdir_test_scope_is_under_testobjdir() {
    let workdir = Path::new("/w");
    let test = unit("example.com/lib").with_scope(Scope::Test);
    assert_eq!(testobjdir(workdir, &test), PathBuf::from("/w/_obj/example.com/lib/_test"));
    assert_eq!(
      objdir(workdir, &test),
      PathBuf::from("/w/_obj/example.com/lib/_test/example.com")
    );
  }

  #[test]
  fn unitdir_does_not_shadow_command_binary() {
    let workdir = Path::new("/w");
    let app = unit("app").with_command(true);
    assert_eq!(unitdir(workdir, &app), PathBuf::from("/w/_obj/app"));
    assert!(!testobjdir(workdir, &app).starts_with("/w/app"));
  }

  #[test]
  fn pkgfile_keeps_dotted_import_paths() {
    assert_eq!(
      pkgfile_path(Path::new("/p"), &unit("example.com")),
      PathBuf::from("/p/example.com.a")
    );
    assert_eq!(
      pkgfile_path(Path::new("/p"), &unit("example.com/lib")),
      PathBuf::from("/p/example.com/lib.a")
    );
  }

  #[tokio::test]
  async fn install_copies_into_pkgdir() {
    let temp = TempDir::new().unwrap();
    let (ctx, _) = test_context(temp.path());
    let built = temp.path().join("obj/lib.a");
    std::fs::create_dir_all(built.parent().unwrap()).unwrap();
    std::fs::write(&built, "archive").unwrap();

    let unit = Arc::new(unit("example.com/lib"));
    let target = install(&ctx, &unit, Target::ready("pack", Artifact::archive(&built)));

    let artifact = target.result().await.unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Archive);
    assert_eq!(artifact.path, pkgfile_path(ctx.pkgdir(), &unit));
    assert_eq!(std::fs::read_to_string(&artifact.path).unwrap(), "archive");
  }

  #[tokio::test]
  async fn install_passes_test_scope_through() {
    let temp = TempDir::new().unwrap();
    let (ctx, _) = test_context(temp.path());
    let unit = Arc::new(unit("example.com/lib").with_scope(Scope::Test));
    let built = Target::ready("pack", Artifact::archive("/obj/lib.a"));

    assert!(install(&ctx, &unit, built.clone()).same(&built));
  }

  #[tokio::test]
  async fn install_reports_missing_input() {
    let temp = TempDir::new().unwrap();
    let (ctx, _) = test_context(temp.path());
    let unit = Arc::new(unit("example.com/lib"));
    let target = install(&ctx, &unit, Target::ready("pack", Artifact::archive(temp.path().join("gone.a"))));

    assert!(matches!(target.result().await, Err(BuildError::Install { .. })));
  }
}
