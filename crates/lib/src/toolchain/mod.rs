//! The external toolchain boundary.
//!
//! Every stage target is a thin wrapper around exactly one [`Toolchain`] call.
//! The default implementation, [`CmdToolchain`], renders a shell command
//! template per stage and runs it.

pub mod cmd;
pub mod template;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use cmd::{CmdToolchain, ToolchainConfig};
pub use template::TemplateError;

/// Errors produced by a toolchain invocation.
#[derive(Debug, Clone, Error)]
pub enum ToolchainError {
  /// The tool exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed { cmd: String, code: Option<i32> },

  /// The tool could not be started or its output could not be written.
  #[error("io error: {0}")]
  Io(Arc<io::Error>),

  /// The command template could not be rendered.
  #[error("template error: {0}")]
  Template(#[from] TemplateError),
}

impl From<io::Error> for ToolchainError {
  fn from(err: io::Error) -> Self {
    ToolchainError::Io(Arc::new(err))
  }
}

/// Compiler, assembler, archiver and linker invocations.
#[async_trait]
pub trait Toolchain: Send + Sync {
  /// Compile `files` (relative to `dir`) of package `import_path` into `out`.
  ///
  /// `complete` tells the compiler that no other objects will be archived with
  /// its output.
  async fn compile(
    &self,
    includes: &[PathBuf],
    import_path: &str,
    dir: &Path,
    out: &Path,
    files: &[String],
    complete: bool,
  ) -> Result<(), ToolchainError>;

  /// Assemble `src` into `out`.
  async fn assemble(&self, dir: &Path, out: &Path, src: &Path) -> Result<(), ToolchainError>;

  /// Archive `objects` into `out`. When the compiler ran, `objects[0]` is its
  /// output and equals `out`.
  async fn archive(&self, out: &Path, objects: &[PathBuf]) -> Result<(), ToolchainError>;

  /// Link `archive` into the executable `out`.
  async fn link(&self, includes: &[PathBuf], out: &Path, archive: &Path) -> Result<(), ToolchainError>;
}
