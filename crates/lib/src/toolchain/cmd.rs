//! Command-template toolchain.
//!
//! Each stage is configured as a shell command template (see
//! [`template`](super::template)). The rendered command runs through the
//! system shell in the unit's source directory.
//!
//! # Stage variables
//!
//! | Stage    | Variables                                                  |
//! |----------|------------------------------------------------------------|
//! | compile  | `out`, `dir`, `importpath`, `files`, `includes`, `complete` |
//! | assemble | `out`, `dir`, `src`                                        |
//! | archive  | `out`, `objects`, `inputs`                                 |
//! | link     | `out`, `archive`, `includes`                               |
//!
//! `objects` lists every object to pack, starting with `out` itself when the
//! compiler already wrote it; `inputs` is the same list without `out`.
//!
//! The default compile template builds one object per primary file in a
//! scratch directory and packs them into an archive at `out`, so the archive
//! stage only appends the assembler objects with `ar`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};

use super::template::{self, TemplateError, Vars};
use super::{Toolchain, ToolchainError};

/// Command templates for each toolchain stage. Missing stages use the `cc`
/// and `ar` defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
  pub compile: String,
  pub assemble: String,
  pub archive: String,
  pub link: String,
  /// Shell used to run commands. Defaults to `/bin/sh`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub shell: Option<String>,
}

impl Default for ToolchainConfig {
  fn default() -> Self {
    Self {
      compile: concat!(
        "set -e; d=$(mktemp -d); trap 'rm -rf \"$d\"' EXIT; ",
        "for f in $${files}; do cc -c $${includes} -o \"$d/$(basename \"$f\").o\" \"$f\"; done; ",
        "rm -f $${out}; ar rcs $${out} \"$d\"/*.o"
      )
      .to_string(),
      assemble: "cc -c -o $${out} $${src}".to_string(),
      archive: "ar rcs $${out} $${inputs}".to_string(),
      link: "cc -o $${out} $${archive}".to_string(),
      shell: None,
    }
  }
}

impl ToolchainConfig {
  /// Parse every template, reporting the first malformed one.
  pub fn validate(&self) -> Result<(), TemplateError> {
    for tmpl in [&self.compile, &self.assemble, &self.archive, &self.link] {
      template::parse(tmpl)?;
    }
    Ok(())
  }
}

/// A [`Toolchain`] that runs configured shell command templates.
#[derive(Debug, Clone, Default)]
pub struct CmdToolchain {
  config: ToolchainConfig,
}

impl CmdToolchain {
  pub fn new(config: ToolchainConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &ToolchainConfig {
    &self.config
  }

  async fn run(&self, tmpl: &str, vars: &Vars, cwd: Option<&Path>, out: &Path) -> Result<(), ToolchainError> {
    let cmd = template::render(tmpl, vars)?;

    if let Some(parent) = out.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }

    info!(cmd = %cmd, "executing command");

    let (shell_cmd, shell_args) = get_shell(self.config.shell.as_deref());

    let mut command = Command::new(&shell_cmd);
    command.args(&shell_args).arg(&cmd).env("out", out);
    if let Some(dir) = cwd.filter(|dir| !dir.as_os_str().is_empty()) {
      command.current_dir(dir);
    }

    debug!(shell = %shell_cmd, working_dir = ?cwd, "spawning process");

    let output = command.output().await?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      let stdout = String::from_utf8_lossy(&output.stdout);

      if !stderr.is_empty() {
        debug!(stderr = %stderr, "command stderr");
      }
      if !stdout.is_empty() {
        debug!(stdout = %stdout, "command stdout");
      }

      return Err(ToolchainError::CmdFailed {
        cmd,
        code: output.status.code(),
      });
    }

    Ok(())
  }
}

#[async_trait]
impl Toolchain for CmdToolchain {
  async fn compile(
    &self,
    includes: &[PathBuf],
    import_path: &str,
    dir: &Path,
    out: &Path,
    files: &[String],
    complete: bool,
  ) -> Result<(), ToolchainError> {
    let vars = Vars::new()
      .path("out", out)
      .path("dir", dir)
      .set("importpath", import_path)
      .list("files", files)
      .raw("includes", include_flags(includes))
      .raw("complete", if complete { "true" } else { "false" });
    self.run(&self.config.compile, &vars, Some(dir), out).await
  }

  async fn assemble(&self, dir: &Path, out: &Path, src: &Path) -> Result<(), ToolchainError> {
    let vars = Vars::new().path("out", out).path("dir", dir).path("src", src);
    self.run(&self.config.assemble, &vars, Some(dir), out).await
  }

  async fn archive(&self, out: &Path, objects: &[PathBuf]) -> Result<(), ToolchainError> {
    let vars = Vars::new()
      .path("out", out)
      .list("objects", objects.iter().map(|p| p.to_string_lossy().to_string()))
      .list(
        "inputs",
        objects.iter().filter(|p| p.as_path() != out).map(|p| p.to_string_lossy().to_string()),
      );
    self.run(&self.config.archive, &vars, None, out).await
  }

  async fn link(&self, includes: &[PathBuf], out: &Path, archive: &Path) -> Result<(), ToolchainError> {
    let vars = Vars::new()
      .path("out", out)
      .path("archive", archive)
      .raw("includes", include_flags(includes));
    self.run(&self.config.link, &vars, None, out).await
  }
}

/// Render include directories as `-I <dir>` pairs.
fn include_flags(includes: &[PathBuf]) -> String {
  includes
    .iter()
    .map(|dir| format!("-I {}", template::quote(&dir.to_string_lossy())))
    .collect::<Vec<_>>()
    .join(" ")
}

/// Get the shell command and argument for the current platform.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    ("cmd.exe".to_string(), vec!["/C".to_string()])
  }
}
