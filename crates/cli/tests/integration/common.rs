//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Shell templates that "compile" by concatenating sources, so a linked
/// binary's contents show every source that went into it.
pub const CAT_TOOLCHAIN: &str = r#"{
  "compile": "cat $${files} > $${out}",
  "assemble": "cat $${src} > $${out}",
  "archive": "cat $${objects} > $${out}.tmp && mv $${out}.tmp $${out}",
  "link": "cp $${archive} $${out}"
}"#;

/// app (command) -> example.com/lib -> example.com/util, plus stdlib `fmt`.
pub fn sample_manifest(toolchain: &str) -> String {
  format!(
    r#"{{
  "stdlib": ["fmt"],
  "toolchain": {toolchain},
  "packages": {{
    "app": {{ "dir": "src/app", "files": ["main.c"], "imports": ["example.com/lib", "fmt"], "command": true }},
    "example.com/lib": {{ "dir": "src/lib", "files": ["lib.c"], "sfiles": ["fast.s"], "imports": ["example.com/util"] }},
    "example.com/util": {{ "dir": "src/util", "files": ["util.c"] }}
  }}
}}"#
  )
}

/// Isolated workspace in a temporary directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// The sample workspace with the `cat` toolchain.
  pub fn sample() -> Self {
    Self::with_toolchain(CAT_TOOLCHAIN)
  }

  pub fn with_toolchain(toolchain: &str) -> Self {
    let env = Self::empty();
    env.write_file("grist.json", &sample_manifest(toolchain));
    env.write_file("src/app/main.c", "int main() { lib(); }\n");
    env.write_file("src/lib/lib.c", "void lib() { util(); }\n");
    env.write_file("src/lib/fast.s", "fast:\n");
    env.write_file("src/util/util.c", "void util() {}\n");
    env
  }

  /// Write a file relative to the workspace root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn root(&self) -> PathBuf {
    let p = self.temp.path().to_path_buf();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn workdir(&self) -> PathBuf {
    self.root().join("_build").join("obj")
  }

  pub fn pkgdir(&self) -> PathBuf {
    self.root().join("_build").join("pkg")
  }

  /// A `grist` command pointed at this workspace, with output directory
  /// overrides cleared.
  pub fn grist_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("grist");
    cmd.env_remove("GRIST_WORKDIR");
    cmd.env_remove("GRIST_PKGDIR");
    cmd.env_remove("RUST_LOG");
    cmd.arg("-C").arg(self.root());
    cmd
  }
}
