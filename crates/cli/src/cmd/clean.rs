use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use grist_lib::manifest::load;

use crate::output::{print_info, print_success};

pub fn cmd_clean(root: &Path) -> Result<()> {
  let ws = load(root).with_context(|| format!("Failed to load workspace: {}", root.display()))?;

  let mut removed = 0;
  for dir in [ws.workdir(), ws.pkgdir()] {
    if dir.exists() {
      fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
      print_info(&format!("Removed {}", dir.display()));
      removed += 1;
    }
  }

  if removed == 0 {
    print_success("Already clean");
  } else {
    print_success("Clean complete");
  }
  Ok(())
}
