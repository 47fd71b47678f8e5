use std::fs;

use predicates::prelude::*;

use super::common::{CAT_TOOLCHAIN, TestEnv, sample_manifest};

#[test]
fn build_links_command_from_all_sources() {
  let env = TestEnv::sample();

  env
    .grist_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("app"));

  let binary = fs::read_to_string(env.workdir().join("app")).unwrap();
  assert!(binary.contains("int main"));
  assert!(env.pkgdir().join("example.com/lib.a").exists());
  assert!(env.pkgdir().join("example.com/util.a").exists());
  assert!(env.pkgdir().join("example.com/util.a.grist").exists());

  let lib = fs::read_to_string(env.pkgdir().join("example.com/lib.a")).unwrap();
  assert!(lib.contains("void lib()"));
  assert!(lib.contains("fast:"));
}

#[test]
fn second_build_reuses_installed_packages() {
  let env = TestEnv::sample();
  env.grist_cmd().arg("build").assert().success();

  env
    .grist_cmd()
    .arg("-vv")
    .arg("build")
    .assert()
    .success()
    .stderr(predicate::str::contains("up to date"));
}

#[test]
fn changed_source_triggers_rebuild() {
  let env = TestEnv::sample();
  env.grist_cmd().arg("build").assert().success();

  env.write_file("src/util/util.c", "void util() { changed(); }\n");

  env
    .grist_cmd()
    .arg("-vv")
    .arg("build")
    .assert()
    .success()
    .stderr(predicate::str::contains("inputs changed"));
  let util = fs::read_to_string(env.pkgdir().join("example.com/util.a")).unwrap();
  assert!(util.contains("changed()"));
}

#[test]
fn build_single_package() {
  let env = TestEnv::sample();

  env
    .grist_cmd()
    .arg("build")
    .arg("example.com/util")
    .assert()
    .success()
    .stdout(predicate::str::contains("example.com/util"));

  assert!(env.pkgdir().join("example.com/util.a").exists());
  assert!(!env.workdir().join("app").exists());
}

#[test]
fn failing_compile_reports_stage() {
  let toolchain = CAT_TOOLCHAIN.replace("cat $${files} > $${out}", "exit 3");
  let env = TestEnv::with_toolchain(&toolchain);

  env
    .grist_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("compile example.com/util"))
    .stderr(predicate::str::contains("1 of 1 target(s) failed"));

  assert!(!env.workdir().join("app").exists());
}

#[test]
fn unknown_package_fails() {
  let env = TestEnv::sample();

  env
    .grist_cmd()
    .arg("build")
    .arg("example.com/nope")
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot find package example.com/nope"));
}

#[test]
fn missing_source_fails_dependents() {
  let env = TestEnv::sample();
  fs::remove_file(env.root().join("src/util/util.c")).unwrap();

  env
    .grist_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("missing source file"));
}

#[test]
fn test_build_links_test_binary() {
  let env = TestEnv::sample();

  env
    .grist_cmd()
    .arg("build")
    .arg("--test")
    .arg("example.com/lib")
    .assert()
    .success()
    .stdout(predicate::str::contains("lib.test"));

  assert!(
    env
      .workdir()
      .join("_obj/example.com/lib/_test/example.com/lib.test")
      .exists()
  );
}

#[test]
fn json_output_lists_artifacts() {
  let env = TestEnv::sample();

  let output = env.grist_cmd().args(["build", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(reports[0]["import_path"], "app");
  assert!(reports[0]["artifact"].as_str().unwrap().ends_with("app"));
  assert!(reports[0].get("error").is_none());
}

#[test]
fn force_rebuilds_everything() {
  let env = TestEnv::sample();
  env.grist_cmd().arg("build").assert().success();

  env
    .grist_cmd()
    .arg("-vv")
    .args(["build", "--force"])
    .assert()
    .success()
    .stderr(predicate::str::contains("forced rebuild"));
}

#[test]
fn build_rejects_import_cycle() {
  let env = TestEnv::sample();
  let manifest = sample_manifest(CAT_TOOLCHAIN).replace(
    r#""dir": "src/util", "files": ["util.c"]"#,
    r#""dir": "src/util", "files": ["util.c"], "imports": ["example.com/lib"]"#,
  );
  env.write_file("grist.json", &manifest);

  env
    .grist_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("import cycle"));

  assert!(!env.pkgdir().exists());
}
