use predicates::prelude::*;

use super::common::{CAT_TOOLCHAIN, TestEnv, sample_manifest};

#[test]
fn plan_lists_waves() {
  let env = TestEnv::sample();

  env
    .grist_cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("Wave 1"))
    .stdout(predicate::str::contains("Wave 3"))
    .stdout(predicate::str::contains("example.com/util"))
    .stdout(predicate::str::contains("To build: 3"));
}

#[test]
fn plan_after_build_is_up_to_date() {
  let env = TestEnv::sample();
  env.grist_cmd().arg("build").assert().success();

  env
    .grist_cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("To build: 0"));
}

#[test]
fn plan_json_output() {
  let env = TestEnv::sample();

  let output = env.grist_cmd().args(["plan", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let waves = plan["waves"].as_array().unwrap();
  assert_eq!(waves.len(), 3);
  assert_eq!(waves[0][0]["import_path"], "example.com/util");
  assert_eq!(waves[2][0]["import_path"], "app");
  assert_eq!(waves[2][0]["command"], true);
}

#[test]
fn plan_rejects_import_cycle() {
  let env = TestEnv::sample();
  let manifest = sample_manifest(CAT_TOOLCHAIN).replace(
    r#""dir": "src/util", "files": ["util.c"]"#,
    r#""dir": "src/util", "files": ["util.c"], "imports": ["example.com/lib"]"#,
  );
  env.write_file("grist.json", &manifest);

  env
    .grist_cmd()
    .arg("plan")
    .assert()
    .failure()
    .stderr(predicate::str::contains("import cycle"));
}
