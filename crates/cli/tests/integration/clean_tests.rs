use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn clean_removes_outputs() {
  let env = TestEnv::sample();
  env.grist_cmd().arg("build").assert().success();
  assert!(env.workdir().exists());

  env
    .grist_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Clean complete"));

  assert!(!env.workdir().exists());
  assert!(!env.pkgdir().exists());
}

#[test]
fn clean_on_fresh_workspace() {
  let env = TestEnv::sample();

  env
    .grist_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Already clean"));
}
