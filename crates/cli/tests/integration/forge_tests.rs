use predicates::prelude::*;

use super::common::TestEnv;

#[test]
#[cfg(unix)]
fn forge_local_manifest_project() {
  let env = TestEnv::new();
  let src = env.manifest_project(
    "hello",
    &[
      "mkdir -p {PREFIX}/bin",
      "printf '#!/bin/sh\\necho hello\\n' > {PREFIX}/bin/hello",
      "chmod +x {PREFIX}/bin/hello",
    ],
  );

  env
    .anvil_cmd()
    .arg("forge")
    .arg(&src)
    .assert()
    .success()
    .stdout(predicate::str::contains("hello built with manifest"));

  assert!(env.root_path().join("opt/hello/bin/hello").is_file());
  assert!(env.bin_path().join("hello").symlink_metadata().is_ok());
  assert!(!env.root_path().join("build/hello").exists());

  env
    .anvil_cmd()
    .args(["list", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"hello\""));
}

#[test]
#[cfg(unix)]
fn forge_twice_reports_existing_install() {
  let env = TestEnv::new();
  let src = env.manifest_project("once", &["mkdir -p {PREFIX} && touch {PREFIX}/marker"]);

  env.anvil_cmd().arg("forge").arg(&src).assert().success();
  env
    .anvil_cmd()
    .arg("forge")
    .arg(&src)
    .assert()
    .success()
    .stdout(predicate::str::contains("already installed"));
}

#[test]
#[cfg(unix)]
fn forge_json_report() {
  let env = TestEnv::new();
  let src = env.manifest_project("quiet", &["mkdir -p {PREFIX} && touch {PREFIX}/marker"]);

  let out = env
    .anvil_cmd()
    .args(["-o", "json", "forge"])
    .arg(&src)
    .arg("--no-release-check")
    .output()
    .unwrap();

  assert!(out.status.success());
  let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(report["name"], "quiet");
  assert_eq!(report["outcome"]["kind"], "built");
  assert_eq!(report["outcome"]["detected"], "manifest");
}

#[test]
#[cfg(unix)]
fn failed_build_prints_suggestions() {
  let env = TestEnv::new();
  let src = env.manifest_project(
    "broken",
    &["echo 'relocation R_X86_64_32 against `.rodata` can not be used; recompile with -fPIC' >&2; exit 2"],
  );

  env
    .anvil_cmd()
    .arg("forge")
    .arg(&src)
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to forge"))
    .stderr(predicate::str::contains("ANVIL_FORCE_PIC=1"));

  assert!(env.root_path().join("build/broken/anvil.json").exists());
}

#[test]
fn forge_unknown_package_fails() {
  let env = TestEnv::new();

  env
    .anvil_cmd()
    .args(["forge", "definitely-not-a-package"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found in index"));
}

#[test]
#[cfg(unix)]
fn uninstall_removes_package() {
  let env = TestEnv::new();
  let src = env.manifest_project(
    "gone",
    &["mkdir -p {PREFIX}/bin && printf '#!/bin/sh\\n' > {PREFIX}/bin/gone && chmod +x {PREFIX}/bin/gone"],
  );
  env.anvil_cmd().arg("forge").arg(&src).assert().success();

  env
    .anvil_cmd()
    .args(["uninstall", "gone"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Uninstalled gone"));

  assert!(!env.root_path().join("opt/gone").exists());
  assert!(env.bin_path().join("gone").symlink_metadata().is_err());

  env
    .anvil_cmd()
    .args(["uninstall", "gone"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not installed"));
}

#[test]
#[cfg(unix)]
fn no_force_pic_overrides_environment() {
  let env = TestEnv::new();
  let src = env.manifest_project("plain", &["mkdir -p {PREFIX} && printf '%s' \"$CFLAGS\" > {PREFIX}/cflags"]);

  env
    .anvil_cmd()
    .env("ANVIL_FORCE_PIC", "1")
    .env("CFLAGS", "-O2")
    .args(["forge", "--no-force-pic", "--no-release-check"])
    .arg(&src)
    .assert()
    .success();

  let cflags = std::fs::read_to_string(env.root_path().join("opt/plain/cflags")).unwrap();
  assert_eq!(cflags, "-O2");
}

#[test]
#[cfg(unix)]
fn force_pic_adds_flag() {
  let env = TestEnv::new();
  let src = env.manifest_project("pic", &["mkdir -p {PREFIX} && printf '%s' \"$CFLAGS\" > {PREFIX}/cflags"]);

  env
    .anvil_cmd()
    .env("CFLAGS", "-O2")
    .args(["forge", "--force-pic", "--no-release-check"])
    .arg(&src)
    .assert()
    .success();

  let cflags = std::fs::read_to_string(env.root_path().join("opt/pic/cflags")).unwrap();
  assert!(cflags.contains("-fPIC"), "CFLAGS were {cflags:?}");
}
