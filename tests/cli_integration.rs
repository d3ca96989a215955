//! CLI integration tests for crossport.
//!
//! These tests run the binary against temporary projects. A shell script
//! stands in for vcpkg where an install is exercised.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const CATALOG: &str = r#"
test-extlibs = ["gtest"]

[app]
name = "sample"
modes = ["debug", "release"]

[modules.util]
libs = ["pthread"]
extlibs = ["fmt"]
linux-extlibs = ["libuuid"]
platforms = ["linux", "windows"]

[modules.core]
depends = ["util"]

[modules.net]
depends = ["util"]

[modules.http]
depends = ["net"]
extlibs = ["curl"]

[conditional-modules.lua]
depends = ["util"]
conditional-env = "lua"

[extlibs]
fmt = "12.1.0"
curl = ""
libuuid = ""
gtest = ""

[packages.apt]
fmt = "libfmt-dev"
libuuid = "uuid-dev"
"#;

/// Get the crossport binary command, isolated from the user's environment.
fn crossport(project: &Path) -> Command {
    let mut cmd = Command::cargo_bin("crossport").unwrap();
    cmd.current_dir(project)
        .env("HOME", project)
        .env_remove("VCPKG_PATH")
        .env_remove("VCPKG_ROOT")
        .env_remove("x11")
        .env_remove("wayland")
        .env_remove("lua");
    cmd
}

/// A temporary project holding the sample catalog.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Crossport.toml"), CATALOG).unwrap();
    tmp
}

/// Install a fake vcpkg that records its arguments and exits with `code`.
#[cfg(unix)]
fn fake_vcpkg(project: &Path, code: i32) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let root = project.join(".vcpkg");
    fs::create_dir_all(&root).unwrap();
    let log = project.join("vcpkg-args.log");
    let script = root.join("vcpkg");
    fs::write(
        &script,
        format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\nexit {}\n",
            log.display(),
            code
        ),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    log
}

// ============================================================================
// crossport plan
// ============================================================================

#[test]
fn test_plan_prints_closed_dependencies() {
    let tmp = project();
    crossport(tmp.path())
        .args(["plan", "http", "-p", "linux"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http <- net, util"))
        .stdout(predicate::str::contains("fmt 12.1.0"));
}

#[test]
fn test_plan_json() {
    let tmp = project();
    let output = crossport(tmp.path())
        .args(["plan", "http", "-p", "linux", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["order"], serde_json::json!(["util", "net", "http"]));
    assert_eq!(plan["modules"]["http"]["depends"], serde_json::json!(["net", "util"]));
    assert_eq!(plan["modules"]["http"]["original-depends"], serde_json::json!(["net"]));
    assert_eq!(plan["target"]["mode"], "debug");
}

#[test]
fn test_plan_from_nested_directory() {
    let tmp = project();
    let nested = tmp.path().join("src").join("net");
    fs::create_dir_all(&nested).unwrap();

    crossport(tmp.path())
        .current_dir(&nested)
        .args(["plan", "core", "-p", "linux"])
        .assert()
        .success()
        .stdout(predicate::str::contains("core <- util"));
}

#[test]
fn test_conditional_module_with_flag_and_env() {
    let tmp = project();
    crossport(tmp.path())
        .args(["plan", "net", "-p", "linux", "--with", "lua"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lua <- util"));

    crossport(tmp.path())
        .args(["plan", "net", "-p", "linux"])
        .env("lua", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("lua <- util"));

    crossport(tmp.path())
        .args(["plan", "net", "-p", "linux"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lua").not());
}

#[test]
fn test_unknown_module_suggests_names() {
    let tmp = project();
    crossport(tmp.path())
        .args(["plan", "htpp", "-p", "linux"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such module: `htpp`"))
        .stderr(predicate::str::contains("did you mean: http?"))
        .stderr(predicate::str::contains("crossport plan"));
}

#[test]
fn test_platform_removal_leaves_unknown_dependency() {
    let tmp = project();
    crossport(tmp.path())
        .args(["plan", "http", "-p", "web"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such module: `util`"));
}

#[test]
fn test_unknown_mode_is_rejected() {
    let tmp = project();
    crossport(tmp.path())
        .args(["plan", "--mode", "profile", "-p", "linux"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mode `profile` unknown"));
}

#[test]
fn test_missing_catalog() {
    let tmp = TempDir::new().unwrap();
    crossport(tmp.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `Crossport.toml`"));
}

#[test]
fn test_invalid_catalog_reports_parse_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("Crossport.toml"),
        "[modules.util]\nlibs = 3\n",
    )
    .unwrap();

    crossport(tmp.path())
        .args(["--no-color", "plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse app catalog"));
}

// ============================================================================
// crossport manifest / packages / triplet
// ============================================================================

#[test]
fn test_manifest_output() {
    let tmp = project();
    let output = crossport(tmp.path())
        .args(["manifest", "core", "-p", "linux", "--test"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let manifest: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(manifest["builtin-baseline"].is_string());
    assert_eq!(
        manifest["dependencies"],
        serde_json::json!(["fmt", "gtest", "libuuid"])
    );
    assert_eq!(
        manifest["overrides"],
        serde_json::json!([{"name": "fmt", "version": "12.1.0"}])
    );
}

#[test]
fn test_packages_for_apt() {
    let tmp = project();
    crossport(tmp.path())
        .args(["packages", "http", "-p", "linux", "--pkgdep", "apt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("libfmt-dev"))
        .stdout(predicate::str::contains("uuid-dev"))
        .stdout(predicate::str::contains("curl").not());
}

#[test]
fn test_triplet_musl_is_synthesized() {
    let tmp = project();
    crossport(tmp.path())
        .args(["triplet", "-m", "x86_64", "--libc", "musl", "-p", "linux"])
        .assert()
        .success()
        .stdout(predicate::str::diff("x64-linux-musl (musl-dynamic)\n"));
}

#[test]
fn test_triplet_from_vcpkg_root() {
    let tmp = project();
    let triplets = tmp.path().join(".vcpkg").join("triplets");
    fs::create_dir_all(&triplets).unwrap();
    fs::write(triplets.join("arm64-linux-release.cmake"), "").unwrap();
    fs::write(triplets.join("arm64-linux.cmake"), "").unwrap();

    crossport(tmp.path())
        .args(["triplet", "-m", "arm64", "-p", "linux", "--mode", "release"])
        .assert()
        .success()
        .stdout(predicate::str::diff("arm64-linux-release (static)\n"));
}

#[test]
fn test_no_triplet_resolved() {
    let tmp = project();
    crossport(tmp.path())
        .args(["triplet", "-m", "arm64", "-p", "linux"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("arm64-linux-dynamic-debug"));
}

// ============================================================================
// crossport fetch
// ============================================================================

#[test]
fn test_fetch_without_vcpkg() {
    let tmp = project();
    crossport(tmp.path())
        .args(["fetch", "core", "-m", "x86_64", "-p", "linux", "--triplet", "x64-linux"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("VCPKG path does not exist"));
}

#[cfg(unix)]
#[test]
fn test_fetch_runs_vcpkg_install() {
    let tmp = project();
    let log = fake_vcpkg(tmp.path(), 0);

    crossport(tmp.path())
        .args(["fetch", "core", "-m", "x86_64", "-p", "linux", "--triplet", "x64-linux"])
        .assert()
        .success();

    let args = fs::read_to_string(&log).unwrap();
    assert!(args.starts_with("install --triplet=x64-linux --allow-unsupported"));

    let manifest_path = tmp
        .path()
        .join("build/linux-x86_64/gcc/debug/vcpkg/vcpkg.json");
    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(manifest_path).unwrap()).unwrap();
    assert_eq!(manifest["dependencies"], serde_json::json!(["fmt", "libuuid"]));
    assert!(tmp.path().join(".vcpkg").join("archives").is_dir());
}

#[test]
fn test_fetch_with_empty_plan_succeeds_without_vcpkg() {
    let tmp = project();
    for command in ["fetch", "list", "tree"] {
        crossport(tmp.path())
            .args([command, "util", "-m", "x86_64", "-p", "web"])
            .assert()
            .success()
            .stderr(predicate::str::contains("cannot compile on platform: web"))
            .stderr(predicate::str::contains("nothing to do"))
            // stderr is a pipe here, so logs carry no colour codes
            .stderr(predicate::str::contains("\x1b[").not());
    }
    assert!(!tmp.path().join("build").exists());
}

#[cfg(unix)]
#[test]
fn test_fetch_propagates_vcpkg_exit_code() {
    let tmp = project();
    fake_vcpkg(tmp.path(), 3);

    crossport(tmp.path())
        .args(["fetch", "core", "-m", "x86_64", "-p", "linux", "--triplet", "x64-linux"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("failed with exit code 3"));
}

#[cfg(unix)]
#[test]
fn test_vcpkg_path_overrides_project_root() {
    let tmp = project();
    let elsewhere = TempDir::new().unwrap();
    let log = fake_vcpkg(elsewhere.path(), 0);

    crossport(tmp.path())
        .args(["list", "core", "-m", "x86_64", "-p", "linux", "--triplet", "x64-linux"])
        .env("VCPKG_PATH", elsewhere.path().join(".vcpkg").join("vcpkg"))
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&log).unwrap(), "list\n");
}

#[cfg(unix)]
#[test]
fn test_tree_passes_libraries() {
    let tmp = project();
    let log = fake_vcpkg(tmp.path(), 0);

    crossport(tmp.path())
        .args(["tree", "core", "-m", "x86_64", "-p", "linux", "--triplet", "x64-linux"])
        .assert()
        .success();

    let args = fs::read_to_string(&log).unwrap();
    assert!(args.starts_with(
        "depend-info fmt libuuid --triplet=x64-linux --format=tree --max-recurse=-1"
    ));
}

// ============================================================================
// crossport cross-file
// ============================================================================

#[test]
fn test_cross_file_writes_toolchain_and_meson_file() {
    let tmp = project();
    let toolchains = tmp.path().join(".vcpkg").join("scripts").join("toolchains");
    fs::create_dir_all(&toolchains).unwrap();
    fs::write(toolchains.join("linux.cmake"), "").unwrap();
    let out = tmp.path().join("cross");

    crossport(tmp.path())
        .args([
            "cross-file",
            "core",
            "-m",
            "riscv64",
            "--libc",
            "musl",
            "-p",
            "linux",
            "--triplet",
            "riscv64-linux-musl",
            "--out-dir",
        ])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("cmake-cross-riscv64.cmake"));

    let meson = fs::read_to_string(out.join("meson-cross-riscv64.ini")).unwrap();
    assert!(meson.contains("c = 'riscv64-linux-musl-gcc'"));
    assert!(meson.contains("cpu_family = 'riscv64'"));
    assert!(meson.contains("pkg-config-cross-wrapper"));
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
#[test]
fn test_cross_file_rejects_native_target() {
    let tmp = project();
    let host = std::env::consts::ARCH;
    crossport(tmp.path())
        .args(["cross-file", "-p", "linux", "--libc", "gnu", "--triplet", "x64-linux", "-m", host])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a cross-linux target"));
}

// ============================================================================
// crossport completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    crossport(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("crossport"));
}
