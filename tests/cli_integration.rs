//! CLI integration tests for macbundle.
//!
//! External tools are replaced with `true`/`false` through the project
//! config, and the apps under test are small `/bin/sh` scripts.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the macbundle binary command, isolated from the user's global config.
fn macbundle(project: &Path) -> Command {
    let mut cmd = Command::cargo_bin("macbundle").unwrap();
    cmd.current_dir(project)
        .env("HOME", project.join(".home"))
        .env_remove("CC")
        .env_remove("CFLAGS")
        .env_remove("ARCHFLAGS");
    cmd
}

/// Create a temporary project with a launcher source and a project config.
fn project(config: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("src")).unwrap();
    fs::write(
        tmp.path().join("src/main.c"),
        "int main(int argc, char **argv) { return 0; }\n",
    )
    .unwrap();
    fs::create_dir_all(tmp.path().join(".macbundle")).unwrap();
    fs::write(tmp.path().join(".macbundle/config.toml"), config).unwrap();
    tmp
}

const FAKE_TOOLCHAIN: &str = r#"
[toolchain]
cc = "true"
strip = "true"
cflags = "-Os"
archflags = ""
platform = "macosx-10.9-x86_64"

[tools]
ibtool = "true"
ditto = "true"
"#;

// ============================================================================
// macbundle stub
// ============================================================================

#[test]
fn test_stub_builds_canonical_main() {
    let tmp = project(FAKE_TOOLCHAIN);

    macbundle(tmp.path())
        .arg("stub")
        .assert()
        .success()
        .stdout(predicate::str::ends_with(".macbundle/prebuilt/main\n"))
        .stderr(predicate::str::contains("Compiling stub main"));

    assert!(tmp.path().join(".macbundle/prebuilt/main").is_file());
}

#[test]
fn test_stub_second_run_is_fresh() {
    let tmp = project(FAKE_TOOLCHAIN);

    macbundle(tmp.path()).arg("stub").assert().success();

    macbundle(tmp.path())
        .arg("stub")
        .assert()
        .success()
        .stderr(predicate::str::contains("Fresh"))
        .stderr(predicate::str::contains("Compiling").not());
}

#[test]
fn test_stub_rebuilds_after_source_change() {
    let tmp = project(FAKE_TOOLCHAIN);
    macbundle(tmp.path()).arg("stub").assert().success();

    let artifact = tmp.path().join(".macbundle/prebuilt/main");
    let old = filetime::FileTime::from_unix_time(1_000_000, 0);
    filetime::set_file_mtime(&artifact, old).unwrap();

    macbundle(tmp.path())
        .arg("stub")
        .assert()
        .success()
        .stderr(predicate::str::contains("Compiling stub main"));
}

#[test]
fn test_stub_all_builds_every_variant() {
    let config = format!(
        "{}\n{}",
        FAKE_TOOLCHAIN,
        r#"
[[stub.variants]]
name = "main"

[[stub.variants]]
name = "main-fat"
arch_flags = ["-arch i386 -arch ppc"]
"#
    );
    let tmp = project(&config);

    macbundle(tmp.path())
        .args(["stub", "--all"])
        .assert()
        .success();

    assert!(tmp.path().join(".macbundle/prebuilt/main").is_file());
    assert!(tmp.path().join(".macbundle/prebuilt/main-fat").is_file());
}

#[test]
fn test_stub_compiler_failure() {
    let tmp = project(&FAKE_TOOLCHAIN.replace("cc = \"true\"", "cc = \"false\""));

    macbundle(tmp.path())
        .arg("stub")
        .assert()
        .failure()
        .stderr(predicate::str::contains("false failed, code 1"));

    assert!(!tmp.path().join(".macbundle/prebuilt/main").exists());
}

#[test]
fn test_stub_missing_source() {
    let tmp = project(FAKE_TOOLCHAIN);
    fs::remove_file(tmp.path().join("src/main.c")).unwrap();

    macbundle(tmp.path())
        .arg("stub")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stub source does not exist"));
}

// ============================================================================
// macbundle convert
// ============================================================================

fn write_resource(root: &Path, rel: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "<document/>").unwrap();
    path
}

#[test]
fn test_convert_xib() {
    let tmp = project(FAKE_TOOLCHAIN);
    write_resource(tmp.path(), "ui/MainMenu.xib");
    write_resource(tmp.path(), "ui/en.lproj/Prefs.xib");

    macbundle(tmp.path())
        .args(["convert", "ui", "--dest", "out/Resources"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Finished converting 2 resource(s)"));

    // The fake ibtool writes nothing, but the layout is prepared
    assert!(tmp.path().join("out/Resources/en.lproj").is_dir());
}

#[test]
fn test_convert_dry_run_lists_outputs() {
    let tmp = project(FAKE_TOOLCHAIN);
    write_resource(tmp.path(), "MainMenu.xib");

    macbundle(tmp.path())
        .args(["convert", "MainMenu.xib", "--dest", "out", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MainMenu.nib"));

    assert!(!tmp.path().join("out").exists());
}

#[test]
fn test_convert_tool_failure() {
    let tmp = project(&FAKE_TOOLCHAIN.replace("ibtool = \"true\"", "ibtool = \"false\""));
    write_resource(tmp.path(), "MainMenu.xib");

    macbundle(tmp.path())
        .args(["convert", "MainMenu.xib", "--dest", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("false failed, code 1"));
}

#[test]
fn test_convert_rejects_colliding_outputs() {
    let tmp = project(FAKE_TOOLCHAIN);
    write_resource(tmp.path(), "a/Main.xib");
    write_resource(tmp.path(), "b/Main.xib");

    macbundle(tmp.path())
        .args(["convert", "*/Main.xib", "--dest", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("would be written to"))
        .stderr(predicate::str::contains("Main.nib"));

    assert!(!tmp.path().join("out").exists());
}

#[test]
fn test_convert_unknown_suffix() {
    let tmp = project(FAKE_TOOLCHAIN);
    write_resource(tmp.path(), "Icon.unknownext");

    macbundle(tmp.path())
        .args(["convert", "Icon.unknownext", "--dest", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "no converter registered for suffix `unknownext`",
        ));
}

// ============================================================================
// macbundle verify
// ============================================================================

#[cfg(unix)]
fn write_app(root: &Path, name: &str, missing: &[&str]) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let missing_case = if missing.is_empty() {
        String::new()
    } else {
        format!("    {}) echo \"* import failed: $name\" ;;\n", missing.join("|"))
    };
    let script = format!(
        r#"#!/bin/sh
while IFS= read -r line; do
  name=$(printf '%s\n' "$line" | sed -n 's/^import_module("\(.*\)")$/\1/p')
  case "$name" in
{missing_case}    *) echo "$name" ;;
  esac
done
exit 0
"#
    );

    let bundle = root.join(format!("{}.app", name));
    let macos = bundle.join("Contents/MacOS");
    fs::create_dir_all(&macos).unwrap();
    let exe = macos.join(name);
    fs::write(&exe, script).unwrap();
    fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
    bundle
}

#[cfg(unix)]
#[test]
fn test_verify_basic_app() {
    let tmp = project("");
    write_app(tmp.path(), "BasicApp", &["xmllib"]);

    macbundle(tmp.path())
        .args([
            "verify",
            "BasicApp.app",
            "--present",
            "os",
            "--present",
            "decimal",
            "--missing",
            "xmllib",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASSED (4/4 checks passed)"));
}

#[cfg(unix)]
#[test]
fn test_verify_json_output() {
    let tmp = project("");
    write_app(tmp.path(), "BasicApp", &[]);

    let output = macbundle(tmp.path())
        .args(["verify", "BasicApp.app", "--present", "os", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["passed"], true);
    assert_eq!(json["checks"][1]["name"], "import os");
}

#[cfg(unix)]
#[test]
fn test_verify_failing_import() {
    let tmp = project("");
    write_app(tmp.path(), "BasicApp", &["xmllib"]);

    macbundle(tmp.path())
        .args(["verify", "BasicApp.app", "--present", "xmllib"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[FAIL] import xmllib"))
        .stdout(predicate::str::contains("* import failed"));
}

#[test]
fn test_verify_missing_app() {
    let tmp = project("");

    macbundle(tmp.path())
        .args(["verify", "Nope.app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("app not found"));
}

#[test]
fn test_verify_rejects_bad_stderr_policy() {
    let tmp = project("");

    macbundle(tmp.path())
        .args(["verify", "Nope.app", "--stderr", "loud"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid stderr policy"));
}

// ============================================================================
// macbundle completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();

    macbundle(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("macbundle"));
}

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();

    macbundle(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stub"))
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("verify"));
}
