//! Test fixtures for common test scenarios.
//!
//! The fixture "applications" are small `/bin/sh` scripts that speak the
//! import protocol on stdin/stdout.

use std::path::{Path, PathBuf};

/// Importer that answers every request with the module name, except the
/// names in `missing`, which get `* import failed: <name>`. Exits 0 when
/// stdin closes.
pub fn importer_script(missing: &[&str]) -> String {
    let missing_cases = if missing.is_empty() {
        String::new()
    } else {
        format!(
            "    {}) echo \"* import failed: $name\" ;;\n",
            missing.join("|")
        )
    };

    format!(
        r#"#!/bin/sh
while IFS= read -r line; do
  name=$(printf '%s\n' "$line" | sed -n 's/^import_module("\(.*\)")$/\1/p')
  case "$name" in
    "") echo "* import failed: malformed request" ;;
{missing_cases}    *) echo "$name" ;;
  esac
done
exit 0
"#
    )
}

/// App that never answers and never exits on its own.
pub fn silent_script() -> String {
    "#!/bin/sh\nexec sleep 60\n".to_string()
}

/// App that answers every request with garbage.
pub fn chatty_script() -> String {
    "#!/bin/sh\nwhile IFS= read -r line; do echo \"hello from the app\"; done\n".to_string()
}

/// App that writes one diagnostic to stderr and then exits.
pub fn stderr_script() -> String {
    "#!/bin/sh\necho \"warning: no display\" >&2\nexit 0\n".to_string()
}

/// App that exits with `code` once stdin closes.
pub fn exit_code_script(code: i32) -> String {
    format!("#!/bin/sh\ncat > /dev/null\nexit {}\n", code)
}

/// Write a script into `dir` and return its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("failed to write fixture script");
    make_executable(&path);
    path
}

/// Create `<dir>/<name>.app/Contents/MacOS/<name>` running `body`.
///
/// Returns the path of the `.app` directory.
pub fn write_app_bundle(dir: &Path, name: &str, body: &str) -> PathBuf {
    let bundle = dir.join(format!("{}.app", name));
    let macos = bundle.join("Contents").join("MacOS");
    std::fs::create_dir_all(&macos).expect("failed to create bundle layout");
    write_script(&macos, name, body);
    bundle
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("failed to chmod fixture script");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}

/// Minimal launcher source for stub builds.
pub const STUB_SOURCE: &str = "int main(int argc, char **argv) { return 0; }\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importer_script_lists_missing_modules() {
        let script = importer_script(&["xmllib", "doesnotexist"]);
        assert!(script.contains("xmllib|doesnotexist)"));
        assert!(script.contains("* import failed"));
    }

    #[test]
    fn test_write_app_bundle_layout() {
        let tmp = tempfile::TempDir::new().unwrap();
        let bundle = write_app_bundle(tmp.path(), "BasicApp", &silent_script());
        assert!(bundle.join("Contents/MacOS/BasicApp").is_file());
    }
}
