//! Compiler flag sanitation for launcher stubs.
//!
//! The host's default CFLAGS usually carry the architectures and SDK the
//! interpreter itself was built for. Those are stripped so the stub can be
//! compiled for whatever variant is requested.

use std::sync::LazyLock;

use regex::Regex;

static ARCH_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)-arch\s+\S+").expect("valid regex"));

static ISYSROOT_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)-isysroot\s+\S+").expect("valid regex"));

/// Flags appended to every stub compile.
pub const PIE_FLAGS: [&str; 2] = ["-fPIE", "-pie"];

/// Remove every match of `re` until nothing changes.
fn strip_to_fixed_point(flags: &str, re: &Regex) -> String {
    let mut current = flags.to_string();
    loop {
        let next = re.replace_all(&current, "$1").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Strip `-dynamic`, `-arch <value>` and `-isysroot <path>` from a flag string.
///
/// Whitespace is normalized to single spaces. Applying this to its own
/// output is a no-op.
pub fn sanitize_cflags(flags: &str) -> String {
    let without_dynamic = flags
        .split_whitespace()
        .filter(|t| *t != "-dynamic")
        .collect::<Vec<_>>()
        .join(" ");

    let without_arch = strip_to_fixed_point(&without_dynamic, &ARCH_PAIR);
    let without_sysroot = strip_to_fixed_point(&without_arch, &ISYSROOT_PAIR);

    without_sysroot.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Ordered compiler flags for one stub compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFlags {
    tokens: Vec<String>,
}

impl BuildFlags {
    /// Start from the host's base CFLAGS, sanitized.
    pub fn from_base(base_cflags: &str) -> Self {
        BuildFlags {
            tokens: sanitize_cflags(base_cflags)
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }

    /// Append architecture flags and the position-independent flags.
    pub fn for_arch(mut self, arch_flags: &[String]) -> Self {
        self.tokens.extend(arch_flags.iter().cloned());
        self.tokens.extend(PIE_FLAGS.iter().map(|f| f.to_string()));
        self
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_arch_and_sysroot() {
        let flags = "-fno-strict-aliasing -arch i386 -arch ppc -isysroot /Developer/SDKs/MacOSX10.4u.sdk -Os -Wall";
        assert_eq!(sanitize_cflags(flags), "-fno-strict-aliasing -Os -Wall");
    }

    #[test]
    fn test_strips_dynamic_token_only() {
        assert_eq!(sanitize_cflags("-dynamic -dynamiclib -g"), "-dynamiclib -g");
    }

    #[test]
    fn test_no_patterns_is_unchanged() {
        assert_eq!(sanitize_cflags("-O2 -g"), "-O2 -g");
        assert_eq!(sanitize_cflags(""), "");
    }

    #[test]
    fn test_does_not_touch_march() {
        assert_eq!(sanitize_cflags("-march=native -O2"), "-march=native -O2");
    }

    #[test]
    fn test_sanitation_is_idempotent() {
        let inputs = [
            "",
            "-O2",
            "-arch x86_64",
            "-arch i386 -arch x86_64 -arch ppc",
            "-isysroot /sdk",
            "-isysroot /a -isysroot /b -arch arm64",
            "-arch -arch x86_64 -g",
            "-dynamic -arch  i386\t-isysroot   /sdk -DNDEBUG",
        ];

        for input in inputs {
            let once = sanitize_cflags(input);
            let twice = sanitize_cflags(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
            assert!(!once.contains("-arch "), "left -arch in {once:?}");
            assert!(!once.contains("-isysroot"), "left -isysroot in {once:?}");
        }
    }

    #[test]
    fn test_build_flags_append_arch_then_pie() {
        let flags = BuildFlags::from_base("-Os -arch ppc -dynamic")
            .for_arch(&["-arch".to_string(), "arm64".to_string()]);

        assert_eq!(flags.tokens(), ["-Os", "-arch", "arm64", "-fPIE", "-pie"]);
    }
}
