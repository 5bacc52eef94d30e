//! macbundle - macOS application bundle build helpers
//!
//! This crate provides the library side of macbundle: the launcher stub
//! cache, the resource converter registry and the harness used to verify a
//! built application over its stdin/stdout.

pub mod builder;
pub mod harness;
pub mod ops;
pub mod util;

/// Test utilities and mocks for macbundle unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recording tool runner and shell-script
/// fixture applications.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildError, ConverterRegistry, StubCache};
pub use harness::{AppHarness, HarnessError, HarnessSession};
pub use util::context::GlobalContext;
