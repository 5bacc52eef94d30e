//! Driving a built application over its stdin/stdout.
//!
//! The app reads one command per line and answers each with one line.
//! Every read is bounded by a deadline; an app that misses it is killed.

pub mod errors;
pub mod protocol;
pub mod session;

pub use errors::HarnessError;
pub use protocol::{import_request, ImportOutcome, IMPORT_FAILED_PREFIX};
pub use session::{AppHarness, HarnessSession, HarnessState, StderrPolicy, DEFAULT_TIMEOUT};
