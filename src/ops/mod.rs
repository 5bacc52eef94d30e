//! High-level operations.
//!
//! This module contains the implementation of macbundle commands.

pub mod convert;
pub mod stub;
pub mod verify;

pub use convert::{convert_resources, plan_conversions, ConvertedResource, PlannedConversion};
pub use stub::{canonical_stub_path, ensure_stub, ensure_stub_with, stub_cache, StubOptions};
pub use verify::{
    format_result, format_result_json, resolve_executable, verify_app, VerifyCheck,
    VerifyOptions, VerifyResult,
};
