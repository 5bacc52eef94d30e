//! Bundle build steps.
//!
//! This module implements the launcher stub cache and the resource
//! converters, both of which shell out to external tools.

pub mod converters;
pub mod errors;
pub mod invoker;
pub mod stub;
pub mod toolchain;

pub use converters::{ConverterRegistry, ToolPaths, Transform};
pub use errors::BuildError;
pub use invoker::ToolInvoker;
pub use stub::{ArchVariant, HostInfo, StubCache, VariantOverride};
pub use toolchain::HostToolchain;
