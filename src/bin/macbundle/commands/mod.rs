//! Command implementations

pub mod completions;
pub mod convert;
pub mod stub;
pub mod verify;
