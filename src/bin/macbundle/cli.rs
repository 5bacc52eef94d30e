//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// macbundle - build helpers for macOS application bundles
#[derive(Parser)]
#[command(name = "macbundle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the launcher stub if it is missing or out of date
    Stub(StubArgs),

    /// Convert interface resources (.xib, .nib) into a bundle directory
    Convert(ConvertArgs),

    /// Launch a built app and check that it starts and imports modules
    Verify(VerifyArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct StubArgs {
    /// Build every configured variant, not just the host's
    #[arg(long)]
    pub all: bool,

    /// Build this variant instead of the detected one (e.g. main-fat)
    #[arg(long, value_name = "NAME")]
    pub variant: Option<String>,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Resource files, directories or glob patterns
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub dest: PathBuf,

    /// Show what would be converted without running any tool
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Path to the .app bundle or its executable
    pub app: PathBuf,

    /// Module that must import successfully (repeatable)
    #[arg(long, value_name = "MODULE")]
    pub present: Vec<String>,

    /// Module that must fail to import (repeatable)
    #[arg(long, value_name = "MODULE")]
    pub missing: Vec<String>,

    /// Seconds to wait for each response and for shutdown
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// What to do with the app's stderr: merge, discard, inherit
    #[arg(long, value_name = "POLICY")]
    pub stderr: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
