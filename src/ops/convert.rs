//! Converting bundle resources.
//!
//! Inputs may be files, directories or glob patterns:
//! - a file is converted into `dest/<file name>`; its suffix must have a
//!   registered converter
//! - a directory is walked and every entry with a registered suffix is
//!   converted, keeping its layout relative to the directory
//! - a glob pattern selects files, and compiled nib bundles, relative to the
//!   project root; matches are converted into `dest/<file name>`
//!
//! Nothing is converted until every input has been planned, so an unknown
//! suffix or two inputs writing the same output fail the run before any tool
//! has been invoked.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use walkdir::WalkDir;

use crate::builder::converters::{suffix_of, ConverterRegistry};
use crate::builder::errors::BuildError;
use crate::util::fs::{ensure_dir, glob_paths, is_glob_pattern, relative_path};

/// One resource scheduled for conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedConversion {
    pub suffix: String,
    pub source: PathBuf,
    /// Destination before the converter picks the output extension
    pub destination: PathBuf,
}

/// A finished (or, in a dry run, planned) conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedResource {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// Expand `inputs` into the list of conversions to run.
///
/// Relative inputs are resolved against `base`.
pub fn plan_conversions(
    registry: &ConverterRegistry,
    inputs: &[String],
    base: &Path,
    dest_dir: &Path,
) -> Result<Vec<PlannedConversion>> {
    let mut plan = Vec::new();

    for input in inputs {
        if is_glob_pattern(input) {
            let before = plan.len();
            for source in glob_paths(base, std::slice::from_ref(input))? {
                if source.is_dir() && !has_converter(registry, &source) {
                    tracing::debug!("Skipping directory {}", source.display());
                    continue;
                }
                plan.push(plan_file(registry, source, dest_dir)?);
            }
            if plan.len() == before {
                tracing::warn!("Pattern `{}` matched no files", input);
            }
            continue;
        }

        let path = base.join(input);
        if !path.exists() {
            bail!("input not found: {}", path.display());
        }

        if path.is_dir() && !has_converter(registry, &path) {
            plan.extend(plan_directory(registry, &path, dest_dir)?);
        } else {
            plan.push(plan_file(registry, path, dest_dir)?);
        }
    }

    dedup_outputs(registry, plan)
}

/// Drop repeated sources and reject distinct sources that would be written
/// to the same output.
fn dedup_outputs(
    registry: &ConverterRegistry,
    plan: Vec<PlannedConversion>,
) -> Result<Vec<PlannedConversion>> {
    let mut outputs: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut unique = Vec::with_capacity(plan.len());

    for item in plan {
        let output = registry.output_path(&item.suffix, &item.destination)?;
        if let Some(first) = outputs.get(&output) {
            if *first == item.source {
                continue;
            }
            bail!(
                "both {} and {} would be written to {}",
                first.display(),
                item.source.display(),
                output.display()
            );
        }
        outputs.insert(output, item.source.clone());
        unique.push(item);
    }

    Ok(unique)
}

fn has_converter(registry: &ConverterRegistry, path: &Path) -> bool {
    suffix_of(path).is_some_and(|s| registry.contains(s))
}

/// A single named input. Its suffix must be registered.
fn plan_file(
    registry: &ConverterRegistry,
    source: PathBuf,
    dest_dir: &Path,
) -> Result<PlannedConversion> {
    let suffix = suffix_of(&source).unwrap_or_default().to_string();
    if !registry.contains(&suffix) {
        return Err(BuildError::UnsupportedConversion { suffix })
            .with_context(|| format!("cannot convert {}", source.display()));
    }

    let name = source
        .file_name()
        .with_context(|| format!("input has no file name: {}", source.display()))?;

    Ok(PlannedConversion {
        suffix,
        destination: dest_dir.join(name),
        source,
    })
}

/// Every registered resource below `dir`, in a stable order.
///
/// A directory whose own suffix is registered (a compiled nib bundle) is
/// taken as one resource and not descended into.
fn plan_directory(
    registry: &ConverterRegistry,
    dir: &Path,
    dest_dir: &Path,
) -> Result<Vec<PlannedConversion>> {
    let mut plan = Vec::new();
    let mut entries = WalkDir::new(dir).min_depth(1).sort_by_file_name().into_iter();

    while let Some(entry) = entries.next() {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        let path = entry.path();

        let Some(suffix) = suffix_of(path).filter(|s| registry.contains(s)) else {
            continue;
        };
        if entry.file_type().is_dir() {
            entries.skip_current_dir();
        }

        plan.push(PlannedConversion {
            suffix: suffix.to_string(),
            source: path.to_path_buf(),
            destination: dest_dir.join(relative_path(dir, path)),
        });
    }

    if plan.is_empty() {
        tracing::warn!("No convertible resources under {}", dir.display());
    }
    Ok(plan)
}

/// Run a conversion plan.
///
/// `on_converted` is called after each resource, for progress reporting.
pub fn convert_resources(
    registry: &ConverterRegistry,
    plan: &[PlannedConversion],
    dry_run: bool,
    mut on_converted: impl FnMut(&ConvertedResource),
) -> Result<Vec<ConvertedResource>> {
    let mut converted = Vec::with_capacity(plan.len());

    for item in plan {
        if !dry_run {
            if let Some(parent) = item.destination.parent() {
                ensure_dir(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let output = registry
            .convert(&item.suffix, &item.source, &item.destination, dry_run)
            .with_context(|| format!("failed to convert {}", item.source.display()))?;

        let resource = ConvertedResource {
            source: item.source.clone(),
            output,
        };
        on_converted(&resource);
        converted.push(resource);
    }

    Ok(converted)
}
