//! Converter registry - suffix to transform mapping.
//!
//! Registration policy: the first transform registered for a suffix wins.
//! Later registrations for the same suffix are ignored and reported.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::builder::converters::nib::{NibPassthrough, ToolPaths, XibCompiler};
use crate::builder::converters::{normalize_suffix, ConversionRequest, Transform};
use crate::builder::errors::BuildError;
use crate::util::process::ToolRunner;

/// Registry of resource converters keyed by file suffix.
pub struct ConverterRegistry {
    converters: BTreeMap<String, Box<dyn Transform>>,
    runner: Arc<dyn ToolRunner>,
}

impl ConverterRegistry {
    /// Create an empty registry whose transforms run tools through `runner`.
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        ConverterRegistry {
            converters: BTreeMap::new(),
            runner,
        }
    }

    /// Create a registry with the built-in interface converters.
    pub fn with_defaults(tools: &ToolPaths, runner: Arc<dyn ToolRunner>) -> Self {
        let mut registry = ConverterRegistry::new(runner);
        registry.register("xib", Box::new(XibCompiler::new(&tools.ibtool)));
        registry.register("nib", Box::new(NibPassthrough::new(&tools.ditto)));
        registry
    }

    /// Register a transform for `suffix` (with or without leading dot).
    ///
    /// Returns `false` if the suffix already had a transform; the existing
    /// one is kept.
    pub fn register(&mut self, suffix: &str, transform: Box<dyn Transform>) -> bool {
        let suffix = normalize_suffix(suffix).to_string();
        match self.converters.entry(suffix) {
            Entry::Vacant(slot) => {
                slot.insert(transform);
                true
            }
            Entry::Occupied(existing) => {
                tracing::warn!(
                    "Converter for `.{}` already registered; keeping the first one",
                    existing.key()
                );
                false
            }
        }
    }

    /// Convert `source` using the transform registered for `suffix`.
    ///
    /// Returns the path written, with the extension chosen by the converter.
    pub fn convert(
        &self,
        suffix: &str,
        source: &Path,
        destination: &Path,
        dry_run: bool,
    ) -> Result<PathBuf, BuildError> {
        let suffix = normalize_suffix(suffix);
        let transform =
            self.converters
                .get(suffix)
                .ok_or_else(|| BuildError::UnsupportedConversion {
                    suffix: suffix.to_string(),
                })?;

        let request = ConversionRequest {
            source,
            destination,
            dry_run,
        };

        if dry_run {
            tracing::debug!("Would convert {} ({})", source.display(), transform.describe());
        } else {
            tracing::info!("Converting {}", source.display());
        }

        transform.transform(&request, self.runner.as_ref())
    }

    /// Path that converting to `destination` with the `suffix` converter
    /// will write.
    pub fn output_path(&self, suffix: &str, destination: &Path) -> Result<PathBuf, BuildError> {
        let suffix = normalize_suffix(suffix);
        self.converters
            .get(suffix)
            .map(|t| t.output_path(destination))
            .ok_or_else(|| BuildError::UnsupportedConversion {
                suffix: suffix.to_string(),
            })
    }

    /// Check if a suffix has a converter.
    pub fn contains(&self, suffix: &str) -> bool {
        self.converters.contains_key(normalize_suffix(suffix))
    }

    /// Registered suffixes, sorted.
    pub fn suffixes(&self) -> impl Iterator<Item = &str> + '_ {
        self.converters.keys().map(|k| k.as_str())
    }

    /// `(suffix, description)` for every converter.
    pub fn describe(&self) -> Vec<(String, String)> {
        self.converters
            .iter()
            .map(|(suffix, t)| (suffix.clone(), t.describe()))
            .collect()
    }

    /// Get the number of registered converters.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}
