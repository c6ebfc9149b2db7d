// src/registry/mod.rs

//! Transform selection over the combined catalog.
//!
//! The [`Registry`] answers "which transformer can convert this source type
//! to this target type with these options?". It holds one immutable
//! generation of the combined catalog at a time; per (source, target)
//! candidate lists are derived lazily and cached, and results for a named
//! preferred transformer are cached again after option filtering. A reload
//! swaps the catalog and discards both caches as a single unit, so derived
//! state can never refer to a stale generation.
//!
//! Selection itself is pure in-memory computation: no I/O, no blocking,
//! safe for unlimited concurrent readers. Racing lazy builds of the same
//! candidate list are harmless because construction is a pure function of
//! the immutable catalog; the first stored result wins and later duplicates
//! are discarded.

pub mod options;
pub mod skyline;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use crate::config::combine::CombinedConfig;
use crate::config::{DEFAULT_PRIORITY, UNLIMITED_SIZE};
use crate::core_version::CoreFunction;
use crate::mediatype;
use options::{filter_timeout, options_match, possible_options};
use skyline::{add_to_supported_list, SupportedTransform};

/// Reserved option name carrying the request timeout. A transport concern,
/// stripped before any capability matching.
pub const TIMEOUT_OPTION: &str = "timeout";

/// Selection errors. An empty candidate list is *not* an error; only a
/// media type that is both undeclared and malformed is rejected.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("media type \"{media_type}\" is not declared by any transformer and is not a recognized media type")]
    UnsupportedMediaType { media_type: String },
}

/// One immutable catalog generation plus the caches derived from it.
/// Replaced wholesale on reload.
#[derive(Debug, Default)]
struct RegistryData {
    /// Declared transforms in registration order: source -> target -> list.
    transforms: BTreeMap<String, BTreeMap<String, Vec<SupportedTransform>>>,

    /// coreVersion by transformer name.
    core_versions: BTreeMap<String, Option<String>>,

    /// Every media type declared as a source or target by any transformer.
    known_types: BTreeSet<String>,

    transformer_count: usize,
    transform_count: usize,

    /// Lazily built candidate list per (source, target) pair.
    index: DashMap<(String, String), Arc<Vec<SupportedTransform>>>,

    /// Option-filtered results per (preferred transformer, source type).
    /// The target type is intentionally absent from the key: a named
    /// preferred transformer binding is specific to one target per source
    /// in practice. Kept for compatibility with observed behavior.
    preferred: DashMap<(String, String), Arc<Vec<SupportedTransform>>>,
}

impl RegistryData {
    fn from_combined(combined: &CombinedConfig) -> Self {
        let mut data = RegistryData::default();
        for entry in combined.transformers() {
            let transformer = &entry.transformer;
            data.transformer_count += 1;
            data.core_versions.insert(
                transformer.transformer_name.clone(),
                transformer.core_version.clone(),
            );
            for supported in &transformer.supported_source_and_target_list {
                data.known_types.insert(supported.source_media_type.clone());
                data.known_types.insert(supported.target_media_type.clone());
                data.transforms
                    .entry(supported.source_media_type.clone())
                    .or_default()
                    .entry(supported.target_media_type.clone())
                    .or_default()
                    .push(SupportedTransform {
                        name: transformer.transformer_name.clone(),
                        options: entry.root_options.clone(),
                        max_source_size_bytes: supported
                            .max_source_size_bytes
                            .unwrap_or(UNLIMITED_SIZE),
                        priority: supported.priority.unwrap_or(DEFAULT_PRIORITY),
                        core_version: transformer.core_version.clone(),
                    });
                data.transform_count += 1;
            }
        }
        data
    }

    /// Candidate list for one pair: built on first use, then cached.
    /// Concurrent first uses may both compute it; the results are
    /// value-identical and the first store wins.
    fn skyline_for(&self, source: &str, target: &str) -> Arc<Vec<SupportedTransform>> {
        let key = (source.to_string(), target.to_string());
        if let Some(hit) = self.index.get(&key) {
            return Arc::clone(&hit);
        }

        let declared = self
            .transforms
            .get(source)
            .and_then(|targets| targets.get(target));
        let mut list = Vec::new();
        if let Some(declared) = declared {
            for transform in declared {
                add_to_supported_list(&mut list, transform.clone());
            }
        }
        debug!(
            source,
            target,
            candidates = list.len(),
            "built candidate list"
        );

        Arc::clone(
            self.index
                .entry(key)
                .or_insert_with(|| Arc::new(list))
                .value(),
        )
    }

    fn check_media_type(&self, media_type: &str) -> Result<(), RegistryError> {
        if self.known_types.contains(media_type) || mediatype::is_valid(media_type) {
            Ok(())
        } else {
            Err(RegistryError::UnsupportedMediaType {
                media_type: media_type.to_string(),
            })
        }
    }
}

/// The capability registry façade. Construct once, share by reference;
/// every query method is a synchronous computation over in-memory data.
#[derive(Debug, Default)]
pub struct Registry {
    data: RwLock<Arc<RegistryData>>,
}

impl Registry {
    /// An empty registry: every selection yields no candidates until a
    /// catalog is loaded.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Build a registry from a combined catalog.
    pub fn from_combined(combined: &CombinedConfig) -> Self {
        let registry = Registry::new();
        registry.reload(combined);
        registry
    }

    /// Replace the published catalog. The new generation, the selection
    /// index and the preferred-transformer cache are swapped as one unit;
    /// readers see either the old generation with its caches or the new
    /// one, never a mixture.
    pub fn reload(&self, combined: &CombinedConfig) {
        let data = Arc::new(RegistryData::from_combined(combined));
        debug!(
            transformers = data.transformer_count,
            transforms = data.transform_count,
            "registry reloaded"
        );
        *self.data.write().unwrap() = data;
    }

    fn snapshot(&self) -> Arc<RegistryData> {
        Arc::clone(&self.data.read().unwrap())
    }

    /// Ordered candidates for one (source, target) pair, before option
    /// filtering: non-decreasing size ceiling, no dominated entries.
    pub fn candidates_for(&self, source: &str, target: &str) -> Vec<SupportedTransform> {
        self.snapshot().skyline_for(source, target).as_ref().clone()
    }

    /// Ordered candidates able to perform the conversion with the given
    /// options. The reserved `timeout` option is ignored. An empty result
    /// means no registered transformer qualifies, which is not an error;
    /// a malformed media type declared by no transformer is.
    ///
    /// When `preferred` names a transformer, the filtered result is cached
    /// under (preferred, source) and reused for subsequent calls with the
    /// same pair, skipping option processing.
    pub fn select(
        &self,
        source: &str,
        target: &str,
        actual_options: &HashMap<String, String>,
        preferred: Option<&str>,
    ) -> Result<Vec<SupportedTransform>, RegistryError> {
        let data = self.snapshot();
        data.check_media_type(source)?;
        data.check_media_type(target)?;

        let preferred = preferred.map(str::trim).filter(|name| !name.is_empty());
        if let Some(name) = preferred {
            let key = (name.to_string(), source.to_string());
            if let Some(cached) = data.preferred.get(&key) {
                return Ok(cached.as_ref().clone());
            }
        }

        let actual = filter_timeout(actual_options);
        let filtered: Vec<SupportedTransform> = data
            .skyline_for(source, target)
            .iter()
            .filter(|transform| {
                options_match(&possible_options(&transform.options, &actual), &actual)
            })
            .cloned()
            .collect();

        if let Some(name) = preferred {
            data.preferred.insert(
                (name.to_string(), source.to_string()),
                Arc::new(filtered.clone()),
            );
        }
        Ok(filtered)
    }

    /// Name of the transformer that will be used for this conversion, or
    /// `None` when nothing qualifies. `source_size_bytes` is ignored when
    /// negative.
    pub fn find_transformer_name(
        &self,
        source: &str,
        source_size_bytes: i64,
        target: &str,
        actual_options: &HashMap<String, String>,
        preferred: Option<&str>,
    ) -> Result<Option<String>, RegistryError> {
        Ok(self
            .select(source, target, actual_options, preferred)?
            .into_iter()
            .find(|t| source_size_bytes < 0 || t.covers(source_size_bytes))
            .map(|t| t.name))
    }

    /// Largest source size any qualifying transformer accepts for this
    /// conversion: the last candidate's ceiling, `-1` for unlimited, `0`
    /// when nothing qualifies.
    pub fn max_size(
        &self,
        source: &str,
        target: &str,
        actual_options: &HashMap<String, String>,
        preferred: Option<&str>,
    ) -> Result<i64, RegistryError> {
        Ok(self
            .select(source, target, actual_options, preferred)?
            .last()
            .map(|t| t.max_source_size_bytes)
            .unwrap_or(0))
    }

    /// Whether the named transformer's engine is new enough for the given
    /// functionality.
    pub fn is_supported(&self, function: CoreFunction, transformer_name: &str) -> bool {
        let data = self.snapshot();
        let core_version = data
            .core_versions
            .get(transformer_name)
            .and_then(|v| v.clone());
        function.is_supported(core_version.as_deref())
    }

    /// Number of registered transformers in the current generation.
    pub fn transformer_count(&self) -> usize {
        self.snapshot().transformer_count
    }

    /// Number of declared (transformer, source, target) routes in the
    /// current generation.
    pub fn transform_count(&self) -> usize {
        self.snapshot().transform_count
    }
}
