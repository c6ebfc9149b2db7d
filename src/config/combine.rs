// src/config/combine.rs

//! Combines the capability documents of many engines into one catalog.
//!
//! Documents are added one at a time with [`CombinedConfig::add_config`];
//! their patch directives are queued rather than applied immediately.
//! [`CombinedConfig::combine`] then applies every queued directive in a
//! fixed pass order (remove, add, override, defaults), resolves option-group
//! references and fills in unset size ceilings and priorities. Problems
//! found while combining are collected into a batch of [`CombineIssue`]s so
//! one engine's bad document never blocks the rest of the fleet; only a
//! duplicate transformer name is fatal, and that is rejected already at
//! [`CombinedConfig::add_config`] time.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;

use super::{
    AddSupported, OverrideSupported, RemoveSupported, SupportedDefaults, TransformConfig,
    TransformOption, TransformOptionGroup, Transformer, DEFAULT_PRIORITY, UNLIMITED_SIZE,
};

/// Fatal combination errors. Raised while documents are being registered,
/// before any directive is applied.
#[derive(Error, Debug)]
pub enum CombineError {
    /// Two documents declare the same transformer name. Engines must be
    /// uniquely named across the fleet, so this aborts startup.
    #[error("transformer \"{transformer_name}\" is already registered; duplicate read from {read_from}")]
    DuplicateTransformer {
        transformer_name: String,
        read_from: String,
    },
}

/// Non-fatal problems found while combining. Collected as a batch and also
/// logged; the offending directive or reference is ignored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CombineIssue {
    #[error("removeTransformers \"{transformer_name}\" matched nothing. Read from {read_from}")]
    DanglingRemoveTransformer {
        transformer_name: String,
        read_from: String,
    },

    #[error("removeSupported {transformer_name}: {source_media_type} -> {target_media_type} matched nothing. Read from {read_from}")]
    DanglingRemove {
        transformer_name: String,
        source_media_type: String,
        target_media_type: String,
        read_from: String,
    },

    #[error("addSupported {transformer_name}: {source_media_type} -> {target_media_type} had no effect (unknown transformer or conversion already declared). Read from {read_from}")]
    DanglingAdd {
        transformer_name: String,
        source_media_type: String,
        target_media_type: String,
        read_from: String,
    },

    #[error("overrideSupported {transformer_name}: {source_media_type} -> {target_media_type} matched no declared conversion. Read from {read_from}")]
    DanglingOverride {
        transformer_name: String,
        source_media_type: String,
        target_media_type: String,
        read_from: String,
    },

    #[error("transformer \"{transformer_name}\" references transformOptions \"{group_name}\" which do not exist; reference ignored. Read from {read_from}")]
    UnknownOptionGroup {
        transformer_name: String,
        group_name: String,
        read_from: String,
    },

    #[error("transformer without a name ignored. Read from {read_from}")]
    UnnamedTransformer { read_from: String },

    #[error("supportedDefaults entry sets neither maxSourceSizeBytes nor priority. Read from {read_from}")]
    EmptyDefault { read_from: String },
}

/// A directive or transformer together with the document it was read from.
#[derive(Debug, Clone)]
struct Sourced<T> {
    item: T,
    read_from: String,
}

/// A transformer after combination: directives applied, option-group
/// references resolved into one root group, size and priority concrete.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTransformer {
    pub transformer: Transformer,
    /// Root option group for matching. Logically required, so children are
    /// optional or required based on their own settings.
    pub root_options: TransformOptionGroup,
    pub read_from: String,
}

/// Accumulates capability documents and produces the combined catalog.
#[derive(Debug, Default)]
pub struct CombinedConfig {
    transform_options: BTreeMap<String, Vec<TransformOption>>,
    transformers: Vec<Sourced<Transformer>>,

    remove_transformers: Vec<Sourced<String>>,
    remove_supported: Vec<Sourced<RemoveSupported>>,
    add_supported: Vec<Sourced<AddSupported>>,
    override_supported: Vec<Sourced<OverrideSupported>>,
    supported_defaults: Vec<Sourced<SupportedDefaults>>,

    combined: Vec<CombinedTransformer>,
}

impl CombinedConfig {
    pub fn new() -> Self {
        CombinedConfig::default()
    }

    /// Register one engine's capability document. `read_from` identifies the
    /// source for diagnostics (an engine id, URL or file name).
    ///
    /// Option groups are shared between all documents; a later document may
    /// redefine a named group. Directives are queued until [`combine`] runs.
    ///
    /// [`combine`]: CombinedConfig::combine
    pub fn add_config(
        &mut self,
        config: TransformConfig,
        read_from: &str,
    ) -> Result<(), CombineError> {
        for transformer in &config.transformers {
            let name = transformer.transformer_name.trim();
            if !name.is_empty()
                && self
                    .transformers
                    .iter()
                    .any(|t| t.item.transformer_name == name)
            {
                return Err(CombineError::DuplicateTransformer {
                    transformer_name: name.to_string(),
                    read_from: read_from.to_string(),
                });
            }
        }

        for (name, options) in config.transform_options {
            self.transform_options.insert(name, options);
        }
        for transformer in config.transformers {
            self.transformers.push(Sourced {
                item: transformer,
                read_from: read_from.to_string(),
            });
        }

        for name in config.remove_transformers {
            self.remove_transformers.push(Sourced {
                item: name,
                read_from: read_from.to_string(),
            });
        }
        for directive in config.remove_supported {
            self.remove_supported.push(Sourced {
                item: directive,
                read_from: read_from.to_string(),
            });
        }
        for directive in config.add_supported {
            self.add_supported.push(Sourced {
                item: directive,
                read_from: read_from.to_string(),
            });
        }
        for directive in config.override_supported {
            self.override_supported.push(Sourced {
                item: directive,
                read_from: read_from.to_string(),
            });
        }
        for directive in config.supported_defaults {
            self.supported_defaults.push(Sourced {
                item: directive,
                read_from: read_from.to_string(),
            });
        }

        Ok(())
    }

    /// Apply all queued directives and resolve the combined catalog.
    ///
    /// Passes run in a fixed order regardless of which document a directive
    /// came from: remove transformers, remove conversions, add conversions,
    /// override conversions, apply defaults. An added conversion can
    /// therefore never be cancelled by a remove declared elsewhere, and an
    /// override of an added conversion resolves.
    ///
    /// Returns the batch of non-fatal issues. Combining the same documents
    /// again yields an identical catalog; nothing on this path depends on
    /// hash iteration order.
    pub fn combine(&mut self) -> Vec<CombineIssue> {
        let mut issues = Vec::new();

        self.apply_remove_transformers(&mut issues);
        self.apply_remove_supported(&mut issues);
        self.apply_add_supported(&mut issues);
        self.apply_override_supported(&mut issues);
        self.apply_defaults(&mut issues);
        self.resolve_transformers(&mut issues);

        for issue in &issues {
            warn!("{issue}");
        }
        issues
    }

    fn apply_remove_transformers(&mut self, issues: &mut Vec<CombineIssue>) {
        for directive in std::mem::take(&mut self.remove_transformers) {
            let before = self.transformers.len();
            self.transformers
                .retain(|t| t.item.transformer_name != directive.item);
            if self.transformers.len() == before {
                issues.push(CombineIssue::DanglingRemoveTransformer {
                    transformer_name: directive.item,
                    read_from: directive.read_from,
                });
            }
        }
    }

    fn apply_remove_supported(&mut self, issues: &mut Vec<CombineIssue>) {
        for directive in std::mem::take(&mut self.remove_supported) {
            let d = &directive.item;
            let mut matched = false;
            for transformer in self.transformers.iter_mut() {
                if d.transformer_name != "*"
                    && transformer.item.transformer_name != d.transformer_name
                {
                    continue;
                }
                let list = &mut transformer.item.supported_source_and_target_list;
                let before = list.len();
                list.retain(|s| {
                    !(s.source_media_type == d.source_media_type
                        && s.target_media_type == d.target_media_type)
                });
                if list.len() != before {
                    matched = true;
                }
            }
            if !matched {
                issues.push(CombineIssue::DanglingRemove {
                    transformer_name: d.transformer_name.clone(),
                    source_media_type: d.source_media_type.clone(),
                    target_media_type: d.target_media_type.clone(),
                    read_from: directive.read_from,
                });
            }
        }
    }

    fn apply_add_supported(&mut self, issues: &mut Vec<CombineIssue>) {
        for directive in std::mem::take(&mut self.add_supported) {
            let d = &directive.item;
            let mut added = false;
            if let Some(transformer) = self
                .transformers
                .iter_mut()
                .find(|t| t.item.transformer_name == d.transformer_name)
            {
                let list = &mut transformer.item.supported_source_and_target_list;
                let exists = list.iter().any(|s| {
                    s.source_media_type == d.source_media_type
                        && s.target_media_type == d.target_media_type
                });
                if !exists {
                    list.push(super::SupportedSourceAndTarget {
                        source_media_type: d.source_media_type.clone(),
                        target_media_type: d.target_media_type.clone(),
                        max_source_size_bytes: d.max_source_size_bytes,
                        priority: d.priority,
                    });
                    added = true;
                }
            }
            if !added {
                issues.push(CombineIssue::DanglingAdd {
                    transformer_name: d.transformer_name.clone(),
                    source_media_type: d.source_media_type.clone(),
                    target_media_type: d.target_media_type.clone(),
                    read_from: directive.read_from,
                });
            }
        }
    }

    fn apply_override_supported(&mut self, issues: &mut Vec<CombineIssue>) {
        for directive in std::mem::take(&mut self.override_supported) {
            let d = &directive.item;
            let mut overridden = false;
            if let Some(transformer) = self
                .transformers
                .iter_mut()
                .find(|t| t.item.transformer_name == d.transformer_name)
            {
                for supported in transformer
                    .item
                    .supported_source_and_target_list
                    .iter_mut()
                    .filter(|s| {
                        s.source_media_type == d.source_media_type
                            && s.target_media_type == d.target_media_type
                    })
                {
                    supported.max_source_size_bytes = d.max_source_size_bytes;
                    supported.priority = d.priority;
                    overridden = true;
                }
            }
            if !overridden {
                issues.push(CombineIssue::DanglingOverride {
                    transformer_name: d.transformer_name.clone(),
                    source_media_type: d.source_media_type.clone(),
                    target_media_type: d.target_media_type.clone(),
                    read_from: directive.read_from,
                });
            }
        }
    }

    /// Fold the queued defaults (later declarations win per field), then
    /// resolve every unset ceiling and priority, falling back to the
    /// built-ins: unlimited size, priority 50.
    fn apply_defaults(&mut self, issues: &mut Vec<CombineIssue>) {
        let mut default_max_size = None;
        let mut default_priority = None;
        for directive in std::mem::take(&mut self.supported_defaults) {
            if directive.item.is_empty() {
                issues.push(CombineIssue::EmptyDefault {
                    read_from: directive.read_from,
                });
                continue;
            }
            if directive.item.max_source_size_bytes.is_some() {
                default_max_size = directive.item.max_source_size_bytes;
            }
            if directive.item.priority.is_some() {
                default_priority = directive.item.priority;
            }
        }

        for transformer in self.transformers.iter_mut() {
            for supported in transformer.item.supported_source_and_target_list.iter_mut() {
                if supported.max_source_size_bytes.is_none() {
                    supported.max_source_size_bytes =
                        Some(default_max_size.unwrap_or(UNLIMITED_SIZE));
                }
                if supported.priority.is_none() {
                    supported.priority = Some(default_priority.unwrap_or(DEFAULT_PRIORITY));
                }
            }
        }
    }

    /// Validate transformers and resolve their option-group references into
    /// one root group per transformer.
    fn resolve_transformers(&mut self, issues: &mut Vec<CombineIssue>) {
        let mut combined = Vec::with_capacity(self.transformers.len());
        for sourced in &self.transformers {
            let mut transformer = sourced.item.clone();
            if transformer.transformer_name.trim().is_empty() {
                issues.push(CombineIssue::UnnamedTransformer {
                    read_from: sourced.read_from.clone(),
                });
                continue;
            }

            let mut known_refs = Vec::new();
            for group_name in &transformer.transform_options {
                if self.transform_options.contains_key(group_name) {
                    known_refs.push(group_name.clone());
                } else {
                    issues.push(CombineIssue::UnknownOptionGroup {
                        transformer_name: transformer.transformer_name.clone(),
                        group_name: group_name.clone(),
                        read_from: sourced.read_from.clone(),
                    });
                }
            }
            transformer.transform_options = known_refs;

            let root_options = self.lookup_options(&transformer.transform_options);
            combined.push(CombinedTransformer {
                transformer,
                root_options,
                read_from: sourced.read_from.clone(),
            });
        }
        self.combined = combined;
    }

    /// Build the root option group from a transformer's references. A single
    /// referenced group contributes its options directly; multiple
    /// references are each wrapped as an optional sub-group, so supplying an
    /// option from one group does not make another group's options required.
    fn lookup_options(&self, group_names: &[String]) -> TransformOptionGroup {
        let children = match group_names {
            [] => Vec::new(),
            [single] => self.transform_options[single].clone(),
            many => many
                .iter()
                .map(|name| {
                    TransformOption::Group(TransformOptionGroup::new(
                        false,
                        self.transform_options[name].clone(),
                    ))
                })
                .collect(),
        };
        TransformOptionGroup::new(true, children)
    }

    /// The combined catalog. Populated by [`CombinedConfig::combine`].
    pub fn transformers(&self) -> &[CombinedTransformer] {
        &self.combined
    }

    /// Re-export the combined catalog in the document shape it was ingested
    /// in, for management endpoints reporting the fleet's effective
    /// capability. Ingesting the export through a fresh aggregator with no
    /// directives reproduces this catalog exactly.
    pub fn build_transform_config(&self) -> TransformConfig {
        TransformConfig {
            transform_options: self.transform_options.clone(),
            transformers: self.combined.iter().map(|t| t.transformer.clone()).collect(),
            ..TransformConfig::default()
        }
    }
}
