// src/config/mod.rs

//! Capability document model.
//!
//! Every conversion engine publishes one JSON document describing what it
//! can do. The document lists its transformers, the (source, target) media
//! type pairs each one supports with a size ceiling and a priority, and a
//! table of named option groups the transformers reference. A document may
//! also carry patch directives (`removeTransformers`, `addSupported`,
//! `removeSupported`, `overrideSupported`, `supportedDefaults`) that adjust
//! conversions declared by *other* documents when everything is combined.
//!
//! # Example
//!
//! ```json
//! {
//!   "transformOptions": {
//!     "imageOptions": [
//!       {"value": {"name": "resizeWidth"}},
//!       {"group": {"transformOptions": [
//!         {"value": {"name": "cropX", "required": true}},
//!         {"value": {"name": "cropY"}}
//!       ]}}
//!     ]
//!   },
//!   "transformers": [
//!     {
//!       "transformerName": "imagemagick",
//!       "supportedSourceAndTargetList": [
//!         {"sourceMediaType": "image/tiff", "targetMediaType": "image/png",
//!          "maxSourceSizeBytes": 1048576, "priority": 50}
//!       ],
//!       "transformOptions": ["imageOptions"]
//!     }
//!   ]
//! }
//! ```

pub mod combine;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Size ceiling meaning "no limit". Sorts after every finite ceiling.
pub const UNLIMITED_SIZE: i64 = -1;

/// Priority applied when a conversion declares none. Lower is better.
pub const DEFAULT_PRIORITY: i32 = 50;

/// Errors raised while loading a capability document
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading capability document: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed capability document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One named option a transformer accepts, and whether the caller must
/// supply it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptionValue {
    pub name: String,

    /// Required leaves only disqualify a candidate when their containing
    /// group is in play for the request. See `registry::options`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
}

/// A nested group of options with conditional requirement semantics: an
/// optional group's required children only become required once the caller
/// supplies at least one option from anywhere inside the group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptionGroup {
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform_options: Vec<TransformOption>,
}

/// Node of the option tree. Externally tagged on the wire:
/// `{"value": {...}}` or `{"group": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformOption {
    Value(TransformOptionValue),
    Group(TransformOptionGroup),
}

impl TransformOptionGroup {
    pub fn new(required: bool, transform_options: Vec<TransformOption>) -> Self {
        TransformOptionGroup { required, transform_options }
    }
}

/// One declared conversion: source to target with a size ceiling and a
/// priority. Unset fields are filled in by `supportedDefaults` during
/// combination, or by the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedSourceAndTarget {
    pub source_media_type: String,
    pub target_media_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_source_size_bytes: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl SupportedSourceAndTarget {
    pub fn new(source: &str, target: &str) -> Self {
        SupportedSourceAndTarget {
            source_media_type: source.to_string(),
            target_media_type: target.to_string(),
            max_source_size_bytes: None,
            priority: None,
        }
    }

    pub fn with_limits(source: &str, target: &str, max_size: i64, priority: i32) -> Self {
        SupportedSourceAndTarget {
            source_media_type: source.to_string(),
            target_media_type: target.to_string(),
            max_source_size_bytes: Some(max_size),
            priority: Some(priority),
        }
    }
}

/// A single transformer's declaration inside a capability document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformer {
    #[serde(default)]
    pub transformer_name: String,

    /// Version of the engine protocol base the transformer was built
    /// against. Gates optional functionality, see `core_version`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_version: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_source_and_target_list: Vec<SupportedSourceAndTarget>,

    /// Names of option groups in the document's `transformOptions` table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transform_options: Vec<String>,
}

/// Directive: drop a conversion some document declared. A transformer name
/// of `"*"` matches every transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveSupported {
    pub transformer_name: String,
    pub source_media_type: String,
    pub target_media_type: String,
}

/// Directive: declare a conversion on an existing transformer that its own
/// document did not list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSupported {
    pub transformer_name: String,
    pub source_media_type: String,
    pub target_media_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_source_size_bytes: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// Directive: replace the size ceiling and/or priority of a declared
/// conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSupported {
    pub transformer_name: String,
    pub source_media_type: String,
    pub target_media_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_source_size_bytes: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// Directive: catalog-wide fallback for conversions that omit their size
/// ceiling or priority. Later declarations win on conflict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_source_size_bytes: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl SupportedDefaults {
    pub fn is_empty(&self) -> bool {
        self.max_source_size_bytes.is_none() && self.priority.is_none()
    }
}

/// The capability document one engine publishes, and the shape the combined
/// catalog is re-exported in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformConfig {
    /// Named option groups shared by the document's transformers.
    /// BTreeMap keeps export deterministic.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub transform_options: BTreeMap<String, Vec<TransformOption>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transformers: Vec<Transformer>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_transformers: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_supported: Vec<AddSupported>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_supported: Vec<RemoveSupported>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub override_supported: Vec<OverrideSupported>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_defaults: Vec<SupportedDefaults>,
}

impl TransformConfig {
    /// Parse a capability document from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a capability document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load a capability document from a file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Serialize back to the wire shape.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}
