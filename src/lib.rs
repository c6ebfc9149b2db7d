// src/lib.rs

//! Transform Registry
//!
//! Capability aggregation and transform-selection engine for a fleet of
//! independent conversion engines (image, office-document, media, text
//! extractors). Each engine publishes a declarative capability document
//! saying which source-type to target-type conversions it supports, under
//! what size ceilings, at what priority and with which named options. This
//! crate merges those documents into one combined catalog and answers the
//! routing question: given "convert X to Y with these options", which
//! registered transformer should handle it?
//!
//! # Architecture
//!
//! - Documents-first: engines describe themselves; the registry never
//!   inspects file content
//! - Patch directives: one document may remove, add or override another
//!   document's declared conversions
//! - Skyline selection: per (source, target) pair the registry keeps the
//!   minimal candidate list covering every input size without dominated
//!   entries
//! - Immutable generations: a full reload atomically swaps the catalog and
//!   every derived cache as a unit
//!
//! The actual transformation work (process execution, file staging, HTTP or
//! queue plumbing) is out of scope; callers dispatch to whatever this engine
//! selects.

pub mod config;
pub mod core_version;
pub mod mediatype;
pub mod registry;

pub use config::combine::{CombineError, CombineIssue, CombinedConfig, CombinedTransformer};
pub use config::{
    AddSupported, ConfigError, OverrideSupported, RemoveSupported, SupportedDefaults,
    SupportedSourceAndTarget, TransformConfig, TransformOption, TransformOptionGroup,
    TransformOptionValue, Transformer, DEFAULT_PRIORITY, UNLIMITED_SIZE,
};
pub use core_version::CoreFunction;
pub use registry::skyline::SupportedTransform;
pub use registry::{Registry, RegistryError, TIMEOUT_OPTION};
