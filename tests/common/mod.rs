// tests/common/mod.rs

//! Shared fixtures for integration tests: capability documents modeled on a
//! small conversion fleet (an image engine, an office engine and an
//! all-in-one fallback).

use std::collections::HashMap;

use transform_registry::{CombinedConfig, Registry, TransformConfig};

pub const IMAGEMAGICK: &str = r#"{
    "transformOptions": {
        "imageMagickOptions": [
            {"value": {"name": "resizeWidth"}},
            {"value": {"name": "resizeHeight"}},
            {"group": {"transformOptions": [
                {"value": {"name": "cropX", "required": true}},
                {"value": {"name": "cropY", "required": true}},
                {"value": {"name": "cropGravity"}}
            ]}}
        ]
    },
    "transformers": [
        {
            "transformerName": "imagemagick",
            "coreVersion": "5.2.1",
            "supportedSourceAndTargetList": [
                {"sourceMediaType": "image/tiff", "targetMediaType": "image/png",
                 "maxSourceSizeBytes": 1048576, "priority": 10},
                {"sourceMediaType": "image/png", "targetMediaType": "image/jpeg",
                 "maxSourceSizeBytes": 52428800, "priority": 50}
            ],
            "transformOptions": ["imageMagickOptions"]
        }
    ]
}"#;

pub const LIBREOFFICE: &str = r#"{
    "transformers": [
        {
            "transformerName": "libreoffice",
            "coreVersion": "2.5.7",
            "supportedSourceAndTargetList": [
                {"sourceMediaType": "application/msword", "targetMediaType": "application/pdf",
                 "maxSourceSizeBytes": 18874368},
                {"sourceMediaType": "text/csv", "targetMediaType": "application/pdf"}
            ]
        }
    ]
}"#;

pub const ALL_IN_ONE: &str = r#"{
    "transformOptions": {
        "aioImageOptions": [
            {"value": {"name": "resizeWidth"}},
            {"value": {"name": "resizeHeight"}},
            {"group": {"transformOptions": [
                {"value": {"name": "cropX", "required": true}},
                {"value": {"name": "cropY", "required": true}},
                {"value": {"name": "cropGravity"}}
            ]}}
        ]
    },
    "transformers": [
        {
            "transformerName": "aio",
            "coreVersion": "2.3.0",
            "supportedSourceAndTargetList": [
                {"sourceMediaType": "image/tiff", "targetMediaType": "image/png",
                 "maxSourceSizeBytes": -1, "priority": 20}
            ],
            "transformOptions": ["aioImageOptions"]
        }
    ]
}"#;

/// Combine the given documents, asserting a clean combination, and build a
/// registry from the result.
pub fn registry_from(docs: &[(&str, &str)]) -> Registry {
    combined_and_registry(docs).1
}

pub fn combined_and_registry(docs: &[(&str, &str)]) -> (CombinedConfig, Registry) {
    let mut combined = CombinedConfig::new();
    for (read_from, json) in docs {
        combined
            .add_config(TransformConfig::from_json(json).unwrap(), read_from)
            .unwrap();
    }
    let issues = combined.combine();
    assert!(issues.is_empty(), "unexpected combine issues: {issues:?}");
    let registry = Registry::from_combined(&combined);
    (combined, registry)
}

pub fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
