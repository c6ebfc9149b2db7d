// src/core_version.rs

//! Engine `coreVersion` gating.
//!
//! Engines declare the version of the shared engine base they were built
//! against. Some protocol functionality only exists from a given base
//! version, so callers ask the registry whether a named transformer's
//! engine is new enough before using it. Version strings are compared
//! leniently: a trailing `-qualifier` (such as `-SNAPSHOT`) is ignored and
//! missing components are padded, so `"2.5"` reads as `2.5.0`.

use semver::Version;

/// Functionality gated on the engine base version a transformer was built
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreFunction {
    /// May be handed a direct-access URL rather than an uploaded file.
    DirectAccessUrl,
    /// May be driven over the message queue rather than HTTP.
    MessageQueue,
    /// Original HTTP protocol; supported by every engine version.
    Http,
    /// Understands the option that preserves the original file name.
    SourceFilename,
}

impl CoreFunction {
    /// Inclusive version range in which the functionality is available.
    /// `None` means unbounded on that side.
    fn range(self) -> (Option<Version>, Option<Version>) {
        match self {
            CoreFunction::DirectAccessUrl => (lenient_version("2.5.7"), None),
            CoreFunction::MessageQueue => (lenient_version("1"), None),
            CoreFunction::Http => (None, None),
            CoreFunction::SourceFilename => (lenient_version("5.1.9"), None),
        }
    }

    /// Whether an engine declaring `core_version` supports this
    /// functionality. A missing or unparsable version counts as the lowest
    /// possible version.
    pub fn is_supported(self, core_version: Option<&str>) -> bool {
        let version = core_version
            .and_then(lenient_version)
            .unwrap_or_else(|| Version::new(0, 0, 0));
        let (from, to) = self.range();
        from.is_none_or(|from| version >= from) && to.is_none_or(|to| version <= to)
    }
}

/// Parse a version string leniently: strip a `-qualifier` suffix, pad
/// missing minor/patch components, reject anything non-numeric.
pub fn lenient_version(version: &str) -> Option<Version> {
    let release = match version.find('-') {
        Some(i) if i > 0 => &version[..i],
        _ => version,
    };

    let mut parts = [0u64; 3];
    let mut count = 0;
    for component in release.split('.') {
        if count == 3 {
            return None;
        }
        parts[count] = component.trim().parse().ok()?;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(Version::new(parts[0], parts[1], parts[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_version_pads_components() {
        assert_eq!(lenient_version("2.5"), Some(Version::new(2, 5, 0)));
        assert_eq!(lenient_version("1"), Some(Version::new(1, 0, 0)));
        assert_eq!(lenient_version("2.5.7"), Some(Version::new(2, 5, 7)));
    }

    #[test]
    fn test_lenient_version_strips_qualifier() {
        assert_eq!(lenient_version("3.0.1-SNAPSHOT"), Some(Version::new(3, 0, 1)));
        assert_eq!(lenient_version("2.5-A1"), Some(Version::new(2, 5, 0)));
    }

    #[test]
    fn test_lenient_version_rejects_garbage() {
        assert_eq!(lenient_version(""), None);
        assert_eq!(lenient_version("abc"), None);
        assert_eq!(lenient_version("1.2.3.4"), None);
    }

    #[test]
    fn test_direct_access_url_boundary() {
        assert!(!CoreFunction::DirectAccessUrl.is_supported(Some("2.5.6")));
        assert!(CoreFunction::DirectAccessUrl.is_supported(Some("2.5.7")));
        assert!(CoreFunction::DirectAccessUrl.is_supported(Some("3.0.0-SNAPSHOT")));
        assert!(!CoreFunction::DirectAccessUrl.is_supported(None));
    }

    #[test]
    fn test_http_always_supported() {
        assert!(CoreFunction::Http.is_supported(None));
        assert!(CoreFunction::Http.is_supported(Some("0.1")));
        assert!(CoreFunction::Http.is_supported(Some("not a version")));
    }

    #[test]
    fn test_source_filename_gate() {
        assert!(!CoreFunction::SourceFilename.is_supported(Some("5.1.8")));
        assert!(CoreFunction::SourceFilename.is_supported(Some("5.1.9")));
        assert!(CoreFunction::SourceFilename.is_supported(Some("5.2")));
    }
}
