//! Parsing of declared UI5 version strings.
//!
//! Manifests either pin an exact patch (`1.120.4`) or accept any patch of a
//! minor line (`1.120.*`, also written `1.120.x`). Parsing never fails:
//! garbage still yields a specifier, and the catalogue lookup later reports
//! it as an unknown version.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn wildcard_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.\d+\.\*$").expect("wildcard pattern is valid"))
}

fn numeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("numeric pattern is valid")
    })
}

/// Best-effort `major.minor.patch` triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Coerce the first numeric run found in `raw`; missing parts become
    /// zero, no digits at all yields `0.0.0`.
    pub fn coerce(raw: &str) -> Self {
        let Some(caps) = numeric_pattern().captures(raw) else {
            return Self::default();
        };
        let part = |i: usize| {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .unwrap_or(0)
        };
        Self::new(part(1), part(2), part(3))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parsed form of a declared version string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSpecifier {
    /// Declared text with an `x`/`X` patch placeholder replaced by `*`.
    pub raw: String,

    /// Coerced numeric version; `patch` is meaningless for wildcards.
    pub semver: SemanticVersion,

    /// `true` for the `<major>.<minor>.*` form.
    pub is_wildcard_patch: bool,
}

impl VersionSpecifier {
    /// Parse a declared version string.
    pub fn parse(raw: &str) -> Self {
        let normalized = normalize_placeholder(raw.trim());
        let semver = SemanticVersion::coerce(&normalized);
        let is_wildcard_patch = wildcard_pattern().is_match(&normalized);
        Self {
            raw: normalized,
            semver,
            is_wildcard_patch,
        }
    }

    /// Key of the owning minor line, `<major>.<minor>.*`.
    pub fn major_minor_key(&self) -> String {
        format!("{}.{}.*", self.semver.major, self.semver.minor)
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Replace the first `x`/`X` with `*`.
pub fn normalize_placeholder(raw: &str) -> String {
    raw.replacen(['x', 'X'], "*", 1)
}
