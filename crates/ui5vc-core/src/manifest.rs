//! Manifest access: declared version, in-place rewrite and discovery.
//!
//! The declared version lives at `sap.platform.cf.ui5VersionNumber`. A
//! manifest without it is skipped, not rejected. Rewriting is a textual
//! substitution of that one value so the rest of the file stays
//! byte-identical.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::{Captures, Regex};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::domain::{ManifestError, VersionSpecifier};

/// File name looked for below every manifest path pattern.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Pattern used when no manifest paths are given.
pub const DEFAULT_MANIFEST_PATTERN: &str = "**";

fn version_entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"("sap\.platform\.cf"\s*:\s*\{[^{}]*?"ui5VersionNumber"\s*:\s*")([^"]*)(")"#)
            .expect("version entry pattern is valid")
    })
}

// ---------------------------------------------------------------------------
// Reading and rewriting
// ---------------------------------------------------------------------------

/// Declared version of a parsed manifest, if any.
pub fn declared_version(manifest: &Value) -> Option<VersionSpecifier> {
    let raw = manifest
        .get("sap.platform.cf")?
        .get("ui5VersionNumber")?
        .as_str()?
        .trim();
    if raw.is_empty() {
        return None;
    }
    Some(VersionSpecifier::parse(raw))
}

/// Parse manifest text and extract the declared version.
pub fn read_declared_version(content: &str) -> Result<Option<VersionSpecifier>, serde_json::Error> {
    let manifest: Value = serde_json::from_str(content)?;
    Ok(declared_version(&manifest))
}

/// Replace the declared version inside the `sap.platform.cf` block.
///
/// Returns `None` when the manifest has no such entry.
pub fn rewrite_declared_version(content: &str, version: &str) -> Option<String> {
    let pattern = version_entry_pattern();
    if !pattern.is_match(content) {
        return None;
    }
    let rewritten = pattern.replace(content, |caps: &Captures<'_>| {
        format!("{}{}{}", &caps[1], version, &caps[3])
    });
    Some(rewritten.into_owned())
}

// ---------------------------------------------------------------------------
// Records and persistence
// ---------------------------------------------------------------------------

/// What the check orchestrator needs to know about one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    /// Path relative to the check's base path.
    pub rel_path: String,
    /// Declared version; `None` means "skip".
    pub declared: Option<VersionSpecifier>,
}

impl ManifestRecord {
    pub fn new(rel_path: impl Into<String>, declared: Option<VersionSpecifier>) -> Self {
        Self {
            rel_path: rel_path.into(),
            declared,
        }
    }

    /// Read and parse `base/rel_path`.
    pub fn load(base: &Path, rel_path: &str) -> Result<Self, ManifestError> {
        let path = base.join(rel_path);
        let content = std::fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
        let declared =
            read_declared_version(&content).map_err(|source| ManifestError::Parse { path, source })?;
        if declared.is_none() {
            debug!(manifest = %rel_path, "No 'sap.platform.cf/ui5VersionNumber' entry");
        }
        Ok(Self::new(rel_path, declared))
    }
}

/// Load every manifest in `rel_paths` below `base`.
pub fn load_records(base: &Path, rel_paths: &[String]) -> Result<Vec<ManifestRecord>, ManifestError> {
    rel_paths
        .iter()
        .map(|rel| ManifestRecord::load(base, rel))
        .collect()
}

/// Persistence hook invoked when a manifest gets a replacement version.
pub trait ManifestWriter {
    fn persist(&mut self, rel_path: &str, version: &str, is_lts: bool) -> Result<(), ManifestError>;
}

/// Writes replacement versions back to manifests below a base path.
#[derive(Debug, Clone)]
pub struct FsManifestWriter {
    base: PathBuf,
}

impl FsManifestWriter {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl ManifestWriter for FsManifestWriter {
    fn persist(&mut self, rel_path: &str, version: &str, is_lts: bool) -> Result<(), ManifestError> {
        let path = self.base.join(rel_path);
        let content = std::fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
        let updated = rewrite_declared_version(&content, version)
            .ok_or_else(|| ManifestError::NoVersionEntry { path: path.clone() })?;
        std::fs::write(&path, updated).map_err(|source| ManifestError::Write {
            path: path.clone(),
            source,
        })?;
        info!(manifest = %rel_path, version = %version, lts = is_lts, "Manifest updated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

fn compile_patterns(patterns: &[String]) -> Result<GlobSet, ManifestError> {
    let mut builder = GlobSetBuilder::new();
    let defaults = [DEFAULT_MANIFEST_PATTERN.to_string()];
    let patterns = if patterns.is_empty() { &defaults[..] } else { patterns };

    for pattern in patterns {
        let trimmed = pattern.trim_end_matches('/');
        let full = if trimmed.is_empty() || trimmed == "." {
            MANIFEST_FILE_NAME.to_string()
        } else {
            format!("{trimmed}/{MANIFEST_FILE_NAME}")
        };
        let glob = GlobBuilder::new(&full)
            .literal_separator(true)
            .build()
            .map_err(|e| ManifestError::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }

    builder.build().map_err(|e| ManifestError::Pattern {
        pattern: patterns.join(","),
        message: e.to_string(),
    })
}

/// Relative paths of all regular files below `dir`, `/`-separated.
/// Hidden entries are skipped.
fn walk(dir: &Path, prefix: &str, files: &mut Vec<String>) -> Result<(), ManifestError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let rel = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&entry.path(), &rel, files)?;
        } else if file_type.is_file() {
            files.push(rel);
        }
    }
    Ok(())
}

/// Find manifests below `base`.
///
/// Every pattern `p` matches `p/manifest.json` relative to `base`; an empty
/// pattern list means `**`. Results are sorted and unique.
pub fn discover_manifests(base: &Path, patterns: &[String]) -> Result<Vec<String>, ManifestError> {
    let globs = compile_patterns(patterns)?;
    let mut files = Vec::new();
    walk(base, "", &mut files)?;

    let mut found: Vec<String> = files
        .into_iter()
        .filter(|rel| rel.ends_with(MANIFEST_FILE_NAME) && globs.is_match(rel))
        .collect();
    found.sort();
    found.dedup();

    debug!(base = ?base, count = found.len(), "Manifests discovered");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"{
    "_version": "1.59.0",
    "sap.app": {
        "id": "rating"
    },
    "sap.platform.cf": {
        "ui5VersionNumber": "1.120.x"
    }
}
"#;

    #[test]
    fn test_read_declared_version_normalizes_placeholder() {
        let spec = read_declared_version(MANIFEST).unwrap().unwrap();
        assert_eq!(spec.raw, "1.120.*");
        assert!(spec.is_wildcard_patch);
    }

    #[test]
    fn test_missing_section_is_skip() {
        assert!(read_declared_version(r#"{"sap.app": {}}"#).unwrap().is_none());
        assert!(read_declared_version(r#"{"sap.platform.cf": {}}"#).unwrap().is_none());
        assert!(read_declared_version(r#"{"sap.platform.cf": {"ui5VersionNumber": ""}}"#)
            .unwrap()
            .is_none());
        assert!(read_declared_version(r#"{"sap.platform.cf": {"ui5VersionNumber": 1}}"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(read_declared_version("{ not json").is_err());
    }

    #[test]
    fn test_rewrite_preserves_everything_else() {
        let updated = rewrite_declared_version(MANIFEST, "1.134.*").unwrap();
        assert_eq!(updated, MANIFEST.replace("1.120.x", "1.134.*"));
    }

    #[test]
    fn test_rewrite_with_sibling_keys_first() {
        let content = r#"{"sap.platform.cf": {"oAuthScopes": ["a"], "ui5VersionNumber": "1.96.3"}, "x": {"ui5VersionNumber": "keep"}}"#;
        let updated = rewrite_declared_version(content, "1.120.*").unwrap();
        assert!(updated.contains(r#""ui5VersionNumber": "1.120.*"}"#));
        assert!(updated.contains(r#""ui5VersionNumber": "keep""#));
    }

    #[test]
    fn test_rewrite_without_entry() {
        assert!(rewrite_declared_version(r#"{"sap.app": {}}"#, "1.120.*").is_none());
    }

    #[test]
    fn test_fs_writer_updates_file() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("app/webapp")).unwrap();
        std::fs::write(dir.path().join("app/webapp/manifest.json"), MANIFEST).unwrap();

        let mut writer = FsManifestWriter::new(dir.path());
        writer
            .persist("app/webapp/manifest.json", "1.134.*", false)
            .unwrap();

        let loaded = ManifestRecord::load(dir.path(), "app/webapp/manifest.json").unwrap();
        assert_eq!(loaded.declared.unwrap().raw, "1.134.*");
    }

    #[test]
    fn test_fs_writer_missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let mut writer = FsManifestWriter::new(dir.path());
        let err = writer.persist("nope/manifest.json", "1.134.*", false).unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
    }

    #[test]
    fn test_discover_default_pattern() {
        let dir = tempdir().unwrap();
        for sub in ["app/a/webapp", "app/b/webapp", ".git/x", "docs"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        std::fs::write(dir.path().join("app/a/webapp/manifest.json"), "{}").unwrap();
        std::fs::write(dir.path().join("app/b/webapp/manifest.json"), "{}").unwrap();
        std::fs::write(dir.path().join(".git/x/manifest.json"), "{}").unwrap();
        std::fs::write(dir.path().join("docs/readme.md"), "").unwrap();

        let found = discover_manifests(dir.path(), &[]).unwrap();
        assert_eq!(
            found,
            vec![
                "app/a/webapp/manifest.json".to_string(),
                "app/b/webapp/manifest.json".to_string()
            ]
        );
    }

    #[test]
    fn test_discover_specific_pattern() {
        let dir = tempdir().unwrap();
        for sub in ["app/a/webapp", "app/b/webapp"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
            std::fs::write(dir.path().join(sub).join("manifest.json"), "{}").unwrap();
        }
        let found = discover_manifests(dir.path(), &["app/b/*".to_string()]).unwrap();
        assert_eq!(found, vec!["app/b/webapp/manifest.json".to_string()]);
    }

    #[test]
    fn test_load_keeps_relative_path_only() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("lib/manifest.json"), r#"{"sap.app": {}}"#).unwrap();

        let record = ManifestRecord::load(dir.path(), "lib/manifest.json").unwrap();
        assert_eq!(record, ManifestRecord::new("lib/manifest.json", None));
    }

    #[test]
    fn test_load_invalid_json_is_parse_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("manifest.json"), "{ \"sap.app\": ").unwrap();
        let err = ManifestRecord::load(dir.path(), "manifest.json").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn test_load_records() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("manifest.json"), MANIFEST).unwrap();
        let records = load_records(dir.path(), &["manifest.json".to_string()]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].declared.as_ref().unwrap().raw, "1.120.*");
    }
}
