//! In-memory catalogue of UI5 minor lines and patches.
//!
//! Built once per check run from the version overview and read-only
//! afterwards. Minor lines keep the order in which the feed lists them
//! (newest first), which the replacement selector relies on.

use super::error::CatalogueError;
use super::lifecycle::{LifecycleCalculator, LifecycleFact};
use super::specifier::SemanticVersion;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use ui5_version_feed::VersionOverview;

/// One minor version line, keyed `<major>.<minor>.*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinorVersionLine {
    pub key: String,
    pub semver: SemanticVersion,
    pub is_lts: bool,
    pub has_reached_end_of_maintenance: bool,
    pub lifecycle: LifecycleFact,
}

impl MinorVersionLine {
    pub fn new(key: &str, is_lts: bool, has_reached_eom: bool, lifecycle: LifecycleFact) -> Self {
        Self {
            key: key.to_string(),
            semver: SemanticVersion::coerce(key),
            is_lts,
            has_reached_end_of_maintenance: has_reached_eom,
            lifecycle,
        }
    }

    /// Still provisioned and maintained.
    pub fn is_eligible(&self) -> bool {
        !self.lifecycle.has_reached_eocp && !self.has_reached_end_of_maintenance
    }
}

/// One concrete patch, keyed by its exact version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchEntry {
    pub version: String,
    pub semver: SemanticVersion,
    pub lifecycle: LifecycleFact,
}

impl PatchEntry {
    pub fn new(version: &str, lifecycle: LifecycleFact) -> Self {
        Self {
            version: version.to_string(),
            semver: SemanticVersion::coerce(version),
            lifecycle,
        }
    }
}

/// Read access used by the validator.
pub trait VersionIndex {
    /// Minor line by `<major>.<minor>.*` key.
    fn minor_line(&self, key: &str) -> Option<&MinorVersionLine>;

    /// Patch by exact version.
    fn patch(&self, version: &str) -> Option<&PatchEntry>;
}

/// All known minor lines and patches.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    lines: Vec<MinorVersionLine>,
    line_index: HashMap<String, usize>,
    patches: HashMap<String, PatchEntry>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalogue from the raw overview.
    ///
    /// Removed and hidden patches are dropped. Lines whose `support` is not
    /// `Maintenance` are marked as having reached end of maintenance.
    ///
    /// # Errors
    ///
    /// `CatalogueError::NoVersions` when the overview lists no versions.
    pub fn from_overview(
        overview: &VersionOverview,
        calculator: &LifecycleCalculator,
    ) -> Result<Self, CatalogueError> {
        if overview.versions.is_empty() {
            return Err(CatalogueError::NoVersions);
        }

        let mut catalogue = Catalogue::new();

        for patch in overview.patches.iter().filter(|p| p.is_listed()) {
            catalogue.insert_patch(PatchEntry::new(
                &patch.version,
                calculator.fact(&patch.eocp),
            ));
        }

        for version in &overview.versions {
            catalogue.insert_line(MinorVersionLine::new(
                &version.version,
                version.lts,
                !version.is_maintained(),
                calculator.fact(&version.eocp),
            ));
        }

        debug!(
            lines = catalogue.lines.len(),
            patches = catalogue.patches.len(),
            skipped_patches = overview.patches.len() - catalogue.patches.len(),
            "Catalogue built"
        );

        Ok(catalogue)
    }

    /// Add a minor line. Replacing an existing key keeps its position.
    pub fn insert_line(&mut self, line: MinorVersionLine) {
        match self.line_index.get(&line.key) {
            Some(&idx) => self.lines[idx] = line,
            None => {
                self.line_index.insert(line.key.clone(), self.lines.len());
                self.lines.push(line);
            }
        }
    }

    /// Add a patch, replacing any entry with the same version.
    pub fn insert_patch(&mut self, patch: PatchEntry) {
        self.patches.insert(patch.version.clone(), patch);
    }

    /// Builder form of [`Catalogue::insert_line`].
    pub fn with_line(mut self, line: MinorVersionLine) -> Self {
        self.insert_line(line);
        self
    }

    /// Builder form of [`Catalogue::insert_patch`].
    pub fn with_patch(mut self, patch: PatchEntry) -> Self {
        self.insert_patch(patch);
        self
    }

    /// Minor lines in feed order.
    pub fn minor_lines(&self) -> impl Iterator<Item = &MinorVersionLine> {
        self.lines.iter()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl VersionIndex for Catalogue {
    fn minor_line(&self, key: &str) -> Option<&MinorVersionLine> {
        self.line_index.get(key).map(|&idx| &self.lines[idx])
    }

    fn patch(&self, version: &str) -> Option<&PatchEntry> {
        self.patches.get(version)
    }
}
