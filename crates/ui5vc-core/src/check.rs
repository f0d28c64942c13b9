//! Check orchestration.
//!
//! A [`VersionCheck`] fetches the catalogue once per run, validates every
//! manifest record in input order and, when fixing is enabled, rewrites
//! invalid manifests to a single replacement version chosen once per run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{Catalogue, CheckError, LifecycleCache, LifecycleCalculator};
use crate::manifest::{load_records, FsManifestWriter, ManifestRecord, ManifestWriter};
use crate::selector::select_replacement;
use crate::source::{fetch_catalogue, CatalogueSource};
use crate::validation::{
    ValidationOptions, ValidationVerdict, VersionValidator, DEFAULT_ALLOWED_DAYS_BEFORE_EOCP,
};

/// Separator used when joining validation messages into a status text.
pub const MESSAGE_SEPARATOR: &str = "<br/>";

/// Placeholder for "no new version".
pub const UNCHANGED: &str = "-";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Options for a check run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckOptions {
    pub allowed_days_before_eocp: i64,
    /// Only LTS lines qualify as replacement.
    #[serde(rename = "useLTS")]
    pub use_lts: bool,
    pub eom_allowed: bool,
    /// Rewrite invalid manifests instead of reporting them as errors.
    pub fix_outdated: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            allowed_days_before_eocp: DEFAULT_ALLOWED_DAYS_BEFORE_EOCP,
            use_lts: true,
            eom_allowed: true,
            fix_outdated: false,
        }
    }
}

impl CheckOptions {
    pub fn validation(&self) -> ValidationOptions {
        ValidationOptions {
            allowed_days_before_eocp: self.allowed_days_before_eocp,
            eom_allowed: self.eom_allowed,
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Outcome of one manifest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ManifestStatus {
    Ok,
    Warn,
    Error,
}

impl ManifestStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            ManifestStatus::Ok => "✅",
            ManifestStatus::Warn => "⚠️",
            ManifestStatus::Error => "❌",
        }
    }
}

/// One row of the check summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryRow {
    pub rel_path: String,
    pub old_version: String,
    pub new_version: String,
    pub status: ManifestStatus,
    pub status_icon: String,
    pub status_text: String,
}

impl SummaryRow {
    fn new(
        record: &ManifestRecord,
        old_version: &str,
        new_version: &str,
        status: ManifestStatus,
        status_text: String,
    ) -> Self {
        Self {
            rel_path: record.rel_path.clone(),
            old_version: old_version.to_string(),
            new_version: new_version.to_string(),
            status,
            status_icon: status.icon().to_string(),
            status_text,
        }
    }

    /// Row for a manifest that keeps its version.
    fn unchanged(record: &ManifestRecord, old_version: &str, verdict: &ValidationVerdict) -> Self {
        let (status, text) = if verdict.messages.is_empty() {
            (ManifestStatus::Ok, "No change required".to_string())
        } else {
            (ManifestStatus::Warn, verdict.joined(MESSAGE_SEPARATOR))
        };
        Self::new(record, old_version, UNCHANGED, status, text)
    }
}

/// Accumulated result of a check run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckSummary {
    pub rows: Vec<SummaryRow>,
    pub updated_files: Vec<String>,
    pub error_count: usize,
}

impl CheckSummary {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn count(&self, status: ManifestStatus) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Replacement picked for the current run.
#[derive(Debug, Clone)]
struct Replacement {
    version: String,
    is_lts: bool,
}

/// Validates (and optionally fixes) manifests against a fetched catalogue.
pub struct VersionCheck {
    options: CheckOptions,
    cache: Arc<LifecycleCache>,
    reference_time: Option<DateTime<Utc>>,
    replacement: Option<Replacement>,
    summary: CheckSummary,
}

impl VersionCheck {
    pub fn new(options: CheckOptions) -> Self {
        Self {
            options,
            cache: Arc::new(LifecycleCache::new()),
            reference_time: None,
            replacement: None,
            summary: CheckSummary::default(),
        }
    }

    /// Evaluate lifecycle facts at `now` instead of the wall clock.
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    /// Share a lifecycle cache with other components.
    pub fn with_cache(mut self, cache: Arc<LifecycleCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    pub fn summary(&self) -> &CheckSummary {
        &self.summary
    }

    pub fn has_errors(&self) -> bool {
        self.summary.has_errors()
    }

    pub fn updated_files(&self) -> &[String] {
        &self.summary.updated_files
    }

    /// Run the check over `records`.
    ///
    /// Catalogue and replacement-selection failures abort the run. Rows built
    /// before the failure stay available through [`VersionCheck::summary`].
    pub async fn run(
        &mut self,
        source: &dyn CatalogueSource,
        records: &[ManifestRecord],
        writer: &mut dyn ManifestWriter,
    ) -> Result<&CheckSummary, CheckError> {
        self.summary = CheckSummary::default();
        self.replacement = None;
        self.cache.reset();

        let now = self.reference_time.unwrap_or_else(Utc::now);
        let calculator = LifecycleCalculator::new(Arc::clone(&self.cache), now);
        let catalogue = fetch_catalogue(source, &calculator).await?;

        info!(
            manifests = records.len(),
            lines = catalogue.line_count(),
            patches = catalogue.patch_count(),
            fix = self.options.fix_outdated,
            "Starting version check"
        );

        for record in records {
            self.check_manifest(&catalogue, record, writer)?;
        }

        info!(
            ok = self.summary.count(ManifestStatus::Ok),
            warn = self.summary.count(ManifestStatus::Warn),
            error = self.summary.count(ManifestStatus::Error),
            updated = self.summary.updated_files.len(),
            "Version check finished"
        );
        Ok(&self.summary)
    }

    /// Load manifests below `base` and run the check, writing fixes to disk.
    pub async fn run_in(
        &mut self,
        source: &dyn CatalogueSource,
        base: &Path,
        rel_paths: &[String],
    ) -> Result<&CheckSummary, CheckError> {
        let records = load_records(base, rel_paths)?;
        let mut writer = FsManifestWriter::new(base);
        self.run(source, &records, &mut writer).await
    }

    fn check_manifest(
        &mut self,
        catalogue: &Catalogue,
        record: &ManifestRecord,
        writer: &mut dyn ManifestWriter,
    ) -> Result<(), CheckError> {
        let Some(specifier) = &record.declared else {
            debug!(manifest = %record.rel_path, "No declared version, skipping");
            return Ok(());
        };

        let verdict =
            VersionValidator::new(catalogue, self.options.validation()).validate(specifier);
        debug!(
            manifest = %record.rel_path,
            version = %specifier.raw,
            valid = verdict.is_valid,
            "Manifest validated"
        );

        let row = if verdict.is_valid {
            SummaryRow::unchanged(record, &specifier.raw, &verdict)
        } else if self.options.fix_outdated {
            let replacement = self.replacement(catalogue)?;
            writer.persist(&record.rel_path, &replacement.version, replacement.is_lts)?;
            self.summary.updated_files.push(record.rel_path.clone());

            let text = if replacement.is_lts {
                "Version has been updated to latest LTS version"
            } else {
                "Version has been updated to latest version"
            };
            SummaryRow::new(
                record,
                &specifier.raw,
                &replacement.version,
                ManifestStatus::Ok,
                text.to_string(),
            )
        } else {
            warn!(manifest = %record.rel_path, version = %specifier.raw, "Invalid version");
            self.summary.error_count += 1;
            SummaryRow::new(
                record,
                &specifier.raw,
                UNCHANGED,
                ManifestStatus::Error,
                verdict.joined(MESSAGE_SEPARATOR),
            )
        };

        self.summary.rows.push(row);
        Ok(())
    }

    /// Replacement for this run, selected on first use.
    fn replacement(&mut self, catalogue: &Catalogue) -> Result<Replacement, CheckError> {
        if let Some(replacement) = &self.replacement {
            return Ok(replacement.clone());
        }
        let prefer_lts = self.options.use_lts;
        let line = select_replacement(catalogue, prefer_lts)?;
        let replacement = Replacement {
            version: line.key.clone(),
            is_lts: prefer_lts,
        };
        info!(version = %replacement.version, lts = prefer_lts, "Replacement version selected");
        self.replacement = Some(replacement.clone());
        Ok(replacement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ManifestError, SelectionError, VersionSpecifier};
    use crate::source::StaticSource;
    use ui5_version_feed::{FeedVersion, VersionOverview};

    #[derive(Default)]
    struct RecordingWriter {
        writes: Vec<(String, String, bool)>,
    }

    impl ManifestWriter for RecordingWriter {
        fn persist(&mut self, rel_path: &str, version: &str, is_lts: bool) -> Result<(), ManifestError> {
            self.writes
                .push((rel_path.to_string(), version.to_string(), is_lts));
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-15T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn version(key: &str, support: &str, lts: bool, eocp: &str) -> FeedVersion {
        FeedVersion {
            version: key.to_string(),
            support: support.to_string(),
            lts,
            eom: String::new(),
            eocp: eocp.to_string(),
        }
    }

    fn source() -> StaticSource {
        StaticSource::new(VersionOverview {
            versions: vec![
                version("1.134.*", "Maintenance", false, "Q1/2026"),
                version("1.132.*", "Out of maintenance", false, "Q2/2026"),
                version("1.120.*", "Maintenance", true, "Q1/2026"),
            ],
            patches: vec![],
        })
    }

    fn record(path: &str, version: Option<&str>) -> ManifestRecord {
        ManifestRecord::new(path, version.map(VersionSpecifier::parse))
    }

    fn options(fix: bool, lts: bool) -> CheckOptions {
        CheckOptions {
            fix_outdated: fix,
            use_lts: lts,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_options() {
        let options = CheckOptions::default();
        assert!(options.use_lts);
        assert!(options.eom_allowed);
        assert!(!options.fix_outdated);
        assert_eq!(options.allowed_days_before_eocp, 30);
    }

    #[test]
    fn test_options_serde_names() {
        let options: CheckOptions =
            serde_json::from_str(r#"{"useLTS": false, "fixOutdated": true}"#).unwrap();
        assert!(!options.use_lts);
        assert!(options.fix_outdated);
        assert!(options.eom_allowed);
    }

    #[tokio::test]
    async fn test_report_only_run() {
        let records = vec![
            record("a/manifest.json", Some("1.134.*")),
            record("b/manifest.json", Some("1.132.*")),
            record("c/manifest.json", Some("1.96.*")),
            record("d/manifest.json", None),
        ];
        let mut writer = RecordingWriter::default();
        let mut check = VersionCheck::new(options(false, false)).with_reference_time(now());
        let summary = check.run(&source(), &records, &mut writer).await.unwrap();

        assert_eq!(summary.rows.len(), 3);
        assert_eq!(summary.rows[0].status, ManifestStatus::Ok);
        assert_eq!(summary.rows[0].status_text, "No change required");
        assert_eq!(summary.rows[0].new_version, "-");
        assert_eq!(summary.rows[1].status, ManifestStatus::Warn);
        assert_eq!(summary.rows[1].status_icon, "⚠️");
        assert_eq!(summary.rows[2].status, ManifestStatus::Error);
        assert_eq!(
            summary.rows[2].status_text,
            "Version 1.96.* is invalid or reached end of cloud provisioning!"
        );
        assert!(check.has_errors());
        assert!(check.updated_files().is_empty());
        assert!(writer.writes.is_empty());
    }

    #[tokio::test]
    async fn test_fix_uses_one_replacement_per_run() {
        let records = vec![
            record("a/manifest.json", Some("1.96.*")),
            record("b/manifest.json", Some("1.134.*")),
            record("c/manifest.json", Some("1.71.4")),
        ];
        let mut writer = RecordingWriter::default();
        let mut check = VersionCheck::new(options(true, true)).with_reference_time(now());
        check.run(&source(), &records, &mut writer).await.unwrap();

        assert_eq!(
            writer.writes,
            vec![
                ("a/manifest.json".to_string(), "1.120.*".to_string(), true),
                ("c/manifest.json".to_string(), "1.120.*".to_string(), true),
            ]
        );
        assert_eq!(check.updated_files(), ["a/manifest.json", "c/manifest.json"]);
        assert!(!check.has_errors());

        let row = &check.summary().rows[0];
        assert_eq!(row.status, ManifestStatus::Ok);
        assert_eq!(row.old_version, "1.96.*");
        assert_eq!(row.new_version, "1.120.*");
        assert_eq!(row.status_text, "Version has been updated to latest LTS version");
    }

    #[tokio::test]
    async fn test_fix_without_candidate_is_fatal() {
        let source = StaticSource::new(VersionOverview {
            versions: vec![version("1.134.*", "Maintenance", false, "Q1/2026")],
            patches: vec![],
        });
        let records = vec![
            record("a/manifest.json", Some("1.134.*")),
            record("b/manifest.json", Some("1.96.*")),
            record("c/manifest.json", Some("1.97.*")),
        ];
        let mut writer = RecordingWriter::default();
        let mut check = VersionCheck::new(options(true, true)).with_reference_time(now());
        let err = check.run(&source, &records, &mut writer).await.unwrap_err();

        assert!(matches!(
            err,
            CheckError::Selection(SelectionError::NoLtsCandidate)
        ));
        assert_eq!(check.summary().rows.len(), 1);
        assert!(writer.writes.is_empty());
    }

    #[tokio::test]
    async fn test_valid_manifests_never_need_a_candidate() {
        let source = StaticSource::new(VersionOverview {
            versions: vec![version("1.134.*", "Maintenance", false, "Q1/2026")],
            patches: vec![],
        });
        let records = vec![record("a/manifest.json", Some("1.134.*"))];
        let mut writer = RecordingWriter::default();
        let mut check = VersionCheck::new(options(true, true)).with_reference_time(now());
        assert!(check.run(&source, &records, &mut writer).await.is_ok());
    }

    #[tokio::test]
    async fn test_each_run_starts_fresh() {
        let records = vec![record("a/manifest.json", Some("1.96.*"))];
        let mut writer = RecordingWriter::default();
        let mut check = VersionCheck::new(options(false, false)).with_reference_time(now());

        check.run(&source(), &records, &mut writer).await.unwrap();
        check.run(&source(), &records, &mut writer).await.unwrap();
        assert_eq!(check.summary().rows.len(), 1);
        assert_eq!(check.summary().error_count, 1);
    }

    #[tokio::test]
    async fn test_empty_catalogue_aborts() {
        let mut writer = RecordingWriter::default();
        let mut check = VersionCheck::new(CheckOptions::default()).with_reference_time(now());
        let err = check
            .run(&StaticSource::default(), &[record("a/manifest.json", Some("1.134.*"))], &mut writer)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No UI5 versions found in response");
    }
}
