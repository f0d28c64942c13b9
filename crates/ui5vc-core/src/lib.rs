//! ui5vc Core Library
//!
//! Validates the UI5 versions declared in application manifests against the
//! public version overview and picks replacement versions for outdated ones.

pub mod check;
pub mod domain;
pub mod manifest;
pub mod reporting;
pub mod selector;
pub mod source;
pub mod telemetry;
pub mod validation;

pub use check::{
    CheckOptions, CheckSummary, ManifestStatus, SummaryRow, VersionCheck, MESSAGE_SEPARATOR,
    UNCHANGED,
};

pub use domain::{
    compute_lifecycle, Catalogue, CatalogueError, CheckError, LifecycleCache, LifecycleCalculator,
    LifecycleFact, ManifestError, MinorVersionLine, PatchEntry, Result, SelectionError,
    SemanticVersion, VersionIndex, VersionSpecifier,
};

pub use manifest::{
    discover_manifests, load_records, read_declared_version, rewrite_declared_version,
    FsManifestWriter, ManifestRecord, ManifestWriter,
};

pub use reporting::{render_summary_md, write_summary_json, write_summary_md};

pub use selector::{latest_version, select_replacement};

pub use source::{
    fetch_and_validate, fetch_catalogue, fetch_latest_version, CatalogueSource, StaticSource,
};

pub use telemetry::init_tracing;

pub use validation::{
    validate, validate_versions, Severity, ValidationMessage, ValidationOptions,
    ValidationResult, ValidationVerdict, VersionValidator, DEFAULT_ALLOWED_DAYS_BEFORE_EOCP,
};

/// Crate version, reported by `ui5vc version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
