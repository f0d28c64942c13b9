//! Domain models for ui5vc.
//!
//! Canonical definitions for the core entities:
//! - `LifecycleFact`: EOCP state derived from a `Qn/YYYY` quarter
//! - `Catalogue`: minor version lines and patches from the overview
//! - `VersionSpecifier`: a parsed declared version string

pub mod catalogue;
pub mod error;
pub mod lifecycle;
pub mod specifier;

// Re-export main types and errors
pub use catalogue::{Catalogue, MinorVersionLine, PatchEntry, VersionIndex};
pub use error::{CatalogueError, CheckError, ManifestError, Result, SelectionError};
pub use lifecycle::{
    compute_lifecycle, quarter_bounds, LifecycleCache, LifecycleCalculator, LifecycleFact,
};
pub use specifier::{normalize_placeholder, SemanticVersion, VersionSpecifier};
