//! Error taxonomy for ui5vc.
//!
//! Validation outcomes are data (`ValidationVerdict`), not errors. The
//! types here cover conditions that abort an operation or a whole run.

use std::path::PathBuf;

/// Errors produced while building a catalogue.
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("No UI5 versions found in response")]
    NoVersions,

    #[error("failed to fetch version overview: {0}")]
    Feed(#[from] ui5_version_feed::FeedError),
}

/// Errors produced by the replacement selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("No valid LTS UI5 version found")]
    NoLtsCandidate,

    #[error("No valid UI5 version found")]
    NoCandidate,
}

impl SelectionError {
    pub fn for_preference(prefer_lts: bool) -> Self {
        if prefer_lts {
            SelectionError::NoLtsCandidate
        } else {
            SelectionError::NoCandidate
        }
    }
}

/// Errors produced while reading, rewriting or locating manifests.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write manifest {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest {path:?} has no 'sap.platform.cf' ui5VersionNumber entry to update")]
    NoVersionEntry { path: PathBuf },

    #[error("invalid manifest path pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal errors of a check run.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Result type for ui5vc operations.
pub type Result<T, E = CheckError> = std::result::Result<T, E>;
