//! Wire types of `versionoverview.json`.
//!
//! Only the fields ui5vc reads are modelled; everything else in the
//! document is ignored by serde.

use serde::{Deserialize, Serialize};

/// Value of `support` for version lines that still receive fixes.
pub const MAINTENANCE_SUPPORT: &str = "Maintenance";

/// The full overview document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VersionOverview {
    /// Minor version lines, newest first as published.
    #[serde(default)]
    pub versions: Vec<FeedVersion>,

    /// Individual patches across all lines.
    #[serde(default)]
    pub patches: Vec<FeedPatch>,
}

/// One minor version line (e.g. `1.120.*`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedVersion {
    /// Version key in `<major>.<minor>.*` form.
    pub version: String,

    /// `"Maintenance"` or `"Out of maintenance"`.
    #[serde(default)]
    pub support: String,

    /// Long term support line.
    #[serde(default)]
    pub lts: bool,

    /// End of maintenance quarter, informational only.
    #[serde(default)]
    pub eom: String,

    /// End of cloud provisioning quarter (`Qn/YYYY`) or a placeholder.
    #[serde(default)]
    pub eocp: String,
}

impl FeedVersion {
    /// Whether the line is still maintained.
    pub fn is_maintained(&self) -> bool {
        self.support == MAINTENANCE_SUPPORT
    }
}

/// One concrete patch (e.g. `1.120.4`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedPatch {
    pub version: String,

    #[serde(default)]
    pub eocp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

impl FeedPatch {
    /// Patches flagged removed or hidden must never be offered.
    pub fn is_listed(&self) -> bool {
        !self.removed.unwrap_or(false) && !self.hidden.unwrap_or(false)
    }
}

impl VersionOverview {
    /// Parse an overview from raw JSON text.
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
