//! Version validation engine.
//!
//! Checks a [`VersionSpecifier`] against a [`VersionIndex`] (normally the
//! [`Catalogue`]) and produces a [`ValidationVerdict`]: a validity flag plus
//! an ordered list of warn/error messages.
//!
//! Two paths exist:
//! - wildcard specifiers (`1.120.*`) are checked against the minor line
//!   itself, using the line's EOCP quarter;
//! - exact patches (`1.120.4`) are checked against the owning minor line
//!   and then against the patch entry and its own EOCP quarter.
//!
//! Validation is pure. Malformed input never errors; it surfaces as an
//! "invalid" verdict.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Catalogue, LifecycleFact, MinorVersionLine, VersionIndex, VersionSpecifier};

/// Default number of days before EOCP below which a version is an error.
pub const DEFAULT_ALLOWED_DAYS_BEFORE_EOCP: i64 = 30;

// ---------------------------------------------------------------------------
// Options and verdict
// ---------------------------------------------------------------------------

/// Validation policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationOptions {
    /// Days remaining in the EOCP quarter below which validation fails.
    pub allowed_days_before_eocp: i64,
    /// End of maintenance only produces a warning when `true`.
    pub eom_allowed: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            allowed_days_before_eocp: DEFAULT_ALLOWED_DAYS_BEFORE_EOCP,
            eom_allowed: true,
        }
    }
}

/// Message severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Error,
}

/// A diagnostic produced during validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationMessage {
    pub text: String,
    pub severity: Severity,
}

impl ValidationMessage {
    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Warn,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
        }
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Outcome of validating one specifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub messages: Vec<ValidationMessage>,
}

impl ValidationVerdict {
    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Warn)
    }

    /// Message texts joined with `separator`.
    pub fn joined(&self, separator: &str) -> String {
        self.messages
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Verdict for a version string, as returned by [`validate_versions`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub version: String,
    pub valid: bool,
    pub messages: Vec<ValidationMessage>,
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Validates specifiers against a version index.
pub struct VersionValidator<'a, I: VersionIndex + ?Sized> {
    index: &'a I,
    options: ValidationOptions,
}

impl<'a, I: VersionIndex + ?Sized> VersionValidator<'a, I> {
    pub fn new(index: &'a I, options: ValidationOptions) -> Self {
        Self { index, options }
    }

    /// Validate one specifier.
    pub fn validate(&self, specifier: &VersionSpecifier) -> ValidationVerdict {
        let mut messages = Vec::new();
        let is_valid = if specifier.is_wildcard_patch {
            self.validate_wildcard(specifier, &mut messages)
        } else {
            self.validate_exact(specifier, &mut messages)
        };
        ValidationVerdict { is_valid, messages }
    }

    fn validate_wildcard(
        &self,
        specifier: &VersionSpecifier,
        messages: &mut Vec<ValidationMessage>,
    ) -> bool {
        let Some(line) = self.provisioned_line(&specifier.raw, specifier, messages) else {
            return false;
        };
        if !self.check_eom(line.has_reached_end_of_maintenance, messages) {
            return false;
        }
        self.check_remaining_days(&line.lifecycle, messages)
    }

    fn validate_exact(
        &self,
        specifier: &VersionSpecifier,
        messages: &mut Vec<ValidationMessage>,
    ) -> bool {
        let key = specifier.major_minor_key();
        let Some(line) = self.provisioned_line(&key, specifier, messages) else {
            return false;
        };
        if !self.check_eom(line.has_reached_end_of_maintenance, messages) {
            return false;
        }

        let Some(patch) = self.index.patch(&specifier.raw) else {
            let v = specifier.semver;
            messages.push(ValidationMessage::error(format!(
                "Patch {} of version {}.{} is not available",
                v.patch, v.major, v.minor
            )));
            return false;
        };

        self.check_remaining_days(&patch.lifecycle, messages)
    }

    /// Minor line for `key`, unless missing or past EOCP.
    fn provisioned_line(
        &self,
        key: &str,
        specifier: &VersionSpecifier,
        messages: &mut Vec<ValidationMessage>,
    ) -> Option<&'a MinorVersionLine> {
        let index: &'a I = self.index;
        match index.minor_line(key) {
            Some(line) if !line.lifecycle.has_reached_eocp => Some(line),
            _ => {
                messages.push(ValidationMessage::error(format!(
                    "Version {} is invalid or reached end of cloud provisioning!",
                    specifier.raw
                )));
                None
            }
        }
    }

    /// `false` when end of maintenance is an error under current options.
    fn check_eom(&self, eom: bool, messages: &mut Vec<ValidationMessage>) -> bool {
        if !eom {
            return true;
        }
        let text = "Version reached end of maintenance!";
        if self.options.eom_allowed {
            messages.push(ValidationMessage::warn(text));
            true
        } else {
            messages.push(ValidationMessage::error(text));
            false
        }
    }

    /// EOCP proximity check.
    ///
    /// Zero remaining days passes without a message, the same as being
    /// outside the final quarter.
    fn check_remaining_days(
        &self,
        fact: &LifecycleFact,
        messages: &mut Vec<ValidationMessage>,
    ) -> bool {
        let remaining = match fact.days_remaining {
            Some(days) if fact.is_in_final_quarter && days > 0 => days,
            _ => return true,
        };

        if remaining < self.options.allowed_days_before_eocp {
            messages.push(ValidationMessage::error(format!(
                "End of cloud provisioning for version imminent ({remaining} days remaining)!"
            )));
            false
        } else {
            messages.push(ValidationMessage::warn(format!(
                "Version is near the end of cloud provisioning ({remaining} days remaining)!"
            )));
            true
        }
    }
}

/// Validate a single specifier against a catalogue.
pub fn validate(
    specifier: &VersionSpecifier,
    catalogue: &Catalogue,
    options: ValidationOptions,
) -> ValidationVerdict {
    VersionValidator::new(catalogue, options).validate(specifier)
}

/// Parse and validate several version strings against a catalogue.
pub fn validate_versions<S: AsRef<str>>(
    versions: &[S],
    catalogue: &Catalogue,
    options: ValidationOptions,
) -> Vec<ValidationResult> {
    let validator = VersionValidator::new(catalogue, options);
    versions
        .iter()
        .map(|raw| {
            let verdict = validator.validate(&VersionSpecifier::parse(raw.as_ref()));
            ValidationResult {
                version: raw.as_ref().to_string(),
                valid: verdict.is_valid,
                messages: verdict.messages,
            }
        })
        .collect()
}
