//! Replacement version selection.
//!
//! Picks the first minor line, in feed order, that is neither past EOCP
//! nor out of maintenance. With `prefer_lts` only LTS lines qualify.

use crate::domain::{Catalogue, MinorVersionLine, SelectionError};

/// Pick the replacement minor line.
///
/// # Errors
///
/// `SelectionError::NoLtsCandidate` / `SelectionError::NoCandidate` when no
/// line survives the filters.
pub fn select_replacement(
    catalogue: &Catalogue,
    prefer_lts: bool,
) -> Result<&MinorVersionLine, SelectionError> {
    catalogue
        .minor_lines()
        .filter(|line| line.is_eligible())
        .find(|line| !prefer_lts || line.is_lts)
        .ok_or_else(|| SelectionError::for_preference(prefer_lts))
}

/// Key (`<major>.<minor>.*`) of the replacement line.
pub fn latest_version(catalogue: &Catalogue, lts: bool) -> Result<String, SelectionError> {
    select_replacement(catalogue, lts).map(|line| line.key.clone())
}
