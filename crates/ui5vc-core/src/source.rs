//! Catalogue sources.
//!
//! A [`CatalogueSource`] produces the raw version overview; the helpers in
//! this module turn it into a [`Catalogue`] and compose fetching with
//! validation or replacement selection. Callers that already hold a
//! catalogue use `validation` and `selector` directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ui5_version_feed::{FeedClient, VersionOverview};

use crate::domain::{Catalogue, CatalogueError, LifecycleCalculator};
use crate::selector::latest_version;
use crate::validation::{validate_versions, ValidationOptions, ValidationResult};

/// Anything that can supply the version overview.
#[async_trait]
pub trait CatalogueSource: Send + Sync {
    /// Fetch the current overview.
    async fn fetch_overview(&self) -> Result<VersionOverview, CatalogueError>;
}

#[async_trait]
impl CatalogueSource for FeedClient {
    async fn fetch_overview(&self) -> Result<VersionOverview, CatalogueError> {
        Ok(FeedClient::fetch_overview(self).await?)
    }
}

/// Source serving a fixed overview (snapshots, tests, offline use).
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    overview: VersionOverview,
}

impl StaticSource {
    pub fn new(overview: VersionOverview) -> Self {
        Self { overview }
    }

    /// Source backed by an overview JSON document.
    pub fn from_json(raw: &str) -> Result<Self, CatalogueError> {
        let overview = VersionOverview::from_json(raw).map_err(CatalogueError::Feed)?;
        Ok(Self::new(overview))
    }
}

#[async_trait]
impl CatalogueSource for StaticSource {
    async fn fetch_overview(&self) -> Result<VersionOverview, CatalogueError> {
        Ok(self.overview.clone())
    }
}

/// Fetch the overview and build a catalogue from it.
pub async fn fetch_catalogue(
    source: &dyn CatalogueSource,
    calculator: &LifecycleCalculator,
) -> Result<Catalogue, CatalogueError> {
    let overview = source.fetch_overview().await?;
    Catalogue::from_overview(&overview, calculator)
}

/// Fetch a catalogue as of `now`, then validate `versions` against it.
pub async fn fetch_and_validate<S: AsRef<str>>(
    source: &dyn CatalogueSource,
    versions: &[S],
    options: ValidationOptions,
    now: DateTime<Utc>,
) -> Result<Vec<ValidationResult>, CatalogueError> {
    let catalogue = fetch_catalogue(source, &LifecycleCalculator::at(now)).await?;
    Ok(validate_versions(versions, &catalogue, options))
}

/// Fetch a catalogue as of `now` and return the latest eligible version.
pub async fn fetch_latest_version(
    source: &dyn CatalogueSource,
    lts: bool,
    now: DateTime<Utc>,
) -> crate::domain::Result<String> {
    let catalogue = fetch_catalogue(source, &LifecycleCalculator::at(now)).await?;
    Ok(latest_version(&catalogue, lts)?)
}
