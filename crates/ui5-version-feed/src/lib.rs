//! UI5 Version Feed: access to the public UI5 version overview
//!
//! This crate is the transport layer of ui5vc. It downloads the
//! `versionoverview.json` document published alongside the UI5 CDN and
//! exposes it as plain serde types. It does not interpret lifecycle
//! dates; that happens in `ui5vc-core`.

pub mod client;
pub mod error;
pub mod overview;

pub use client::{FeedClient, FeedConfig, DEFAULT_OVERVIEW_URL};
pub use error::FeedError;
pub use overview::{FeedPatch, FeedVersion, VersionOverview, MAINTENANCE_SUPPORT};

/// Result type for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;
