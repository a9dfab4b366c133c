//! Site directory resolution
//!
//! This module provides:
//! - The `Site` record every other component keys on
//! - A replica-database directory (fast path on hosts with database access)
//! - A sitematrix API directory (fallback everywhere else)
//! - A single retry on transient failures

mod api;
mod replica;

pub use api::*;
pub use replica::*;

use crate::error::Result;
use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// A public, open wiki
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Base URL, e.g. https://en.wikipedia.org
    pub url: String,
    /// Database name, e.g. enwiki; keys the per-site reports
    pub dbname: String,
    /// Language or site code used to pick an edit summary
    pub code: String,
}

/// One site entry as it appears in a sitematrix response
///
/// Status markers are flags: their presence matters, not their value.
#[derive(Debug, Clone, Deserialize)]
pub struct SitematrixEntry {
    pub url: String,
    #[serde(default)]
    pub dbname: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub closed: Option<IgnoredAny>,
    #[serde(default)]
    pub private: Option<IgnoredAny>,
    #[serde(default)]
    pub fishbowl: Option<IgnoredAny>,
}

/// Return true only if the wiki is public and open
pub fn check_status(entry: &SitematrixEntry) -> bool {
    entry.closed.is_none() && entry.private.is_none() && entry.fishbowl.is_none()
}

/// Source of the site list
#[async_trait]
pub trait SiteDirectory: Send + Sync {
    /// List all open, public sites
    async fn sites(&self) -> Result<Vec<Site>>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Tries a primary directory and falls back transparently on any failure
pub struct FallbackDirectory {
    primary: Option<Box<dyn SiteDirectory>>,
    fallback: Box<dyn SiteDirectory>,
}

impl FallbackDirectory {
    pub fn new(primary: Option<Box<dyn SiteDirectory>>, fallback: Box<dyn SiteDirectory>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl SiteDirectory for FallbackDirectory {
    async fn sites(&self) -> Result<Vec<Site>> {
        if let Some(primary) = &self.primary {
            match primary.sites().await {
                Ok(sites) => {
                    info!("Resolved {} sites from {}", sites.len(), primary.name());
                    return Ok(sites);
                }
                Err(e) => {
                    warn!(
                        "{} unavailable ({}), falling back to {}",
                        primary.name(),
                        e,
                        self.fallback.name()
                    );
                }
            }
        }

        let sites = self.fallback.sites().await?;
        info!("Resolved {} sites from {}", sites.len(), self.fallback.name());
        Ok(sites)
    }

    fn name(&self) -> &str {
        self.fallback.name()
    }
}

/// Resolve the site list, retrying exactly once after `retry_delay` on a
/// transient failure
pub async fn resolve_sites(directory: &dyn SiteDirectory, retry_delay: Duration) -> Result<Vec<Site>> {
    match directory.sites().await {
        Ok(sites) => Ok(sites),
        Err(e) if e.is_transient() => {
            warn!(
                "Site directory request failed ({}), retrying in {:?}",
                e, retry_delay
            );
            tokio::time::sleep(retry_delay).await;
            directory.sites().await
        }
        Err(e) => Err(e),
    }
}
