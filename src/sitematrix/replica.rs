//! Replica database directory
//!
//! Reads the `wiki` table of the replicated `meta_p` database. Uses the sqlx
//! `Any` driver so the same code runs against MySQL replicas and SQLite.

use super::{Site, SiteDirectory};
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::Row;
use std::time::Duration;
use tracing::debug;

const SITE_QUERY: &str = "SELECT url, dbname, lang FROM wiki WHERE is_closed = 0";

/// Directory backed by a replica of the wiki metadata table
pub struct ReplicaDirectory {
    database_url: String,
    connect_timeout: Duration,
}

impl ReplicaDirectory {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Build from configuration; `None` when no replica credentials exist
    pub fn from_config(config: &Config) -> Option<Self> {
        config.replica_url.as_deref().map(Self::new)
    }
}

#[async_trait]
impl SiteDirectory for ReplicaDirectory {
    async fn sites(&self) -> Result<Vec<Site>> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(self.connect_timeout)
            .connect(&self.database_url)
            .await?;

        debug!("Querying replica: {}", SITE_QUERY);
        let rows = sqlx::query(SITE_QUERY).fetch_all(&pool).await;
        pool.close().await;

        rows?.iter().map(site_from_row).collect()
    }

    fn name(&self) -> &str {
        "replica database"
    }
}

fn site_from_row(row: &AnyRow) -> Result<Site> {
    let url = text_column(row, "url")?;
    if url.is_empty() {
        return Err(Error::Response("replica row without url".to_string()));
    }

    Ok(Site {
        url,
        dbname: text_column(row, "dbname")?,
        code: text_column(row, "lang").unwrap_or_default(),
    })
}

/// Replica columns may be declared as binary strings; accept both
fn text_column(row: &AnyRow, column: &str) -> Result<String> {
    match row.try_get::<String, _>(column) {
        Ok(value) => Ok(value),
        Err(_) => {
            let bytes: Vec<u8> = row.try_get(column)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}
