//! Sitematrix API directory
//!
//! Parses the nested `action=sitematrix` response: numbered language groups
//! each carrying a `code` and a `site` list, a `specials` list of project
//! sites, and a `count` to ignore.

use super::{check_status, Site, SiteDirectory, SitematrixEntry};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::wiki::http_client;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SitematrixResponse {
    sitematrix: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct LanguageGroup {
    code: String,
    #[serde(default)]
    site: Vec<SitematrixEntry>,
}

/// Directory backed by the sitematrix API of a meta wiki
pub struct SitematrixApi {
    client: Client,
    api_url: String,
}

impl SitematrixApi {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_client(http_client(config)?, &config.meta_api_url))
    }

    pub fn with_client(client: Client, api_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.to_string(),
        }
    }
}

#[async_trait]
impl SiteDirectory for SitematrixApi {
    async fn sites(&self) -> Result<Vec<Site>> {
        debug!("Requesting sitematrix from {}", self.api_url);

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "sitematrix"),
                ("format", "json"),
                ("smlangprop", "code|site"),
                ("smsiteprop", "url|dbname|code"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: self.api_url.clone(),
            });
        }

        let body: SitematrixResponse = response.json().await?;
        parse_sitematrix(body.sitematrix)
    }

    fn name(&self) -> &str {
        "sitematrix API"
    }
}

/// Flatten a sitematrix object into the open, public sites it lists
pub fn parse_sitematrix(matrix: Map<String, Value>) -> Result<Vec<Site>> {
    let mut sites = Vec::new();

    for (key, value) in matrix {
        match key.as_str() {
            "count" => continue,
            "specials" => {
                let specials: Vec<SitematrixEntry> = serde_json::from_value(value)?;
                for entry in specials {
                    let code = entry.code.clone().unwrap_or_default();
                    push_open_site(&mut sites, entry, code);
                }
            }
            _ => {
                let group: LanguageGroup = serde_json::from_value(value).map_err(|e| {
                    Error::Response(format!("sitematrix group {}: {}", key, e))
                })?;
                for entry in group.site {
                    push_open_site(&mut sites, entry, group.code.clone());
                }
            }
        }
    }

    Ok(sites)
}

fn push_open_site(sites: &mut Vec<Site>, entry: SitematrixEntry, code: String) {
    if !check_status(&entry) {
        return;
    }
    match entry.dbname {
        Some(dbname) => sites.push(Site {
            url: entry.url,
            dbname,
            code,
        }),
        None => debug!("Ignoring sitematrix entry without dbname: {}", entry.url),
    }
}
