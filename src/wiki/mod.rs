//! MediaWiki API client
//!
//! This module provides:
//! - A shared HTTP client with the configured user agent and timeout
//! - External link search (`list=exturlusage`) with continuation
//! - Page text reads for the run gate
//! - A global request rate limit

mod rate_limit;
mod site;

pub use rate_limit::*;
pub use site::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::linksearch::{LinkSearch, LinkedPage, Protocol};
use crate::rungate::ControlPage;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Build the HTTP client used for every wiki request
pub fn http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .gzip(true)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<Q> {
    error: Option<ApiErrorBody>,
    query: Option<Q>,
    #[serde(default, rename = "continue")]
    continuation: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct ExtUrlUsageQuery {
    #[serde(default)]
    exturlusage: Vec<ExtUrlUsageHit>,
}

#[derive(Debug, Deserialize)]
struct ExtUrlUsageHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct RevisionsQuery {
    #[serde(default)]
    pages: Vec<RevisionsPage>,
}

#[derive(Debug, Deserialize)]
struct RevisionsPage {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
struct Revision {
    slots: HashMap<String, RevisionSlot>,
}

#[derive(Debug, Deserialize)]
struct RevisionSlot {
    #[serde(default)]
    content: String,
}

/// MediaWiki Action API client, usable against any site in the farm
#[derive(Clone)]
pub struct MediaWikiClient {
    client: Client,
    limiter: Arc<GlobalRateLimiter>,
}

impl MediaWikiClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_client(
            http_client(config)?,
            config.requests_per_second,
        ))
    }

    pub fn with_client(client: Client, requests_per_second: u32) -> Self {
        Self {
            client,
            limiter: Arc::new(GlobalRateLimiter::new(requests_per_second)),
        }
    }

    async fn get_json<Q: DeserializeOwned>(
        &self,
        site: &SiteHandle,
        params: &[(String, String)],
    ) -> Result<ApiResponse<Q>> {
        self.limiter.wait().await;
        trace!("GET {} {:?}", site.api_url(), params);

        let response = self
            .client
            .get(site.api_url().clone())
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: site.api_url().to_string(),
            });
        }

        let body: ApiResponse<Q> = response.json().await?;
        if let Some(error) = body.error {
            return Err(Error::Api {
                code: error.code,
                info: error.info,
            });
        }
        Ok(body)
    }

    /// Current text of `title`; a missing page reads as empty
    pub async fn page_text(&self, site: &SiteHandle, title: &str) -> Result<String> {
        let params = query_params(&[
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("prop", "revisions"),
            ("rvprop", "content"),
            ("rvslots", "main"),
            ("titles", title),
        ]);

        let body: ApiResponse<RevisionsQuery> = self.get_json(site, &params).await?;
        let page = body
            .query
            .and_then(|q| q.pages.into_iter().next())
            .ok_or_else(|| Error::Response(format!("no page returned for {}", title)))?;

        if page.missing {
            debug!("{} does not exist", title);
            return Ok(String::new());
        }

        Ok(page
            .revisions
            .into_iter()
            .next()
            .and_then(|mut rev| rev.slots.remove("main"))
            .map(|slot| slot.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl LinkSearch for MediaWikiClient {
    async fn search(
        &self,
        site: &SiteHandle,
        pattern: &str,
        protocol: Protocol,
    ) -> Result<Vec<LinkedPage>> {
        let base = query_params(&[
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("list", "exturlusage"),
            ("euprop", "title"),
            ("eulimit", "max"),
            ("euquery", pattern),
            ("euprotocol", protocol.as_str()),
        ]);

        let mut pages = Vec::new();
        let mut continuation: HashMap<String, String> = HashMap::new();

        loop {
            let mut params = base.clone();
            params.extend(continuation.drain());

            let body: ApiResponse<ExtUrlUsageQuery> = self.get_json(site, &params).await?;
            if let Some(query) = body.query {
                pages.extend(
                    query
                        .exturlusage
                        .into_iter()
                        .map(|hit| LinkedPage::on_site(site, hit.title)),
                );
            }

            match body.continuation {
                Some(next) if !next.is_empty() => continuation = next,
                _ => break,
            }
        }

        debug!(
            "{} pages link to {}://{} on {}",
            pages.len(),
            protocol,
            pattern,
            site.api_url()
        );
        Ok(pages)
    }
}

/// The wiki holding the run page
pub struct ControlWiki {
    client: MediaWikiClient,
    site: SiteHandle,
}

impl ControlWiki {
    pub fn new(client: MediaWikiClient, site: SiteHandle) -> Self {
        Self { client, site }
    }
}

#[async_trait]
impl ControlPage for ControlWiki {
    async fn page_text(&self, title: &str) -> Result<String> {
        self.client.page_text(&self.site, title).await
    }
}

fn query_params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
