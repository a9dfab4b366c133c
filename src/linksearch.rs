//! Per-site external link enumeration
//!
//! Link search treats http/https and domain/subdomain links separately, so a
//! complete listing for one target runs four searches in a fixed order.

use crate::error::{Error, Result};
use crate::wiki::SiteHandle;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::fmt;
use tracing::debug;

/// Link protocol searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which hosts a search pattern covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The target domain itself
    Exact,
    /// Any subdomain of the target (`*.target`)
    Subdomains,
}

/// One protocol/scope combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchVariant {
    pub protocol: Protocol,
    pub scope: Scope,
}

impl SearchVariant {
    /// Search order: even index is http, odd is https; index > 1 is wildcard
    pub const ALL: [SearchVariant; 4] = [
        Self::from_index(0),
        Self::from_index(1),
        Self::from_index(2),
        Self::from_index(3),
    ];

    pub const fn from_index(index: usize) -> Self {
        Self {
            protocol: if index % 2 == 0 {
                Protocol::Http
            } else {
                Protocol::Https
            },
            scope: if index > 1 {
                Scope::Subdomains
            } else {
                Scope::Exact
            },
        }
    }

    /// Link search pattern for `target`
    pub fn pattern(&self, target: &str) -> String {
        match self.scope {
            Scope::Exact => target.to_string(),
            Scope::Subdomains => format!("*.{}", target),
        }
    }
}

/// Read access to a page found by link search
pub trait PageHandle {
    fn title(&self) -> &str;
    fn full_url(&self) -> &str;
}

/// A page containing a matching external link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedPage {
    title: String,
    url: String,
}

impl LinkedPage {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// A page on `site`, with its canonical URL derived from the title
    pub fn on_site(site: &SiteHandle, title: impl Into<String>) -> Self {
        let title = title.into();
        let url = site.page_url(&title);
        Self { title, url }
    }
}

impl PageHandle for LinkedPage {
    fn title(&self) -> &str {
        &self.title
    }

    fn full_url(&self) -> &str {
        &self.url
    }
}

/// A site's native external link search
#[async_trait]
pub trait LinkSearch: Send + Sync {
    /// All pages on `site` linking to `pattern` over `protocol`
    async fn search(
        &self,
        site: &SiteHandle,
        pattern: &str,
        protocol: Protocol,
    ) -> Result<Vec<LinkedPage>>;
}

/// Stream the pages on `site` linking to `target`, across all four variants
///
/// Results are concatenated in variant order and not deduplicated. Nothing
/// is cached; call again to restart.
pub fn list_pages<'a>(
    search: &'a dyn LinkSearch,
    site: &'a SiteHandle,
    target: &'a str,
) -> BoxStream<'a, Result<LinkedPage>> {
    stream::iter(SearchVariant::ALL)
        .then(move |variant| async move {
            let pattern = variant.pattern(target);
            debug!(
                "Link search on {}: {}://{}",
                site.api_url(),
                variant.protocol,
                pattern
            );
            search.search(site, &pattern, variant.protocol).await
        })
        .map_ok(|pages| stream::iter(pages.into_iter().map(Ok::<_, Error>)))
        .try_flatten()
        .boxed()
}
