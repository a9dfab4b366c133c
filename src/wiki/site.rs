//! Site handles: the API endpoint and article path of one wiki

use crate::error::{Error, Result};
use crate::quote::quote;
use crate::sitematrix::Site;
use url::Url;

/// Characters left unescaped in article paths
const TITLE_SAFE: &str = "/:;@$!*(),";

/// A validated wiki endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteHandle {
    base: Url,
    api: Url,
}

impl SiteHandle {
    /// Build the handle for a directory entry
    pub fn for_site(site: &Site) -> Result<Self> {
        Self::from_base_url(&site.url)
    }

    /// Build from a site base URL such as https://en.wikipedia.org
    pub fn from_base_url(url: &str) -> Result<Self> {
        let base = Url::parse(url)?;
        check_web_url(&base)?;
        let api = base.join("/w/api.php")?;
        Ok(Self { base, api })
    }

    /// Build from an API endpoint such as https://en.wikipedia.org/w/api.php
    pub fn from_api_url(url: &str) -> Result<Self> {
        let api = Url::parse(url)?;
        check_web_url(&api)?;
        let mut base = api.clone();
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base, api })
    }

    pub fn api_url(&self) -> &Url {
        &self.api
    }

    /// Canonical URL of an article on this site
    pub fn page_url(&self, title: &str) -> String {
        format!(
            "{}/wiki/{}",
            self.base.as_str().trim_end_matches('/'),
            quote(&title.replace(' ', "_"), TITLE_SAFE)
        )
    }
}

fn check_web_url(url: &Url) -> Result<()> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidSite(format!(
            "unsupported scheme '{}' in {}",
            url.scheme(),
            url
        )));
    }
    if url.host_str().is_none() {
        return Err(Error::InvalidSite(format!("no host in {}", url)));
    }
    Ok(())
}
