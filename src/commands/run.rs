//! Run command: build and store the global report for one target

use crate::config::{
    default_directory_retry_delay, default_run_page, default_site_timeout, Config,
};
use crate::error::{Error, Result};
use crate::linksearch::{list_pages, LinkSearch};
use crate::ordered_map::OrderedMap;
use crate::progress::{advance_progress, finish_progress, start_progress_bar};
use crate::report::{site_report, summary_table, timestamp, RunOutput, SiteReport};
use crate::rungate::{run_check, ControlPage};
use crate::sitematrix::{
    resolve_sites, FallbackDirectory, ReplicaDirectory, Site, SiteDirectory, SitematrixApi,
};
use crate::store::{validate_target, ReportStore};
use crate::wiki::{ControlWiki, MediaWikiClient, SiteHandle};
use chrono::Utc;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options for a run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Skip the run page check
    pub override_gate: bool,
}

/// What happened on a site that was searched successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteOutcome {
    Found(SiteReport),
    NoMatches,
}

/// Why a site ended up in `skipped`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InvalidSite(String),
    Search(String),
    TimedOut(Duration),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidSite(e) => write!(f, "invalid site: {}", e),
            SkipReason::Search(e) => write!(f, "link search failed: {}", e),
            SkipReason::TimedOut(limit) => write!(f, "timed out after {:?}", limit),
        }
    }
}

/// Wires the site directory, link search, run gate and store together
pub struct Runner {
    directory: Box<dyn SiteDirectory>,
    search: Box<dyn LinkSearch>,
    control: Box<dyn ControlPage>,
    store: ReportStore,
    run_page: String,
    site_timeout: Duration,
    retry_delay: Duration,
}

impl Runner {
    pub fn new(
        directory: Box<dyn SiteDirectory>,
        search: Box<dyn LinkSearch>,
        control: Box<dyn ControlPage>,
        store: ReportStore,
    ) -> Self {
        Self {
            directory,
            search,
            control,
            store,
            run_page: default_run_page(),
            site_timeout: Duration::from_secs(default_site_timeout()),
            retry_delay: Duration::from_secs(default_directory_retry_delay()),
        }
    }

    /// Production wiring: replica with sitematrix fallback, live wikis
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = MediaWikiClient::new(config)?;

        let primary = ReplicaDirectory::from_config(config)
            .map(|replica| Box::new(replica) as Box<dyn SiteDirectory>);
        if primary.is_none() {
            debug!("No replica configured, using the sitematrix API only");
        }
        let directory = FallbackDirectory::new(primary, Box::new(SitematrixApi::new(config)?));

        let control_site = SiteHandle::from_api_url(&config.run_page_api_url)?;
        let control = ControlWiki::new(client.clone(), control_site);

        Ok(Self::new(
            Box::new(directory),
            Box::new(client),
            Box::new(control),
            ReportStore::from_config(config),
        )
        .with_run_page(&config.run_page)
        .with_site_timeout(config.site_timeout())
        .with_retry_delay(config.directory_retry_delay()))
    }

    pub fn with_run_page(mut self, run_page: &str) -> Self {
        self.run_page = run_page.to_string();
        self
    }

    pub fn with_site_timeout(mut self, site_timeout: Duration) -> Self {
        self.site_timeout = site_timeout;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Search every site for `target`, then write the report and advance
    /// the target's lifecycle
    pub async fn run(&self, target: &str, options: RunOptions) -> Result<RunOutput> {
        validate_target(target)?;
        run_check(self.control.as_ref(), &self.run_page, options.override_gate).await?;

        let settings = self.store.load_config()?.settings_for(target)?;
        let sites = resolve_sites(self.directory.as_ref(), self.retry_delay).await?;
        let start_time = timestamp(Utc::now());
        info!("Searching {} sites for links to {}", sites.len(), target);

        let mut site_reports = OrderedMap::new();
        let mut counts = OrderedMap::new();
        let mut skipped = Vec::new();

        let progress = start_progress_bar(sites.len(), "Searching sites");
        for site in &sites {
            advance_progress(&progress, &site.dbname);

            match self.search_site(site, target, &settings.summary).await {
                Ok(SiteOutcome::Found(report)) => {
                    debug!("{}: {} pages", site.dbname, report.count);
                    counts.insert(site.dbname.as_str(), report.count);
                    site_reports.insert(site.dbname.as_str(), report);
                }
                Ok(SiteOutcome::NoMatches) => {
                    counts.insert(site.dbname.as_str(), 0);
                }
                Err(reason) => {
                    warn!("Skipping {}: {}", site.url, reason);
                    skipped.push(site.url.clone());
                }
            }
        }
        finish_progress(progress, "Sites searched");

        let output = RunOutput {
            target: target.to_string(),
            start_time,
            summary_table: summary_table(&counts),
            site_reports,
            skipped,
        };
        info!(
            "{}: {} pages on {} wikis, {} sites skipped",
            target,
            output.summary_table.total_pages,
            output.summary_table.total_wikis,
            output.skipped.len()
        );

        let store = self.store.clone();
        let saved = output.clone();
        let target_owned = target.to_string();
        tokio::task::spawn_blocking(move || store.save(&saved, &target_owned))
            .await
            .map_err(|e| Error::Other(format!("Report save task failed: {}", e)))??;

        Ok(output)
    }

    async fn search_site(
        &self,
        site: &Site,
        target: &str,
        preload: &OrderedMap<String>,
    ) -> std::result::Result<SiteOutcome, SkipReason> {
        let handle =
            SiteHandle::for_site(site).map_err(|e| SkipReason::InvalidSite(e.to_string()))?;

        let pages = list_pages(self.search.as_ref(), &handle, target);
        let report = tokio::time::timeout(self.site_timeout, site_report(pages, &site.code, preload))
            .await
            .map_err(|_| SkipReason::TimedOut(self.site_timeout))?
            .map_err(|e| SkipReason::Search(e.to_string()))?;

        Ok(match report {
            Some(report) => SiteOutcome::Found(report),
            None => SiteOutcome::NoMatches,
        })
    }
}

/// Run a report for `target` against the configured wikis
pub async fn cmd_run(config: &Config, target: &str, options: RunOptions) -> Result<RunOutput> {
    Runner::from_config(config)?.run(target, options).await
}
