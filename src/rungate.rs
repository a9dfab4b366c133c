//! Run gate: operators halt future runs by editing a wiki page

use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::{info, warn};

/// Read access to the page controlling whether runs may proceed
#[async_trait]
pub trait ControlPage: Send + Sync {
    /// Current text of `title`
    async fn page_text(&self, title: &str) -> Result<String>;
}

/// Whether run page text allows a run
pub fn gate_open(text: &str) -> bool {
    text.ends_with("True")
}

/// Refuse to run unless the run page ends with `True` or the gate is overridden
pub async fn run_check(control: &dyn ControlPage, run_page: &str, run_override: bool) -> Result<()> {
    if run_override {
        info!("Run gate overridden, not consulting {}", run_page);
        return Ok(());
    }

    let text = control.page_text(run_page).await?;
    if gate_open(&text) {
        Ok(())
    } else {
        warn!("Run page {} is not True, quitting", run_page);
        Err(Error::RunBlocked(run_page.to_string()))
    }
}
