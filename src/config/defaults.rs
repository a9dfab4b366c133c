//! Default values for configuration

/// Default sitematrix API endpoint
pub fn default_meta_api_url() -> String {
    "https://meta.wikimedia.org/w/api.php".to_string()
}

/// Default replica DSN, taken from the environment when present
pub fn default_replica_url() -> Option<String> {
    std::env::var("LINKSPAM_REPLICA_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
}

/// Default run page consulted before every run
pub fn default_run_page() -> String {
    "User:AntiCompositeBot/HijackSpam/Run".to_string()
}

/// Default API endpoint of the wiki hosting the run page
pub fn default_run_page_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

/// Default user agent
pub fn default_user_agent() -> String {
    format!(
        "linkspam/{} (Global link usage reports)",
        env!("CARGO_PKG_VERSION")
    )
}

/// Default request timeout in seconds
pub fn default_timeout() -> u64 {
    30
}

/// Default time budget for a single site in seconds
pub fn default_site_timeout() -> u64 {
    300
}

/// Default delay before retrying the site directory (5 seconds)
pub fn default_directory_retry_delay() -> u64 {
    5
}

/// Default global request rate
pub fn default_requests_per_second() -> u32 {
    10
}
