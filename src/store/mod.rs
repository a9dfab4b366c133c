//! Report and config persistence
//!
//! This module owns the data directory shared with the web front end:
//! - `<target>.json` holds the latest run for a target
//! - `linkspam_config.json` holds per-target settings and lifecycle
//!
//! All writes go through a temp file and rename so readers never observe a
//! partial document.

mod lock;
mod status;

pub use lock::*;
pub use status::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::report::RunOutput;
use serde::Serialize;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const CONFIG_FILE: &str = "linkspam_config.json";
const LOCK_FILE: &str = "linkspam_config.json.lock";

/// Target names that would collide with store bookkeeping
const RESERVED_TARGETS: &[&str] = &["default", "linkspam_config"];

/// Handle on the data directory
#[derive(Debug, Clone)]
pub struct ReportStore {
    data_dir: PathBuf,
}

impl ReportStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.data_dir())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    pub fn report_path(&self, target: &str) -> Result<PathBuf> {
        validate_target(target)?;
        Ok(self.data_dir.join(format!("{}.json", target)))
    }

    /// Read linkspam_config.json
    pub fn load_config(&self) -> Result<LinkspamConfig> {
        let path = self.config_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::Config(format!("{} not found", path.display())));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Latest report for `target`, or `None` if it has never been run
    pub fn load_report(&self, target: &str) -> Result<Option<RunOutput>> {
        let path = self.report_path(target)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No report at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write the report, then record the run in the config under the lock
    pub fn save(&self, output: &RunOutput, target: &str) -> Result<TargetStatus> {
        let report_path = self.report_path(target)?;
        write_json_atomic(&report_path, output)?;
        info!("Wrote {}", report_path.display());

        let _lock = ConfigLock::acquire(&self.data_dir.join(LOCK_FILE))?;
        let mut config = self.load_config()?;
        let entry = config.record_run(target, &output.start_time)?;
        write_json_atomic(&self.config_path(), &config)?;
        debug!(
            "{} is now {:?} (last update {})",
            target, entry.status, output.start_time
        );

        Ok(entry)
    }
}

/// Reject target names that are not a plain file stem
pub fn validate_target(target: &str) -> Result<()> {
    let invalid = |reason: &str| Err(Error::InvalidTarget(format!("{:?}: {}", target, reason)));

    if target.trim().is_empty() {
        return invalid("empty");
    }
    if target == "." || target == ".." {
        return invalid("not a file name");
    }
    if target.contains(['/', '\\', '\0']) {
        return invalid("contains a path separator");
    }
    if RESERVED_TARGETS.contains(&target) {
        return invalid("reserved name");
    }
    Ok(())
}

/// Serialize `value` with 4-space indentation and swap it into `path`
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        value.serialize(&mut serializer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o644))?;
    }

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordered_map::OrderedMap;
    use crate::report::{summary_table, PageRecord, SiteReport};
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn seeded_store() -> (TempDir, ReportStore) {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path());
        let config = json!({
            "default": {"status": "new", "frequency": "manual", "summary": {"en": "Removing links"}},
            "example.com": {
                "status": "new",
                "frequency": "automatic",
                "title": "Example",
                "summary": {}
            }
        });
        fs::write(store.config_path(), config.to_string()).unwrap();
        (dir, store)
    }

    fn output(target: &str, start_time: &str) -> RunOutput {
        let mut site_reports = OrderedMap::new();
        site_reports.insert(
            "enwiki",
            SiteReport {
                reports: vec![PageRecord {
                    page_title: "Foo".to_string(),
                    page_link: "https://en.wikipedia.org/wiki/Foo".to_string(),
                    edit_link: "https://en.wikipedia.org/wiki/Foo?action=edit&summary=&minor=1"
                        .to_string(),
                }],
                count: 1,
            },
        );
        let counts = site_reports.iter().map(|(k, v)| (k.to_string(), v.count)).collect();
        RunOutput {
            target: target.to_string(),
            start_time: start_time.to_string(),
            site_reports,
            skipped: Vec::new(),
            summary_table: summary_table(&counts),
        }
    }

    #[test]
    fn test_save_writes_report_and_advances_status() {
        let (_dir, store) = seeded_store();
        let run = output("example.com", "2019-06-01T12:00:00.000000");

        let entry = store.save(&run, "example.com").unwrap();
        assert_eq!(entry.status, Some(Status::Automatic));

        assert_eq!(store.load_report("example.com").unwrap(), Some(run));

        let config = store.load_config().unwrap();
        let saved = config.get("example.com").unwrap().unwrap();
        assert_eq!(saved.last_update.as_deref(), Some("2019-06-01T12:00:00.000000"));
        assert_eq!(config.raw("example.com").unwrap()["title"], json!("Example"));
    }

    #[test]
    fn test_save_unconfigured_target_copies_default() {
        let (_dir, store) = seeded_store();
        store
            .save(&output("spam.example", "2019-06-01T12:00:00.000000"), "spam.example")
            .unwrap();

        let config = store.load_config().unwrap();
        assert_eq!(config.get("spam.example").unwrap().unwrap().status, Some(Status::Finished));
        assert_eq!(config.get("default").unwrap().unwrap().status, Some(Status::New));
        let keys: Vec<&str> = config.targets().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["example.com", "spam.example"]);
    }

    #[test]
    fn test_unrelated_partial_entries_survive_save() {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path());
        let config = r#"{
            "default": {"status": "new", "frequency": "manual", "summary": null},
            "legacy.example": {"status": "finished"},
            "example.com": {"status": "new", "frequency": "automatic"}
        }"#;
        fs::write(store.config_path(), config).unwrap();

        store
            .save(&output("example.com", "2019-06-01T12:00:00.000000"), "example.com")
            .unwrap();

        let config = store.load_config().unwrap();
        assert_eq!(config.raw("legacy.example"), Some(&json!({"status": "finished"})));
        assert!(config.raw("default").unwrap()["summary"].is_null());
        let keys: Vec<&str> = config.targets().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["legacy.example", "example.com"]);
    }

    #[test]
    fn test_output_uses_four_space_indent() {
        let (_dir, store) = seeded_store();
        store
            .save(&output("example.com", "2019-06-01T12:00:00.000000"), "example.com")
            .unwrap();

        let text = fs::read_to_string(store.report_path("example.com").unwrap()).unwrap();
        assert!(text.starts_with("{\n    \"target\": \"example.com\",\n    \"start_time\""));

        let config = fs::read_to_string(store.config_path()).unwrap();
        assert!(config.starts_with("{\n    \"default\": {\n        \"status\": \"new\""));
    }

    #[test]
    fn test_load_report_missing_is_none() {
        let (_dir, store) = seeded_store();
        assert!(store.load_report("never.example").unwrap().is_none());
    }

    #[test]
    fn test_load_config_missing_is_config_error() {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path());
        assert!(matches!(store.load_config(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_target() {
        assert!(validate_target("example.com").is_ok());
        assert!(validate_target("sub.example.co.uk").is_ok());
        for bad in ["", " ", ".", "..", "../etc/passwd", "a/b", "a\\b", "default", "linkspam_config"] {
            assert!(
                matches!(validate_target(bad), Err(Error::InvalidTarget(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_concurrent_saves_keep_every_target() {
        let (_dir, store) = seeded_store();
        let store = Arc::new(store);
        let targets: Vec<String> = (0..8).map(|i| format!("site{}.example", i)).collect();

        let handles: Vec<_> = targets
            .iter()
            .cloned()
            .map(|target| {
                let store = store.clone();
                thread::spawn(move || {
                    store
                        .save(&output(&target, "2019-06-01T12:00:00.000000"), &target)
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let config = store.load_config().unwrap();
        for target in &targets {
            assert!(config.raw(target).is_some(), "{} lost", target);
            assert!(store.load_report(target).unwrap().is_some());
        }
    }
}
