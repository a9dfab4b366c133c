//! Target lifecycle records kept in linkspam_config.json
//!
//! The file is shared with the web front end. Only the entry of the target
//! being run is parsed; every other entry is carried through as raw JSON.

use crate::error::{Error, Result};
use crate::ordered_map::OrderedMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

/// Key of the entry used for unconfigured targets
pub const DEFAULT_ENTRY: &str = "default";

/// Report status shown by the web front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    New,
    Automatic,
    Finished,
    ManualPending,
    Other(String),
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            "new" => Status::New,
            "automatic" => Status::Automatic,
            "finished" => Status::Finished,
            "manual-pending" => Status::ManualPending,
            _ => Status::Other(value),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::New => write!(f, "new"),
            Status::Automatic => write!(f, "automatic"),
            Status::Finished => write!(f, "finished"),
            Status::ManualPending => write!(f, "manual-pending"),
            Status::Other(s) => write!(f, "{}", s),
        }
    }
}

/// How often a target's report is regenerated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    Manual,
    Automatic,
    Other(String),
}

impl From<String> for Frequency {
    fn from(value: String) -> Self {
        match value.as_str() {
            "manual" => Frequency::Manual,
            "automatic" => Frequency::Automatic,
            _ => Frequency::Other(value),
        }
    }
}

impl From<Frequency> for String {
    fn from(frequency: Frequency) -> Self {
        frequency.to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Manual => write!(f, "manual"),
            Frequency::Automatic => write!(f, "automatic"),
            Frequency::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Settings and lifecycle of one target
///
/// Every key is optional: the front end writes partial entries.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TargetStatus {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub last_update: Option<String>,
    /// Preloaded edit summaries keyed by language code
    #[serde(default, deserialize_with = "null_as_empty")]
    pub summary: OrderedMap<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<OrderedMap<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<OrderedMap<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl TargetStatus {
    /// Record a successful run finished with `start_time`
    pub fn record_run(&mut self, start_time: &str) {
        self.last_update = Some(start_time.to_string());

        if self.status == Some(Status::New) {
            self.status = Some(if self.frequency == Some(Frequency::Manual) {
                Status::Finished
            } else {
                Status::Automatic
            });
        }
    }
}

/// The whole linkspam_config.json document, in file order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkspamConfig {
    targets: Map<String, Value>,
}

impl LinkspamConfig {
    /// Parsed entry for `target`, if present
    pub fn get(&self, target: &str) -> Result<Option<TargetStatus>> {
        self.targets
            .get(target)
            .map(|value| parse_entry(target, value))
            .transpose()
    }

    /// Entry for `target` exactly as stored
    pub fn raw(&self, target: &str) -> Option<&Value> {
        self.targets.get(target)
    }

    /// Configured targets, excluding the default entry. Entries that do not
    /// parse are logged and left out.
    pub fn targets(&self) -> impl Iterator<Item = (&str, TargetStatus)> {
        self.targets
            .iter()
            .filter(|(name, _)| name.as_str() != DEFAULT_ENTRY)
            .filter_map(|(name, value)| match parse_entry(name, value) {
                Ok(entry) => Some((name.as_str(), entry)),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            })
    }

    /// Settings for `target`, falling back to the default entry
    pub fn settings_for(&self, target: &str) -> Result<TargetStatus> {
        if let Some(status) = self.get(target)? {
            return Ok(status);
        }

        warn!("No config found for {}. Using the default configs.", target);
        self.get(DEFAULT_ENTRY)?.ok_or_else(|| missing_default(target))
    }

    /// Apply a finished run to `target`, creating its entry from the default
    /// entry when missing. Only `status` and `last_update` are rewritten.
    pub fn record_run(&mut self, target: &str, start_time: &str) -> Result<TargetStatus> {
        if !self.targets.contains_key(target) {
            let default = self
                .targets
                .get(DEFAULT_ENTRY)
                .cloned()
                .ok_or_else(|| missing_default(target))?;
            self.targets.insert(target.to_string(), default);
        }

        let mut entry = self.settings_for(target)?;
        entry.record_run(start_time);

        let object = self
            .targets
            .get_mut(target)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| Error::Config(format!("entry for {} is not an object", target)))?;
        object.insert("last_update".to_string(), Value::String(start_time.to_string()));
        if let Some(status) = &entry.status {
            object.insert("status".to_string(), Value::String(status.to_string()));
        }

        Ok(entry)
    }
}

fn parse_entry(target: &str, value: &Value) -> Result<TargetStatus> {
    TargetStatus::deserialize(value)
        .map_err(|e| Error::Config(format!("entry for {} in linkspam_config.json: {}", target, e)))
}

fn missing_default(target: &str) -> Error {
    Error::Config(format!(
        "no entry for {} and no '{}' entry in linkspam_config.json",
        target, DEFAULT_ENTRY
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> LinkspamConfig {
        serde_json::from_value(json!({
            "default": {
                "status": "new",
                "frequency": "manual",
                "summary": {"en": "Removing links"}
            },
            "example.com": {
                "status": "new",
                "frequency": "automatic",
                "title": "Example hijack",
                "summary": {"en": "Removing example.com", "de": "Entferne example.com"}
            },
            "old.example.org": {
                "status": "manual-pending",
                "frequency": "manual",
                "last_update": "2019-01-01T00:00:00.000000"
            }
        }))
        .unwrap()
    }

    fn entry(cfg: &LinkspamConfig, target: &str) -> TargetStatus {
        cfg.get(target).unwrap().unwrap()
    }

    #[test]
    fn test_new_automatic_becomes_automatic() {
        let mut cfg = config();
        let entry = cfg.record_run("example.com", "2019-06-01T12:00:00.000000").unwrap();
        assert_eq!(entry.status, Some(Status::Automatic));
        assert_eq!(entry.last_update.as_deref(), Some("2019-06-01T12:00:00.000000"));
    }

    #[test]
    fn test_new_manual_becomes_finished() {
        let mut status = config().settings_for("unconfigured.net").unwrap();
        status.record_run("2019-06-01T12:00:00.000000");
        assert_eq!(status.status, Some(Status::Finished));
    }

    #[test]
    fn test_other_statuses_unchanged() {
        let mut cfg = config();
        let entry = cfg
            .record_run("old.example.org", "2019-06-01T12:00:00.000000")
            .unwrap();
        assert_eq!(entry.status, Some(Status::ManualPending));
        assert_eq!(entry.last_update.as_deref(), Some("2019-06-01T12:00:00.000000"));
    }

    #[test]
    fn test_unconfigured_target_uses_default() {
        let cfg = config();
        let settings = cfg.settings_for("unconfigured.net").unwrap();
        assert_eq!(settings, entry(&cfg, DEFAULT_ENTRY));
        assert_eq!(settings.summary.get("en").map(String::as_str), Some("Removing links"));
    }

    #[test]
    fn test_record_run_inserts_missing_target() {
        let mut cfg = config();
        cfg.record_run("unconfigured.net", "2019-06-01T12:00:00.000000")
            .unwrap();
        assert_eq!(entry(&cfg, "unconfigured.net").status, Some(Status::Finished));
        assert_eq!(entry(&cfg, DEFAULT_ENTRY).status, Some(Status::New));
        assert!(cfg.raw(DEFAULT_ENTRY).unwrap().get("last_update").is_none());
    }

    #[test]
    fn test_missing_default_is_config_error() {
        let cfg = LinkspamConfig::default();
        assert!(matches!(cfg.settings_for("example.com"), Err(Error::Config(_))));
    }

    #[test]
    fn test_extra_keys_and_unknown_values_survive() {
        let mut cfg: LinkspamConfig = serde_json::from_value(json!({
            "default": {"status": "new", "frequency": "manual"},
            "weird.example": {"status": "paused", "frequency": "weekly", "title": "Odd"}
        }))
        .unwrap();
        cfg.record_run("weird.example", "2019-06-01T12:00:00.000000")
            .unwrap();

        let value = serde_json::to_value(&cfg).unwrap();
        assert_eq!(
            value["weird.example"],
            json!({
                "status": "paused",
                "frequency": "weekly",
                "title": "Odd",
                "last_update": "2019-06-01T12:00:00.000000"
            })
        );
    }

    #[test]
    fn test_partial_and_malformed_entries_do_not_block_other_targets() {
        let mut cfg: LinkspamConfig = serde_json::from_value(json!({
            "default": {"status": "new", "frequency": "manual", "summary": null},
            "legacy.example": {"status": "finished"},
            "broken.example": "not an object",
            "example.com": {"status": "new", "frequency": "automatic", "summary": {"en": "Removing"}}
        }))
        .unwrap();

        let entry = cfg.record_run("example.com", "2019-06-01T12:00:00.000000").unwrap();
        assert_eq!(entry.status, Some(Status::Automatic));

        let settings = cfg.settings_for("spam.example").unwrap();
        assert!(settings.summary.is_empty());

        let value = serde_json::to_value(&cfg).unwrap();
        assert_eq!(value["legacy.example"], json!({"status": "finished"}));
        assert_eq!(value["broken.example"], json!("not an object"));
        assert!(value["default"]["summary"].is_null());
    }

    #[test]
    fn test_missing_status_is_left_alone() {
        let mut cfg: LinkspamConfig = serde_json::from_value(json!({
            "bare.example": {"title": "No lifecycle yet"}
        }))
        .unwrap();

        let entry = cfg.record_run("bare.example", "2019-06-01T12:00:00.000000").unwrap();
        assert_eq!(entry.status, None);
        assert!(cfg.raw("bare.example").unwrap().get("status").is_none());
    }

    #[test]
    fn test_targets_excludes_default_and_unparsable() {
        let cfg: LinkspamConfig = serde_json::from_value(json!({
            "default": {"status": "new"},
            "example.com": {"status": "new"},
            "broken.example": 42,
            "old.example.org": {"status": "finished"}
        }))
        .unwrap();
        let names: Vec<&str> = cfg.targets().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["example.com", "old.example.org"]);
    }
}
