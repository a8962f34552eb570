use crate::digest::event::EventCategory;
use crate::error::{CoreError, CoreResult};
use crate::notification::model::parse_timestamp;
use serde::{Deserialize, Serialize};
use std::path::Path;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DigestConfig {
    /// Categories surfaced in the final digest. Filtering happens after
    /// reduction, so cancellations still see every record.
    pub enabled_categories: Vec<EventCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_start: Option<String>, // RFC3339, inclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_end: Option<String>, // RFC3339, inclusive
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            enabled_categories: EventCategory::ALL.to_vec(),
            window_start: None,
            window_end: None,
        }
    }
}

/// Parsed, validated time bounds of a digest period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestWindow {
    pub start: Option<OffsetDateTime>,
    pub end: Option<OffsetDateTime>,
}

impl DigestWindow {
    pub fn contains(&self, ts: OffsetDateTime) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

impl DigestConfig {
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let cfg: DigestConfig = serde_json::from_slice(&bytes)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> CoreResult<DigestWindow> {
        if self.enabled_categories.is_empty() {
            return Err(CoreError::Config(
                "enabled_categories must name at least one category".to_string(),
            ));
        }
        let start = self
            .window_start
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(|e| CoreError::Config(format!("window_start: {}", e)))?;
        let end = self
            .window_end
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(|e| CoreError::Config(format!("window_end: {}", e)))?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(CoreError::Config(format!(
                    "window_start {} is after window_end {}",
                    self.window_start.as_deref().unwrap_or_default(),
                    self.window_end.as_deref().unwrap_or_default()
                )));
            }
        }
        Ok(DigestWindow { start, end })
    }

    pub fn is_enabled(&self, category: EventCategory) -> bool {
        self.enabled_categories.contains(&category)
    }
}
