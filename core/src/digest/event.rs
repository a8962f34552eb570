use super::key::EventKey;
use crate::notification::model::ComponentIdentity;
use serde::{Deserialize, Serialize};

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventCategory {
    POLICY_VIOLATION,
    POLICY_VIOLATION_OVERRIDE,
    POLICY_VIOLATION_CLEARED,
    VULNERABILITY,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [
        EventCategory::POLICY_VIOLATION,
        EventCategory::POLICY_VIOLATION_OVERRIDE,
        EventCategory::POLICY_VIOLATION_CLEARED,
        EventCategory::VULNERABILITY,
    ];
}

/// Dataset labels consumed by the template renderer.
pub mod labels {
    pub const RULE: &str = "RULE";
    pub const COMPONENT: &str = "COMPONENT";
    pub const VERSION: &str = "";
    pub const ADDED: &str = "ADDED";
    pub const UPDATED: &str = "UPDATED";
    pub const DELETED: &str = "DELETED";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct ItemEntry {
    pub label: String,
    pub value: String,
}

impl ItemEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRef {
    pub project_name: String,
    pub project_version_name: String,
    pub project_version_url: String,
}

impl From<&ComponentIdentity> for ProjectRef {
    fn from(c: &ComponentIdentity) -> Self {
        Self {
            project_name: c.project_name.clone(),
            project_version_name: c.project_version_name.clone(),
            project_version_url: c.project_version_url.clone(),
        }
    }
}

/// One surviving digest entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub key: EventKey,
    pub category: EventCategory,
    pub project: ProjectRef,
    pub dataset: Vec<ItemEntry>,
}

impl Event {
    /// Values recorded under `label`, in dataset order.
    pub fn values<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.dataset
            .iter()
            .filter(move |e| e.label == label)
            .map(|e| e.value.as_str())
    }

    /// Number of digest items this event stands for.
    pub fn item_count(&self) -> usize {
        match self.category {
            EventCategory::VULNERABILITY => self
                .dataset
                .iter()
                .filter(|e| {
                    e.label == labels::ADDED || e.label == labels::UPDATED || e.label == labels::DELETED
                })
                .count(),
            _ => 1,
        }
    }
}
