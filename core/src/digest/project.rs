use super::event::{Event, EventCategory, ProjectRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Digest events of one project version, split by category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectDigest {
    pub project: ProjectRef,
    pub policy_violations: Vec<Event>,
    pub policy_overrides: Vec<Event>,
    pub policy_clears: Vec<Event>,
    pub vulnerabilities: Vec<Event>,
    pub category_counts: BTreeMap<EventCategory, usize>,
}

impl ProjectDigest {
    fn empty(project: ProjectRef) -> Self {
        Self {
            project,
            policy_violations: Vec::new(),
            policy_overrides: Vec::new(),
            policy_clears: Vec::new(),
            vulnerabilities: Vec::new(),
            category_counts: BTreeMap::new(),
        }
    }

    /// Group events by project-version URL. Output is sorted by project name,
    /// then version name, then URL.
    pub fn group(events: &[Event]) -> Vec<ProjectDigest> {
        let mut by_url: BTreeMap<&str, ProjectDigest> = BTreeMap::new();
        for ev in events {
            let digest = by_url
                .entry(ev.project.project_version_url.as_str())
                .or_insert_with(|| ProjectDigest::empty(ev.project.clone()));
            *digest.category_counts.entry(ev.category).or_insert(0) += ev.item_count();
            let bucket = match ev.category {
                EventCategory::POLICY_VIOLATION => &mut digest.policy_violations,
                EventCategory::POLICY_VIOLATION_OVERRIDE => &mut digest.policy_overrides,
                EventCategory::POLICY_VIOLATION_CLEARED => &mut digest.policy_clears,
                EventCategory::VULNERABILITY => &mut digest.vulnerabilities,
            };
            bucket.push(ev.clone());
        }

        let mut out: Vec<ProjectDigest> = by_url.into_values().collect();
        out.sort_by(|a, b| {
            (
                &a.project.project_name,
                &a.project.project_version_name,
                &a.project.project_version_url,
            )
                .cmp(&(
                    &b.project.project_name,
                    &b.project.project_version_name,
                    &b.project.project_version_url,
                ))
        });
        out
    }

    pub fn total_items(&self) -> usize {
        self.category_counts.values().sum()
    }
}
