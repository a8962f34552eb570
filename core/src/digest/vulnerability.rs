use super::event::{labels, Event, EventCategory, ItemEntry, ProjectRef};
use super::key::{build_vulnerability_key, EventKey};
use super::lookup::{MemoizedLookup, VulnerabilityLookup};
use super::store::EventStore;
use crate::notification::model::{ComponentIdentity, VulnerabilityId, VulnerabilityNotification};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Running add/update/delete sets for one component version across a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VulnerabilityAggregate {
    added: BTreeSet<VulnerabilityId>,
    updated: BTreeSet<VulnerabilityId>,
    deleted: BTreeSet<VulnerabilityId>,
}

/// Net change left once every delta of the batch has been folded in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetChange {
    pub added: Vec<VulnerabilityId>,
    pub updated: Vec<VulnerabilityId>,
    pub deleted: Vec<VulnerabilityId>,
}

impl NetChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

impl VulnerabilityAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_delta(
        &mut self,
        added: &[VulnerabilityId],
        updated: &[VulnerabilityId],
        deleted: &[VulnerabilityId],
    ) {
        for vid in added {
            // A re-add undoes an earlier delete.
            if !self.deleted.remove(vid) {
                self.added.insert(vid.clone());
            }
        }
        for vid in updated {
            // Newly added items absorb their updates; deletes win over updates.
            if self.added.contains(vid) || self.deleted.contains(vid) {
                continue;
            }
            self.updated.insert(vid.clone());
        }
        for vid in deleted {
            self.updated.remove(vid);
            if !self.added.remove(vid) {
                self.deleted.insert(vid.clone());
            }
        }
    }

    pub fn net(&self) -> NetChange {
        let added: BTreeSet<&VulnerabilityId> = self.added.difference(&self.deleted).collect();
        let updated = self
            .updated
            .iter()
            .filter(|v| !added.contains(v) && !self.deleted.contains(*v))
            .cloned()
            .collect();
        NetChange {
            added: added.into_iter().cloned().collect(),
            updated,
            deleted: self.deleted.iter().cloned().collect(),
        }
    }
}

/// A key whose vulnerability names could not be resolved; it yields no event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookupFailure {
    pub key: EventKey,
    pub component_version_url: String,
    pub message: String,
}

#[derive(Debug)]
struct Tracked {
    component: ComponentIdentity,
    aggregate: VulnerabilityAggregate,
}

#[derive(Debug, Default)]
pub struct VulnerabilityReducer {
    tracked: BTreeMap<EventKey, Tracked>,
}

impl VulnerabilityReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one delta into the aggregate for its key.
    pub fn apply(&mut self, delta: &VulnerabilityNotification) {
        let c = &delta.component;
        let key = build_vulnerability_key(&c.project_version_url, &c.component_version_url);
        let tracked = self.tracked.entry(key).or_insert_with(|| Tracked {
            component: c.clone(),
            aggregate: VulnerabilityAggregate::new(),
        });
        // Latest display names win.
        tracked.component = c.clone();
        tracked
            .aggregate
            .apply_delta(&delta.added, &delta.updated, &delta.deleted);
    }

    pub fn aggregate(&self, key: &EventKey) -> Option<&VulnerabilityAggregate> {
        self.tracked.get(key).map(|t| &t.aggregate)
    }

    /// Number of keys whose activity does not net to zero.
    pub fn publishable(&self) -> usize {
        self.tracked
            .values()
            .filter(|t| !t.aggregate.net().is_empty())
            .count()
    }

    /// Publish one event per key with a non-empty net change.
    ///
    /// Keys whose lookup fails are reported and left out; the rest still
    /// reach the store.
    pub fn finish<L: VulnerabilityLookup + ?Sized>(
        self,
        store: &mut EventStore,
        lookup: &mut MemoizedLookup<'_, L>,
    ) -> Vec<LookupFailure> {
        let mut failures = Vec::new();
        for (key, tracked) in self.tracked {
            let net = tracked.aggregate.net();
            if net.is_empty() {
                tracing::debug!(key = %key, "vulnerability activity nets to zero");
                continue;
            }
            let c = &tracked.component;
            let info = match lookup.resolve(&c.component_version_url) {
                Ok(info) => info,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "vulnerability lookup failed");
                    failures.push(LookupFailure {
                        key,
                        component_version_url: c.component_version_url.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let mut dataset = vec![
                ItemEntry::new(labels::COMPONENT, c.component_name.clone()),
                ItemEntry::new(labels::VERSION, c.component_version_name.clone()),
            ];
            for (label, ids) in [
                (labels::ADDED, &net.added),
                (labels::UPDATED, &net.updated),
                (labels::DELETED, &net.deleted),
            ] {
                dataset.extend(ids.iter().map(|vid| ItemEntry::new(label, info.display_for(vid))));
            }

            store.put(Event {
                key,
                category: EventCategory::VULNERABILITY,
                project: ProjectRef::from(c),
                dataset,
            });
        }
        failures
    }
}
