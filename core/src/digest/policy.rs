use super::event::{labels, Event, EventCategory, ItemEntry, ProjectRef};
use super::key::{build_policy_key, EventKey};
use super::store::EventStore;
use crate::notification::model::{NotificationRecord, PolicyNotification, PolicyRuleRef};
use std::collections::HashMap;

/// Where one policy key stands within the current batch. A key with no entry
/// has not been seen yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKeyState {
    ViolationActive,
    OverrideActive,
    ClearActive,
    /// A violation seen in this batch was overridden or cleared. No event.
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
enum Cancel {
    Override,
    Clear,
}

impl Cancel {
    fn category(self) -> EventCategory {
        match self {
            Cancel::Override => EventCategory::POLICY_VIOLATION_OVERRIDE,
            Cancel::Clear => EventCategory::POLICY_VIOLATION_CLEARED,
        }
    }

    fn active_state(self) -> PolicyKeyState {
        match self {
            Cancel::Override => PolicyKeyState::OverrideActive,
            Cancel::Clear => PolicyKeyState::ClearActive,
        }
    }
}

#[derive(Debug, Default)]
pub struct PolicyReducer {
    states: HashMap<EventKey, PolicyKeyState>,
}

impl PolicyReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &EventKey) -> Option<PolicyKeyState> {
        self.states.get(key).copied()
    }

    /// Apply one record. Non-policy records are ignored.
    pub fn apply(&mut self, store: &mut EventStore, record: &NotificationRecord) {
        match record {
            NotificationRecord::PolicyViolation(n) => {
                for rule in &n.rules {
                    self.violation(store, n, rule);
                }
            }
            NotificationRecord::PolicyOverride(n) => {
                for rule in &n.rules {
                    self.cancel(store, n, rule, Cancel::Override);
                }
            }
            NotificationRecord::PolicyClear(n) => {
                for rule in &n.rules {
                    self.cancel(store, n, rule, Cancel::Clear);
                }
            }
            NotificationRecord::VulnerabilityDelta(_) | NotificationRecord::Unknown => {}
        }
    }

    fn violation(&mut self, store: &mut EventStore, n: &PolicyNotification, rule: &PolicyRuleRef) {
        let event = policy_event(n, rule, EventCategory::POLICY_VIOLATION);
        tracing::debug!(key = %event.key, rule = %rule.name, "policy violation active");
        self.states
            .insert(event.key.clone(), PolicyKeyState::ViolationActive);
        // Repeats of the same violation keep the latest names.
        store.put(event);
    }

    fn cancel(
        &mut self,
        store: &mut EventStore,
        n: &PolicyNotification,
        rule: &PolicyRuleRef,
        cancel: Cancel,
    ) {
        let key = build_policy_key(
            &n.component.project_version_url,
            &n.component.component_version_url,
            &rule.url,
        );
        match self.states.get(&key).copied() {
            Some(PolicyKeyState::ViolationActive) => {
                tracing::debug!(key = %key, ?cancel, "violation cancelled within batch");
                store.remove(&key);
                self.states.insert(key, PolicyKeyState::Cancelled);
            }
            None => {
                // The violation predates the window, so the cancellation itself is news.
                let event = policy_event(n, rule, cancel.category());
                self.states.insert(key, cancel.active_state());
                store.put(event);
            }
            Some(state) => {
                tracing::debug!(key = %key, ?state, ?cancel, "cancellation ignored, key already settled");
            }
        }
    }
}

fn policy_event(n: &PolicyNotification, rule: &PolicyRuleRef, category: EventCategory) -> Event {
    let c = &n.component;
    Event {
        key: build_policy_key(&c.project_version_url, &c.component_version_url, &rule.url),
        category,
        project: ProjectRef::from(c),
        dataset: vec![
            ItemEntry::new(labels::RULE, rule.name.clone()),
            ItemEntry::new(labels::COMPONENT, c.component_name.clone()),
            ItemEntry::new(labels::VERSION, c.component_version_name.clone()),
        ],
    }
}
