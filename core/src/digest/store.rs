use super::event::Event;
use super::key::EventKey;
use std::collections::BTreeMap;

/// Net event state of one reduction run, at most one event per key.
#[derive(Debug, Default)]
pub struct EventStore {
    events: BTreeMap<EventKey, Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, key: &EventKey) -> bool {
        self.events.contains_key(key)
    }

    pub fn get(&self, key: &EventKey) -> Option<&Event> {
        self.events.get(key)
    }

    pub fn get_mut(&mut self, key: &EventKey) -> Option<&mut Event> {
        self.events.get_mut(key)
    }

    /// Insert or replace the event stored under `event.key`.
    pub fn put(&mut self, event: Event) -> Option<Event> {
        self.events.insert(event.key.clone(), event)
    }

    pub fn remove(&mut self, key: &EventKey) -> Option<Event> {
        self.events.remove(key)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in key order.
    pub fn into_events(self) -> Vec<Event> {
        self.events.into_values().collect()
    }
}
