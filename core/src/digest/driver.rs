use super::event::{Event, EventCategory};
use super::lookup::{MemoizedLookup, VulnerabilityLookup};
use super::policy::PolicyReducer;
use super::store::EventStore;
use super::vulnerability::{LookupFailure, VulnerabilityReducer};
use crate::config::DigestConfig;
use crate::error::CoreResult;
use crate::notification::model::{parse_timestamp, NotificationRecord};
use serde::{Deserialize, Serialize};

/// A record that was skipped because it did not have the shape its tag
/// promises.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordError {
    pub index: usize,
    pub kind: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReductionStats {
    pub records_seen: usize,
    pub records_applied: usize,
    pub records_ignored: usize,
    pub records_malformed: usize,
    pub records_outside_window: usize,
    pub lookup_calls: usize,
    pub events_filtered: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DigestOutcome {
    /// Surviving events, in key order. Order carries no meaning.
    pub events: Vec<Event>,
    pub record_errors: Vec<RecordError>,
    pub lookup_failures: Vec<LookupFailure>,
    pub stats: ReductionStats,
}

/// Reduce one chronologically ordered batch to its net digest events.
pub fn reduce<L: VulnerabilityLookup + ?Sized>(
    records: &[NotificationRecord],
    lookup: &L,
) -> CoreResult<DigestOutcome> {
    reduce_with_config(records, lookup, &DigestConfig::default())
}

/// Like [`reduce`], with a category filter and an optional time window.
///
/// Records are applied strictly in the order given; the caller owns the
/// chronological sort. Only an invalid configuration fails the whole run.
pub fn reduce_with_config<L: VulnerabilityLookup + ?Sized>(
    records: &[NotificationRecord],
    lookup: &L,
    config: &DigestConfig,
) -> CoreResult<DigestOutcome> {
    let window = config.validate()?;

    let mut store = EventStore::new();
    let mut policy = PolicyReducer::new();
    let mut vulnerability = VulnerabilityReducer::new();
    let mut memo = MemoizedLookup::new(lookup);
    let mut outcome = DigestOutcome::default();

    for (index, record) in records.iter().enumerate() {
        outcome.stats.records_seen += 1;

        if let NotificationRecord::Unknown = record {
            tracing::debug!(index, "ignoring record of unknown kind");
            outcome.stats.records_ignored += 1;
            continue;
        }

        let checked = record.validate().and_then(|()| {
            let ts = record.timestamp().unwrap_or_default();
            parse_timestamp(ts).map_err(|e| e.to_string())
        });
        let ts = match checked {
            Ok(ts) => ts,
            Err(reason) => {
                tracing::warn!(index, kind = record.kind(), %reason, "skipping malformed record");
                outcome.stats.records_malformed += 1;
                outcome.record_errors.push(RecordError {
                    index,
                    kind: record.kind().to_string(),
                    reason,
                });
                continue;
            }
        };
        if !window.contains(ts) {
            outcome.stats.records_outside_window += 1;
            continue;
        }

        match record {
            NotificationRecord::PolicyViolation(_)
            | NotificationRecord::PolicyOverride(_)
            | NotificationRecord::PolicyClear(_) => policy.apply(&mut store, record),
            NotificationRecord::VulnerabilityDelta(delta) => vulnerability.apply(delta),
            NotificationRecord::Unknown => {}
        }
        outcome.stats.records_applied += 1;
    }

    // A disabled category never reaches the lookup collaborator.
    if config.is_enabled(EventCategory::VULNERABILITY) {
        outcome.lookup_failures = vulnerability.finish(&mut store, &mut memo);
    } else {
        outcome.stats.events_filtered += vulnerability.publishable();
    }
    outcome.stats.lookup_calls = memo.calls();

    for event in store.into_events() {
        if config.is_enabled(event.category) {
            outcome.events.push(event);
        } else {
            outcome.stats.events_filtered += 1;
        }
    }

    tracing::info!(
        records = outcome.stats.records_seen,
        events = outcome.events.len(),
        malformed = outcome.stats.records_malformed,
        lookup_failures = outcome.lookup_failures.len(),
        "digest batch reduced"
    );
    Ok(outcome)
}
