use super::model::{parse_timestamp, NotificationRecord};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// A record that could not be decoded: a 1-based NDJSON line, or a 1-based
/// position in a JSON array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineError {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub records: Vec<NotificationRecord>,
    pub line_errors: Vec<LineError>,
}

impl ParsedBatch {
    fn push_decoded(&mut self, line: usize, decoded: Result<NotificationRecord, serde_json::Error>) {
        match decoded {
            Ok(rec) => self.records.push(rec),
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping undecodable record");
                self.line_errors.push(LineError {
                    line,
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Parse a JSON array of records.
///
/// The document itself must be an array; elements that do not decode are
/// collected in `line_errors` by position and skipped.
pub fn parse_json_records(json_str: &str) -> CoreResult<ParsedBatch> {
    let elements: Vec<serde_json::Value> = serde_json::from_str(json_str)
        .map_err(|e| CoreError::InvalidInput(format!("Failed to parse JSON records: {}", e)))?;

    let mut batch = ParsedBatch::default();
    for (pos, value) in elements.into_iter().enumerate() {
        batch.push_decoded(pos + 1, serde_json::from_value(value));
    }
    Ok(batch)
}

/// Parse NDJSON records (one JSON object per line).
///
/// Undecodable lines are collected in `line_errors` and skipped so that one
/// bad line does not throw away the rest of the batch.
pub fn parse_ndjson_records(ndjson_str: &str) -> ParsedBatch {
    let mut batch = ParsedBatch::default();

    for (line_num, line) in ndjson_str.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        batch.push_decoded(line_num + 1, serde_json::from_str(trimmed));
    }

    batch
}

/// Decode either format, sniffing a leading `[` for a JSON array.
pub fn parse_records(content: &str) -> CoreResult<ParsedBatch> {
    if content.trim_start().starts_with('[') {
        parse_json_records(content)
    } else {
        Ok(parse_ndjson_records(content))
    }
}

/// Stable ascending sort by timestamp; ties keep their input order.
///
/// Records without a usable timestamp (unknown kinds, unparseable values)
/// sort first and are left for the driver to report.
pub fn sort_chronologically(records: Vec<NotificationRecord>) -> Vec<NotificationRecord> {
    let mut keyed: Vec<_> = records
        .into_iter()
        .map(|rec| {
            let ts = rec.timestamp().and_then(|s| parse_timestamp(s).ok());
            (ts, rec)
        })
        .collect();
    keyed.sort_by_key(|(ts, _)| *ts);
    keyed.into_iter().map(|(_, rec)| rec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(kind: &str, ts: &str, rule: &str) -> String {
        format!(
            r#"{{"type":"{}","timestamp":"{}","component":{{"project_name":"p","project_version_name":"1","component_name":"c","component_version_name":"2","project_version_url":"/pv/1","component_version_url":"/cv/1"}},"rules":[{{"name":"{}","url":"/rules/{}"}}]}}"#,
            kind, ts, rule, rule
        )
    }

    #[test]
    fn ndjson_collects_bad_lines_and_keeps_good_ones() {
        let content = format!(
            "{}\nnot json at all\n\n{}\n",
            line("POLICY_VIOLATION", "2026-02-10T00:00:00Z", "r1"),
            line("POLICY_CLEAR", "2026-02-10T00:00:01Z", "r1")
        );
        let batch = parse_ndjson_records(&content);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.line_errors.len(), 1);
        assert_eq!(batch.line_errors[0].line, 2);
    }

    #[test]
    fn json_array_is_sniffed() {
        let content = format!("[{}]", line("POLICY_VIOLATION", "2026-02-10T00:00:00Z", "r1"));
        let batch = parse_records(&content).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert!(batch.line_errors.is_empty());
    }

    #[test]
    fn sort_is_stable_for_equal_timestamps() {
        let content = [
            line("POLICY_CLEAR", "2026-02-10T00:00:05Z", "late"),
            line("POLICY_VIOLATION", "2026-02-10T00:00:01Z", "first"),
            line("POLICY_OVERRIDE", "2026-02-10T00:00:01Z", "second"),
        ]
        .join("\n");
        let sorted = sort_chronologically(parse_ndjson_records(&content).records);
        let kinds: Vec<&str> = sorted.iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, vec!["POLICY_VIOLATION", "POLICY_OVERRIDE", "POLICY_CLEAR"]);
    }

    #[test]
    fn json_array_keeps_good_elements_around_a_bad_one() {
        let content = format!(
            r#"[{},{{"type":"POLICY_VIOLATION","timestamp":"2026-02-10T00:00:01Z"}},{}]"#,
            line("POLICY_VIOLATION", "2026-02-10T00:00:00Z", "r1"),
            line("POLICY_CLEAR", "2026-02-10T00:00:02Z", "r1")
        );
        let batch = parse_records(&content).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.line_errors.len(), 1);
        assert_eq!(batch.line_errors[0].line, 2);
        assert!(batch.line_errors[0].reason.contains("component"));
    }

    #[test]
    fn truncated_json_array_is_rejected() {
        assert!(parse_json_records(r#"[{"type":"POLICY_VIOLATION"}"#).is_err());
    }

    #[test]
    fn sort_keeps_bad_timestamp_at_front() {
        let content = [
            line("POLICY_VIOLATION", "2026-02-10T00:00:00Z", "good"),
            line("POLICY_CLEAR", "yesterday", "bad"),
        ]
        .join("\n");
        let sorted = sort_chronologically(parse_ndjson_records(&content).records);
        let kinds: Vec<&str> = sorted.iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, vec!["POLICY_CLEAR", "POLICY_VIOLATION"]);
    }
}
