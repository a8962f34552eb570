use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const ISSUE_TYPE: &str = "issueType";
const PROJECT_VERSION: &str = "projectVersion";
const COMPONENT_VERSION: &str = "componentVersion";
const POLICY_RULE: &str = "policyRule";

const ISSUE_TYPE_POLICY: &str = "POLICY";
const ISSUE_TYPE_VULNERABILITY: &str = "VULNERABILITY";

const NAME_VALUE_SEPARATOR: char = '=';
const PAIR_SEPARATOR: char = '|';

/// Deduplication identity of a digest event.
///
/// Built only from relative URLs, never from display names, so renaming a
/// rule or a version does not split one entity into two events.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(String);

impl EventKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn build_policy_key(
    project_version_url: &str,
    component_version_url: &str,
    rule_url: &str,
) -> EventKey {
    let mut b = KeyBuilder::new(ISSUE_TYPE_POLICY);
    b.hashed(PROJECT_VERSION, project_version_url);
    b.hashed(COMPONENT_VERSION, component_version_url);
    b.hashed(POLICY_RULE, rule_url);
    b.finish()
}

pub fn build_vulnerability_key(project_version_url: &str, component_version_url: &str) -> EventKey {
    let mut b = KeyBuilder::new(ISSUE_TYPE_VULNERABILITY);
    b.hashed(PROJECT_VERSION, project_version_url);
    b.hashed(COMPONENT_VERSION, component_version_url);
    b.finish()
}

// Field order and separators are part of the key format.
struct KeyBuilder {
    buf: String,
}

impl KeyBuilder {
    fn new(issue_type: &str) -> Self {
        let mut buf = String::with_capacity(256);
        buf.push_str(ISSUE_TYPE);
        buf.push(NAME_VALUE_SEPARATOR);
        buf.push_str(issue_type);
        Self { buf }
    }

    fn hashed(&mut self, name: &str, value: &str) {
        self.buf.push(PAIR_SEPARATOR);
        self.buf.push_str(name);
        self.buf.push(NAME_VALUE_SEPARATOR);
        self.buf.push_str(&sha256_hex(value.as_bytes()));
    }

    fn finish(self) -> EventKey {
        EventKey(self.buf)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}
