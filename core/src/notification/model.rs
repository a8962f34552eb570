use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Project version and component version a notification is about.
///
/// The relative URLs are the stable identity; names are display-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentIdentity {
    pub project_name: String,
    pub project_version_name: String,
    pub component_name: String,
    pub component_version_name: String,
    pub project_version_url: String,
    pub component_version_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyRuleRef {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VulnerabilityId {
    pub source: String,
    pub id: String,
}

impl VulnerabilityId {
    pub fn new(source: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for VulnerabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyNotification {
    pub timestamp: String, // RFC3339
    pub component: ComponentIdentity,
    pub rules: Vec<PolicyRuleRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VulnerabilityNotification {
    pub timestamp: String, // RFC3339
    pub component: ComponentIdentity,
    #[serde(default)]
    pub added: Vec<VulnerabilityId>,
    #[serde(default)]
    pub updated: Vec<VulnerabilityId>,
    #[serde(default)]
    pub deleted: Vec<VulnerabilityId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationRecord {
    PolicyViolation(PolicyNotification),
    PolicyOverride(PolicyNotification),
    PolicyClear(PolicyNotification),
    VulnerabilityDelta(VulnerabilityNotification),
    /// Any tag this crate does not know about. Carried through and ignored.
    #[serde(other)]
    Unknown,
}

impl NotificationRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationRecord::PolicyViolation(_) => "POLICY_VIOLATION",
            NotificationRecord::PolicyOverride(_) => "POLICY_OVERRIDE",
            NotificationRecord::PolicyClear(_) => "POLICY_CLEAR",
            NotificationRecord::VulnerabilityDelta(_) => "VULNERABILITY_DELTA",
            NotificationRecord::Unknown => "UNKNOWN",
        }
    }

    pub fn timestamp(&self) -> Option<&str> {
        match self {
            NotificationRecord::PolicyViolation(p)
            | NotificationRecord::PolicyOverride(p)
            | NotificationRecord::PolicyClear(p) => Some(&p.timestamp),
            NotificationRecord::VulnerabilityDelta(v) => Some(&v.timestamp),
            NotificationRecord::Unknown => None,
        }
    }

    pub fn component(&self) -> Option<&ComponentIdentity> {
        match self {
            NotificationRecord::PolicyViolation(p)
            | NotificationRecord::PolicyOverride(p)
            | NotificationRecord::PolicyClear(p) => Some(&p.component),
            NotificationRecord::VulnerabilityDelta(v) => Some(&v.component),
            NotificationRecord::Unknown => None,
        }
    }

    /// Checks the record has the shape its tag promises.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(c) = self.component() {
            if c.project_version_url.trim().is_empty() {
                return Err("project_version_url is empty".to_string());
            }
            if c.component_version_url.trim().is_empty() {
                return Err("component_version_url is empty".to_string());
            }
        }
        match self {
            NotificationRecord::PolicyViolation(p)
            | NotificationRecord::PolicyOverride(p)
            | NotificationRecord::PolicyClear(p) => {
                if p.rules.is_empty() {
                    return Err(format!("{} carries no policy rules", self.kind()));
                }
                if let Some(r) = p.rules.iter().find(|r| r.url.trim().is_empty()) {
                    return Err(format!("policy rule '{}' has an empty url", r.name));
                }
                Ok(())
            }
            NotificationRecord::VulnerabilityDelta(v) => {
                if v.added.is_empty() && v.updated.is_empty() && v.deleted.is_empty() {
                    return Err("vulnerability delta has no added, updated or deleted ids".to_string());
                }
                Ok(())
            }
            NotificationRecord::Unknown => Ok(()),
        }
    }
}

pub fn parse_timestamp(s: &str) -> CoreResult<OffsetDateTime> {
    OffsetDateTime::parse(s.trim(), &Rfc3339)
        .map_err(|e| CoreError::InvalidInput(format!("invalid RFC3339 timestamp '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> ComponentIdentity {
        ComponentIdentity {
            project_name: "billing".to_string(),
            project_version_name: "1.0".to_string(),
            component_name: "openssl".to_string(),
            component_version_name: "1.0.2k".to_string(),
            project_version_url: "/api/projects/p1/versions/v1".to_string(),
            component_version_url: "/api/components/c1/versions/cv1".to_string(),
        }
    }

    #[test]
    fn decodes_tagged_policy_record() {
        let json = r#"{"type":"POLICY_OVERRIDE","timestamp":"2026-02-10T00:00:00Z",
            "component":{"project_name":"billing","project_version_name":"1.0",
            "component_name":"openssl","component_version_name":"1.0.2k",
            "project_version_url":"/p/1","component_version_url":"/c/1"},
            "rules":[{"name":"No GPL","url":"/rules/1"}]}"#;
        let rec: NotificationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.kind(), "POLICY_OVERRIDE");
        assert!(rec.validate().is_ok());
    }

    #[test]
    fn unknown_tag_decodes_to_unknown() {
        let rec: NotificationRecord =
            serde_json::from_str(r#"{"type":"BOM_EDIT","timestamp":"x"}"#).unwrap();
        assert_eq!(rec, NotificationRecord::Unknown);
        assert!(rec.validate().is_ok());
    }

    #[test]
    fn policy_record_without_rules_is_malformed() {
        let rec = NotificationRecord::PolicyViolation(PolicyNotification {
            timestamp: "2026-02-10T00:00:00Z".to_string(),
            component: identity(),
            rules: vec![],
        });
        assert!(rec.validate().is_err());
    }

    #[test]
    fn empty_delta_is_malformed() {
        let rec = NotificationRecord::VulnerabilityDelta(VulnerabilityNotification {
            timestamp: "2026-02-10T00:00:00Z".to_string(),
            component: identity(),
            added: vec![],
            updated: vec![],
            deleted: vec![],
        });
        assert!(rec.validate().is_err());
    }

    #[test]
    fn vulnerability_id_display() {
        assert_eq!(VulnerabilityId::new("NVD", "CVE-2016-2107").to_string(), "NVD:CVE-2016-2107");
    }

    #[test]
    fn rejects_non_rfc3339_timestamp() {
        assert!(parse_timestamp("2026-02-10T00:00:00Z").is_ok());
        assert!(parse_timestamp("last tuesday").is_err());
    }
}
