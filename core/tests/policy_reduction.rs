use digest_core::digest::driver::reduce;
use digest_core::digest::event::{EventCategory, ItemEntry};
use digest_core::digest::lookup::VulnerabilityCatalog;
use digest_core::notification::model::{
    ComponentIdentity, NotificationRecord, PolicyNotification, PolicyRuleRef,
};

const PROJECT: &str = "billing-service";
const PROJECT_VERSION: &str = "2.4.0";
const COMPONENT: &str = "jackson-databind";
const VERSION: &str = "2.9.8";

fn notification(second: u32) -> PolicyNotification {
    PolicyNotification {
        timestamp: format!("2026-02-10T09:00:{:02}Z", second),
        component: ComponentIdentity {
            project_name: PROJECT.to_string(),
            project_version_name: PROJECT_VERSION.to_string(),
            component_name: COMPONENT.to_string(),
            component_version_name: VERSION.to_string(),
            project_version_url: "/api/projects/p1/versions/v1".to_string(),
            component_version_url: "/api/components/c1/versions/cv1".to_string(),
        },
        rules: vec![PolicyRuleRef {
            name: "Rule1".to_string(),
            url: "/api/policy-rules/1".to_string(),
        }],
    }
}

fn violation(second: u32) -> NotificationRecord {
    NotificationRecord::PolicyViolation(notification(second))
}

fn overridden(second: u32) -> NotificationRecord {
    NotificationRecord::PolicyOverride(notification(second))
}

fn cleared(second: u32) -> NotificationRecord {
    NotificationRecord::PolicyClear(notification(second))
}

fn categories(records: &[NotificationRecord]) -> Vec<EventCategory> {
    let out = reduce(records, &VulnerabilityCatalog::default()).unwrap();
    assert!(out.record_errors.is_empty());
    out.events.iter().map(|e| e.category).collect()
}

#[test]
fn single_violation_yields_one_event_with_rule_component_version() {
    let out = reduce(&[violation(0)], &VulnerabilityCatalog::default()).unwrap();
    assert_eq!(out.events.len(), 1);
    let ev = &out.events[0];
    assert_eq!(ev.category, EventCategory::POLICY_VIOLATION);
    assert_eq!(ev.project.project_name, PROJECT);
    assert_eq!(ev.project.project_version_name, PROJECT_VERSION);
    assert_eq!(
        ev.dataset,
        vec![
            ItemEntry::new("RULE", "Rule1"),
            ItemEntry::new("COMPONENT", COMPONENT),
            ItemEntry::new("", VERSION),
        ]
    );
}

#[test]
fn lone_override_is_reported() {
    assert_eq!(
        categories(&[overridden(0)]),
        vec![EventCategory::POLICY_VIOLATION_OVERRIDE]
    );
}

#[test]
fn lone_clear_is_reported() {
    assert_eq!(
        categories(&[cleared(0)]),
        vec![EventCategory::POLICY_VIOLATION_CLEARED]
    );
}

#[test]
fn violation_then_override_is_empty() {
    assert!(categories(&[violation(0), overridden(1)]).is_empty());
}

#[test]
fn violation_then_clear_is_empty() {
    assert!(categories(&[violation(0), cleared(1)]).is_empty());
}

#[test]
fn violation_clear_violation_leaves_violation() {
    assert_eq!(
        categories(&[violation(0), cleared(1), violation(2)]),
        vec![EventCategory::POLICY_VIOLATION]
    );
}

#[test]
fn violation_override_violation_leaves_violation() {
    assert_eq!(
        categories(&[violation(0), overridden(1), violation(2)]),
        vec![EventCategory::POLICY_VIOLATION]
    );
}

#[test]
fn repeated_violations_cancel_on_final_clear() {
    let records = [
        violation(0),
        violation(1),
        overridden(2),
        violation(3),
        cleared(4),
    ];
    assert!(categories(&records).is_empty());
}

#[test]
fn display_names_do_not_split_identity() {
    let mut renamed = notification(1);
    renamed.rules[0].name = "Rule1 (renamed)".to_string();
    renamed.component.component_version_name = "2.9.8-patched".to_string();
    let records = [violation(0), NotificationRecord::PolicyClear(renamed)];
    assert!(categories(&records).is_empty());
}
