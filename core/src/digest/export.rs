use super::event::Event;
use crate::error::CoreResult;

/// Flatten events to one CSV row per dataset entry, ordered by key then
/// dataset position.
pub fn render_digest_csv(events: &[Event]) -> CoreResult<String> {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));

    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    wtr.write_record([
        "project",
        "project_version",
        "category",
        "label",
        "value",
        "event_key",
    ])?;
    for ev in sorted {
        let category = format!("{:?}", ev.category);
        for item in &ev.dataset {
            wtr.write_record([
                ev.project.project_name.as_str(),
                ev.project.project_version_name.as_str(),
                category.as_str(),
                item.label.as_str(),
                item.value.as_str(),
                ev.key.as_str(),
            ])?;
        }
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::event::{EventCategory, ItemEntry, ProjectRef};
    use crate::digest::key::build_policy_key;

    #[test]
    fn one_row_per_dataset_entry() {
        let ev = Event {
            key: build_policy_key("/pv/1", "/cv/1", "/rules/1"),
            category: EventCategory::POLICY_VIOLATION,
            project: ProjectRef {
                project_name: "billing".to_string(),
                project_version_name: "1.0".to_string(),
                project_version_url: "/pv/1".to_string(),
            },
            dataset: vec![
                ItemEntry::new("RULE", "No GPL, ever"),
                ItemEntry::new("COMPONENT", "openssl"),
                ItemEntry::new("", "1.0.2k"),
            ],
        };
        let csv = render_digest_csv(&[ev]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("project,project_version,category"));
        assert!(lines[1].contains("\"No GPL, ever\""));
        assert!(lines[3].contains("POLICY_VIOLATION,,1.0.2k"));
    }

    #[test]
    fn line_breaks_inside_values_survive() {
        let ev = Event {
            key: build_policy_key("/pv/1", "/cv/1", "/rules/1"),
            category: EventCategory::POLICY_VIOLATION,
            project: ProjectRef {
                project_name: "billing".to_string(),
                project_version_name: "1.0".to_string(),
                project_version_url: "/pv/1".to_string(),
            },
            dataset: vec![ItemEntry::new("RULE", "No GPL\r\nin release builds")],
        };
        let csv = render_digest_csv(&[ev]).unwrap();
        assert!(csv.contains("\"No GPL\r\nin release builds\""));
        assert!(csv.starts_with("project,project_version,category,label,value,event_key\n"));
        assert!(csv.ends_with('\n'));
    }
}
