//! Round-trip checks on the plain-text export: every list item appears
//! exactly once, in its original order, under the fixed section headings.

use momsync::minutes::{export::render_plain_text, ActionItem, MinutesResult};

fn minutes_fixture() -> MinutesResult {
    MinutesResult {
        summary: "Kickoff for the data migration project.".to_string(),
        key_points: vec![
            "Current warehouse is at capacity".to_string(),
            "Two vendors shortlisted".to_string(),
            "Security review required before contract".to_string(),
        ],
        decisions: vec![
            "Migrate in Q4".to_string(),
            "Freeze schema changes during migration".to_string(),
        ],
        action_items: vec![
            ActionItem {
                task: "Prepare vendor comparison".to_string(),
                owner: "Lena".to_string(),
                deadline: Some("2026-08-20".to_string()),
            },
            ActionItem {
                task: "Book security review".to_string(),
                owner: "Tomas".to_string(),
                deadline: None,
            },
            ActionItem {
                task: "Draft rollback plan".to_string(),
                owner: "Lena".to_string(),
                deadline: Some("2026-09-01".to_string()),
            },
        ],
        next_steps: vec![
            "Vendor demos next week".to_string(),
            "Budget sign-off".to_string(),
        ],
        raw_transcript: Some("raw transcript text".to_string()),
    }
}

fn assert_once_in_order(text: &str, items: &[String]) {
    let mut cursor = 0;
    for item in items {
        let pos = text[cursor..]
            .find(item.as_str())
            .unwrap_or_else(|| panic!("'{}' missing or out of order", item));
        let absolute = cursor + pos;
        // No second occurrence anywhere after the first
        assert!(
            text[absolute + item.len()..].find(item.as_str()).is_none(),
            "'{}' appears more than once",
            item
        );
        cursor = absolute + item.len();
    }
}

#[test]
fn every_key_point_once_in_order() {
    let minutes = minutes_fixture();
    let text = render_plain_text(&minutes);
    assert_once_in_order(&text, &minutes.key_points);
}

#[test]
fn every_decision_once_in_order() {
    let minutes = minutes_fixture();
    let text = render_plain_text(&minutes);
    assert_once_in_order(&text, &minutes.decisions);
}

#[test]
fn every_next_step_once_in_order() {
    let minutes = minutes_fixture();
    let text = render_plain_text(&minutes);
    assert_once_in_order(&text, &minutes.next_steps);
}

#[test]
fn action_items_carry_owner_and_optional_deadline() {
    let minutes = minutes_fixture();
    let text = render_plain_text(&minutes);

    let rendered: Vec<String> = minutes
        .action_items
        .iter()
        .map(|item| match &item.deadline {
            Some(deadline) => format!(
                "- {} (Owner: {}, Deadline: {})",
                item.task, item.owner, deadline
            ),
            None => format!("- {} (Owner: {})", item.task, item.owner),
        })
        .collect();

    assert_once_in_order(&text, &rendered);
    // The deadline-less item must not grow a deadline
    assert!(text.contains("- Book security review (Owner: Tomas)\n"));
    assert_eq!(text.matches("Deadline:").count(), 2);
}

#[test]
fn summary_and_headings_present() {
    let minutes = minutes_fixture();
    let text = render_plain_text(&minutes);

    assert!(text.starts_with("MINUTES OF MEETING"));
    assert!(text.contains(&minutes.summary));
    for heading in [
        "SUMMARY:",
        "KEY DISCUSSION POINTS:",
        "DECISIONS MADE:",
        "ACTION ITEMS:",
        "NEXT STEPS:",
    ] {
        assert_eq!(text.matches(heading).count(), 1, "{} missing", heading);
    }
}

#[test]
fn raw_transcript_stays_out_of_the_export() {
    let minutes = minutes_fixture();
    let text = render_plain_text(&minutes);
    assert!(!text.contains("raw transcript text"));
}
