//! Scenario synthesis: a deterministic, pure function from collected
//! evidence to Given/When/Then text.
//!
//! At most one popup scenario and one hover scenario are emitted per run, a
//! precision-over-recall choice: only the highest-confidence finding per
//! category makes the report. Nothing here is fabricated; every quoted
//! label, title, and href comes from a Discovery or PopupCandidate.

use crate::discover::Discovery;
use crate::popups::PopupCandidate;

/// Longest trigger description quoted into a scenario title.
const TRIGGER_CHARS: usize = 60;

fn truncate_chars(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}

/// Render the behavioral report for one exploration run.
///
/// The popup scenario uses the first candidate, in detection order, that
/// carries a title or at least one action; candidates are never re-ranked.
/// The hover scenario uses the top-ranked discovery. When both lists are
/// empty the output is the feature header plus a manual-verification note.
pub fn synthesize(url: &str, discoveries: &[Discovery], popups: &[PopupCandidate]) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "Feature: Validate hover and popup interactions for \"{url}\""
    ));
    lines.push(String::new());

    if let Some(candidate) = popups
        .iter()
        .find(|p| p.title.is_some() || !p.actions.is_empty())
    {
        let title = candidate
            .title
            .clone()
            .unwrap_or_else(|| "Popup/Overlay".to_string());
        lines.push(format!(
            "Scenario: Validate popup/overlay behavior - \"{title}\""
        ));
        lines.push(format!("  Given the user is on \"{url}\""));
        lines.push("  When the user triggers the action that opens the popup".to_string());
        lines.push(format!(
            "  Then a pop-up/overlay should appear with title \"{title}\""
        ));
        if candidate.actions.is_empty() {
            lines.push(
                "  # No actionable buttons detected in popup; manual verification required"
                    .to_string(),
            );
        } else {
            let shown: Vec<&str> = candidate
                .actions
                .iter()
                .take(2)
                .map(|a| a.label.as_str())
                .collect();
            lines.push(format!(
                "  And the pop-up should contain buttons \"{}\"",
                shown.join("\", \"")
            ));
            let cancel = candidate.actions[0].label.as_str();
            let proceed = candidate
                .actions
                .get(1)
                .map(|a| a.label.as_str())
                .unwrap_or("Continue");
            lines.push(format!("  When the user clicks the \"{cancel}\" button"));
            lines.push(
                "  Then the pop-up should close and the user should remain on the same page"
                    .to_string(),
            );
            lines.push(format!(
                "  When the user triggers the popup again and clicks the \"{proceed}\" button"
            ));
            lines.push("  Then the page should navigate to the target link (if any)".to_string());
        }
        lines.push(String::new());
    }

    if let Some(top) = discoveries.first() {
        let trigger = if top.sample.text.is_empty() {
            top.sample.tag.clone()
        } else {
            top.sample.text.clone()
        };
        let trigger = truncate_chars(&trigger, TRIGGER_CHARS);
        lines.push(format!(
            "Scenario: Validate hover-based interaction for \"{trigger}\""
        ));
        lines.push(format!("  Given the user is on \"{url}\""));
        lines.push(format!(
            "  When the user hovers over the UI element that appears like \"{trigger}\""
        ));

        if let Some(link) = top.revealed.iter().find(|r| r.href.is_some()) {
            let href = link.href.as_deref().unwrap_or_default();
            let link_text = if link.text.is_empty() { href } else { link.text.as_str() };
            lines.push(format!(
                "  Then a dropdown/overlay should appear containing a link \"{link_text}\""
            ));
            lines.push(format!("  When the user clicks the link \"{link_text}\""));
            lines.push(format!(
                "  Then the page URL should change to \"{href}\""
            ));
        } else if let Some(first) = top.revealed.first() {
            let shown = if first.text.is_empty() { &first.tag } else { &first.text };
            lines.push(format!(
                "  Then a dropdown/overlay should appear containing text \"{shown}\""
            ));
        } else {
            lines.push(
                "  Then a hover-activated element should become visible (manual check)".to_string(),
            );
        }
        lines.push(String::new());
    }

    if popups.is_empty() && discoveries.is_empty() {
        lines.push(
            "  # No hover interactions or popups detected automatically. Manual checks required."
                .to_string(),
        );
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::RevealedNode;
    use crate::events::{BoundingBox, ElementFingerprint};
    use crate::popups::{PopupAction, PopupKind};

    const URL: &str = "https://example.com";

    fn discovery(text: &str, revealed: Vec<RevealedNode>) -> Discovery {
        let sample = ElementFingerprint {
            tag: "li".into(),
            classes: "menu".into(),
            sibling_index: 1,
            text: text.into(),
            bbox: BoundingBox { x: 10, y: 10, w: 60, h: 20 },
        };
        Discovery {
            key: sample.cluster_key(),
            count: 5,
            sample,
            revealed,
        }
    }

    fn revealed(text: &str, href: Option<&str>) -> RevealedNode {
        RevealedNode {
            tag: "a".into(),
            text: text.into(),
            href: href.map(str::to_string),
            fragment: None,
            bbox: BoundingBox { x: 12, y: 34, w: 80, h: 20 },
        }
    }

    fn dialog(title: &str, labels: &[&str]) -> PopupCandidate {
        PopupCandidate {
            kind: PopupKind::RoleDialog,
            title: if title.is_empty() { None } else { Some(title.into()) },
            actions: labels
                .iter()
                .map(|l| PopupAction { label: (*l).into(), href: None })
                .collect(),
            fragment: None,
            window_count: None,
        }
    }

    #[test]
    fn empty_run_emits_only_the_manual_note() {
        let text = synthesize(URL, &[], &[]);
        assert!(text.starts_with(
            "Feature: Validate hover and popup interactions for \"https://example.com\""
        ));
        assert!(text.contains("Manual checks required."));
        assert!(!text.contains("Scenario:"));
    }

    #[test]
    fn popup_scenario_names_both_buttons_and_both_flows() {
        let popups = vec![dialog("Session expiring", &["Cancel", "Continue"])];
        let text = synthesize(URL, &[], &popups);
        assert!(text.contains("Scenario: Validate popup/overlay behavior - \"Session expiring\""));
        assert!(text.contains("contain buttons \"Cancel\", \"Continue\""));
        assert!(text.contains("When the user clicks the \"Cancel\" button"));
        assert!(text.contains("the user should remain on the same page"));
        assert!(text.contains("clicks the \"Continue\" button"));
        assert!(text.contains("Then the page should navigate to the target link"));
    }

    #[test]
    fn popup_without_buttons_gets_a_manual_note() {
        let popups = vec![dialog("Cookie notice", &[])];
        let text = synthesize(URL, &[], &popups);
        assert!(text.contains("No actionable buttons detected in popup"));
        assert!(!text.contains("clicks the"));
    }

    #[test]
    fn first_qualifying_popup_wins_without_reranking() {
        let popups = vec![
            dialog("", &[]),
            dialog("Second", &["OK"]),
            dialog("Third", &["A", "B"]),
        ];
        let text = synthesize(URL, &[], &popups);
        assert!(text.contains("\"Second\""));
        assert!(!text.contains("\"Third\""));
    }

    #[test]
    fn hover_scenario_asserts_a_url_change_when_a_link_was_revealed() {
        let top = discovery("Products", vec![revealed("All products", Some("/products"))]);
        let text = synthesize(URL, &[top], &[]);
        assert!(text.contains("Scenario: Validate hover-based interaction for \"Products\""));
        assert!(text.contains("containing a link \"All products\""));
        assert!(text.contains("When the user clicks the link \"All products\""));
        assert!(text.contains("Then the page URL should change to \"/products\""));
    }

    #[test]
    fn hover_scenario_falls_back_to_visible_text() {
        let top = discovery("Products", vec![revealed("New arrivals", None)]);
        let text = synthesize(URL, &[top], &[]);
        assert!(text.contains("containing text \"New arrivals\""));
        assert!(!text.contains("URL should change"));
    }

    #[test]
    fn hover_scenario_with_nothing_revealed_asks_for_a_manual_check() {
        let top = discovery("Products", vec![]);
        let text = synthesize(URL, &[top], &[]);
        assert!(text.contains("should become visible (manual check)"));
    }

    #[test]
    fn empty_trigger_text_falls_back_to_the_tag_name() {
        let top = discovery("", vec![]);
        let text = synthesize(URL, &[top], &[]);
        assert!(text.contains("interaction for \"li\""));
    }

    #[test]
    fn trigger_text_is_truncated_to_sixty_chars() {
        let long = "x".repeat(200);
        let top = discovery(&long, vec![]);
        let text = synthesize(URL, &[top], &[]);
        assert!(text.contains(&format!("interaction for \"{}\"", "x".repeat(60))));
    }

    #[test]
    fn output_is_deterministic() {
        let popups = vec![dialog("T", &["A", "B"])];
        let discoveries = vec![discovery("Menu", vec![revealed("L", Some("/l"))])];
        assert_eq!(
            synthesize(URL, &discoveries, &popups),
            synthesize(URL, &discoveries, &popups)
        );
    }
}
