//! End-to-end exercise of the pure pipeline: raw event log plus a synthetic
//! DOM snapshot in, Given/When/Then text out. No browser involved.

use hoverscout_explore::discover::{build_discoveries, DomNode, NodeStyle};
use hoverscout_explore::events::{
    BoundingBox, DialogRecord, ElementFingerprint, InteractionEvent, InteractionKind,
};
use hoverscout_explore::popups::{assemble, DialogNode, PopupAction};
use hoverscout_explore::scenario::synthesize;

const URL: &str = "https://shop.example/";

fn hover_event(kind: InteractionKind, at_ms: u64) -> InteractionEvent {
    InteractionEvent {
        kind,
        at_ms,
        target: Some(ElementFingerprint {
            tag: "button".into(),
            classes: "nav.products".into(),
            sibling_index: 2,
            text: "Products".into(),
            bbox: BoundingBox { x: 120, y: 40, w: 90, h: 28 },
        }),
    }
}

fn style(display: &str, opacity: f64) -> NodeStyle {
    NodeStyle {
        display: display.into(),
        visibility: "visible".into(),
        opacity,
    }
}

/// A page with one hover-reactive element that reveals a sibling link: the
/// top discovery contains exactly that link and the synthesized scenario
/// asserts a URL change to its href.
#[test]
fn hover_reveal_flows_through_to_a_url_change_assertion() {
    // Both event kinds fire for the same physical element; they merge by
    // fingerprint instead of being suppressed.
    let events: Vec<InteractionEvent> = (0..4)
        .flat_map(|i| {
            [
                hover_event(InteractionKind::PointerOver, i * 10),
                hover_event(InteractionKind::MouseEnter, i * 10 + 1),
            ]
        })
        .collect();

    let snapshot = vec![
        // The revealed dropdown link, just under the trigger.
        DomNode {
            tag: "a".into(),
            text: "All products".into(),
            href: Some("/products".into()),
            fragment: Some("<a href=\"/products\">All products</a>".into()),
            bbox: BoundingBox { x: 120, y: 70, w: 140, h: 24 },
            style: style("block", 1.0),
        },
        // Still faded out: not revealed.
        DomNode {
            tag: "a".into(),
            text: "Hidden promo".into(),
            href: Some("/promo".into()),
            fragment: None,
            bbox: BoundingBox { x: 120, y: 96, w: 140, h: 24 },
            style: style("block", 0.0),
        },
        // Visible but on the other side of the page.
        DomNode {
            tag: "a".into(),
            text: "Footer".into(),
            href: Some("/footer".into()),
            fragment: None,
            bbox: BoundingBox { x: 900, y: 700, w: 80, h: 20 },
            style: style("block", 1.0),
        },
    ];

    let discoveries = build_discoveries(&events, &snapshot);
    assert_eq!(discoveries.len(), 1);
    let top = &discoveries[0];
    assert_eq!(top.count, 8);
    assert_eq!(top.revealed.len(), 1);
    assert_eq!(top.revealed[0].href.as_deref(), Some("/products"));

    let text = synthesize(URL, &discoveries, &[]);
    assert!(text.contains("When the user hovers over the UI element that appears like \"Products\""));
    assert!(text.contains("Then the page URL should change to \"/products\""));
}

/// A `role="dialog"` element with Cancel/Continue buttons yields one popup
/// candidate preserving DOM order, and the scenario covers both flows.
#[test]
fn role_dialog_produces_cancel_and_continue_flows() {
    let roles = vec![DialogNode {
        title: "Before you go".into(),
        buttons: vec![
            PopupAction { label: "Cancel".into(), href: None },
            PopupAction { label: "Continue".into(), href: Some("/checkout".into()) },
        ],
        fragment: Some("<div role=\"dialog\">...</div>".into()),
    }];
    let popups = assemble(&[], roles, Vec::new(), 0);
    assert_eq!(popups.len(), 1);
    assert_eq!(popups[0].actions[0].label, "Cancel");
    assert_eq!(popups[0].actions[1].label, "Continue");

    let text = synthesize(URL, &[], &popups);
    assert!(text.contains("And the pop-up should contain buttons \"Cancel\", \"Continue\""));
    assert!(text.contains("When the user clicks the \"Cancel\" button"));
    assert!(text.contains("When the user triggers the popup again and clicks the \"Continue\" button"));
}

/// An auto-dismissed native confirm still surfaces as a popup candidate.
#[test]
fn captured_native_dialog_precedes_dom_candidates() {
    let dialogs = vec![DialogRecord {
        kind: "confirm".into(),
        message: "Do you want to leave?".into(),
        default_value: None,
    }];
    let roles = vec![DialogNode {
        title: "Newsletter".into(),
        buttons: vec![PopupAction { label: "Subscribe".into(), href: None }],
        fragment: None,
    }];
    let popups = assemble(&dialogs, roles, Vec::new(), 0);
    let text = synthesize(URL, &[], &popups);
    // Detection order is stable: the first qualifying candidate wins.
    assert!(text.contains("Validate popup/overlay behavior - \"Do you want to leave?\""));
}

/// Zero interactive elements: empty lists and only the manual note.
#[test]
fn inert_page_reports_only_the_manual_note() {
    let discoveries = build_discoveries(&[], &[]);
    let popups = assemble(&[], Vec::new(), Vec::new(), 0);
    assert!(discoveries.is_empty());
    assert!(popups.is_empty());

    let text = synthesize(URL, &discoveries, &popups);
    assert!(text.contains("No hover interactions or popups detected automatically."));
    assert!(!text.contains("Scenario:"));
}
