//! Popup and overlay detection, independent of hover discoveries.
//!
//! Three sources feed one candidate list, in fixed detection order: native
//! dialogs captured (and auto-dismissed) by the instrumentation, elements
//! marked as dialogs by accessibility attributes, and positioned elements
//! stacked above normal flow. Secondary windows opened during exploration
//! are recorded only as a count and never followed here; following links is
//! the opt-in click verifier's job.

use anyhow::Result;
use hoverscout_drivers::scout_browser::page::ScoutPage;
use serde::{Deserialize, Serialize};

use crate::events::DialogRecord;

/// Stacking index a positioned element must exceed to count as an overlay.
const OVERLAY_Z_THRESHOLD: i64 = 40;
/// Minimum rendered size for an overlay candidate (width OR height).
const OVERLAY_MIN_WIDTH: i64 = 80;
const OVERLAY_MIN_HEIGHT: i64 = 40;
/// At most this many overlay candidates are kept.
const MAX_OVERLAYS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PopupKind {
    BrowserDialog,
    RoleDialog,
    Overlay,
    PopupWindow,
}

/// One actionable control captured inside a dialog or overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupAction {
    /// Visible label, at most 60 chars (capped in-page).
    #[serde(rename = "text")]
    pub label: String,
    #[serde(default)]
    pub href: Option<String>,
}

/// A modal, overlay, native dialog, or secondary-window observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopupCandidate {
    pub kind: PopupKind,
    pub title: Option<String>,
    /// Up to eight actionable controls, in DOM order.
    pub actions: Vec<PopupAction>,
    pub fragment: Option<String>,
    /// Secondary windows observed; only set for [`PopupKind::PopupWindow`].
    pub window_count: Option<usize>,
}

/// An element carrying `role="dialog"` or `aria-modal="true"`.
#[derive(Debug, Clone, Deserialize)]
pub struct DialogNode {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub buttons: Vec<PopupAction>,
    #[serde(default)]
    pub fragment: Option<String>,
}

/// A positioned element, candidate for the overlay heuristic.
#[derive(Debug, Clone, Deserialize)]
pub struct OverlayNode {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub buttons: Vec<PopupAction>,
    #[serde(default)]
    pub fragment: Option<String>,
    pub position: String,
    #[serde(rename = "zIndex")]
    pub z_index: i64,
    pub width: i64,
    pub height: i64,
}

const DIALOG_SCAN_SCRIPT: &str = r#"
var res = [];
function describe(el) {
    var head = el.querySelector('h1,h2,h3') || el.querySelector('.title');
    var buttons = Array.prototype.slice.call(el.querySelectorAll('a,button'), 0, 8)
        .map(function (b) {
            return { text: (b.innerText || b.textContent || '').trim().slice(0, 60),
                     href: b.getAttribute ? b.getAttribute('href') : null };
        });
    return {
        title: head && head.innerText ? head.innerText.trim().slice(0, 120) : '',
        buttons: buttons,
        fragment: el.outerHTML ? el.outerHTML.slice(0, 800) : null
    };
}
document.querySelectorAll('[role="dialog"], [aria-modal="true"]').forEach(function (el) {
    try { res.push(describe(el)); } catch (e) {}
});
return res;
"#;

/// Positioned elements already past the stacking and size thresholds, so
/// low-z decorations never count toward the cap. The Rust-side
/// [`is_overlay`] predicate re-applies the same rule.
const OVERLAY_SCAN_SCRIPT: &str = r#"
var res = [];
var nodes = document.querySelectorAll('body *');
for (var i = 0; i < nodes.length && res.length < 40; i++) {
    var el = nodes[i];
    try {
        var cs = getComputedStyle(el);
        if (cs.position !== 'fixed' && cs.position !== 'sticky' && cs.position !== 'absolute') {
            continue;
        }
        var z = parseInt(cs.zIndex || '0', 10) || 0;
        if (z <= 40) continue;
        if (el.offsetWidth <= 80 && el.offsetHeight <= 40) continue;
        var head = el.querySelector('h1,h2,h3') || el.querySelector('.title');
        var buttons = Array.prototype.slice.call(el.querySelectorAll('a,button'), 0, 8)
            .map(function (b) {
                return { text: (b.innerText || b.textContent || '').trim().slice(0, 60),
                         href: b.getAttribute ? b.getAttribute('href') : null };
            });
        res.push({
            title: head && head.innerText ? head.innerText.trim().slice(0, 120) : '',
            buttons: buttons,
            fragment: el.outerHTML ? el.outerHTML.slice(0, 800) : null,
            position: cs.position,
            zIndex: parseInt(cs.zIndex || '0', 10) || 0,
            width: el.offsetWidth,
            height: el.offsetHeight
        });
    } catch (e) {}
}
return res;
"#;

/// Query the live DOM for accessibility-marked dialogs.
pub async fn dialog_scan(page: &ScoutPage) -> Result<Vec<DialogNode>> {
    page.eval(DIALOG_SCAN_SCRIPT, vec![]).await
}

/// Query the live DOM for positioned elements.
pub async fn overlay_scan(page: &ScoutPage) -> Result<Vec<OverlayNode>> {
    page.eval(OVERLAY_SCAN_SCRIPT, vec![]).await
}

/// Above normal flow, stacked high enough, and not trivially small.
pub fn is_overlay(node: &OverlayNode) -> bool {
    matches!(node.position.as_str(), "fixed" | "sticky" | "absolute")
        && node.z_index > OVERLAY_Z_THRESHOLD
        && (node.width > OVERLAY_MIN_WIDTH || node.height > OVERLAY_MIN_HEIGHT)
}

fn non_empty(title: String) -> Option<String> {
    if title.is_empty() { None } else { Some(title) }
}

/// Assemble the candidate list in fixed detection order: native dialogs,
/// role-marked dialogs, overlays, then a secondary-window count.
pub fn assemble(
    dialogs: &[DialogRecord],
    dialog_nodes: Vec<DialogNode>,
    overlay_nodes: Vec<OverlayNode>,
    window_count: usize,
) -> Vec<PopupCandidate> {
    let mut candidates = Vec::new();

    for dialog in dialogs {
        candidates.push(PopupCandidate {
            kind: PopupKind::BrowserDialog,
            title: non_empty(dialog.message.clone()),
            actions: Vec::new(),
            fragment: None,
            window_count: None,
        });
    }

    for node in dialog_nodes {
        candidates.push(PopupCandidate {
            kind: PopupKind::RoleDialog,
            title: non_empty(node.title),
            actions: node.buttons,
            fragment: node.fragment,
            window_count: None,
        });
    }

    for node in overlay_nodes
        .into_iter()
        .filter(|n| is_overlay(n))
        .take(MAX_OVERLAYS)
    {
        candidates.push(PopupCandidate {
            kind: PopupKind::Overlay,
            title: non_empty(node.title),
            actions: node.buttons,
            fragment: node.fragment,
            window_count: None,
        });
    }

    if window_count > 0 {
        candidates.push(PopupCandidate {
            kind: PopupKind::PopupWindow,
            title: None,
            actions: Vec::new(),
            fragment: None,
            window_count: Some(window_count),
        });
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(position: &str, z: i64, w: i64, h: i64) -> OverlayNode {
        OverlayNode {
            title: String::new(),
            buttons: Vec::new(),
            fragment: None,
            position: position.into(),
            z_index: z,
            width: w,
            height: h,
        }
    }

    #[test]
    fn overlay_predicate_needs_stacking_and_size() {
        assert!(is_overlay(&overlay("fixed", 41, 100, 10)));
        assert!(is_overlay(&overlay("sticky", 999, 10, 50)));
        assert!(!is_overlay(&overlay("fixed", 40, 100, 100)));
        assert!(!is_overlay(&overlay("static", 999, 100, 100)));
        assert!(!is_overlay(&overlay("absolute", 50, 80, 40)));
    }

    #[test]
    fn detection_order_is_dialogs_then_roles_then_overlays_then_windows() {
        let dialogs = vec![DialogRecord {
            kind: "confirm".into(),
            message: "Leave page?".into(),
            default_value: None,
        }];
        let roles = vec![DialogNode {
            title: "Session expiring".into(),
            buttons: vec![
                PopupAction { label: "Cancel".into(), href: None },
                PopupAction { label: "Continue".into(), href: Some("/renew".into()) },
            ],
            fragment: Some("<div role=\"dialog\">".into()),
        }];
        let overlays = vec![overlay("fixed", 100, 300, 200)];

        let candidates = assemble(&dialogs, roles, overlays, 2);
        let kinds: Vec<PopupKind> = candidates.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PopupKind::BrowserDialog,
                PopupKind::RoleDialog,
                PopupKind::Overlay,
                PopupKind::PopupWindow,
            ]
        );
        assert_eq!(candidates[0].title.as_deref(), Some("Leave page?"));
        assert_eq!(candidates[3].window_count, Some(2));
    }

    #[test]
    fn role_dialog_buttons_keep_dom_order() {
        let roles = vec![DialogNode {
            title: String::new(),
            buttons: vec![
                PopupAction { label: "Cancel".into(), href: None },
                PopupAction { label: "Continue".into(), href: None },
            ],
            fragment: None,
        }];
        let candidates = assemble(&[], roles, Vec::new(), 0);
        assert_eq!(candidates[0].actions[0].label, "Cancel");
        assert_eq!(candidates[0].actions[1].label, "Continue");
    }

    #[test]
    fn low_stacked_decorations_never_crowd_out_a_qualifying_overlay() {
        let mut overlays: Vec<OverlayNode> =
            (0..10).map(|_| overlay("absolute", 1, 20, 20)).collect();
        overlays.push(overlay("fixed", 100, 300, 200));
        let candidates = assemble(&[], Vec::new(), overlays, 0);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, PopupKind::Overlay);
    }

    #[test]
    fn overlays_are_capped_at_six() {
        let overlays: Vec<OverlayNode> =
            (0..10).map(|_| overlay("fixed", 100, 300, 200)).collect();
        let candidates = assemble(&[], Vec::new(), overlays, 0);
        assert_eq!(candidates.len(), MAX_OVERLAYS);
    }

    #[test]
    fn no_sources_means_no_candidates() {
        assert!(assemble(&[], Vec::new(), Vec::new(), 0).is_empty());
    }
}
