//! Aggregation pass: fold the raw event log into ranked discoveries and
//! join each against the nodes currently visible near its trigger.
//!
//! The DOM is read once, scoped to the margin-expanded boxes of the
//! surviving clusters; every judgement after that (visibility, overlap,
//! ranking) is a pure function over the returned records so the heuristics
//! are testable without a browser.
//!
//! Known accuracy gap, kept deliberately: boxes are compared in viewport
//! coordinates as observed at capture time, so a page that scrolls during
//! exploration can make the overlap computation work on stale coordinates.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use anyhow::Result;
use hoverscout_drivers::scout_browser::page::ScoutPage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::{BoundingBox, ElementFingerprint, InteractionEvent};

/// At most this many clusters survive aggregation.
pub const MAX_DISCOVERIES: usize = 12;
/// At most this many revealed nodes are kept per discovery.
pub const MAX_REVEALED: usize = 12;
/// Trigger box expansion applied before the overlap test, per side.
pub const REVEAL_MARGIN: i64 = 8;
/// Overlapping nodes considered per trigger before the text/link filter.
const OVERLAP_SCAN_CAP: usize = 80;
/// Effective opacity at or below this counts as invisible.
const OPACITY_FLOOR: f64 = 0.03;

/// Computed-style facts the snapshot carries for the visibility predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: f64,
}

/// One element from the post-exploration DOM snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    pub tag: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub fragment: Option<String>,
    pub bbox: BoundingBox,
    pub style: NodeStyle,
}

/// A node judged newly relevant near a discovery's trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealedNode {
    pub tag: String,
    /// Visible text, at most 300 chars (capped in-page).
    pub text: String,
    pub href: Option<String>,
    /// Serialized fragment, at most 800 chars (capped in-page).
    pub fragment: Option<String>,
    pub bbox: BoundingBox,
}

/// A ranked cluster of enter events plus the UI it revealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discovery {
    /// Composite fingerprint key the cluster was grouped on.
    pub key: String,
    /// Raw events folded into this cluster; the primary ranking signal.
    pub count: usize,
    /// Most recent observation of the trigger element.
    pub sample: ElementFingerprint,
    pub revealed: Vec<RevealedNode>,
}

/// Snapshot of every sizable element under `body` that overlaps one of the
/// requested areas (`arguments[0]`). The whole node list is walked; only
/// overlapping nodes count toward the cap, so reveal containers appended
/// late in the document are never evicted by unrelated earlier nodes.
const SNAPSHOT_SCRIPT: &str = r#"
var areas = arguments[0] || [];
function hits(r) {
    for (var j = 0; j < areas.length; j++) {
        var a = areas[j];
        if (!(r.x + r.w < a.x || r.x > a.x + a.w ||
              r.y + r.h < a.y || r.y > a.y + a.h)) return true;
    }
    return false;
}
var out = [];
var nodes = document.querySelectorAll('body *');
for (var i = 0; i < nodes.length && out.length < 600; i++) {
    var n = nodes[i];
    try {
        var rect = n.getBoundingClientRect();
        if (rect.width < 6 || rect.height < 6) continue;
        var r = { x: Math.round(rect.x), y: Math.round(rect.y),
                  w: Math.round(rect.width), h: Math.round(rect.height) };
        if (!hits(r)) continue;
        var cs = getComputedStyle(n);
        out.push({
            tag: n.tagName.toLowerCase(),
            text: (n.innerText || n.textContent || '').trim().slice(0, 300),
            href: n.getAttribute ? n.getAttribute('href') : null,
            fragment: n.outerHTML ? n.outerHTML.slice(0, 800) : null,
            bbox: r,
            style: { display: cs.display, visibility: cs.visibility,
                     opacity: parseFloat(cs.opacity || '1') }
        });
    } catch (e) {}
}
return out;
"#;

/// Margin-expanded trigger boxes of the clusters that will survive
/// aggregation, in rank order. These scope the snapshot query.
pub fn trigger_areas(events: &[InteractionEvent]) -> Vec<BoundingBox> {
    cluster_events(events)
        .into_iter()
        .take(MAX_DISCOVERIES)
        .map(|(_, _, sample)| sample.bbox.expanded(REVEAL_MARGIN))
        .collect()
}

/// Read the DOM near the given areas as typed node records.
pub async fn dom_snapshot(page: &ScoutPage, areas: &[BoundingBox]) -> Result<Vec<DomNode>> {
    let args = vec![serde_json::to_value(areas)?];
    let nodes: Vec<DomNode> = page.eval(SNAPSHOT_SCRIPT, args).await?;
    debug!(target: "explore.discover", nodes = nodes.len(), "captured DOM snapshot");
    Ok(nodes)
}

/// Rendered and perceivable: laid out, not hidden, above the opacity floor.
pub fn is_visible(style: &NodeStyle) -> bool {
    style.display != "none" && style.visibility != "hidden" && style.opacity > OPACITY_FLOOR
}

/// Group events by cluster key, keeping per key the fold count and the most
/// recent sample. Returned in descending count order, ties broken by first
/// observation, so ranking is independent of map traversal order.
fn cluster_events(events: &[InteractionEvent]) -> Vec<(String, usize, ElementFingerprint)> {
    let mut clusters: HashMap<String, (usize, usize, ElementFingerprint)> = HashMap::new();
    let mut next_rank = 0usize;

    for event in events {
        let Some(target) = event.target.as_ref() else {
            continue;
        };
        let key = target.cluster_key();
        match clusters.entry(key) {
            Entry::Occupied(mut entry) => {
                let (count, _, sample) = entry.get_mut();
                *count += 1;
                *sample = target.clone();
            }
            Entry::Vacant(entry) => {
                entry.insert((1, next_rank, target.clone()));
                next_rank += 1;
            }
        }
    }

    let mut ordered: Vec<(String, usize, usize, ElementFingerprint)> = clusters
        .into_iter()
        .map(|(key, (count, seen, sample))| (key, count, seen, sample))
        .collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ordered
        .into_iter()
        .map(|(key, count, _, sample)| (key, count, sample))
        .collect()
}

/// Nodes judged revealed near `trigger`: visible, overlapping the margin-
/// expanded trigger box, and bearing either text or a hyperlink.
pub fn revealed_near(trigger: &BoundingBox, nodes: &[DomNode]) -> Vec<RevealedNode> {
    let area = trigger.expanded(REVEAL_MARGIN);
    nodes
        .iter()
        .filter(|n| n.bbox.overlaps(&area) && is_visible(&n.style))
        .take(OVERLAP_SCAN_CAP)
        .filter(|n| !n.text.is_empty() || n.href.is_some())
        .take(MAX_REVEALED)
        .map(|n| RevealedNode {
            tag: n.tag.clone(),
            text: n.text.clone(),
            href: n.href.clone(),
            fragment: n.fragment.clone(),
            bbox: n.bbox,
        })
        .collect()
}

/// Fold the event log and the DOM snapshot into the final ranked list.
pub fn build_discoveries(events: &[InteractionEvent], snapshot: &[DomNode]) -> Vec<Discovery> {
    let mut discoveries: Vec<Discovery> = cluster_events(events)
        .into_iter()
        .take(MAX_DISCOVERIES)
        .map(|(key, count, sample)| {
            let revealed = revealed_near(&sample.bbox, snapshot);
            Discovery {
                key,
                count,
                sample,
                revealed,
            }
        })
        .collect();

    // Frequency first: the same region reacting across grid, hotspot, and
    // spiral passes is strong evidence over sensor noise.
    discoveries.sort_by(|a, b| {
        (b.count, b.revealed.len()).cmp(&(a.count, a.revealed.len()))
    });
    discoveries
}
