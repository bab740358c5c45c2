//! Raw capture types shared between the in-page instrumentation and the
//! aggregation pass.
//!
//! Everything here crosses the JS boundary as JSON, so field names mirror
//! the compact keys the injected script emits. Fingerprints are value types
//! with structural equality: the same logical element may surface as
//! different DOM node instances across layout passes, so identity is the
//! fingerprint, never a node reference.

use serde::{Deserialize, Serialize};

/// Number of leading characters of trimmed element text that participate in
/// the cluster key.
pub const KEY_TEXT_CHARS: usize = 40;

/// Axis-aligned box in viewport coordinates at observation time.
///
/// Values are integer CSS pixels. Coordinates are not corrected for scroll
/// between capture and aggregation; see the crate docs for that known
/// accuracy gap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }

    /// Grow the box by `margin` pixels on every side.
    pub fn expanded(&self, margin: i64) -> BoundingBox {
        BoundingBox {
            x: self.x - margin,
            y: self.y - margin,
            w: self.w + 2 * margin,
            h: self.h + 2 * margin,
        }
    }

    /// Closed-interval rectangle intersection test.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        !(self.x + self.w < other.x
            || self.x > other.x + other.w
            || self.y + self.h < other.y
            || self.y > other.y + other.h)
    }
}

/// Selector-free structural descriptor of a DOM element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementFingerprint {
    pub tag: String,
    /// Up to three class names joined with `.`, possibly empty.
    #[serde(rename = "cls")]
    pub classes: String,
    /// 1-based index among element siblings.
    #[serde(rename = "idx")]
    pub sibling_index: u32,
    /// Trimmed, whitespace-collapsed inner text, at most 200 chars.
    #[serde(rename = "txt")]
    pub text: String,
    pub bbox: BoundingBox,
}

impl ElementFingerprint {
    /// Composite grouping key: two observations with the same key are folded
    /// into one discovery for the duration of a run.
    pub fn cluster_key(&self) -> String {
        let head: String = self.text.chars().take(KEY_TEXT_CHARS).collect();
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.tag, self.classes, self.sibling_index, self.bbox.x, self.bbox.y, head
        )
    }
}

/// Pointer event kinds captured by the instrumentation. Both fire for the
/// same physical element; duplicates are merged by fingerprint at
/// aggregation time, not suppressed at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    PointerOver,
    MouseEnter,
}

/// One entry of the append-only in-page event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    /// Milliseconds since the Unix epoch, as reported by `Date.now()`.
    #[serde(rename = "time")]
    pub at_ms: u64,
    /// `None` when the event target was not an element node.
    pub target: Option<ElementFingerprint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Added,
    Removed,
    #[serde(rename = "attr")]
    Attribute,
}

/// One DOM mutation observed during exploration.
///
/// Collected for diagnostics and future correlation; deliberately never
/// joined against interaction events today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    #[serde(rename = "type")]
    pub kind: MutationKind,
    #[serde(rename = "time")]
    pub at_ms: u64,
    /// Serialized node fragment, capped in-page to bound memory.
    #[serde(rename = "html", default)]
    pub fragment: String,
    /// Changed attribute name for [`MutationKind::Attribute`] records.
    #[serde(rename = "name", default)]
    pub attribute: Option<String>,
}

/// A native browser dialog captured (and immediately dismissed) in-page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogRecord {
    /// `alert`, `confirm`, or `prompt`.
    pub kind: String,
    pub message: String,
    /// Default value offered by a `prompt`, when any.
    #[serde(rename = "value", default)]
    pub default_value: Option<String>,
}
