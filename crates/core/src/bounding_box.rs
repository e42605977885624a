//! Bounding-box geometry and the deletion tombstone filter.
//!
//! The upstream recognition engine re-indexes images between runs and issues
//! fresh face IDs each time, but the bounding boxes it reports are stable.
//! Deleted faces are therefore tracked by box rather than by ID, and a
//! candidate face is dropped when its box matches a tombstoned box within a
//! per-coordinate tolerance.

use serde::{Deserialize, Serialize};

/// A face bounding box in normalised image coordinates.
///
/// Field names follow the upstream engine's wire format (`Left`, `Top`,
/// `Width`, `Height`), all in `[0, 1]` relative to the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(rename = "Left")]
    pub left: f64,
    #[serde(rename = "Top")]
    pub top: f64,
    #[serde(rename = "Width")]
    pub width: f64,
    #[serde(rename = "Height")]
    pub height: f64,
}

impl BoundingBox {
    /// Whether every coordinate delta against `other` is strictly below
    /// `tolerance`.
    pub fn matches_within(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (self.left - other.left).abs() < tolerance
            && (self.top - other.top).abs() < tolerance
            && (self.width - other.width).abs() < tolerance
            && (self.height - other.height).abs() < tolerance
    }
}

/// A bounding box as it arrives on the wire, where any coordinate may be
/// absent. Faces with incomplete boxes are rejected before grouping.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PartialBoundingBox {
    #[serde(rename = "Left")]
    pub left: Option<f64>,
    #[serde(rename = "Top")]
    pub top: Option<f64>,
    #[serde(rename = "Width")]
    pub width: Option<f64>,
    #[serde(rename = "Height")]
    pub height: Option<f64>,
}

impl PartialBoundingBox {
    /// Returns the complete box, or `None` if any coordinate is missing.
    pub fn complete(&self) -> Option<BoundingBox> {
        Some(BoundingBox {
            left: self.left?,
            top: self.top?,
            width: self.width?,
            height: self.height?,
        })
    }
}

impl From<BoundingBox> for PartialBoundingBox {
    fn from(b: BoundingBox) -> Self {
        Self {
            left: Some(b.left),
            top: Some(b.top),
            width: Some(b.width),
            height: Some(b.height),
        }
    }
}

/// Whether `candidate` matches any tombstoned box within `tolerance`.
///
/// A candidate without a box cannot be compared and is treated as not
/// tombstoned.
pub fn is_tombstoned(
    candidate: Option<&BoundingBox>,
    tombstones: &[BoundingBox],
    tolerance: f64,
) -> bool {
    match candidate {
        Some(bbox) => tombstones.iter().any(|t| bbox.matches_within(t, tolerance)),
        None => false,
    }
}
