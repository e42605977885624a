//! Wire-facing input and output types for the engine's public operations.

use facegraph_core::bounding_box::PartialBoundingBox;
use facegraph_db::models::FaceGroup;
use serde::{Deserialize, Serialize};

/// A face as presented to `process_batch` or the manual operations.
///
/// Field names follow the upstream engine's wire format; unknown fields are
/// ignored. `matched_face_ids`, when non-empty, short-circuits the
/// recognition lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceInput {
    #[serde(rename = "faceId")]
    pub face_id: String,
    #[serde(rename = "boundingBox", default)]
    pub bounding_box: Option<PartialBoundingBox>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(rename = "matchedFaceIds", default)]
    pub matched_face_ids: Option<Vec<String>>,
    #[serde(rename = "fileId", default)]
    pub file_id: Option<String>,
}

/// Result of one `process_batch` invocation.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    /// Number of faces that were actually grouped (skipped faces excluded).
    pub processed_count: usize,
    /// The distinct groups touched by the batch, in final persisted state.
    pub groups: Vec<FaceGroup>,
}

impl BatchOutcome {
    /// The outcome of a skipped batch: unreachable source, empty input, or
    /// every face tombstoned.
    pub fn empty() -> Self {
        Self {
            processed_count: 0,
            groups: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_input_parses_wire_format() {
        let face: FaceInput = serde_json::from_str(
            r#"{
                "faceId": "f1",
                "boundingBox": {"Left": 0.1, "Top": 0.2, "Width": 0.3, "Height": 0.4},
                "confidence": 0.98,
                "matchedFaceIds": ["f2", "f3"],
                "someUnknownField": true
            }"#,
        )
        .unwrap();

        assert_eq!(face.face_id, "f1");
        assert!(face.bounding_box.unwrap().complete().is_some());
        assert_eq!(face.matched_face_ids.unwrap(), vec!["f2", "f3"]);
        assert!(face.file_id.is_none());
    }

    #[test]
    fn face_input_tolerates_minimal_payload() {
        let face: FaceInput = serde_json::from_str(r#"{"faceId": "f1"}"#).unwrap();
        assert_eq!(face.face_id, "f1");
        assert!(face.bounding_box.is_none());
        assert!(face.matched_face_ids.is_none());
    }
}
