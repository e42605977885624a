//! Client for the external face-recognition backend.
//!
//! The backend owns similarity computation; the engine only asks it which
//! previously-indexed faces match a given face. The production
//! implementation talks JSON over HTTP to a recognition sidecar; tests
//! substitute an in-memory implementation of [`RecognitionClient`].

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// HTTP request timeout for a single search call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One face the backend considers similar above the requested threshold.
#[derive(Debug, Clone, Deserialize)]
pub struct FaceMatch {
    #[serde(rename = "faceId")]
    pub face_id: String,
    pub similarity: f32,
}

/// Error type for recognition lookups. Callers downgrade these to an empty
/// match set; a face with no matches is handled correctly as a singleton.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned an unexpected non-2xx status code.
    #[error("Recognition backend returned HTTP {0}")]
    HttpStatus(u16),
}

/// Similarity search against a per-user face collection.
#[async_trait]
pub trait RecognitionClient: Send + Sync {
    /// Faces in `collection_id` matching `face_id` at or above `threshold`,
    /// capped at `max_faces`. An unknown face or collection yields an empty
    /// result, not an error.
    async fn search_matches(
        &self,
        collection_id: &str,
        face_id: &str,
        threshold: f32,
        max_faces: usize,
    ) -> Result<Vec<FaceMatch>, RecognitionError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "faceMatches", default)]
    face_matches: Vec<FaceMatch>,
}

/// JSON-over-HTTP client for the recognition sidecar.
pub struct HttpRecognitionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecognitionClient {
    /// Create a client against the sidecar's base URL.
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RecognitionClient for HttpRecognitionClient {
    async fn search_matches(
        &self,
        collection_id: &str,
        face_id: &str,
        threshold: f32,
        max_faces: usize,
    ) -> Result<Vec<FaceMatch>, RecognitionError> {
        let url = format!("{}/collections/{collection_id}/search", self.base_url);
        let payload = serde_json::json!({
            "faceId": face_id,
            "faceMatchThreshold": threshold,
            "maxFaces": max_faces,
        });

        let response = self.client.post(&url).json(&payload).send().await?;

        // An unindexed face or missing collection is an expected condition.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(RecognitionError::HttpStatus(response.status().as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.face_matches)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalises_base_url() {
        let client = HttpRecognitionClient::new("http://localhost:9000/");
        assert_eq!(client.base_url, "http://localhost:9000");
    }

    #[test]
    fn error_display_http_status() {
        let err = RecognitionError::HttpStatus(503);
        assert_eq!(err.to_string(), "Recognition backend returned HTTP 503");
    }

    #[test]
    fn search_response_defaults_to_empty() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.face_matches.is_empty());
    }

    #[test]
    fn face_match_parses_wire_format() {
        let parsed: FaceMatch =
            serde_json::from_str(r#"{"faceId": "f1", "similarity": 0.91}"#).unwrap();
        assert_eq!(parsed.face_id, "f1");
        assert!(parsed.similarity > 0.9);
    }
}
