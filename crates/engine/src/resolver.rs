//! Match resolution for incoming faces.
//!
//! Caller-supplied matches win; otherwise the recognition backend is asked.
//! Recognition failures are absorbed here: a face whose lookup fails is
//! processed with an empty match set and lands in a singleton group, which
//! a later batch can still merge away.

use crate::input::FaceInput;
use crate::recognition::RecognitionClient;
use facegraph_core::config::GroupingConfig;
use std::sync::Arc;
use tracing::warn;

/// Resolves the set of matching face IDs for a face.
pub struct MatchResolver {
    recognition: Arc<dyn RecognitionClient>,
    config: GroupingConfig,
}

impl MatchResolver {
    pub fn new(recognition: Arc<dyn RecognitionClient>, config: GroupingConfig) -> Self {
        Self {
            recognition,
            config,
        }
    }

    /// The matching face IDs for `face`, never including `face` itself.
    ///
    /// Pre-supplied `matched_face_ids` are returned verbatim (minus the face
    /// itself); otherwise the backend is queried with the user's collection
    /// and the configured threshold and cap.
    pub async fn resolve(&self, user_id: &str, face: &FaceInput) -> Vec<String> {
        if let Some(supplied) = &face.matched_face_ids {
            if !supplied.is_empty() {
                return supplied
                    .iter()
                    .filter(|id| *id != &face.face_id)
                    .cloned()
                    .collect();
            }
        }

        let collection_id = self.config.collection_id(user_id);
        let result = self
            .recognition
            .search_matches(
                &collection_id,
                &face.face_id,
                self.config.similarity_threshold,
                self.config.max_matches,
            )
            .await;

        match result {
            Ok(matches) => matches
                .into_iter()
                .map(|m| m.face_id)
                .filter(|id| id != &face.face_id)
                .take(self.config.max_matches)
                .collect(),
            Err(e) => {
                warn!(
                    user_id,
                    face_id = %face.face_id,
                    error = %e,
                    "Match lookup failed; treating face as unmatched"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::{FaceMatch, RecognitionError};
    use async_trait::async_trait;

    struct FixedMatches(Vec<&'static str>);

    #[async_trait]
    impl RecognitionClient for FixedMatches {
        async fn search_matches(
            &self,
            _collection_id: &str,
            _face_id: &str,
            _threshold: f32,
            _max_faces: usize,
        ) -> Result<Vec<FaceMatch>, RecognitionError> {
            Ok(self
                .0
                .iter()
                .map(|id| FaceMatch {
                    face_id: id.to_string(),
                    similarity: 0.9,
                })
                .collect())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl RecognitionClient for AlwaysFails {
        async fn search_matches(
            &self,
            _collection_id: &str,
            _face_id: &str,
            _threshold: f32,
            _max_faces: usize,
        ) -> Result<Vec<FaceMatch>, RecognitionError> {
            Err(RecognitionError::HttpStatus(500))
        }
    }

    fn face(face_id: &str, matched: Option<Vec<&str>>) -> FaceInput {
        FaceInput {
            face_id: face_id.to_string(),
            matched_face_ids: matched.map(|m| m.into_iter().map(String::from).collect()),
            ..FaceInput::default()
        }
    }

    #[tokio::test]
    async fn supplied_matches_skip_the_backend() {
        let resolver = MatchResolver::new(Arc::new(AlwaysFails), GroupingConfig::default());
        let resolved = resolver
            .resolve("u1", &face("f1", Some(vec!["f2", "f3"])))
            .await;
        assert_eq!(resolved, vec!["f2", "f3"]);
    }

    #[tokio::test]
    async fn supplied_matches_exclude_self() {
        let resolver = MatchResolver::new(Arc::new(AlwaysFails), GroupingConfig::default());
        let resolved = resolver
            .resolve("u1", &face("f1", Some(vec!["f1", "f2"])))
            .await;
        assert_eq!(resolved, vec!["f2"]);
    }

    #[tokio::test]
    async fn backend_matches_exclude_self() {
        let resolver = MatchResolver::new(
            Arc::new(FixedMatches(vec!["f1", "f2"])),
            GroupingConfig::default(),
        );
        let resolved = resolver.resolve("u1", &face("f1", None)).await;
        assert_eq!(resolved, vec!["f2"]);
    }

    #[tokio::test]
    async fn backend_failure_yields_empty_set() {
        let resolver = MatchResolver::new(Arc::new(AlwaysFails), GroupingConfig::default());
        let resolved = resolver.resolve("u1", &face("f1", None)).await;
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn backend_result_is_capped() {
        let config = GroupingConfig {
            max_matches: 2,
            ..GroupingConfig::default()
        };
        let resolver = MatchResolver::new(Arc::new(FixedMatches(vec!["a", "b", "c", "d"])), config);
        let resolved = resolver.resolve("u1", &face("f1", None)).await;
        assert_eq!(resolved.len(), 2);
    }
}
