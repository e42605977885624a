/// Runtime configuration for the grouping service.
///
/// All fields have defaults suitable for local development; in production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct GroupingConfig {
    /// Minimum similarity for a recognition match (default: `0.85`).
    pub similarity_threshold: f32,
    /// Maximum number of matches requested per face (default: `20`).
    pub max_matches: usize,
    /// Timeout for the image HEAD probe, in milliseconds (default: `5000`).
    pub head_timeout_ms: u64,
    /// Per-coordinate tolerance when comparing bounding boxes against
    /// deletion tombstones (default: `0.05`).
    pub bounding_box_tolerance: f64,
    /// The only user allowed to invoke destructive test operations.
    /// `None` disables them entirely.
    pub test_user_id: Option<String>,
    /// Prefix for per-user recognition collections (default: `face_coll_`).
    pub recognition_collection_prefix: String,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            max_matches: 20,
            head_timeout_ms: 5000,
            bounding_box_tolerance: 0.05,
            test_user_id: None,
            recognition_collection_prefix: "face_coll_".to_string(),
        }
    }
}

impl GroupingConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default      |
    /// |---------------------------------|--------------|
    /// | `SIMILARITY_THRESHOLD`          | `0.85`       |
    /// | `MAX_MATCHES`                   | `20`         |
    /// | `HEAD_TIMEOUT_MS`               | `5000`       |
    /// | `BOUNDING_BOX_TOLERANCE`        | `0.05`       |
    /// | `TEST_USER_ID`                  | unset        |
    /// | `RECOGNITION_COLLECTION_PREFIX` | `face_coll_` |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            similarity_threshold: env_parsed("SIMILARITY_THRESHOLD", defaults.similarity_threshold),
            max_matches: env_parsed("MAX_MATCHES", defaults.max_matches),
            head_timeout_ms: env_parsed("HEAD_TIMEOUT_MS", defaults.head_timeout_ms),
            bounding_box_tolerance: env_parsed(
                "BOUNDING_BOX_TOLERANCE",
                defaults.bounding_box_tolerance,
            ),
            test_user_id: std::env::var("TEST_USER_ID").ok().filter(|s| !s.is_empty()),
            recognition_collection_prefix: std::env::var("RECOGNITION_COLLECTION_PREFIX")
                .unwrap_or(defaults.recognition_collection_prefix),
        }
    }

    /// Recognition collection ID for a user, e.g. `face_coll_u123`.
    pub fn collection_id(&self, user_id: &str) -> String {
        format!("{}{user_id}", self.recognition_collection_prefix)
    }
}

/// Parse an env var, falling back to `default` when unset or unparseable.
fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
