/// All timestamps are UTC.
///
/// User, face, and file identifiers are opaque strings assigned by external
/// systems (the identity service and the recognition engine) and are passed
/// as plain `&str`; group IDs are minted by this service as UUID strings.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
