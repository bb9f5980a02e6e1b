/// Stable clip identity. Opaque and immutable for the clip's lifetime.
pub type ClipId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh clip identifier.
pub fn new_clip_id() -> ClipId {
    uuid::Uuid::new_v4()
}
