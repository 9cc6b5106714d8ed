/// Users, sessions and purpose tokens are keyed by random UUIDs.
pub type UserId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
