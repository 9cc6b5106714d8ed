/// Caller-facing failure kinds.
///
/// Every business-rule failure is mapped onto one of these at the service
/// boundary. Variants carrying a `String` hold either a user-safe message
/// (`InvalidInput`, `Conflict`) or an internal cause that is logged and never
/// sent to the client (`Upstream`, `Internal`).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Email unknown or password wrong. Deliberately undifferentiated.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, revoked or expired session.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Purpose token absent, expired, used, or issued for another purpose.
    #[error("Invalid token")]
    TokenInvalid,

    /// Email delivery or identity provider failure.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
