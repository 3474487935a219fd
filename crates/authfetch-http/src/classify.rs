//! Status code classification.

/// What the client does with a completed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// 2xx: hand the response to the caller.
    Success,
    /// 400: tell the user to log in again, swallow the error.
    SessionExpired,
    /// 401: refresh the access token and replay once.
    Unauthorized,
    /// 500: report to telemetry, tell the user, swallow the error.
    ServerError,
    /// Anything else: propagate to the caller.
    Unhandled,
}

/// Classify a response status code.
pub fn classify(status: u16) -> Classification {
    match status {
        200..=299 => Classification::Success,
        400 => Classification::SessionExpired,
        401 => Classification::Unauthorized,
        500 => Classification::ServerError,
        _ => Classification::Unhandled,
    }
}
