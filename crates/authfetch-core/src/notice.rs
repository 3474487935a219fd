//! User-visible notices.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A condition the client handled locally that the user should be told about.
///
/// The client never presents these itself; it hands them to a
/// [`NoticeSink`](crate::NoticeSink) and the host decides how to show them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// A request was answered with 400; the user has to log in again.
    SessionExpired,
    /// The refresh credential was refused and the session was torn down.
    ReloginRequired,
    /// The server answered with 500.
    SystemError,
}

impl Notice {
    /// The fixed message shown to the user for this notice.
    pub fn message(&self) -> &'static str {
        match self {
            Notice::SessionExpired => {
                "Your session has expired. This service is available after logging in again."
            }
            Notice::ReloginRequired => "Failed to renew your login. Please log in again.",
            Notice::SystemError => "A system error occurred. Please contact an administrator.",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
