//! Session configuration and endpoint selection.

use std::fmt;

/// Path of the practice endpoint (one scenario per connection).
pub const TESTING_ENDPOINT: &str = "ws-testing";

/// Path of the competition endpoint (scenarios repeat until closed).
pub const COMPETITION_ENDPOINT: &str = "ws-competition";

/// What the client tells the server about itself, and how it plays.
#[derive(Clone, Default)]
pub struct SessionConfig {
    /// Name of this scheduler entry.
    pub entry_name: String,

    /// Opaque token for the human submitting the entry. Sent verbatim.
    pub auth_token: String,

    /// Play scenarios back-to-back on one connection instead of one.
    pub competition_mode: bool,
}

impl SessionConfig {
    /// Returns the full URL for this config's mode under `base`.
    pub fn endpoint_url(&self, base: &str) -> String {
        endpoint_url(base, self.competition_mode)
    }
}

// The auth token stays out of logs.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("entry_name", &self.entry_name)
            .field("auth_token", &"<redacted>")
            .field("competition_mode", &self.competition_mode)
            .finish()
    }
}

/// Composes `{base}/ws-testing` or `{base}/ws-competition`.
///
/// A trailing `/` on `base` is not doubled.
pub fn endpoint_url(base: &str, competition_mode: bool) -> String {
    let endpoint = if competition_mode {
        COMPETITION_ENDPOINT
    } else {
        TESTING_ENDPOINT
    };
    format!("{}/{endpoint}", base.trim_end_matches('/'))
}
