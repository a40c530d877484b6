use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A bearer token plus its expiry. Replaced whole on every successful
/// refresh; readers never observe a partially-updated value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CachedToken {
    pub value: String,
    pub expires_on: Timestamp,
}

impl CachedToken {
    pub fn new(value: impl Into<String>, expires_on: Timestamp) -> Self {
        Self {
            value: value.into(),
            expires_on,
        }
    }

    /// The pre-first-fetch state: no value, already expired.
    pub(crate) fn empty() -> Self {
        Self {
            value: String::new(),
            expires_on: Timestamp::UNIX_EPOCH,
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_on <= now
    }
}
