use serde::Deserialize;

/// In-memory bearer token state.
///
/// The client mutates this during acquisition, refresh, and logout; durable
/// storage is the caller's job. Read it back through the accessors after any
/// call that may have changed it, and seed it from storage when constructing
/// the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenState {
    access_token: Option<String>,
    expires_at: Option<u64>,
}

impl TokenState {
    /// Builds state from previously persisted values. `expires_at` is a Unix
    /// timestamp in seconds and only means anything while a token is held.
    pub fn new(access_token: Option<String>, expires_at: Option<u64>) -> Self {
        Self {
            access_token,
            expires_at,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }

    /// Expiry check only. Absent expiry reads as not expired; whether a token
    /// is held at all is the caller's separate concern.
    pub fn is_expired(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at < now,
            None => false,
        }
    }

    /// Replaces the token without touching the expiry.
    pub fn set_token(&mut self, access_token: impl Into<String>) {
        self.access_token = Some(access_token.into());
    }

    /// Drops both the token and its expiry.
    pub fn clear(&mut self) {
        self.access_token = None;
        self.expires_at = None;
    }

    pub(crate) fn store(&mut self, access_token: String, expires_at: u64) {
        self.access_token = Some(access_token);
        self.expires_at = Some(expires_at);
    }
}

/// Decoded body of a token or refresh response.
///
/// Both fields are optional: the server is authoritative and a response
/// without an `access_token` simply leaves the local state alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenPayload {
    pub access_token: Option<String>,
    pub expires_in: Option<u64>,
}
