use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;

/// Subtracted from the server-reported lifetime so a token never expires mid-request
pub const AUTH_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Application credentials used for the client-credentials grant
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl Credentials {
    pub fn new(client_id: &str, client_secret: &str, user_agent: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// Value for the `Authorization` header of the token exchange
    pub fn basic_auth_header(&self) -> String {
        let auth = base64::encode(format!("{}:{}", self.client_id, self.client_secret));
        format!("Basic {}", auth)
    }
}

/// Bearer token paired with the instant it stops being usable.
///
/// Sessions are never edited in place; a new authorization replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    bearer_token: String,
    expires_at: Instant,
}

impl Session {
    pub fn issue(bearer_token: String, expires_in: Duration, issued_at: Instant) -> Self {
        Self {
            bearer_token,
            expires_at: issued_at + expires_in.saturating_sub(AUTH_EXPIRY_MARGIN),
        }
    }

    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Successful response body of the access token endpoint
#[derive(Deserialize, Debug)]
pub(crate) struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}
