pub mod session;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;
use crate::transport::{HttpRequest, Transport};

pub use session::{FileSession, MemorySession, SessionStore};

pub const TOKEN_NOT_VALID: &str = "token_not_valid";

/// 401, 403, or a body whose `code` says the token is not valid.
pub fn is_auth_failure(status: u16, body: &Value) -> bool {
    status == 401
        || status == 403
        || body.get("code").and_then(Value::as_str) == Some(TOKEN_NOT_VALID)
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenReply {
    access: String,
}

pub struct AuthGuard {
    session: Box<dyn SessionStore>,
}

impl AuthGuard {
    pub fn new(session: Box<dyn SessionStore>) -> Self {
        Self { session }
    }

    pub fn current_token(&self) -> Option<String> {
        match self.session.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "could not read session token");
                None
            }
        }
    }

    /// The token, or [`ClientError::NotLoggedIn`] before any request is made.
    pub fn require_token(&self) -> Result<String, ClientError> {
        self.current_token().ok_or(ClientError::NotLoggedIn)
    }

    /// Drops the token and returns the error that sends the user back to login.
    pub fn on_auth_failure(&self) -> ClientError {
        tracing::warn!("session rejected by the server, clearing token");
        if let Err(e) = self.session.clear() {
            tracing::warn!(error = %e, "could not clear session token");
        }
        ClientError::SessionExpired
    }

    /// `Err(SessionExpired)` after teardown when the response is an auth failure.
    pub fn screen(&self, status: u16, body: &Value) -> Result<(), ClientError> {
        if is_auth_failure(status, body) {
            return Err(self.on_auth_failure());
        }
        Ok(())
    }

    /// Exchanges credentials for an access token and stores it.
    pub async fn login(
        &self,
        transport: &dyn Transport,
        token_url: &str,
        username: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let body = serde_json::to_value(Credentials { username, password })
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let resp = transport
            .send(HttpRequest::new(Method::POST, token_url).json(body))
            .await?;
        if !resp.is_success() {
            return Err(ClientError::LoginRejected {
                status: resp.status,
            });
        }
        let reply: TokenReply = serde_json::from_str(&resp.body)
            .map_err(|e| ClientError::Transport(format!("malformed token response: {e}")))?;
        self.session.save(&reply.access)?;
        tracing::info!(user = username, "logged in");
        Ok(())
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        self.session.clear()
    }
}

impl std::fmt::Debug for AuthGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGuard")
            .field("logged_in", &self.current_token().is_some())
            .finish()
    }
}
