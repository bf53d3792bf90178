use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not logged in, run `visitlog login` first")]
    NotLoggedIn,

    #[error("session expired or token is not valid, run `visitlog login` again")]
    SessionExpired,

    #[error("login rejected by the token endpoint (status {status})")]
    LoginRejected { status: u16 },

    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("server rejected the request (status {status}): {body}")]
    Remote { status: u16, body: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("no record with url {url} in the current list")]
    RecordNotFound { url: String },

    #[error("invalid page size {value}, expected one of 5, 10, 25, 50")]
    InvalidPageSize { value: usize },

    #[error("failed to access session file {path}: {source}")]
    Session {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Errors that end the session: the token has been (or must be) dropped.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::NotLoggedIn | Self::SessionExpired)
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
