use crate::error::ClientError;

pub const DEFAULT_API_BASE: &str = "https://sistema-de-registro-de-visitas.onrender.com";

/// Resource locations derived from the API base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: &str) -> Result<Self, ClientError> {
        let trimmed = base.trim().trim_end_matches('/');
        let parsed = reqwest::Url::parse(trimmed)
            .map_err(|e| ClientError::Config(format!("invalid api base '{base}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "invalid api base '{base}': expected http or https"
            )));
        }
        Ok(Self {
            base: trimmed.to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn records(&self) -> String {
        format!("{}/api/registros/", self.base)
    }

    pub fn token(&self) -> String {
        format!("{}/api/token/", self.base)
    }

    pub fn dashboard(&self) -> String {
        format!("{}/api/dashboard/", self.base)
    }
}
