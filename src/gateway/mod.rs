use std::sync::Arc;

use reqwest::Method;

use crate::auth::AuthGuard;
use crate::error::ClientError;
use crate::record::RecordPayload;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Single-record writes against the remote API.
///
/// Nothing is applied locally before the server answers, so a rejected write
/// leaves local state exactly as it was. Refreshing after success is the
/// caller's job (see [`crate::console::Console::dispatch`]).
pub struct MutationGateway {
    transport: Arc<dyn Transport>,
    guard: Arc<AuthGuard>,
    collection_url: String,
}

impl MutationGateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        guard: Arc<AuthGuard>,
        collection_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            guard,
            collection_url: collection_url.into(),
        }
    }

    pub async fn create(&self, payload: &RecordPayload) -> Result<(), ClientError> {
        let url = self.collection_url.clone();
        self.send(Method::POST, &url, Some(payload)).await
    }

    pub async fn update(&self, id_or_url: &str, payload: &RecordPayload) -> Result<(), ClientError> {
        self.send(Method::PUT, id_or_url, Some(payload)).await
    }

    pub async fn delete(&self, id_or_url: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, id_or_url, None).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        payload: Option<&RecordPayload>,
    ) -> Result<(), ClientError> {
        let token = self.guard.require_token()?;
        let mut request = HttpRequest::new(method.clone(), url).bearer(&token);
        if let Some(payload) = payload {
            let body = serde_json::to_value(payload)
                .map_err(|e| ClientError::Transport(format!("failed to encode payload: {e}")))?;
            request = request.json(body);
        }

        let resp = self.transport.send(request).await?;
        if !resp.is_success() {
            return Err(self.rejection(&resp));
        }
        tracing::info!(%method, url, status = resp.status, "record mutation accepted");
        Ok(())
    }

    fn rejection(&self, resp: &HttpResponse) -> ClientError {
        let body = resp.json_or_empty();
        if let Err(e) = self.guard.screen(resp.status, &body) {
            return e;
        }
        ClientError::Remote {
            status: resp.status,
            body: body.to_string(),
        }
    }
}
