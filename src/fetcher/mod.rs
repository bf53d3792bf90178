use std::collections::HashSet;
use std::sync::Arc;

use indicatif::ProgressBar;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::AuthGuard;
use crate::error::ClientError;
use crate::record::Record;
use crate::store::RecordStore;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// The two collection shapes the API may answer with.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PageBody {
    Bare(Vec<Record>),
    Envelope {
        #[serde(default)]
        results: Option<Vec<Record>>,
        #[serde(default)]
        next: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub pages: usize,
    pub records: usize,
}

/// Walks the collection's `next` cursors and fills a [`RecordStore`].
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    guard: Arc<AuthGuard>,
    collection_url: String,
    progress: Option<ProgressBar>,
}

impl PageFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        guard: Arc<AuthGuard>,
        collection_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            guard,
            collection_url: collection_url.into(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.progress = Some(pb);
        self
    }

    /// Fetches every page into `store`.
    ///
    /// Without `start_url` the store is cleared and the walk starts at the
    /// collection URL. Pages are requested one after another; on error the
    /// records gathered so far stay in the store.
    pub async fn fetch_all(
        &self,
        store: &mut RecordStore,
        start_url: Option<&str>,
    ) -> Result<FetchReport, ClientError> {
        let token = self.guard.require_token()?;

        let mut cursor = match start_url {
            Some(url) => url.to_string(),
            None => {
                store.clear();
                self.collection_url.clone()
            }
        };
        let mut report = FetchReport::default();
        let mut visited: HashSet<String> = HashSet::new();

        loop {
            if !visited.insert(cursor.clone()) {
                return Err(ClientError::Transport(format!(
                    "pagination loops back to {cursor}"
                )));
            }

            let resp = self
                .transport
                .send(HttpRequest::new(Method::GET, cursor.as_str()).bearer(&token))
                .await?;
            if !resp.is_success() {
                return Err(self.rejection(&resp));
            }

            let page: PageBody = serde_json::from_str(&resp.body).map_err(|e| {
                ClientError::Transport(format!("malformed page from {cursor}: {e}"))
            })?;
            report.pages += 1;

            let next = match page {
                PageBody::Bare(records) => {
                    tracing::debug!(page = report.pages, results = records.len(), "unpaginated collection");
                    store.replace(records);
                    None
                }
                PageBody::Envelope { results, next } => {
                    let results = results.unwrap_or_default();
                    tracing::debug!(page = report.pages, results = results.len(), "page fetched");
                    store.append(results);
                    next.filter(|n| !n.trim().is_empty())
                }
            };

            if let Some(pb) = self.progress.as_ref() {
                pb.set_message(format!("page {} ({} records)", report.pages, store.len()));
                pb.tick();
            }

            match next {
                Some(url) => cursor = url,
                None => break,
            }
        }

        report.records = store.len();
        tracing::info!(pages = report.pages, records = report.records, "records loaded");
        Ok(report)
    }

    fn rejection(&self, resp: &HttpResponse) -> ClientError {
        let body = resp.json_or_empty();
        if let Err(e) = self.guard.screen(resp.status, &body) {
            return e;
        }
        let detail = body
            .get("detail")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| resp.body.clone());
        ClientError::Remote {
            status: resp.status,
            body: detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::auth::MemorySession;
    use crate::transport::scripted::ScriptedTransport;

    const BASE: &str = "https://api.test/api/registros/";

    fn entry(url: &str, name: &str) -> Value {
        json!({"url": url, "nombre": name, "rut": "1234567-8", "motivo": "x",
               "horaentrada": null, "horasalida": null, "estado_finalizado": false})
    }

    fn fetcher(transport: Arc<ScriptedTransport>, token: Option<&str>) -> (PageFetcher, Arc<AuthGuard>) {
        let session = match token {
            Some(t) => MemorySession::with_token(t),
            None => MemorySession::default(),
        };
        let guard = Arc::new(AuthGuard::new(Box::new(session)));
        (PageFetcher::new(transport, guard.clone(), BASE), guard)
    }

    fn names(store: &RecordStore) -> Vec<&str> {
        store.records().iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn follows_next_cursors_in_order() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(200, json!({"results": [entry("u1", "a"), entry("u2", "b")], "next": "https://api.test/api/registros/?page=2"}))
                .reply(200, json!({"results": [entry("u3", "c")], "next": null})),
        );
        let (fetcher, _) = fetcher(transport.clone(), Some("tok"));
        let mut store = RecordStore::new();

        let report = fetcher.fetch_all(&mut store, None).await.unwrap();
        assert_eq!(report, FetchReport { pages: 2, records: 3 });
        assert_eq!(names(&store), ["a", "b", "c"]);

        let sent = transport.requests();
        assert_eq!(sent[0].url, BASE);
        assert_eq!(sent[1].url, "https://api.test/api/registros/?page=2");
        assert!(sent.iter().all(|r| r.bearer.as_deref() == Some("tok")));
    }

    #[tokio::test]
    async fn bare_array_replaces_store() {
        let transport = Arc::new(ScriptedTransport::new().reply(200, json!([entry("u9", "z")])));
        let (fetcher, _) = fetcher(transport, Some("tok"));
        let mut store = RecordStore::new();
        store.append(vec![Record::default()]);

        let report = fetcher.fetch_all(&mut store, None).await.unwrap();
        assert_eq!(report.pages, 1);
        assert_eq!(names(&store), ["z"]);
    }

    #[tokio::test]
    async fn refetch_starts_from_empty() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(200, json!({"results": [entry("u1", "a")], "next": null}))
                .reply(200, json!({"results": [entry("u2", "b")], "next": null})),
        );
        let (fetcher, _) = fetcher(transport, Some("tok"));
        let mut store = RecordStore::new();
        fetcher.fetch_all(&mut store, None).await.unwrap();
        fetcher.fetch_all(&mut store, None).await.unwrap();
        assert_eq!(names(&store), ["b"]);
    }

    #[tokio::test]
    async fn cursor_pointing_back_stops_with_error() {
        let page2 = "https://api.test/api/registros/?page=2";
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(200, json!({"results": [entry("u1", "a")], "next": page2}))
                .reply(200, json!({"results": [entry("u2", "b")], "next": BASE}))
                .reply(200, json!({"results": [entry("u1", "a")], "next": page2})),
        );
        let (fetcher, _) = fetcher(transport.clone(), Some("tok"));
        let mut store = RecordStore::new();

        let err = fetcher.fetch_all(&mut store, None).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(ref m) if m.contains("loops back")));
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(names(&store), ["a", "b"]);
    }

    #[tokio::test]
    async fn no_token_means_no_request() {
        let transport = Arc::new(ScriptedTransport::new());
        let (fetcher, _) = fetcher(transport.clone(), None);
        let mut store = RecordStore::new();
        let err = fetcher.fetch_all(&mut store, None).await.unwrap_err();
        assert!(matches!(err, ClientError::NotLoggedIn));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn unauthorized_clears_token_and_stops() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(401, json!({"detail": "expired"}))
                .reply(200, json!([])),
        );
        let (fetcher, guard) = fetcher(transport.clone(), Some("tok"));
        let mut store = RecordStore::new();
        let err = fetcher.fetch_all(&mut store, None).await.unwrap_err();
        assert!(matches!(err, ClientError::SessionExpired));
        assert_eq!(guard.current_token(), None);
        assert_eq!(transport.remaining(), 1);
    }

    #[tokio::test]
    async fn token_not_valid_body_is_auth_failure() {
        let transport = Arc::new(
            ScriptedTransport::new().reply(400, json!({"code": "token_not_valid"})),
        );
        let (fetcher, guard) = fetcher(transport, Some("tok"));
        let err = fetcher.fetch_all(&mut RecordStore::new(), None).await.unwrap_err();
        assert!(matches!(err, ClientError::SessionExpired));
        assert!(guard.current_token().is_none());
    }

    #[tokio::test]
    async fn remote_error_keeps_partial_pages() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(200, json!({"results": [entry("u1", "a")], "next": "https://api.test/p2"}))
                .reply(500, json!({"detail": "boom"})),
        );
        let (fetcher, guard) = fetcher(transport, Some("tok"));
        let mut store = RecordStore::new();
        let err = fetcher.fetch_all(&mut store, None).await.unwrap_err();
        match err {
            ClientError::Remote { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(names(&store), ["a"]);
        assert_eq!(guard.current_token().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn network_failure_is_transport_error() {
        let transport = Arc::new(ScriptedTransport::new().fail("connection refused"));
        let (fetcher, _) = fetcher(transport, Some("tok"));
        let err = fetcher.fetch_all(&mut RecordStore::new(), None).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_transport_error() {
        let transport = Arc::new(ScriptedTransport::new().reply_raw(200, "<html>"));
        let (fetcher, _) = fetcher(transport, Some("tok"));
        let err = fetcher.fetch_all(&mut RecordStore::new(), None).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
