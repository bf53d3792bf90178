use std::fmt::Display;
use std::sync::Arc;

use chrono::TimeZone;

use crate::auth::AuthGuard;
use crate::endpoints::Endpoints;
use crate::error::ClientError;
use crate::fetcher::{FetchReport, PageFetcher};
use crate::gateway::MutationGateway;
use crate::paginator::{window_of, PageSize, PageWindow};
use crate::query::{derive, Filters, SortField, SortState};
use crate::record::{Record, RecordForm, RecordPayload};
use crate::store::RecordStore;
use crate::transport::Transport;
use crate::view::{EditPanel, ViewState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Reload every page from scratch.
    Refresh,
    /// Save the payload: PUT when the panel is editing a record, POST otherwise.
    Submit(RecordPayload),
    /// Delete a record. Callers must have confirmed with the user first.
    Delete(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Refreshed(FetchReport),
    Created(FetchReport),
    Updated(FetchReport),
    Deleted(FetchReport),
}

impl Outcome {
    pub fn report(&self) -> FetchReport {
        match self {
            Self::Refreshed(r) | Self::Created(r) | Self::Updated(r) | Self::Deleted(r) => *r,
        }
    }
}

pub struct Console {
    fetcher: PageFetcher,
    gateway: MutationGateway,
    store: RecordStore,
    state: ViewState,
    panel: EditPanel,
    processed: Vec<Record>,
    revision: u64,
}

impl Console {
    pub fn new(fetcher: PageFetcher, gateway: MutationGateway) -> Self {
        Self {
            fetcher,
            gateway,
            store: RecordStore::new(),
            state: ViewState::default(),
            panel: EditPanel::Closed,
            processed: Vec::new(),
            revision: 0,
        }
    }

    /// Wires fetcher and gateway to the same transport, guard and collection.
    pub fn connect(transport: Arc<dyn Transport>, guard: Arc<AuthGuard>, endpoints: &Endpoints) -> Self {
        let fetcher = PageFetcher::new(transport.clone(), guard.clone(), endpoints.records());
        let gateway = MutationGateway::new(transport, guard, endpoints.records());
        Self::new(fetcher, gateway)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn panel(&self) -> &EditPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut EditPanel {
        &mut self.panel
    }

    /// Number of times the ordered view has been rebuilt.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Filtered and sorted records, all pages.
    pub fn processed(&self) -> &[Record] {
        &self.processed
    }

    pub fn window(&self) -> PageWindow<&Record> {
        let refs: Vec<&Record> = self.processed.iter().collect();
        window_of(&refs, self.state.page_size, self.state.page)
    }

    pub async fn dispatch(&mut self, command: Command) -> Result<Outcome, ClientError> {
        match command {
            Command::Refresh => self.refresh().await.map(Outcome::Refreshed),
            Command::Submit(payload) => {
                let updated = match self.panel.target() {
                    Some(url) => {
                        let url = url.to_string();
                        self.gateway.update(&url, &payload).await?;
                        true
                    }
                    None => {
                        self.gateway.create(&payload).await?;
                        false
                    }
                };
                self.panel = EditPanel::Closed;
                let report = self.refresh().await?;
                Ok(if updated {
                    Outcome::Updated(report)
                } else {
                    Outcome::Created(report)
                })
            }
            Command::Delete(id_or_url) => {
                self.gateway.delete(&id_or_url).await?;
                if self.panel.target() == Some(id_or_url.as_str()) {
                    self.panel = EditPanel::Closed;
                }
                self.refresh().await.map(Outcome::Deleted)
            }
        }
    }

    pub fn open_create(&mut self) {
        self.panel = EditPanel::Creating(RecordForm::default());
    }

    /// Opens the panel on a record from the current store, prefilled.
    pub fn open_edit<Tz>(&mut self, id_or_url: &str, tz: &Tz) -> Result<(), ClientError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let record = self
            .store
            .find(id_or_url)
            .ok_or_else(|| ClientError::RecordNotFound {
                url: id_or_url.to_string(),
            })?;
        self.panel = EditPanel::Editing {
            id_or_url: record.id_or_url.clone(),
            form: RecordForm::from_record(record, tz),
        };
        Ok(())
    }

    /// Validates the open form and submits it; the panel stays open on failure.
    pub async fn submit_panel<Tz: TimeZone>(&mut self, tz: &Tz) -> Result<Outcome, ClientError> {
        let payload = match self.panel.form() {
            Some(form) => form.to_payload(tz)?,
            None => return Err(ClientError::validation("form", "no record form is open")),
        };
        self.dispatch(Command::Submit(payload)).await
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.state = self.state.clone().with_filters(filters);
        self.recompute();
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.state = self.state.clone().with_sort(sort);
        self.recompute();
    }

    pub fn toggle_sort(&mut self, field: SortField) {
        self.state = self.state.clone().sorted_by(field);
        self.recompute();
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.state = self.state.clone().with_page_size(page_size);
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.state = self.state.clone().at_page(page);
        let effective = self.window().effective_page;
        self.state = self.state.clone().at_page(effective);
    }

    pub fn next_page(&mut self) {
        let next = self.state.clone().next_page(&self.window());
        self.state = next;
    }

    pub fn previous_page(&mut self) {
        let previous = self.state.clone().previous_page(&self.window());
        self.state = previous;
    }

    async fn refresh(&mut self) -> Result<FetchReport, ClientError> {
        let report = self.fetcher.fetch_all(&mut self.store, None).await?;
        self.recompute();
        Ok(report)
    }

    fn recompute(&mut self) {
        self.processed = derive(self.store.records(), &self.state.filters, self.state.sort)
            .into_iter()
            .cloned()
            .collect();
        self.state = self.state.clone().first_page();
        self.revision += 1;
    }
}
