use serde::Serialize;

use crate::paginator::{window_of, PageSize, PageWindow};
use crate::query::{derive, Filters, SortField, SortState};
use crate::record::{Record, RecordForm};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub filters: Filters,
    pub sort: SortState,
    pub page_size: PageSize,
    pub page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filters: Filters::default(),
            sort: SortState::default(),
            page_size: PageSize::default(),
            page: 1,
        }
    }
}

impl ViewState {
    pub fn with_filters(self, filters: Filters) -> Self {
        Self {
            filters,
            page: 1,
            ..self
        }
    }

    pub fn with_sort(self, sort: SortState) -> Self {
        Self {
            sort,
            page: 1,
            ..self
        }
    }

    /// Header click on `field`.
    pub fn sorted_by(self, field: SortField) -> Self {
        let sort = self.sort.toggled(field);
        self.with_sort(sort)
    }

    pub fn with_page_size(self, page_size: PageSize) -> Self {
        Self {
            page_size,
            page: 1,
            ..self
        }
    }

    /// Requested page; out-of-range values are clamped when the window is cut.
    pub fn at_page(self, page: usize) -> Self {
        Self {
            page: page.max(1),
            ..self
        }
    }

    pub fn first_page(self) -> Self {
        self.at_page(1)
    }

    pub fn next_page<T>(self, current: &PageWindow<T>) -> Self {
        if current.has_next() {
            self.at_page(current.effective_page + 1)
        } else {
            self
        }
    }

    pub fn previous_page<T>(self, current: &PageWindow<T>) -> Self {
        if current.has_previous() {
            self.at_page(current.effective_page - 1)
        } else {
            self
        }
    }

    /// Filters and sorts `records`, then cuts the current page.
    pub fn render<'a>(&self, records: &'a [Record]) -> PageWindow<&'a Record> {
        let ordered = derive(records, &self.filters, self.sort);
        window_of(&ordered, self.page_size, self.page)
    }
}

/// The create/edit side panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EditPanel {
    #[default]
    Closed,
    Creating(RecordForm),
    Editing { id_or_url: String, form: RecordForm },
}

impl EditPanel {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn form(&self) -> Option<&RecordForm> {
        match self {
            Self::Closed => None,
            Self::Creating(form) | Self::Editing { form, .. } => Some(form),
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut RecordForm> {
        match self {
            Self::Closed => None,
            Self::Creating(form) | Self::Editing { form, .. } => Some(form),
        }
    }

    /// Resource the panel would PUT to; `None` means a create.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Editing { id_or_url, .. } if !id_or_url.is_empty() => Some(id_or_url),
            _ => None,
        }
    }
}
