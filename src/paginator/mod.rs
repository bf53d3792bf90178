use serde::Serialize;

use crate::error::ClientError;

/// Page sizes offered by the list view.
pub const PAGE_SIZES: [usize; 4] = [5, 10, 25, 50];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PageSize(usize);

impl PageSize {
    pub fn new(value: usize) -> Result<Self, ClientError> {
        if PAGE_SIZES.contains(&value) {
            Ok(Self(value))
        } else {
            Err(ClientError::InvalidPageSize { value })
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(10)
    }
}

/// One page of an ordered list plus the numbers shown around it.
///
/// `start_index_1_based` and `end_index_inclusive` are both 0 for an empty list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageWindow<T> {
    pub items: Vec<T>,
    pub effective_page: usize,
    pub max_page: usize,
    pub start_index_1_based: usize,
    pub end_index_inclusive: usize,
    pub total_count: usize,
}

impl<T> PageWindow<T> {
    pub fn has_previous(&self) -> bool {
        self.effective_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.effective_page < self.max_page
    }
}

/// Total pages for `total` items, never less than 1.
pub fn max_page(total: usize, page_size: PageSize) -> usize {
    total.div_ceil(page_size.get()).max(1)
}

/// Slices `list` to the requested page, clamping the page into `1..=max_page`.
pub fn window_of<T: Clone>(list: &[T], page_size: PageSize, requested_page: usize) -> PageWindow<T> {
    let total = list.len();
    let max_page = max_page(total, page_size);
    let effective_page = requested_page.clamp(1, max_page);

    let start = if total == 0 {
        0
    } else {
        (effective_page - 1) * page_size.get()
    };
    let end = (start + page_size.get()).min(total);

    PageWindow {
        items: list[start..end].to_vec(),
        effective_page,
        max_page,
        start_index_1_based: if total == 0 { 0 } else { start + 1 },
        end_index_inclusive: end,
        total_count: total,
    }
}
