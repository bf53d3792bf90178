use crate::record::Record;

/// Records as the API returned them, in arrival order.
///
/// Only the page fetcher writes here; everything else reads.
#[derive(Clone, Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, id_or_url: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id_or_url == id_or_url)
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    pub(crate) fn replace(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    pub(crate) fn append(&mut self, records: Vec<Record>) {
        self.records.extend(records);
    }
}
