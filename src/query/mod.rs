pub mod collate;

use std::cmp::Ordering;

use serde::Serialize;

use crate::record::time::sort_key_millis;
use crate::record::Record;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    Any,
    Completed,
    Incomplete,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "any" | "all" => Some(Self::Any),
            "completed" | "done" | "finalizado" => Some(Self::Completed),
            "incomplete" | "open" | "incompleto" => Some(Self::Incomplete),
            _ => None,
        }
    }

    fn admits(self, completed: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Completed => completed,
            Self::Incomplete => !completed,
        }
    }
}

/// User-entered filter values, stored as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub search: String,
    pub name: String,
    pub identity_code: String,
    pub reason: String,
    pub status: StatusFilter,
}

/// Filter inputs trimmed and lowercased once per derivation.
struct Needles {
    search: String,
    name: String,
    identity_code: String,
    reason: String,
    status: StatusFilter,
}

impl Needles {
    fn from_filters(filters: &Filters) -> Self {
        let norm = |v: &str| v.trim().to_lowercase();
        Self {
            search: norm(&filters.search),
            name: norm(&filters.name),
            identity_code: norm(&filters.identity_code),
            reason: norm(&filters.reason),
            status: filters.status,
        }
    }

    fn admits(&self, record: &Record) -> bool {
        let name = record.name.to_lowercase();
        let identity_code = record.identity_code.to_lowercase();
        let reason = record.reason.to_lowercase();

        if !self.search.is_empty()
            && !(name.contains(&self.search)
                || identity_code.contains(&self.search)
                || reason.contains(&self.search))
        {
            return false;
        }
        if !self.name.is_empty() && !name.contains(&self.name) {
            return false;
        }
        if !self.identity_code.is_empty() && !identity_code.contains(&self.identity_code) {
            return false;
        }
        if !self.reason.is_empty() && !reason.contains(&self.reason) {
            return false;
        }
        self.status.admits(record.completed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    IdentityCode,
    Reason,
    EntryTime,
    ExitTime,
    Completed,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        Self::Name,
        Self::IdentityCode,
        Self::Reason,
        Self::EntryTime,
        Self::ExitTime,
        Self::Completed,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "name" | "nombre" => Some(Self::Name),
            "identity_code" | "identity" | "rut" => Some(Self::IdentityCode),
            "reason" | "motivo" => Some(Self::Reason),
            "entry_time" | "entry" | "horaentrada" => Some(Self::EntryTime),
            "exit_time" | "exit" | "horasalida" => Some(Self::ExitTime),
            "completed" | "status" | "estado" => Some(Self::Completed),
            _ => None,
        }
    }

    fn compare(self, a: &Record, b: &Record) -> Ordering {
        match self {
            Self::Name => collate::compare(&a.name, &b.name),
            Self::IdentityCode => collate::compare(&a.identity_code, &b.identity_code),
            Self::Reason => collate::compare(&a.reason, &b.reason),
            Self::EntryTime => sort_key_millis(a.entry_time.as_deref())
                .cmp(&sort_key_millis(b.entry_time.as_deref())),
            Self::ExitTime => sort_key_millis(a.exit_time.as_deref())
                .cmp(&sort_key_millis(b.exit_time.as_deref())),
            Self::Completed => a.completed.cmp(&b.completed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Ascending => ord,
            Self::Descending => ord.reverse(),
        }
    }
}

/// Exactly one active sort column plus its direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    /// Newest visits first.
    fn default() -> Self {
        Self {
            field: SortField::EntryTime,
            direction: SortDirection::Descending,
        }
    }
}

impl SortState {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Header-click semantics: same field flips, new field starts ascending.
    pub fn toggled(self, field: SortField) -> Self {
        if self.field == field {
            Self {
                field,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                field,
                direction: SortDirection::Ascending,
            }
        }
    }

    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        self.direction.apply(self.field.compare(a, b))
    }
}

/// Filtered and stably sorted view of `records`.
pub fn derive<'a>(records: &'a [Record], filters: &Filters, sort: SortState) -> Vec<&'a Record> {
    let needles = Needles::from_filters(filters);
    let mut out: Vec<&Record> = records.iter().filter(|r| needles.admits(r)).collect();
    out.sort_by(|a, b| sort.compare(a, b));
    out
}
