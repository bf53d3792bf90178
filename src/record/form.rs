use std::fmt::Display;

use chrono::TimeZone;

use super::identity::validate_identity_code;
use super::time::{instant_to_picker, picker_to_instant};
use super::{Record, RecordPayload};
use crate::error::ClientError;

/// Raw values of the create/edit form, as typed by the user.
///
/// Timestamps hold picker values (`YYYY-MM-DDTHH:MM` or empty).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordForm {
    pub name: String,
    pub identity_code: String,
    pub reason: String,
    pub entry_time: String,
    pub exit_time: String,
    pub completed: bool,
}

impl RecordForm {
    /// Prefills the form from an existing record, rendering timestamps in `tz`.
    pub fn from_record<Tz>(record: &Record, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            name: record.name.clone(),
            identity_code: record.identity_code.clone(),
            reason: record.reason.clone(),
            entry_time: instant_to_picker(record.entry_time.as_deref(), tz),
            exit_time: instant_to_picker(record.exit_time.as_deref(), tz),
            completed: record.completed,
        }
    }

    /// Validates the form and builds the request body. No network involved.
    pub fn to_payload<Tz: TimeZone>(&self, tz: &Tz) -> Result<RecordPayload, ClientError> {
        let name = required("name", &self.name)?;
        let identity_code = validate_identity_code(&self.identity_code)?;
        let reason = required("reason", &self.reason)?;
        Ok(RecordPayload {
            name,
            identity_code,
            reason,
            entry_time: picker_to_instant(&self.entry_time, tz)?,
            exit_time: picker_to_instant(&self.exit_time, tz)?,
            completed: self.completed,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::validation(field, format!("the {field} is required")));
    }
    Ok(value.to_string())
}
