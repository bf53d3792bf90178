pub mod form;
pub mod identity;
pub mod time;

use serde::{Deserialize, Deserializer, Serialize};

pub use form::RecordForm;
pub use identity::validate_identity_code;

/// One visitor-log entry as returned by the collection endpoint.
///
/// Field names on the wire are the API's (`nombre`, `rut`, ...). Timestamps are
/// kept as the raw strings the server sent; see [`time`] for parsing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    #[serde(rename = "url", default, deserialize_with = "null_as_default")]
    pub id_or_url: String,
    #[serde(rename = "nombre", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "rut", default, deserialize_with = "null_as_default")]
    pub identity_code: String,
    #[serde(rename = "motivo", default, deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(rename = "horaentrada", default)]
    pub entry_time: Option<String>,
    #[serde(rename = "horasalida", default)]
    pub exit_time: Option<String>,
    #[serde(
        rename = "estado_finalizado",
        default,
        deserialize_with = "null_as_default"
    )]
    pub completed: bool,
}

/// Body sent on create (POST) and update (PUT).
///
/// `None` timestamps serialize as JSON `null`, never as a placeholder date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordPayload {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "rut")]
    pub identity_code: String,
    #[serde(rename = "motivo")]
    pub reason: String,
    #[serde(rename = "horaentrada")]
    pub entry_time: Option<String>,
    #[serde(rename = "horasalida")]
    pub exit_time: Option<String>,
    #[serde(rename = "estado_finalizado")]
    pub completed: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
