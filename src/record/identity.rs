use std::sync::OnceLock;

use regex::Regex;

use crate::error::ClientError;

const IDENTITY_PATTERN: &str = r"^[0-9]{7,8}-[0-9kK]$";

fn identity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IDENTITY_PATTERN).expect("identity pattern compiles"))
}

/// Checks the `NNNNNNNN-C` shape of an identity code and returns it trimmed.
pub fn validate_identity_code(raw: &str) -> Result<String, ClientError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ClientError::validation(
            "identity code",
            "the identity code is required",
        ));
    }
    if !identity_re().is_match(value) {
        return Err(ClientError::validation(
            "identity code",
            format!("'{value}' does not match the expected format, e.g. 12345678-9"),
        ));
    }
    Ok(value.to_string())
}
