use eyre::{Report, WrapErr};
use serde::Serialize;

/// Serializes a response envelope, degrading to an error envelope when
/// the value itself cannot be represented as JSON.
pub fn stringify_response<T: Serialize>(obj: &T) -> String {
  match serde_json::to_string(obj) {
    Ok(json) => json,
    Err(err) => fallback_error_json(&format!("When serializing response: {err}")),
  }
}

pub fn stringify_pretty<T: Serialize>(obj: &T) -> Result<String, Report> {
  serde_json::to_string_pretty(obj).wrap_err("When converting an entry to JSON string")
}

/// Last-resort envelope assembled by hand so it can never fail itself.
fn fallback_error_json(message: &str) -> String {
  format!(r#"{{"success":false,"error":"{}"}}"#, message.replace('"', "'"))
}
