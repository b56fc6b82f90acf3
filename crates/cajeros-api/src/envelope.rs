// ── Response envelope detection ──
//
// The REST backend wraps answers as `{success, data, message, error}`,
// sometimes with the payload under an endpoint-specific field instead of
// `data`. The table backend answers with bare arrays/objects. Both shapes
// pass through `unwrap_payload` so callers only ever see the payload.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::Error;

/// Keys whose presence marks a JSON object as an envelope.
pub const ENVELOPE_KEYS: [&str; 4] = ["success", "data", "error", "message"];

const GENERIC_FAILURE: &str = "request failed";

/// Whether `value` is an envelope rather than a bare payload.
pub fn is_envelope(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| ENVELOPE_KEYS.iter().any(|k| map.contains_key(*k)))
}

/// Strip an envelope if present, returning the payload.
///
/// Bare payloads are implicitly successful and returned unchanged. For an
/// envelope, `success: false` (or an `error` with no `data` and no explicit
/// `success`) becomes [`Error::Backend`] carrying the backend's message. On
/// success the payload is `data`, falling back to the named `field`, and
/// finally to `null` for acknowledgement-only envelopes.
pub fn unwrap_payload(body: Value, field: Option<&str>) -> Result<Value, Error> {
    if !is_envelope(&body) {
        return Ok(body);
    }
    let Value::Object(mut map) = body else {
        return Ok(body);
    };

    let failed = match map.get("success").and_then(Value::as_bool) {
        Some(success) => !success,
        None => is_set(map.get("error")) && !map.contains_key("data"),
    };
    if failed {
        return Err(Error::Backend {
            message: message_from_map(&map).unwrap_or_else(|| GENERIC_FAILURE.into()),
        });
    }

    let payload = take_non_null(&mut map, "data")
        .or_else(|| field.and_then(|f| take_non_null(&mut map, f)))
        .unwrap_or(Value::Null);
    Ok(payload)
}

/// Extract the backend's own message from an error body, if it parses.
///
/// Checks `message`, then `error` (string or `{message}` object), then `msg`.
pub fn error_message(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body).ok()? {
        Value::Object(map) => message_from_map(&map),
        _ => None,
    }
}

/// Read a response body as JSON, mapping non-2xx statuses to [`Error::Http`].
///
/// An empty 2xx body (e.g. `204 No Content`) decodes as `null`.
pub(crate) async fn read_json(resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();
    let body = resp.text().await.map_err(Error::Transport)?;

    if !status.is_success() {
        let message = error_message(&body)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
        return Err(Error::Http {
            status: status.as_u16(),
            message,
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}

/// Decode an unwrapped payload into `T`.
pub(crate) fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, Error> {
    serde_json::from_value(payload.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: payload.to_string(),
    })
}

/// Decode a list payload; `null` means an empty list.
pub(crate) fn decode_list<T: DeserializeOwned>(payload: Value) -> Result<Vec<T>, Error> {
    if payload.is_null() {
        return Ok(Vec::new());
    }
    decode(payload)
}

fn message_from_map(map: &Map<String, Value>) -> Option<String> {
    if let Some(msg) = map.get("message").and_then(Value::as_str) {
        return Some(msg.to_owned());
    }
    match map.get("error") {
        Some(Value::String(msg)) => return Some(msg.clone()),
        Some(Value::Object(inner)) => {
            if let Some(msg) = inner.get("message").and_then(Value::as_str) {
                return Some(msg.to_owned());
            }
        }
        _ => {}
    }
    map.get("msg").and_then(Value::as_str).map(str::to_owned)
}

fn is_set(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null | Value::Bool(false)))
}

fn take_non_null(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    map.remove(key).filter(|v| !v.is_null())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_is_implicit_success() {
        let body = json!([{ "id": 1 }, { "id": 2 }]);
        assert_eq!(unwrap_payload(body.clone(), None).unwrap(), body);
    }

    #[test]
    fn bare_object_without_envelope_keys_passes_through() {
        let body = json!({ "id": 1, "nombre": "A" });
        assert!(!is_envelope(&body));
        assert_eq!(unwrap_payload(body.clone(), Some("cajero")).unwrap(), body);
    }

    #[test]
    fn success_envelope_yields_data() {
        let body = json!({ "success": true, "data": [{ "id": 3 }] });
        assert_eq!(unwrap_payload(body, None).unwrap(), json!([{ "id": 3 }]));
    }

    #[test]
    fn named_field_used_when_data_missing() {
        let body = json!({ "success": true, "cajeros": [{ "id": 9 }] });
        assert_eq!(
            unwrap_payload(body, Some("cajeros")).unwrap(),
            json!([{ "id": 9 }])
        );
    }

    #[test]
    fn failed_envelope_carries_backend_message() {
        let body = json!({ "success": false, "message": "Credenciales incorrectas" });
        let err = unwrap_payload(body, None).unwrap_err();
        assert!(matches!(err, Error::Backend { ref message } if message == "Credenciales incorrectas"));
    }

    #[test]
    fn failed_envelope_falls_back_to_error_field() {
        let body = json!({ "success": false, "error": "cajero no encontrado" });
        let err = unwrap_payload(body, None).unwrap_err();
        assert_eq!(err.to_string(), "cajero no encontrado");
    }

    #[test]
    fn error_without_success_flag_is_failure() {
        let body = json!({ "error": "boom" });
        assert!(unwrap_payload(body, None).is_err());
    }

    #[test]
    fn acknowledgement_envelope_yields_null() {
        let body = json!({ "success": true, "message": "actualizado" });
        assert_eq!(unwrap_payload(body, None).unwrap(), Value::Null);
    }

    #[test]
    fn error_message_reads_postgrest_shape() {
        let body = r#"{"code":"23505","details":null,"hint":null,"message":"duplicate key"}"#;
        assert_eq!(error_message(body).as_deref(), Some("duplicate key"));
    }

    #[test]
    fn error_message_reads_nested_error_object() {
        let body = r#"{"error":{"code":401,"message":"invalid api key"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("invalid api key"));
    }

    #[test]
    fn error_message_none_for_non_json() {
        assert!(error_message("<html>Bad Gateway</html>").is_none());
    }
}
