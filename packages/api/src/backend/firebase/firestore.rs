//! Firestore typed-value codec for profile documents.
//!
//! Firestore's REST API wraps every field in a typed envelope
//! (`{"stringValue": "..."}`, `{"integerValue": "42"}`). Profiles are encoded
//! by serialising them with serde first and wrapping each JSON scalar, and
//! decoded the other way round, so the camelCase field names stay defined in
//! one place.

use serde_json::{json, Map, Value};

use crate::error::BackendError;
use crate::models::{ProfilePatch, UserProfile};

/// Encode a patch as a Firestore document body plus its update mask.
///
/// Only the fields the patch sets appear in the mask. An empty string is
/// left out of the body, which makes Firestore delete the field.
pub fn encode_patch(patch: &ProfilePatch) -> Result<(Vec<String>, Value), BackendError> {
    let plain = serde_json::to_value(patch)
        .map_err(|e| BackendError::unknown(format!("Failed to encode profile: {e}")))?;
    let Value::Object(plain) = plain else {
        return Err(BackendError::unknown("Profile did not encode to an object"));
    };

    let mut mask = Vec::with_capacity(plain.len());
    let mut fields = Map::new();
    for (key, value) in plain {
        if value.as_str() != Some("") {
            fields.insert(key.clone(), encode_value(value));
        }
        mask.push(key);
    }
    Ok((mask, json!({ "fields": fields })))
}

fn encode_value(value: Value) -> Value {
    match value {
        Value::String(s) => json!({ "stringValue": s }),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "integerValue": n.to_string() }),
        Value::Number(n) => json!({ "doubleValue": n }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        _ => json!({ "nullValue": null }),
    }
}

/// Decode a Firestore document into the profile of `uid`.
pub fn decode_profile(uid: &str, document: &Value) -> Result<UserProfile, BackendError> {
    let mut plain = Map::new();
    if let Some(fields) = document.get("fields").and_then(Value::as_object) {
        for (key, value) in fields {
            if let Some(decoded) = decode_value(value) {
                plain.insert(key.clone(), decoded);
            }
        }
    }
    plain.insert("id".to_string(), Value::String(uid.to_string()));

    serde_json::from_value(Value::Object(plain))
        .map_err(|e| BackendError::unknown(format!("Malformed profile document: {e}")))
}

fn decode_value(value: &Value) -> Option<Value> {
    let envelope = value.as_object()?;
    if let Some(s) = envelope.get("stringValue") {
        return Some(s.clone());
    }
    if let Some(i) = envelope.get("integerValue") {
        // Firestore sends 64-bit integers as strings.
        return match i {
            Value::String(s) => s.parse::<i64>().ok().map(Value::from),
            other => Some(other.clone()),
        };
    }
    if let Some(d) = envelope.get("doubleValue") {
        return Some(d.clone());
    }
    if let Some(b) = envelope.get("booleanValue") {
        return Some(b.clone());
    }
    None
}
