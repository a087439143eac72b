//! Sensitive-field redaction.
//!
//! Redaction runs **before** hashing and persistence, so the chain attests
//! to the redacted view of every payload — it is part of the canonical
//! event, not a display-time transform.

use serde_json::Value;

/// Marker substituted for every sensitive value.
pub const REDACTED: &str = "[REDACTED]";

/// Field-name tokens that mark a map entry as sensitive.
///
/// Matching is case-insensitive substring containment, so `"userPassword"`
/// and `"X-Api-Key"` are both caught.
const SENSITIVE_TOKENS: &[&str] = &[
    "password",
    "passwd",
    "token",
    "secret",
    "key",
    "apikey",
    "api_key",
    "auth",
    "authorization",
    "access_token",
    "refresh_token",
    "session",
    "cookie",
    "csrf",
    "ssn",
    "credential",
    "private",
];

/// Whether a map key names a sensitive field.
fn is_sensitive(key: &str) -> bool {
    let key = key.to_lowercase();
    SENSITIVE_TOKENS.iter().any(|token| key.contains(token))
}

/// Return a deep copy of `value` with every sensitive map entry's value
/// replaced by [`REDACTED`].
///
/// Arrays and nested objects are walked recursively; scalars and `null`
/// pass through unchanged. The input is never mutated, and redacting an
/// already-redacted structure is a no-op.
pub fn redact_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, inner) in map {
                if is_sensitive(key) {
                    out.insert(key.clone(), Value::String(REDACTED.to_string()));
                } else {
                    out.insert(key.clone(), redact_value(inner));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_redacts_sensitive_keys() {
        let input = json!({
            "username": "alice",
            "password": "hunter2",
            "apiKey": "abc123",
            "Authorization": "Bearer xyz"
        });

        let redacted = redact_value(&input);

        assert_eq!(redacted["username"], "alice");
        assert_eq!(redacted["password"], REDACTED);
        assert_eq!(redacted["apiKey"], REDACTED);
        assert_eq!(redacted["Authorization"], REDACTED);
    }

    #[test]
    fn test_recurses_into_nested_structures() {
        let input = json!({
            "profile": {
                "name": "alice",
                "credentials": { "refresh_token": "rt-1" }
            },
            "devices": [
                { "session_id": "s-1", "device": "laptop" }
            ]
        });

        let redacted = redact_value(&input);

        assert_eq!(redacted["profile"]["name"], "alice");
        // "credentials" itself matches a sensitive token; the whole value
        // is masked rather than walked.
        assert_eq!(redacted["profile"]["credentials"], REDACTED);
        assert_eq!(redacted["devices"][0]["session_id"], REDACTED);
        assert_eq!(redacted["devices"][0]["device"], "laptop");
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(redact_value(&json!(null)), json!(null));
        assert_eq!(redact_value(&json!(42)), json!(42));
        assert_eq!(redact_value(&json!("plain")), json!("plain"));
        assert_eq!(redact_value(&json!([1, 2, 3])), json!([1, 2, 3]));
    }

    #[test]
    fn test_idempotent() {
        let input = json!({
            "password": "hunter2",
            "note": "keep this",
            "nested": { "csrf_token": "t" }
        });

        let once = redact_value(&input);
        let twice = redact_value(&once);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_input_not_mutated() {
        let input = json!({ "secret": "s3cr3t" });
        let copy = input.clone();

        let _ = redact_value(&input);

        assert_eq!(input, copy);
    }
}
