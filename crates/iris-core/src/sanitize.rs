//! Bounds the size of untrusted property payloads before storage.

use serde_json::Value;

/// Default cap on the character length of a property string.
pub const DEFAULT_MAX_PROPERTY_LEN: usize = 200;

/// Appended to every string that was cut.
pub const TRUNCATION_MARKER: &str = "...";

/// Truncate every string leaf of `value` longer than `max_len` characters
/// to its first `max_len` characters plus [`TRUNCATION_MARKER`].
///
/// Recurses through objects and arrays. Numbers, booleans and nulls are left
/// alone. Lengths are counted in `char`s so multi-byte text is never split
/// inside a code point. Applying it twice with the same `max_len` is a no-op
/// the second time.
pub fn truncate_strings(value: &mut Value, max_len: usize) {
    match value {
        Value::String(s) => {
            if let Some((cut, _)) = s.char_indices().nth(max_len) {
                s.truncate(cut);
                s.push_str(TRUNCATION_MARKER);
            }
        }
        Value::Array(items) => {
            for item in items {
                truncate_strings(item, max_len);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                truncate_strings(item, max_len);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
