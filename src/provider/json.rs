//! JSON string encoding helpers.
//!
//! Request bodies are always produced by `serde_json`; these helpers expose
//! the same escaping for the raw response scanner and for tests.

/// Encode `s` as a JSON string literal, surrounding quotes included.
///
/// Newlines, quotes, backslashes and control characters are escaped;
/// non-ASCII text is kept as UTF-8.
pub fn encode_string(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

/// Decode a JSON string literal (with surrounding quotes).
pub fn decode_string(literal: &str) -> Result<String, serde_json::Error> {
    serde_json::from_str(literal)
}

/// Decode the inside of a JSON string literal (without surrounding quotes).
pub fn decode_string_contents(contents: &str) -> Result<String, serde_json::Error> {
    decode_string(&format!("\"{contents}\""))
}
