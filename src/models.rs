use serde::Deserialize;
use serde::de::Error as _;
use serde_json::Value as JsonValue;

/// Body of `PUT /`
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PutValueRequest {
    pub name: String,
    pub value: String,
}

impl PutValueRequest {
    /// Decode a request body, accepting only a JSON object
    ///
    /// The derived `Deserialize` also accepts `["name", "value"]`, so the
    /// shape is checked before the fields are read.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        match serde_json::from_slice::<JsonValue>(body)? {
            object @ JsonValue::Object(_) => serde_json::from_value(object),
            other => Err(serde_json::Error::custom(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Escape text for inclusion in an HTML body
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Page shown for a stored entry
pub fn render_entry(key: &str, value: &str) -> String {
    format!("<h1>{}: {}</h1>", escape_html(key), escape_html(value))
}
