//! Named types that map to plain JSON scalars instead of definitions.

use std::fmt::Debug;

use serde_json::{Value, json};

/// Intercepts a named type reference before it is looked up as a
/// declaration. A recognized type has no child definitions.
pub trait ScalarRecognizer: Debug + Send + Sync {
    /// Returns the schema for `name`, or `None` to let the next recognizer
    /// or the declaration lookup handle it.
    fn recognize(&self, name: &str) -> Option<Value>;
}

/// Typed byte arrays travel as base64 strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferRecognizer;

impl BufferRecognizer {
    /// Type names recognized as binary buffers.
    pub const NAMES: [&'static str; 6] = [
        "Uint8Array",
        "Int8Array",
        "Uint16Array",
        "Int16Array",
        "Uint32Array",
        "Int32Array",
    ];
}

impl ScalarRecognizer for BufferRecognizer {
    fn recognize(&self, name: &str) -> Option<Value> {
        Self::NAMES
            .contains(&name)
            .then(|| json!({"type": "string", "contentEncoding": "base64"}))
    }
}

/// `URL` travels as a URI string.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlRecognizer;

impl ScalarRecognizer for UrlRecognizer {
    fn recognize(&self, name: &str) -> Option<Value> {
        (name == "URL").then(|| json!({"type": "string", "format": "uri"}))
    }
}

/// `Date` travels as an RFC 3339 string.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRecognizer;

impl ScalarRecognizer for DateRecognizer {
    fn recognize(&self, name: &str) -> Option<Value> {
        (name == "Date").then(|| json!({"type": "string", "format": "date-time"}))
    }
}

/// Buffer, URL and Date recognizers, in that order.
pub fn default_recognizers() -> Vec<Box<dyn ScalarRecognizer>> {
    vec![
        Box::new(BufferRecognizer),
        Box::new(UrlRecognizer),
        Box::new(DateRecognizer),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_family() {
        for name in BufferRecognizer::NAMES {
            assert_eq!(
                BufferRecognizer.recognize(name),
                Some(json!({"type": "string", "contentEncoding": "base64"}))
            );
        }
        assert_eq!(BufferRecognizer.recognize("Float32Array"), None);
    }

    #[test]
    fn test_url_and_date() {
        assert_eq!(
            UrlRecognizer.recognize("URL"),
            Some(json!({"type": "string", "format": "uri"}))
        );
        assert_eq!(UrlRecognizer.recognize("Url"), None);
        assert_eq!(
            DateRecognizer.recognize("Date"),
            Some(json!({"type": "string", "format": "date-time"}))
        );
    }
}
