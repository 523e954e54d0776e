//! JSON-pointer style paths into a declaration document.

use std::fmt;

/// Parsed pointer: `/Widget/size` → `["Widget", "size"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPointer {
    segments: Vec<String>,
}

impl JsonPointer {
    /// Parses a pointer, with or without its leading `#`. `~1` decodes to `/`
    /// and `~0` to `~`. Empty segments are ignored.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('#').unwrap_or(raw);
        let segments = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.replace("~1", "/").replace("~0", "~"))
            .collect();
        Self { segments }
    }

    /// Unescaped segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Splits off the declaration name.
    pub fn split_first(&self) -> Option<(&str, &[String])> {
        self.segments
            .split_first()
            .map(|(first, rest)| (first.as_str(), rest))
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_unescape() {
        let pointer = JsonPointer::parse("#/Widget/a~1b/c~0d");
        assert_eq!(pointer.segments(), ["Widget", "a/b", "c~d"]);
        assert_eq!(pointer.to_string(), "/Widget/a~1b/c~0d");
    }

    #[test]
    fn test_split_first() {
        let pointer = JsonPointer::parse("/Widget/size");
        let (name, rest) = pointer.split_first().unwrap_or_default();
        assert_eq!(name, "Widget");
        assert_eq!(rest, ["size"]);
        assert!(JsonPointer::parse("/").split_first().is_none());
    }
}
