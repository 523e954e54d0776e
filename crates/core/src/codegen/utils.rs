//! Common utilities for TypeScript printing.

/// Check if a name needs quoting to be used as a property key.
///
/// Returns true if the name:
/// - Is empty
/// - Doesn't start with a letter, underscore, or dollar sign
/// - Contains characters other than alphanumeric, underscore, or dollar sign
pub fn needs_quoting(name: &str) -> bool {
    !name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Escape a string for use in a double-quoted JavaScript/TypeScript literal.
pub fn escape_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Quote a string if needed for use as a property key or enum member.
pub fn quote_if_needed(name: &str) -> String {
    if needs_quoting(name) {
        format!("\"{}\"", escape_js_string(name))
    } else {
        name.to_string()
    }
}

/// Render a `/** ... */` block at the given indentation level (2 spaces per
/// level). Single-line docs stay on one line.
pub fn doc_comment(docs: &str, indent: usize) -> String {
    let prefix = "  ".repeat(indent);
    let docs = docs.replace("*/", "*\\/");
    let lines: Vec<&str> = docs.lines().collect();
    if let [line] = lines.as_slice() {
        return format!("{prefix}/** {line} */\n");
    }
    let mut out = format!("{prefix}/**\n");
    for line in lines {
        if line.is_empty() {
            out.push_str(&format!("{prefix} *\n"));
        } else {
            out.push_str(&format!("{prefix} * {line}\n"));
        }
    }
    out.push_str(&format!("{prefix} */\n"));
    out
}
