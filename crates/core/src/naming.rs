//! Identifier sanitizing for generated declaration and class names.

/// What the previous kept character was.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Prev {
    Other,
    Separator,
    Digit,
    Dollar,
}

/// Converts an arbitrary name into a PascalCase identifier.
///
/// Characters outside `[A-Za-z0-9_$]` and underscores that precede a
/// lowercase letter act as word separators and are dropped. A letter that
/// follows a separator, a digit or a `$` starts a new word and is uppercased,
/// as is the first character. The result always matches
/// `^[A-Za-z_$][A-Za-z0-9_$]*$`.
///
/// ```
/// use tsgen_core::naming::safe_name;
///
/// assert_eq!(safe_name("foo_bar"), "FooBar");
/// assert_eq!(safe_name("_get"), "Get");
/// assert_eq!(safe_name("user-joined"), "UserJoined");
/// ```
pub fn safe_name(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut prev = Prev::Other;

    for (i, &c) in chars.iter().enumerate() {
        let is_word_char = c.is_ascii_alphanumeric() || c == '_' || c == '$';
        let splits_words =
            c == '_' && chars.get(i + 1).is_some_and(|next| next.is_ascii_lowercase());
        if !is_word_char || splits_words {
            prev = Prev::Separator;
            continue;
        }

        if c.is_ascii_alphabetic() && prev != Prev::Other {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        prev = match c {
            '0'..='9' => Prev::Digit,
            '$' => Prev::Dollar,
            _ => Prev::Other,
        };
    }

    let mut chars = out.chars();
    let out = match chars.next() {
        None => return "_".to_string(),
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
    };
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{out}")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_identifier(s: &str) -> bool {
        let mut chars = s.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    }

    #[test]
    fn test_separators() {
        assert_eq!(safe_name("foo_bar"), "FooBar");
        assert_eq!(safe_name("_get"), "Get");
        assert_eq!(safe_name("user-joined"), "UserJoined");
        assert_eq!(safe_name("a.b c"), "ABC");
        assert_eq!(safe_name("camelCase"), "CamelCase");
    }

    #[test]
    fn test_underscore_before_non_lowercase_is_kept() {
        assert_eq!(safe_name("FOO_BAR"), "FOO_BAR");
        assert_eq!(safe_name("_1"), "_1");
    }

    #[test]
    fn test_digit_and_dollar_runs_start_words() {
        assert_eq!(safe_name("v2beta"), "V2Beta");
        assert_eq!(safe_name("$ref"), "$Ref");
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(safe_name(""), "_");
        assert_eq!(safe_name("---"), "_");
        assert_eq!(safe_name("2fa"), "_2Fa");
    }

    #[test]
    fn test_output_is_always_an_identifier() {
        for raw in ["", "x", "ü-ber", "9", "a b", "__proto__", "$", "ünïcödé", "-_-a"] {
            let name = safe_name(raw);
            assert!(is_identifier(&name), "{raw:?} -> {name:?}");
        }
    }
}
