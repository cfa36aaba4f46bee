//! Escaping of values and field names in query text

/// Characters that must be backslash-escaped inside tag and text values
pub const TAG_ESCAPE_CHARS: &[char] = &[
    ',', '.', '<', '>', '{', '}', '[', ']', '"', '\'', ':', ';', '!', '@', '#', '$', '%', '^',
    '&', '*', '(', ')', '-', '+', '=', '~', '|', '/',
];

/// Escape special characters; spaces are escaped too when `querying`
pub fn escape(value: &str, querying: bool) -> String {
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        if TAG_ESCAPE_CHARS.contains(&c) || (querying && c == ' ') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape a value for use inside `{...}` or as a text term
pub fn escape_value(value: &str) -> String {
    escape(value, true)
}

/// Escape a field alias for use after `@`
pub fn escape_field(name: &str) -> String {
    escape(name, false)
}

/// Quote a value as an exact phrase: `"..."` with `\` and `"` escaped
pub fn exact_phrase(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Convert a SQL LIKE pattern to a wildcard pattern body
///
/// `%` becomes `*`, `_` becomes `?`, and `'` and `\` are escaped for the
/// `w'...'` quoting.
pub fn like_pattern(pattern: &str) -> String {
    let mut converted = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '%' => converted.push('*'),
            '_' => converted.push('?'),
            '\'' | '\\' => {
                converted.push('\\');
                converted.push(c);
            }
            other => converted.push(other),
        }
    }
    converted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_special_chars() {
        assert_eq!(escape("a.b@c", false), "a\\.b\\@c");
        assert_eq!(escape("New York", false), "New York");
        assert_eq!(escape("New York", true), "New\\ York");
    }

    #[test]
    fn test_escape_email_tag() {
        assert_eq!(escape_value("jo@x.io"), "jo\\@x\\.io");
    }

    #[test]
    fn test_exact_phrase() {
        assert_eq!(exact_phrase("red shoe"), "\"red shoe\"");
        assert_eq!(exact_phrase("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("Micro%"), "Micro*");
        assert_eq!(like_pattern("%soft%"), "*soft*");
        assert_eq!(like_pattern("R_dis"), "R?dis");
        assert_eq!(like_pattern("O'Neil%"), "O\\'Neil*");
    }
}
