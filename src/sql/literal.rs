//! Literal sanitization for inlined SQL.
//!
//! Values are inlined rather than bound: the statements flow through
//! a map of plain strings so the executor can stay generic over what
//! it runs. Text is quoted with each `'` escaped to `\'` (MariaDB
//! backslash escaping); numbers are stringified and quoted the same
//! way; absent values render as the bare token `NULL`.

use crate::record::Value;

/// Quote a text literal, escaping embedded single quotes.
pub fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "\\'"))
}

/// Render a field value, or `NULL` when the field is absent.
pub fn value_or_null(value: Option<Value<'_>>) -> String {
    match value {
        Some(Value::Int(n)) => format!("'{n}'"),
        Some(Value::Text(s)) => quote_text(s),
        None => "NULL".to_string(),
    }
}

/// Render a surrogate key, or `NULL` for an unresolved dimension.
pub fn id_or_null(id: Option<u64>) -> String {
    match id {
        Some(id) => format!("'{id}'"),
        None => "NULL".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain_text() {
        assert_eq!(quote_text("DBTest"), "'DBTest'");
    }

    #[test]
    fn test_quote_escapes_single_quotes() {
        assert_eq!(quote_text("O'Brien"), "'O\\'Brien'");
        assert_eq!(quote_text("IT'S A TEST :)"), "'IT\\'S A TEST :)'");
    }

    #[test]
    fn test_quote_never_terminates_the_literal() {
        let quoted = quote_text("a'b'c");
        // Every interior quote is escaped; only the delimiters remain.
        let interior = &quoted[1..quoted.len() - 1];
        assert!(!interior.contains("''"));
        assert_eq!(interior.matches("\\'").count(), 2);
    }

    #[test]
    fn test_ints_are_quoted_like_text() {
        assert_eq!(value_or_null(Some(Value::Int(10))), "'10'");
        assert_eq!(value_or_null(Some(Value::Int(-1))), "'-1'");
    }

    #[test]
    fn test_absent_value_renders_null() {
        assert_eq!(value_or_null(None), "NULL");
        assert_eq!(id_or_null(None), "NULL");
    }

    #[test]
    fn test_id_is_quoted() {
        assert_eq!(id_or_null(Some(7)), "'7'");
    }
}
