//! MySQL dialect helpers shared by the backend and the composers.

use std::sync::LazyLock;

use regex::Regex;

/// Quotes an identifier with backticks, doubling embedded backticks.
#[must_use]
pub fn quote(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// Escapes a string literal body (without surrounding quotes).
#[must_use]
pub fn escape_sql_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out
}

/// Quotes and escapes a string literal.
#[must_use]
pub fn quote_string(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

/// Character set implied by a collation name (`utf8mb4_bin` -> `utf8mb4`).
#[must_use]
pub fn charset_for_collation(collation: &str) -> &str {
    collation.split('_').next().unwrap_or(collation)
}

/// Server default collation of a character set, if known.
#[must_use]
pub fn default_collation_for_charset(charset: &str) -> Option<&'static str> {
    let collation = match charset.to_ascii_lowercase().as_str() {
        "latin1" => "latin1_swedish_ci",
        "latin2" => "latin2_general_ci",
        "utf8" => "utf8_general_ci",
        "utf8mb3" => "utf8mb3_general_ci",
        "utf8mb4" => "utf8mb4_0900_ai_ci",
        "ascii" => "ascii_general_ci",
        "binary" => "binary",
        "ucs2" => "ucs2_general_ci",
        "utf16" => "utf16_general_ci",
        "utf32" => "utf32_general_ci",
        "cp1250" => "cp1250_general_ci",
        "gbk" => "gbk_chinese_ci",
        "big5" => "big5_chinese_ci",
        "sjis" => "sjis_japanese_ci",
        _ => return None,
    };
    Some(collation)
}

/// Returns true if the collation is the charset's server default.
#[must_use]
pub fn is_default_collation(charset: &str, collation: &str) -> bool {
    default_collation_for_charset(charset).is_some_and(|d| d.eq_ignore_ascii_case(collation))
}

/// Whether a storage engine supports foreign keys.
///
/// Unknown engines yield `None`; callers treat that as supported.
#[must_use]
pub fn engine_supports_foreign_keys(engine: &str) -> Option<bool> {
    match engine.to_ascii_lowercase().as_str() {
        "innodb" | "ndbcluster" | "ndb" => Some(true),
        "myisam" | "memory" | "heap" | "archive" | "csv" | "merge" | "mrg_myisam"
        | "blackhole" | "federated" | "example" => Some(false),
        _ => None,
    }
}

/// Renders a comment literal truncated to `max_length` characters.
///
/// The overflow is kept inside an SQL comment so no text is lost. A limit of
/// zero means the server cannot store the comment and yields an empty string.
#[must_use]
pub fn comment_text(comment: &str, max_length: usize) -> String {
    if max_length == 0 {
        return String::new();
    }
    if comment.chars().count() <= max_length {
        return quote_string(comment);
    }
    let split = comment
        .char_indices()
        .nth(max_length)
        .map_or(comment.len(), |(i, _)| i);
    let (head, rest) = comment.split_at(split);
    format!(
        "{} /* comment truncated */ /*{}*/",
        quote_string(head),
        rest.replace("*/", "* /")
    )
}

/// Quotes an account name, splitting an optional `@host` part.
#[must_use]
pub fn quote_user(name: &str) -> String {
    match name.split_once('@') {
        Some((user, host)) => format!("{}@{}", quote_string(user), quote_string(host)),
        None => quote_string(name),
    }
}

static SCHEMA_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`(?:[^`]|``)+`\.(`(?:[^`]|``)+`)").expect("schema qualifier pattern")
});

/// Removes references to `schema` from qualified identifiers in `sql`.
///
/// `` `mydb`.`users` `` becomes `` `users` `` when `schema` is `mydb`;
/// other schemas are left alone.
#[must_use]
pub fn strip_schema_qualifier(sql: &str, schema: &str) -> String {
    let wanted = quote(schema);
    SCHEMA_QUALIFIER
        .replace_all(sql, |caps: &regex::Captures<'_>| {
            let whole = &caps[0];
            if whole.starts_with(&format!("{wanted}.")) {
                caps[1].to_string()
            } else {
                whole.to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote() {
        assert_eq!(quote("users"), "`users`");
        assert_eq!(quote("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_escape() {
        assert_eq!(quote_string("it's"), "'it\\'s'");
        assert_eq!(escape_sql_string("a\\b\n"), "a\\\\b\\n");
    }

    #[test]
    fn test_charset_helpers() {
        assert_eq!(charset_for_collation("utf8mb4_bin"), "utf8mb4");
        assert_eq!(charset_for_collation("binary"), "binary");
        assert!(is_default_collation("latin1", "latin1_swedish_ci"));
        assert!(!is_default_collation("latin1", "latin1_bin"));
        assert!(!is_default_collation("klingon", "klingon_ci"));
    }

    #[test]
    fn test_engine_fk_support() {
        assert_eq!(engine_supports_foreign_keys("InnoDB"), Some(true));
        assert_eq!(engine_supports_foreign_keys("MyISAM"), Some(false));
        assert_eq!(engine_supports_foreign_keys("RocksDB"), None);
    }

    #[test]
    fn test_comment_truncation() {
        assert_eq!(comment_text("short", 10), "'short'");
        assert_eq!(
            comment_text("abcdef", 4),
            "'abcd' /* comment truncated */ /*ef*/"
        );
        assert_eq!(comment_text("anything", 0), "");
    }

    #[test]
    fn test_quote_user() {
        assert_eq!(quote_user("bob"), "'bob'");
        assert_eq!(quote_user("bob@localhost"), "'bob'@'localhost'");
    }

    #[test]
    fn test_strip_schema_qualifier() {
        let sql = "SELECT * FROM `mydb`.`users` JOIN `other`.`t` ON 1";
        assert_eq!(
            strip_schema_qualifier(sql, "mydb"),
            "SELECT * FROM `users` JOIN `other`.`t` ON 1"
        );
    }
}
