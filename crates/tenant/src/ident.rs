//! Validation of caller-supplied text that is interpolated into SQL or used
//! as a filesystem path segment.
//!
//! Values are always bound as parameters; only identifiers, type
//! declarations, raw column lists, and filter conditions pass through here.

use common::{GatewayError, GatewayResult, INDEX_METADATA_TABLE};

const MAX_IDENTIFIER_LEN: usize = 128;
const MAX_SEGMENT_LEN: usize = 255;

fn invalid(msg: String) -> GatewayError {
    GatewayError::InvalidRequest(msg)
}

/// `[A-Za-z_][A-Za-z0-9_]*`, at most 128 characters.
pub fn identifier<'a>(kind: &str, value: &'a str) -> GatewayResult<&'a str> {
    let mut chars = value.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !head_ok
        || value.len() > MAX_IDENTIFIER_LEN
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(invalid(format!("invalid {kind} name '{value}'")));
    }
    Ok(value)
}

/// A table name a caller may write to: a valid identifier that is not the
/// reserved index metadata table.
pub fn user_table(value: &str) -> GatewayResult<&str> {
    identifier("table", value)?;
    if value.eq_ignore_ascii_case(INDEX_METADATA_TABLE) {
        return Err(invalid(format!(
            "table name '{value}' is reserved for index metadata"
        )));
    }
    Ok(value)
}

/// Column type declaration such as `INTEGER PRIMARY KEY` or `DECIMAL(10, 2)`.
///
/// Letters, digits, `_`, spaces and balanced parentheses are allowed; commas
/// only inside parentheses.
pub fn column_type(value: &str) -> GatewayResult<&str> {
    let bad = || invalid(format!("invalid column type '{value}'"));
    if value.trim().is_empty() || value.len() > MAX_SEGMENT_LEN {
        return Err(bad());
    }
    let mut depth = 0usize;
    for c in value.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1).ok_or_else(bad)?,
            ',' if depth > 0 => {}
            c if c.is_ascii_alphanumeric() || c == '_' || c == ' ' => {}
            _ => return Err(bad()),
        }
    }
    if depth != 0 {
        return Err(bad());
    }
    Ok(value)
}

/// Raw select column list: `*` or comma-separated identifiers.
///
/// Returns the list re-joined with `", "`.
pub fn column_list(value: &str) -> GatewayResult<String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(invalid(format!("invalid column list '{value}'")));
    }
    for part in &parts {
        if *part != "*" {
            identifier("column", part)?;
        }
    }
    Ok(parts.join(", "))
}

/// Raw filter condition interpolated after `WHERE`.
///
/// Statement separators and comments are rejected outside quoted literals;
/// NUL and unterminated quotes are rejected anywhere. A doubled quote inside
/// a literal (`'it''s'`) is an escaped quote.
pub fn condition(value: &str) -> GatewayResult<&str> {
    if value.contains('\0') {
        return Err(invalid("condition must not contain '\\0'".into()));
    }
    let bytes = value.as_bytes();
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match (b, bytes.get(i + 1).copied()) {
                (b'\'' | b'"', _) => quote = Some(b),
                (b';', _) => return Err(forbidden(";")),
                (b'-', Some(b'-')) => return Err(forbidden("--")),
                (b'/', Some(b'*')) => return Err(forbidden("/*")),
                (b'*', Some(b'/')) => return Err(forbidden("*/")),
                _ => {}
            },
        }
    }
    if let Some(q) = quote {
        return Err(invalid(format!(
            "condition has unbalanced {} quotes",
            char::from(q)
        )));
    }
    Ok(value)
}

fn forbidden(token: &str) -> GatewayError {
    invalid(format!("condition must not contain '{token}' outside quotes"))
}

/// Username usable as a directory name: `[A-Za-z0-9_-]+`.
pub fn username_segment(value: &str) -> GatewayResult<&str> {
    if value.is_empty()
        || value.len() > MAX_SEGMENT_LEN
        || !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(invalid(format!("invalid username '{value}'")));
    }
    Ok(value)
}

/// Database name usable as a file stem: `[A-Za-z0-9_.-]+`, not starting with `.`.
pub fn database_segment(value: &str) -> GatewayResult<&str> {
    if value.is_empty()
        || value.len() > MAX_SEGMENT_LEN
        || value.starts_with('.')
        || !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(invalid(format!("invalid database name '{value}'")));
    }
    Ok(value)
}

/// Password that survives a round trip through a connection string.
pub fn password(value: &str) -> GatewayResult<&str> {
    if value.contains('/') {
        return Err(invalid("password must not contain '/'".into()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identifiers_follow_allow_list() {
        for ok in ["orders", "_tmp", "Col9", "a_b_c"] {
            assert!(identifier("table", ok).is_ok(), "{ok}");
        }
        for bad in ["", "9lives", "drop table", "x;y", "a-b", "naïve", "t\"x"] {
            assert!(identifier("table", bad).is_err(), "{bad}");
        }
        assert!(identifier("table", &"a".repeat(129)).is_err());
    }

    #[test]
    fn reserved_metadata_table_is_not_writable() {
        assert!(user_table("orders").is_ok());
        assert!(user_table("indexes").is_err());
        assert!(user_table("INDEXES").is_err());
    }

    #[test]
    fn column_types_allow_common_declarations() {
        for ok in [
            "TEXT",
            "INTEGER PRIMARY KEY",
            "VARCHAR(20)",
            "DECIMAL(10, 2)",
            "REAL NOT NULL DEFAULT 0",
        ] {
            assert!(column_type(ok).is_ok(), "{ok}");
        }
        for bad in [
            "",
            "  ",
            "TEXT, evil TEXT",
            "TEXT); DROP TABLE x; --",
            "INT(",
            "INT)",
            "TEXT DEFAULT 'x'",
        ] {
            assert!(column_type(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn column_lists_normalise_spacing() {
        assert_eq!(column_list("*").unwrap(), "*");
        assert_eq!(column_list("id,name").unwrap(), "id, name");
        assert_eq!(column_list(" id ,  name ").unwrap(), "id, name");
        assert!(column_list("").is_err());
        assert!(column_list("id,").is_err());
        assert!(column_list("id, (SELECT 1)").is_err());
    }

    #[test]
    fn conditions_reject_statement_breakouts() {
        assert!(condition("id = 1").is_ok());
        assert!(condition("name = 'it''s'").is_ok());
        assert!(condition("").is_ok());
        assert!(condition("id = 1; DROP TABLE orders").is_err());
        assert!(condition("id = 1 -- trailing").is_err());
        assert!(condition("id = 1 /* x */").is_err());
        assert!(condition("name = 'open").is_err());
        assert!(condition("id = 1\0").is_err());
    }

    #[test]
    fn conditions_allow_metacharacters_inside_literals() {
        assert!(condition("name = 'a;b'").is_ok());
        assert!(condition("note = 'x--y' AND tag = '/* z */'").is_ok());
        assert!(condition("\"odd;col\" = 1").is_ok());
        assert!(condition("name = 'it''s' ; DROP TABLE orders").is_err());
        assert!(condition("name = 'a' -- 'b'").is_err());
        assert!(condition("name = \"a'").is_err());
    }

    #[test]
    fn path_segments_cannot_escape_the_tenant_directory() {
        assert!(username_segment("alice").is_ok());
        assert!(username_segment("a-b_c9").is_ok());
        for bad in ["", "..", "a/b", "a\\b", "auth.db", "a:b"] {
            assert!(username_segment(bad).is_err(), "{bad}");
        }

        assert!(database_segment("orders").is_ok());
        assert!(database_segment("orders.v2").is_ok());
        for bad in ["", ".", "..", ".hidden", "../bob/orders", "a/b", "x\0"] {
            assert!(database_segment(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn passwords_cannot_contain_slash() {
        assert!(password("pa:ss").is_ok());
        assert!(password("").is_ok());
        assert!(password("a/b").is_err());
    }

    proptest! {
        #[test]
        fn accepted_identifiers_never_contain_sql_metacharacters(s in ".{0,40}") {
            if identifier("column", &s).is_ok() {
                prop_assert!(s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
            }
        }

        #[test]
        fn accepted_database_names_are_single_segments(s in ".{0,40}") {
            if database_segment(&s).is_ok() {
                prop_assert!(!s.contains('/') && !s.contains('\\'));
                prop_assert!(!s.starts_with('.'));
            }
        }
    }
}
