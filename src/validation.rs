//! Input Validation Module
//!
//! Every name that ends up inside generated DDL (tables, schemas, columns,
//! functions, triggers, session settings) passes through here first. Generated
//! SQL embeds identifiers unquoted, so anything that would need quoting is
//! rejected rather than escaped.
//!
//! ## Usage
//!
//! ```rust
//! use pg_audit_ddl::validation::validate_sql_identifier;
//!
//! assert!(validate_sql_identifier("users_audit", "table_name").is_ok());
//! assert!(validate_sql_identifier("users; DROP TABLE x", "table_name").is_err());
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::config::MAX_IDENTIFIER_LENGTH;
use crate::error::{AuditError, AuditResult};

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
        .unwrap_or_else(|e| panic!("invalid identifier pattern: {e}"))
});

/// Validate an unquoted `PostgreSQL` identifier
///
/// Allows letters, digits and underscores, up to [`MAX_IDENTIFIER_LENGTH`]
/// bytes. `$` is legal in PostgreSQL names but would break the dollar-quoted
/// procedure bodies, so it is refused.
pub fn validate_sql_identifier(identifier: &str, param_name: &str) -> AuditResult<()> {
    if identifier.is_empty() {
        return Err(AuditError::InvalidIdentifier {
            parameter: param_name.to_string(),
            value: identifier.to_string(),
            reason: "Identifier cannot be empty".to_string(),
        });
    }

    let dangerous_chars = [';', '-', '\'', '"', '/', '*', '\\', '\0'];
    if let Some(ch) = identifier.chars().find(|c| dangerous_chars.contains(c)) {
        return Err(AuditError::InvalidIdentifier {
            parameter: param_name.to_string(),
            value: sanitize_for_logging(identifier),
            reason: format!("Identifier contains dangerous character: '{ch}'"),
        });
    }

    if identifier.len() > MAX_IDENTIFIER_LENGTH {
        return Err(AuditError::InvalidIdentifier {
            parameter: param_name.to_string(),
            value: sanitize_for_logging(identifier),
            reason: format!(
                "Identifier too long ({} bytes, max {MAX_IDENTIFIER_LENGTH})",
                identifier.len()
            ),
        });
    }

    if !IDENTIFIER_RE.is_match(identifier) {
        return Err(AuditError::InvalidIdentifier {
            parameter: param_name.to_string(),
            value: sanitize_for_logging(identifier),
            reason: "Identifier must start with a letter or underscore and contain only \
                     letters, digits and underscores"
                .to_string(),
        });
    }

    Ok(())
}

/// Validate a possibly schema-qualified name (`schema.table` or `table`)
pub fn validate_qualified_name(name: &str, param_name: &str) -> AuditResult<()> {
    match name.split_once('.') {
        Some((schema, table)) => {
            validate_sql_identifier(schema, param_name)?;
            validate_sql_identifier(table, param_name)
        }
        None => validate_sql_identifier(name, param_name),
    }
}

/// Sanitize string for error messages (truncate, escape control characters)
fn sanitize_for_logging(s: &str) -> String {
    let max_chars = 50;
    let truncated = match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    };

    truncated
        .replace('\0', "\\0")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_audit_object_names() {
        for name in ["users", "_staging", "public_users_audit", "audit_username", "t2"] {
            assert!(validate_sql_identifier(name, "table_name").is_ok(), "{name}");
        }
        assert!(validate_sql_identifier(&"a".repeat(63), "table_name").is_ok());
    }

    #[test]
    fn test_rejects_names_needing_quotes() {
        for name in ["", "users; DROP TABLE x", "order-items", "audit user", "\"Users\"", "2fa_codes"] {
            assert!(validate_sql_identifier(name, "table_name").is_err(), "{name}");
        }
        assert!(validate_sql_identifier(&"a".repeat(64), "table_name").is_err());
    }

    #[test]
    fn test_rejects_dollar_sign() {
        let result = validate_sql_identifier("price$usd", "column_name");
        assert!(matches!(
            result,
            Err(AuditError::InvalidIdentifier { ref parameter, .. }) if parameter == "column_name"
        ));
        assert!(validate_sql_identifier("$body$", "function").is_err());
    }

    #[test]
    fn test_qualified_names() {
        assert!(validate_qualified_name("app.users", "test").is_ok());
        assert!(validate_qualified_name("users", "test").is_ok());
        assert!(validate_qualified_name("app.", "test").is_err());
        assert!(validate_qualified_name("a.b.c", "test").is_err());
    }

    #[test]
    fn test_error_value_is_truncated() {
        let long = format!("{}-", "x".repeat(200));
        match validate_sql_identifier(&long, "test") {
            Err(AuditError::InvalidIdentifier { value, .. }) => {
                assert!(value.len() <= 53);
                assert!(value.ends_with("..."));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
