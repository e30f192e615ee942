//! Naming Conventions for Audit Objects
//!
//! Audit table, function and trigger names come from templates stored in
//! [`MetaData::naming_convention`], using `%(table_name)s` and `%(schema)s`
//! placeholders (`%%` is a literal percent sign). Missing keys fall back to
//! the defaults in [`crate::config`].

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::{
    AUDIT_DATA_TABLE_CONVENTION, AUDIT_FUNCTION_CONVENTION, AUDIT_TABLE_CONVENTION,
    AUDIT_TRANSACTION_TABLE_CONVENTION, AUDIT_TRIGGER_CONVENTION, DEFAULT_AUDIT_DATA_TABLE_NAMING_CONVENTION,
    DEFAULT_AUDIT_FUNCTION_NAMING_CONVENTION, DEFAULT_AUDIT_TABLE_NAMING_CONVENTION,
    DEFAULT_AUDIT_TRANSACTION_TABLE_NAMING_CONVENTION, DEFAULT_AUDIT_TRIGGER_NAMING_CONVENTION,
    DEFAULT_SCHEMA,
};
use crate::error::{AuditError, AuditResult};
use crate::metadata::MetaData;
use crate::validation::validate_sql_identifier;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%\(([^)]*)\)s|%%").unwrap_or_else(|e| panic!("invalid placeholder pattern: {e}"))
});

/// Names of every object the generator may create for one target table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditNames {
    pub table: String,
    pub function: String,
    pub trigger: String,
    pub transaction_table: String,
    pub data_table: String,
}

impl AuditNames {
    /// Resolve all conventions for `table_name`; `schema` is the audit schema,
    /// `public` when `None`.
    pub fn resolve(metadata: &MetaData, table_name: &str, schema: Option<&str>) -> AuditResult<Self> {
        let schema = schema.unwrap_or(DEFAULT_SCHEMA);
        let name = |key: &str, default: &str| -> AuditResult<String> {
            let template = convention(metadata, key, default);
            let rendered = render(key, template, table_name, schema)?;
            validate_sql_identifier(&rendered, key)?;
            Ok(rendered)
        };

        Ok(Self {
            table: name(AUDIT_TABLE_CONVENTION, DEFAULT_AUDIT_TABLE_NAMING_CONVENTION)?,
            function: name(AUDIT_FUNCTION_CONVENTION, DEFAULT_AUDIT_FUNCTION_NAMING_CONVENTION)?,
            trigger: name(AUDIT_TRIGGER_CONVENTION, DEFAULT_AUDIT_TRIGGER_NAMING_CONVENTION)?,
            transaction_table: name(
                AUDIT_TRANSACTION_TABLE_CONVENTION,
                DEFAULT_AUDIT_TRANSACTION_TABLE_NAMING_CONVENTION,
            )?,
            data_table: name(AUDIT_DATA_TABLE_CONVENTION, DEFAULT_AUDIT_DATA_TABLE_NAMING_CONVENTION)?,
        })
    }
}

/// Template registered under `key`, or `default`
pub fn convention<'a>(metadata: &'a MetaData, key: &str, default: &'a str) -> &'a str {
    metadata
        .naming_convention
        .get(key)
        .map(String::as_str)
        .unwrap_or(default)
}

/// Substitute placeholders in a naming convention template
pub fn render(key: &str, template: &str, table_name: &str, schema: &str) -> AuditResult<String> {
    let mut unknown = None;
    let rendered = PLACEHOLDER_RE.replace_all(template, |caps: &Captures<'_>| {
        match caps.get(1).map(|m| m.as_str()) {
            Some("table_name") => table_name.to_string(),
            Some("schema") => schema.to_string(),
            Some(other) => {
                unknown.get_or_insert_with(|| other.to_string());
                String::new()
            }
            None => "%".to_string(),
        }
    });

    match unknown {
        Some(placeholder) => Err(AuditError::UnknownNamingPlaceholder {
            key: key.to_string(),
            template: template.to_string(),
            placeholder,
        }),
        None => Ok(rendered.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::testing::assert_error_sqlstate;

    #[test]
    fn test_render_placeholders() {
        assert_eq!(
            render("k", "%(schema)s_%(table_name)s_audit", "users", "app").unwrap(),
            "app_users_audit"
        );
        assert_eq!(render("k", "100%%_%(table_name)s", "t", "s").unwrap(), "100%_t");
        assert_eq!(render("k", "fixed_name", "t", "s").unwrap(), "fixed_name");
    }

    #[test]
    fn test_render_unknown_placeholder() {
        let result = render("audit.table", "%(tablename)s_audit", "users", "public");
        match result {
            Err(AuditError::UnknownNamingPlaceholder { placeholder, .. }) => {
                assert_eq!(placeholder, "tablename");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let names = AuditNames::resolve(&MetaData::new(), "users", None).unwrap();
        assert_eq!(names.table, "users_audit");
        assert_eq!(names.function, "public_users_audit");
        assert_eq!(names.trigger, "public_users_audit");
        assert_eq!(names.transaction_table, "audit_transaction_table");
        assert_eq!(names.data_table, "audit_data_table");
    }

    #[test]
    fn test_resolve_custom_conventions() {
        let metadata = MetaData::new()
            .with_naming_convention("audit.table", "%(table_name)s_history")
            .with_naming_convention("audit.trigger", "trg_%(table_name)s");

        let names = AuditNames::resolve(&metadata, "orders", Some("sales")).unwrap();
        assert_eq!(names.table, "orders_history");
        assert_eq!(names.function, "sales_orders_audit");
        assert_eq!(names.trigger, "trg_orders");
    }

    #[test]
    fn test_resolve_rejects_invalid_rendered_name() {
        let metadata = MetaData::new().with_naming_convention("audit.table", "%(table_name)s-audit");
        assert_error_sqlstate(AuditNames::resolve(&metadata, "users", None), "42602");

        let long = "x".repeat(60);
        assert_error_sqlstate(AuditNames::resolve(&MetaData::new(), &long, None), "42602");
    }
}
