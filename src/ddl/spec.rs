use serde::{Deserialize, Serialize};

use crate::schema::{Column, Table};

/// Shape of the audit storage for a target table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLayout {
    /// One companion table per target holding full row versions
    #[default]
    Shadow,
    /// Shared transaction table for operation metadata plus a shared data
    /// table holding rows as JSON
    Split,
}

/// Audit configuration declared on a table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditOptions {
    #[serde(default)]
    pub enabled: bool,
    /// Schema for the audit table(s); defaults to the target's schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    /// Columns filled from `audit.<name>` session settings
    #[serde(default)]
    pub session_settings: Vec<Column>,
    #[serde(default)]
    pub layout: AuditLayout,
}

impl AuditOptions {
    /// Enabled options with every other field defaulted
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn with_schema_name(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    pub fn with_session_setting(mut self, column: Column) -> Self {
        self.session_settings.push(column);
        self
    }

    pub fn with_layout(mut self, layout: AuditLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// Effective audit settings for one table
#[derive(Debug, Clone, PartialEq)]
pub struct AuditSpec {
    pub enabled: bool,
    /// Schema the audit tables live in (`None` = search path default)
    pub schema: Option<String>,
    pub session_settings: Vec<Column>,
    pub layout: AuditLayout,
}

/// Derive the audit spec from a table's declared options.
///
/// Missing options mean auditing is disabled.
pub fn audit_spec(table: &Table) -> AuditSpec {
    match &table.info.audit_options {
        Some(options) => AuditSpec {
            enabled: options.enabled,
            schema: options.schema_name.clone().or_else(|| table.schema.clone()),
            session_settings: options.session_settings.clone(),
            layout: options.layout,
        },
        None => AuditSpec {
            enabled: false,
            schema: table.schema.clone(),
            session_settings: Vec::new(),
            layout: AuditLayout::default(),
        },
    }
}
