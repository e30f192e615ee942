//! Configuration: Generator Constants and Schema Documents
//!
//! - **Constants**: identifier limits, default schema, naming convention
//!   defaults and the session-setting namespace
//! - **`SchemaDocument`**: JSON description of tables and naming conventions,
//!   consumed by the `pg_audit_ddl` binary
//!
//! ## Document Format
//!
//! ```json
//! {
//!   "naming_convention": { "audit.table": "%(table_name)s_history" },
//!   "tables": [
//!     {
//!       "name": "users",
//!       "schema": "app",
//!       "columns": [
//!         { "name": "id", "type": "integer", "primary_key": true },
//!         { "name": "email", "type": "text", "nullable": false }
//!       ],
//!       "audit": {
//!         "enabled": true,
//!         "session_settings": [
//!           { "name": "username", "type": "varchar(64)", "nullable": false }
//!         ]
//!       }
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ddl::spec::AuditOptions;
use crate::error::{AuditError, AuditResult};
use crate::metadata::MetaData;
use crate::schema::{Column, Table};

/// PostgreSQL truncates identifiers beyond NAMEDATALEN - 1 bytes
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Schema substituted into naming conventions when neither the audit options
/// nor the target table name one
pub const DEFAULT_SCHEMA: &str = "public";

/// Namespace of the custom GUCs read by the generated procedures (`audit.<name>`)
pub const SETTINGS_NAMESPACE: &str = "audit";

/// Prefix given to session-setting columns in audit tables
pub const SESSION_SETTING_PREFIX: &str = "audit_";

pub const AUDIT_OPERATION_COLUMN: &str = "audit_operation";
pub const AUDIT_TIMESTAMP_COLUMN: &str = "audit_operation_timestamp";
pub const AUDIT_USER_COLUMN: &str = "audit_current_user";
/// Column of the split-layout transaction table naming the audited table
pub const AUDIT_TABLE_NAME_COLUMN: &str = "table_name";
/// Column of the split-layout data table holding the row as JSON
pub const AUDIT_DATA_COLUMN: &str = "data";
/// Length of `audit_current_user` and `table_name`
pub const AUDIT_NAME_LENGTH: u32 = 64;

pub const AUDIT_TABLE_CONVENTION: &str = "audit.table";
pub const AUDIT_FUNCTION_CONVENTION: &str = "audit.function";
pub const AUDIT_TRIGGER_CONVENTION: &str = "audit.trigger";
pub const AUDIT_TRANSACTION_TABLE_CONVENTION: &str = "audit.transaction_table";
pub const AUDIT_DATA_TABLE_CONVENTION: &str = "audit.data_table";

pub const DEFAULT_AUDIT_TABLE_NAMING_CONVENTION: &str = "%(table_name)s_audit";
pub const DEFAULT_AUDIT_FUNCTION_NAMING_CONVENTION: &str = "%(schema)s_%(table_name)s_audit";
pub const DEFAULT_AUDIT_TRIGGER_NAMING_CONVENTION: &str = "%(schema)s_%(table_name)s_audit";
pub const DEFAULT_AUDIT_TRANSACTION_TABLE_NAMING_CONVENTION: &str = "audit_transaction_table";
pub const DEFAULT_AUDIT_DATA_TABLE_NAMING_CONVENTION: &str = "audit_data_table";

/// Table entry of a [`SchemaDocument`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditOptions>,
}

impl TableDefinition {
    pub fn into_table(self) -> AuditResult<Table> {
        let mut table = Table::new(self.name);
        table.schema = self.schema;
        for column in self.columns {
            table.add_column(column)?;
        }
        table.info.audit_options = self.audit;
        Ok(table)
    }
}

/// JSON description of a schema to generate audit DDL for
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    #[serde(default)]
    pub naming_convention: BTreeMap<String, String>,
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

impl SchemaDocument {
    pub fn from_json_str(json: &str) -> AuditResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| AuditError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        debug!(path = %path.display(), bytes = raw.len(), "loaded schema document");

        Self::from_json_str(&raw).map_err(|e| AuditError::ConfigError {
            setting: path.display().to_string(),
            value: "<file contents>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Build a [`MetaData`] with the audit listener installed and every table
    /// attached in document order.
    pub fn into_metadata(self) -> AuditResult<MetaData> {
        let mut metadata = MetaData::new();
        metadata.naming_convention = self.naming_convention;
        crate::audit::install_listener(&mut metadata);

        for definition in self.tables {
            metadata.add_table(definition.into_table()?)?;
        }

        Ok(metadata)
    }
}
