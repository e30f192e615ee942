//! Schema Model: Tables and Columns the Generator Works From
//!
//! This module is the small slice of an ORM schema model the audit generator
//! needs:
//! - **`ColumnType`**: PostgreSQL type with parsing and `compile()`
//! - **`Column`**: name, type, nullability, key and default
//! - **`Table`**: ordered columns plus the `TableInfo` the generator writes into
//!
//! Tables are registered in a [`crate::metadata::MetaData`], which fires the
//! attach event that derives audit tables.
//!
//! ## Example
//!
//! ```rust
//! use pg_audit_ddl::schema::{Column, ColumnType, Table};
//!
//! let table = Table::new("users")
//!     .with_schema("app")
//!     .with_column(Column::new("id", ColumnType::Integer).primary_key())
//!     .with_column(Column::new("email", ColumnType::Text));
//!
//! assert_eq!(table.fullname(), "app.users");
//! ```

pub mod column;
pub mod types;

pub use column::Column;
pub use types::ColumnType;

use crate::ddl::spec::AuditOptions;
use crate::error::{AuditError, AuditResult};

/// Role of a table derived by the audit generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTableKind {
    /// Per-target copy of row versions
    Shadow,
    /// Shared operation metadata of the split layout
    Transaction,
    /// Shared JSON row data of the split layout
    Data,
}

impl AuditTableKind {
    /// Whether several targets write into one table of this kind
    pub fn is_shared(self) -> bool {
        !matches!(self, AuditTableKind::Shadow)
    }
}

/// Per-table metadata written by the audit generator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableInfo {
    /// Audit configuration declared on the table
    pub audit_options: Option<AuditOptions>,
    /// Set on a target table once its audit DDL has been generated
    pub is_audited: bool,
    /// Set on tables derived by the generator
    pub is_audit_table: bool,
    /// Role of a derived table; `None` on tables the generator did not create
    pub audit_kind: Option<AuditTableKind>,
    /// Full name of the table an audit table records
    pub target_table: Option<String>,
    /// Scripts installing procedures and triggers, one per procedure, in execution order
    pub create_ddl: Vec<String>,
    /// Scripts removing procedures and triggers, one per procedure, in execution order
    pub drop_ddl: Vec<String>,
}

/// A table definition
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub schema: Option<String>,
    columns: Vec<Column>,
    pub info: TableInfo,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            info: TableInfo::default(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Builder form of [`Table::extend_columns`]; a same-named column is replaced.
    pub fn with_column(mut self, column: Column) -> Self {
        self.extend_columns(std::iter::once(column));
        self
    }

    pub fn with_audit(mut self, options: AuditOptions) -> Self {
        self.info.audit_options = Some(options);
        self
    }

    /// `schema.name` when a schema is set, otherwise `name`
    pub fn fullname(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Append a column, rejecting duplicates
    pub fn add_column(&mut self, column: Column) -> AuditResult<()> {
        if self.column(&column.name).is_some() {
            return Err(AuditError::DuplicateColumn {
                column_name: column.name,
                table: self.fullname(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Merge columns into the table: same-named columns are replaced in place,
    /// new ones appended in order.
    pub fn extend_columns(&mut self, columns: impl IntoIterator<Item = Column>) {
        for column in columns {
            match self.columns.iter_mut().find(|c| c.name == column.name) {
                Some(existing) => *existing = column,
                None => self.columns.push(column),
            }
        }
    }

    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// `CREATE TABLE` statement for this table
    pub fn create_sql(&self) -> String {
        let mut parts: Vec<String> = self.columns.iter().map(Column::to_sql).collect();

        let pk = self.primary_key();
        if !pk.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", pk.join(", ")));
        }

        format!(
            "CREATE TABLE {} (\n    {}\n);",
            self.fullname(),
            parts.join(",\n    ")
        )
    }

    /// `DROP TABLE` statement for this table
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {};", self.fullname())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::testing::assert_error_sqlstate;

    fn users() -> Table {
        Table::new("users")
            .with_column(Column::new("id", ColumnType::Integer).primary_key())
            .with_column(Column::new("name", ColumnType::varchar(100)).not_null())
    }

    #[test]
    fn test_fullname() {
        assert_eq!(users().fullname(), "users");
        assert_eq!(users().with_schema("app").fullname(), "app.users");
    }

    #[test]
    fn test_add_column_rejects_duplicates() {
        let mut table = users();
        assert!(table.add_column(Column::new("email", ColumnType::Text)).is_ok());
        assert_error_sqlstate(table.add_column(Column::new("email", ColumnType::Text)), "42701");
    }

    #[test]
    fn test_extend_columns_replaces_and_appends() {
        let mut table = users();
        table.extend_columns(vec![
            Column::new("name", ColumnType::Text),
            Column::new("age", ColumnType::Integer),
        ]);

        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "age"]);
        assert_eq!(table.column("name").map(|c| &c.column_type), Some(&ColumnType::Text));
    }

    #[test]
    fn test_create_sql() {
        assert_eq!(
            users().with_schema("app").create_sql(),
            "CREATE TABLE app.users (\n    id INTEGER NOT NULL,\n    name VARCHAR(100) NOT NULL,\n    PRIMARY KEY (id)\n);"
        );
        assert_eq!(users().drop_sql(), "DROP TABLE IF EXISTS users;");
    }
}
