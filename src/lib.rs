//! pg_audit_ddl: audit tables, trigger procedures and triggers for PostgreSQL
//!
//! Tables are registered in a [`MetaData`] registry. When a table carrying
//! enabled [`AuditOptions`] is attached, the audit listener derives its audit
//! storage and records the DDL needed to install and remove the audit trigger.
//!
//! ## Architecture
//!
//! - **schema / metadata**: table model and the registry that fires attach events
//! - **hooks**: the [`hooks::TableListener`] seam
//! - **audit**: the listener deriving audit tables (shadow or split layout)
//! - **naming**: naming-convention rendering for derived objects
//! - **ddl**: procedure and trigger SQL generation
//! - **install**: aggregation across every audited table
//! - **config**: constants and the JSON schema document
//!
//! ## Example
//!
//! ```
//! use pg_audit_ddl::{install_audit_triggers, AuditOptions, Column, ColumnType, MetaData, Table};
//!
//! let mut metadata = MetaData::new();
//! pg_audit_ddl::audit::install_listener(&mut metadata);
//!
//! metadata.add_table(
//!     Table::new("users")
//!         .with_column(Column::new("id", ColumnType::Serial).primary_key())
//!         .with_column(Column::new("email", ColumnType::Text))
//!         .with_audit(AuditOptions::enabled()),
//! )?;
//!
//! let sql = install_audit_triggers(&metadata);
//! assert!(sql.contains("CREATE TRIGGER public_users_audit"));
//! # Ok::<(), pg_audit_ddl::AuditError>(())
//! ```

pub mod audit;
pub mod config;
pub mod ddl;
pub mod error;
pub mod hooks;
pub mod install;
pub mod metadata;
pub mod naming;
pub mod schema;
pub mod validation;

pub use ddl::{AuditLayout, AuditOptions};
pub use error::{AuditError, AuditResult};
pub use install::{
    create_audit_tables, drop_audit_tables, install_audit_triggers, install_audit_triggers_with,
    uninstall_audit_triggers, uninstall_audit_triggers_with, DdlExecutor,
};
pub use metadata::MetaData;
pub use schema::{Column, ColumnType, Table};

/// Crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
