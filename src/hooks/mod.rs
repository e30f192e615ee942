//! Table Events: Listener Hooks on Table Registration
//!
//! A [`MetaData`] notifies its listeners after a table has been attached.
//! Listeners receive the full name of the new table and mutable access to the
//! registry, so they can derive and register further tables and write into the
//! new table's `TableInfo`.
//!
//! ```rust
//! use pg_audit_ddl::metadata::MetaData;
//! use pg_audit_ddl::schema::Table;
//!
//! let mut metadata = MetaData::new();
//! metadata.on_attach(|name, _| {
//!     println!("attached {name}");
//!     Ok(())
//! });
//! metadata.add_table(Table::new("users")).unwrap();
//! ```

use crate::error::AuditResult;
use crate::metadata::MetaData;

/// Receives table lifecycle events from a [`MetaData`]
pub trait TableListener: Send + Sync {
    /// Called once the table named `table` is registered in `metadata`
    fn after_attach(&self, table: &str, metadata: &mut MetaData) -> AuditResult<()>;
}

impl<F> TableListener for F
where
    F: Fn(&str, &mut MetaData) -> AuditResult<()> + Send + Sync,
{
    fn after_attach(&self, table: &str, metadata: &mut MetaData) -> AuditResult<()> {
        self(table, metadata)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::error::AuditError;
    use crate::error::testing::assert_error_contains;
    use crate::metadata::MetaData;
    use crate::schema::Table;

    #[test]
    fn test_listener_sees_every_attach() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);

        let mut metadata = MetaData::new();
        metadata.on_attach(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        metadata.add_table(Table::new("a")).unwrap();
        metadata.add_table(Table::new("b")).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_can_write_table_info() {
        let mut metadata = MetaData::new();
        metadata.on_attach(|name, md| {
            let table = md.table_mut(name).ok_or_else(|| AuditError::TableNotFound {
                name: name.to_string(),
            })?;
            table.info.is_audited = true;
            Ok(())
        });

        metadata.add_table(Table::new("users").with_schema("app")).unwrap();
        assert!(metadata.table("app.users").unwrap().info.is_audited);
    }

    #[test]
    fn test_failing_listener_detaches_table() {
        let mut metadata = MetaData::new();
        metadata.on_attach(|name, _| {
            Err(AuditError::InvalidAuditOptions {
                table: name.to_string(),
                reason: "rejected".to_string(),
            })
        });

        assert_error_contains(metadata.add_table(Table::new("users")), "rejected");
        assert!(metadata.table("users").is_none());
    }
}
