use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{AuditError, AuditResult};
use crate::hooks::TableListener;
use crate::schema::Table;

/// Registry of table definitions plus naming conventions
///
/// Tables are kept in registration order, which is also the order the
/// install/uninstall DDL is emitted in.
#[derive(Default)]
pub struct MetaData {
    /// Naming convention templates keyed by element (`audit.table`, ...)
    pub naming_convention: BTreeMap<String, String>,
    tables: Vec<Table>,
    listeners: Vec<Arc<dyn TableListener>>,
}

impl fmt::Debug for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaData")
            .field("naming_convention", &self.naming_convention)
            .field("tables", &self.tables)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_naming_convention(
        mut self,
        key: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.naming_convention.insert(key.into(), template.into());
        self
    }

    /// Register a listener notified after every [`MetaData::add_table`]
    pub fn listen(&mut self, listener: impl TableListener + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    /// Closure form of [`MetaData::listen`]
    pub fn on_attach<F>(&mut self, listener: F)
    where
        F: Fn(&str, &mut MetaData) -> AuditResult<()> + Send + Sync + 'static,
    {
        self.listen(listener);
    }

    /// Attach a new table and fire the attach event.
    ///
    /// A table whose full name is already registered is rejected. If a listener
    /// fails, every table is restored to its state before the call, undoing
    /// whatever earlier listeners registered, and the error is returned.
    pub fn add_table(&mut self, table: Table) -> AuditResult<()> {
        let fullname = table.fullname();
        if self.table(&fullname).is_some() {
            return Err(AuditError::TableConflict { name: fullname });
        }

        debug!(table = %fullname, "attaching table");
        let snapshot = self.tables.clone();
        self.tables.push(table);

        let listeners = self.listeners.clone();
        for listener in listeners {
            if let Err(e) = listener.after_attach(&fullname, self) {
                debug!(table = %fullname, error = %e, "listener failed, restoring tables");
                self.tables = snapshot;
                return Err(e);
            }
        }

        Ok(())
    }

    /// Register a table without firing events, merging columns into an
    /// existing definition of the same full name.
    pub fn define_table(&mut self, table: Table) -> &mut Table {
        let fullname = table.fullname();
        match self.tables.iter().position(|t| t.fullname() == fullname) {
            Some(idx) => {
                let existing = &mut self.tables[idx];
                existing.extend_columns(table.columns().iter().cloned());
                existing.info.is_audit_table |= table.info.is_audit_table;
                if table.info.audit_kind.is_some() {
                    existing.info.audit_kind = table.info.audit_kind;
                }
                if table.info.target_table.is_some() {
                    existing.info.target_table = table.info.target_table;
                }
                existing
            }
            None => {
                self.tables.push(table);
                let last = self.tables.len() - 1;
                &mut self.tables[last]
            }
        }
    }

    pub fn table(&self, fullname: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.fullname() == fullname)
    }

    pub fn table_mut(&mut self, fullname: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.fullname() == fullname)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Tables whose audit DDL has been generated
    pub fn audited_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter().filter(|t| t.info.is_audited)
    }

    /// Tables derived by the audit generator
    pub fn audit_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter().filter(|t| t.info.is_audit_table)
    }
}
