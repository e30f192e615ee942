//! Install / Uninstall Aggregation
//!
//! Collects the DDL generated for every audited table of a [`MetaData`], in
//! registration order. The host either takes the text or passes a
//! [`DdlExecutor`] that receives each script in turn.

use tracing::{debug, info};

use crate::error::AuditResult;
use crate::metadata::MetaData;

/// Receives generated DDL scripts, e.g. to run them on a connection the host
/// owns
pub trait DdlExecutor {
    fn execute(&mut self, sql: &str) -> AuditResult<()>;
}

/// Collects scripts in memory
impl DdlExecutor for Vec<String> {
    fn execute(&mut self, sql: &str) -> AuditResult<()> {
        self.push(sql.to_string());
        Ok(())
    }
}

/// `CREATE TABLE` statements for every derived audit table
pub fn create_audit_tables(metadata: &MetaData) -> String {
    metadata
        .audit_tables()
        .map(|t| t.create_sql())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `DROP TABLE` statements for every derived audit table
pub fn drop_audit_tables(metadata: &MetaData) -> String {
    metadata
        .audit_tables()
        .map(|t| t.drop_sql())
        .collect::<Vec<_>>()
        .join("\n")
}

/// All procedure/trigger creation DDL, one blank line between scripts
pub fn install_audit_triggers(metadata: &MetaData) -> String {
    let scripts: Vec<&str> = metadata
        .audited_tables()
        .flat_map(|t| t.info.create_ddl.iter().map(String::as_str))
        .collect();
    debug!(scripts = scripts.len(), "collected audit install DDL");
    scripts.join("\n\n")
}

/// All procedure/trigger removal DDL, one blank line between scripts
pub fn uninstall_audit_triggers(metadata: &MetaData) -> String {
    let scripts: Vec<&str> = metadata
        .audited_tables()
        .flat_map(|t| t.info.drop_ddl.iter().map(String::as_str))
        .collect();
    debug!(scripts = scripts.len(), "collected audit uninstall DDL");
    scripts.join("\n\n")
}

/// Hand every creation script to `executor`, stopping at the first error
pub fn install_audit_triggers_with(metadata: &MetaData, executor: &mut dyn DdlExecutor) -> AuditResult<usize> {
    run_scripts(metadata, executor, |t| &t.info.create_ddl, "installed")
}

/// Hand every removal script to `executor`, stopping at the first error
pub fn uninstall_audit_triggers_with(metadata: &MetaData, executor: &mut dyn DdlExecutor) -> AuditResult<usize> {
    run_scripts(metadata, executor, |t| &t.info.drop_ddl, "uninstalled")
}

fn run_scripts(
    metadata: &MetaData,
    executor: &mut dyn DdlExecutor,
    scripts: impl Fn(&crate::schema::Table) -> &Vec<String>,
    action: &str,
) -> AuditResult<usize> {
    let mut executed = 0;
    for table in metadata.audited_tables() {
        for sql in scripts(table) {
            executor.execute(sql)?;
            executed += 1;
        }
        info!(table = %table.fullname(), "{action} audit triggers");
    }
    Ok(executed)
}
