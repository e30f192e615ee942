//! Audit Table Derivation
//!
//! [`create_audit_table`] runs when a table is attached to a [`MetaData`] (see
//! [`install_listener`]). For a table whose audit options are enabled it:
//!
//! 1. resolves the audit table, function and trigger names,
//! 2. derives the audit table definition(s) and registers them,
//! 3. renders the procedure/trigger DDL and the matching drop DDL into the
//!    target's `TableInfo`.
//!
//! ## Layouts
//!
//! - **Shadow** (default): one `<table>_audit` table per target with the
//!   operation metadata, the session settings and a nullable copy of every
//!   target column.
//! - **Split**: a shared transaction table (operation metadata, session
//!   settings, audited table name) and a shared data table holding the row as
//!   JSON, each fed by its own trigger.

use tracing::{debug, info};

use crate::config::{
    AUDIT_DATA_COLUMN, AUDIT_NAME_LENGTH, AUDIT_OPERATION_COLUMN, AUDIT_TABLE_NAME_COLUMN,
    AUDIT_TIMESTAMP_COLUMN, AUDIT_USER_COLUMN, SESSION_SETTING_PREFIX,
};
use crate::ddl::{
    audit_spec, create_data_trigger_ddl, create_shadow_trigger_ddl, create_transaction_trigger_ddl,
    drop_trigger_ddl, AuditLayout, AuditSpec, TriggerNames,
};
use crate::error::{AuditError, AuditResult};
use crate::hooks::TableListener;
use crate::metadata::MetaData;
use crate::naming::AuditNames;
use crate::schema::{AuditTableKind, Column, ColumnType, Table};
use crate::validation::{validate_qualified_name, validate_sql_identifier};

/// Listener deriving audit tables and DDL for every attached table
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditListener;

impl TableListener for AuditListener {
    fn after_attach(&self, table: &str, metadata: &mut MetaData) -> AuditResult<()> {
        create_audit_table(table, metadata)
    }
}

/// Register [`AuditListener`] on `metadata`
pub fn install_listener(metadata: &mut MetaData) {
    metadata.listen(AuditListener);
}

/// Everything derived for one target, computed before the metadata is touched
struct Derived {
    tables: Vec<Table>,
    create_ddl: Vec<String>,
    drop_ddl: Vec<String>,
}

/// Derive audit tables and DDL for the registered table `target_name`.
///
/// Tables without enabled audit options are left untouched. On success the
/// target carries `is_audited`, `create_ddl` and `drop_ddl`; each derived
/// table carries `is_audit_table`, `audit_kind` and `target_table`.
pub fn create_audit_table(target_name: &str, metadata: &mut MetaData) -> AuditResult<()> {
    let target = metadata
        .table(target_name)
        .ok_or_else(|| AuditError::TableNotFound {
            name: target_name.to_string(),
        })?
        .clone();

    let spec = audit_spec(&target);
    if !spec.enabled {
        debug!(table = target_name, "auditing not enabled, skipping");
        return Ok(());
    }

    if target.columns().is_empty() {
        return Err(AuditError::InvalidAuditOptions {
            table: target_name.to_string(),
            reason: "audited table has no columns".to_string(),
        });
    }

    validate_qualified_name(target_name, "table_name")?;
    if let Some(schema) = &spec.schema {
        validate_sql_identifier(schema, "schema_name")?;
    }
    for column in target.columns() {
        validate_sql_identifier(&column.name, "column_name")?;
    }

    let names = AuditNames::resolve(metadata, &target.name, spec.schema.as_deref())?;
    let session_settings = session_setting_columns(&spec)?;

    let derived = match spec.layout {
        AuditLayout::Shadow => derive_shadow(&target, &spec, &names, &session_settings)?,
        AuditLayout::Split => derive_split(&target, &spec, &names, &session_settings)?,
    };

    for (idx, table) in derived.tables.iter().enumerate() {
        let fullname = table.fullname();
        if derived.tables[..idx].iter().any(|t| t.fullname() == fullname) {
            return Err(AuditError::TableConflict { name: fullname });
        }
        check_conflict(metadata, table, target_name)?;
    }

    for mut table in derived.tables {
        table.info.is_audit_table = true;
        table.info.target_table = Some(target_name.to_string());
        let audit_table = metadata.define_table(table);
        info!(
            table = target_name,
            audit_table = %audit_table.fullname(),
            "registered audit table"
        );
    }

    let target = metadata
        .table_mut(target_name)
        .ok_or_else(|| crate::internal_error!("target '{}' vanished during audit derivation", target_name))?;
    target.info.create_ddl = derived.create_ddl;
    target.info.drop_ddl = derived.drop_ddl;
    target.info.is_audited = true;

    info!(
        table = target_name,
        layout = ?spec.layout,
        procedures = target.info.create_ddl.len(),
        "generated audit trigger DDL"
    );

    Ok(())
}

/// Session-setting columns renamed with the `audit_` prefix
fn session_setting_columns(spec: &AuditSpec) -> AuditResult<Vec<Column>> {
    spec.session_settings
        .iter()
        .map(|setting| {
            validate_sql_identifier(&setting.name, "session_setting")?;
            let renamed = format!("{SESSION_SETTING_PREFIX}{}", setting.name);
            validate_sql_identifier(&renamed, "session_setting")?;
            Ok(setting.renamed(renamed))
        })
        .collect()
}

fn metadata_columns() -> [Column; 3] {
    [
        Column::new(AUDIT_OPERATION_COLUMN, ColumnType::varchar(1)).not_null(),
        Column::new(AUDIT_TIMESTAMP_COLUMN, ColumnType::timestamp()).not_null(),
        Column::new(AUDIT_USER_COLUMN, ColumnType::varchar(AUDIT_NAME_LENGTH)).not_null(),
    ]
}

fn new_audit_table(name: &str, spec: &AuditSpec, kind: AuditTableKind) -> Table {
    let mut table = Table::new(name);
    table.schema = spec.schema.clone();
    table.info.audit_kind = Some(kind);
    table
}

fn derive_shadow(
    target: &Table,
    spec: &AuditSpec,
    names: &AuditNames,
    session_settings: &[Column],
) -> AuditResult<Derived> {
    let mut shadow = new_audit_table(&names.table, spec, AuditTableKind::Shadow);
    let columns = metadata_columns()
        .into_iter()
        .chain(session_settings.iter().cloned())
        .chain(target.columns().iter().map(Column::audit_copy));
    for column in columns {
        shadow.add_column(column)?;
    }

    let table_full_name = target.fullname();
    let audit_table_full_name = shadow.fullname();
    let trigger_names = TriggerNames {
        function: &names.function,
        trigger: &names.trigger,
        table: &table_full_name,
        audit_table: &audit_table_full_name,
    };

    let create = create_shadow_trigger_ddl(
        trigger_names,
        target.columns(),
        shadow.columns(),
        session_settings,
    )?;
    let drop = drop_trigger_ddl(trigger_names);

    Ok(Derived {
        tables: vec![shadow],
        create_ddl: vec![create],
        drop_ddl: vec![drop],
    })
}

fn derive_split(
    target: &Table,
    spec: &AuditSpec,
    names: &AuditNames,
    session_settings: &[Column],
) -> AuditResult<Derived> {
    // Shared between targets with different settings, so setting columns are
    // nullable here; the procedure guard still enforces required settings.
    let mut transaction = new_audit_table(&names.transaction_table, spec, AuditTableKind::Transaction);
    let columns = std::iter::once(Column::new("id", ColumnType::Serial).primary_key())
        .chain(metadata_columns())
        .chain(session_settings.iter().map(Column::audit_copy))
        .chain(std::iter::once(
            Column::new(AUDIT_TABLE_NAME_COLUMN, ColumnType::varchar(AUDIT_NAME_LENGTH)).not_null(),
        ));
    for column in columns {
        transaction.add_column(column)?;
    }

    let data = new_audit_table(&names.data_table, spec, AuditTableKind::Data)
        .with_column(Column::new("id", ColumnType::Serial).primary_key())
        .with_column(Column::new(AUDIT_DATA_COLUMN, ColumnType::Json).not_null());

    let transaction_function = suffixed(&names.function, "_transaction")?;
    let transaction_trigger = suffixed(&names.trigger, "_transaction")?;
    let data_function = suffixed(&names.function, "_data")?;
    let data_trigger = suffixed(&names.trigger, "_data")?;

    let table_full_name = target.fullname();
    let transaction_full_name = transaction.fullname();
    let data_full_name = data.fullname();

    let transaction_names = TriggerNames {
        function: &transaction_function,
        trigger: &transaction_trigger,
        table: &table_full_name,
        audit_table: &transaction_full_name,
    };
    let data_names = TriggerNames {
        function: &data_function,
        trigger: &data_trigger,
        table: &table_full_name,
        audit_table: &data_full_name,
    };

    let create_ddl = vec![
        create_transaction_trigger_ddl(transaction_names, transaction.columns(), session_settings)?,
        create_data_trigger_ddl(data_names),
    ];
    let drop_ddl = vec![drop_trigger_ddl(transaction_names), drop_trigger_ddl(data_names)];

    Ok(Derived {
        tables: vec![transaction, data],
        create_ddl,
        drop_ddl,
    })
}

fn suffixed(name: &str, suffix: &str) -> AuditResult<String> {
    let name = format!("{name}{suffix}");
    validate_sql_identifier(&name, "audit_object")?;
    Ok(name)
}

/// A derived table may only land on an existing audit table of the same kind:
/// a shared one in the split layout, or the target's own shadow table.
/// Columns both declare must agree on type.
fn check_conflict(metadata: &MetaData, table: &Table, target_name: &str) -> AuditResult<()> {
    let Some(existing) = metadata.table(&table.fullname()) else {
        return Ok(());
    };

    let compatible = match (existing.info.audit_kind, table.info.audit_kind) {
        (Some(have), Some(want)) if have == want => {
            want.is_shared() || existing.info.target_table.as_deref() == Some(target_name)
        }
        _ => false,
    };
    if !compatible {
        return Err(AuditError::TableConflict {
            name: table.fullname(),
        });
    }

    for column in table.columns() {
        if let Some(current) = existing.column(&column.name) {
            if current.column_type != column.column_type {
                return Err(AuditError::ColumnTypeConflict {
                    table: table.fullname(),
                    column_name: column.name.clone(),
                    existing: current.column_type.compile(),
                    requested: column.column_type.compile(),
                });
            }
        }
    }

    Ok(())
}
