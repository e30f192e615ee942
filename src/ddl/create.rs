use tracing::debug;

use super::templates::{make_audit_procedure, AuditProcedure};
use crate::config::{
    AUDIT_DATA_COLUMN, AUDIT_OPERATION_COLUMN, AUDIT_TABLE_NAME_COLUMN, AUDIT_TIMESTAMP_COLUMN,
    AUDIT_USER_COLUMN, SESSION_SETTING_PREFIX, SETTINGS_NAMESPACE,
};
use crate::error::{AuditError, AuditResult};
use crate::schema::Column;
use crate::validation::validate_sql_identifier;

/// Names shared by one trigger function/trigger pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerNames<'a> {
    pub function: &'a str,
    pub trigger: &'a str,
    /// Full name of the audited table
    pub table: &'a str,
    /// Full name of the table rows are written to
    pub audit_table: &'a str,
}

/// Per-operation value lists of an audit INSERT
#[derive(Debug, Default)]
struct Elements {
    deletion: Vec<String>,
    updation: Vec<String>,
    insertion: Vec<String>,
}

impl Elements {
    fn push_all(&mut self, expr: impl Into<String>) {
        let expr = expr.into();
        self.deletion.push(expr.clone());
        self.updation.push(expr.clone());
        self.insertion.push(expr);
    }

    fn push(&mut self, deletion: String, updation: String, insertion: String) {
        self.deletion.push(deletion);
        self.updation.push(updation);
        self.insertion.push(insertion);
    }
}

/// Expression reading a session setting, and the guard for non-nullable ones.
///
/// The setting name is the column name without the `audit_` prefix. A
/// committed setting reads back as `''` rather than failing, hence the guard.
fn session_setting_element(setting: &Column) -> AuditResult<(String, Option<String>)> {
    let name = setting
        .name
        .strip_prefix(SESSION_SETTING_PREFIX)
        .unwrap_or(&setting.name);
    validate_sql_identifier(name, "session_setting")?;

    let missing_ok = if setting.nullable { "true" } else { "false" };
    let expr = format!(
        "current_setting('{SETTINGS_NAMESPACE}.{name}', {missing_ok})::{}",
        setting.column_type.compile()
    );

    let check = (!setting.nullable).then(|| {
        format!(
            "IF {expr}::VARCHAR = '' THEN RAISE EXCEPTION \
             '{SETTINGS_NAMESPACE}.{name} session setting must be set to a non null/empty value'; \
             END IF;"
        )
    });

    Ok((expr, check))
}

/// Build column/element lists for an audit table whose columns are drawn from
/// operation metadata, session settings, the audited row, and optionally the
/// name of the audited table. Primary keys of the audit table are skipped.
fn build_audit_procedure(
    names: TriggerNames<'_>,
    target_columns: &[Column],
    audit_columns: &[Column],
    session_settings: &[Column],
    record_table_name: bool,
) -> AuditResult<String> {
    let mut columns = Vec::new();
    let mut elements = Elements::default();
    let mut checks = Vec::new();

    for col in audit_columns {
        if col.primary_key {
            continue;
        }

        if let Some(setting) = session_settings.iter().find(|s| s.name == col.name) {
            let (expr, check) = session_setting_element(setting)?;
            elements.push_all(expr);
            checks.extend(check);
        } else if target_columns.iter().any(|t| t.name == col.name) {
            elements.push(
                format!("OLD.{}", col.name),
                format!("NEW.{}", col.name),
                format!("NEW.{}", col.name),
            );
        } else {
            match col.name.as_str() {
                AUDIT_OPERATION_COLUMN => elements.push(
                    "'D'".to_string(),
                    "'U'".to_string(),
                    "'I'".to_string(),
                ),
                AUDIT_TIMESTAMP_COLUMN => elements.push_all("now()"),
                AUDIT_USER_COLUMN => elements.push_all("current_user"),
                AUDIT_TABLE_NAME_COLUMN if record_table_name => elements.push_all("TG_TABLE_NAME"),
                other => {
                    return Err(AuditError::InvalidAuditOptions {
                        table: names.audit_table.to_string(),
                        reason: format!("no value source for audit column '{other}'"),
                    });
                }
            }
        }

        columns.push(col.name.clone());
    }

    debug!(
        function = names.function,
        columns = columns.len(),
        checks = checks.len(),
        "rendering audit procedure"
    );

    Ok(make_audit_procedure(&AuditProcedure {
        procedure_name: names.function,
        trigger_name: names.trigger,
        table_full_name: names.table,
        audit_table_full_name: names.audit_table,
        audit_columns: &columns,
        deletion_elements: &elements.deletion,
        updation_elements: &elements.updation,
        insertion_elements: &elements.insertion,
        check_settings: &checks,
    }))
}

/// Procedure and trigger copying full row versions into a shadow table.
///
/// `audit_columns` are the shadow table's columns; `session_settings` the
/// renamed (`audit_<name>`) session-setting columns among them.
pub fn create_shadow_trigger_ddl(
    names: TriggerNames<'_>,
    target_columns: &[Column],
    audit_columns: &[Column],
    session_settings: &[Column],
) -> AuditResult<String> {
    build_audit_procedure(names, target_columns, audit_columns, session_settings, false)
}

/// Procedure and trigger recording operation metadata, session settings and
/// the audited table's name into the shared transaction table.
pub fn create_transaction_trigger_ddl(
    names: TriggerNames<'_>,
    audit_columns: &[Column],
    session_settings: &[Column],
) -> AuditResult<String> {
    build_audit_procedure(names, &[], audit_columns, session_settings, true)
}

/// Procedure and trigger storing the affected row as JSON in the shared data
/// table.
pub fn create_data_trigger_ddl(names: TriggerNames<'_>) -> String {
    let columns = vec![AUDIT_DATA_COLUMN.to_string()];
    let deletion = vec!["to_json(OLD)".to_string()];
    let modification = vec!["to_json(NEW)".to_string()];

    make_audit_procedure(&AuditProcedure {
        procedure_name: names.function,
        trigger_name: names.trigger,
        table_full_name: names.table,
        audit_table_full_name: names.audit_table,
        audit_columns: &columns,
        deletion_elements: &deletion,
        updation_elements: &modification,
        insertion_elements: &modification,
        check_settings: &[],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AUDIT_NAME_LENGTH;
    use crate::error::testing::{assert_error_contains, assert_error_sqlstate};
    use crate::schema::ColumnType;

    const NAMES: TriggerNames<'static> = TriggerNames {
        function: "public_users_audit",
        trigger: "public_users_audit",
        table: "users",
        audit_table: "users_audit",
    };

    fn metadata_columns() -> Vec<Column> {
        vec![
            Column::new(AUDIT_OPERATION_COLUMN, ColumnType::varchar(1)).not_null(),
            Column::new(AUDIT_TIMESTAMP_COLUMN, ColumnType::timestamp()).not_null(),
            Column::new(AUDIT_USER_COLUMN, ColumnType::varchar(AUDIT_NAME_LENGTH)).not_null(),
        ]
    }

    fn target_columns() -> Vec<Column> {
        vec![
            Column::new("id", ColumnType::Integer).primary_key(),
            Column::new("name", ColumnType::Text),
        ]
    }

    #[test]
    fn test_shadow_without_settings() {
        let target = target_columns();
        let mut audit = metadata_columns();
        audit.extend(target.iter().map(Column::audit_copy));

        let sql = create_shadow_trigger_ddl(NAMES, &target, &audit, &[]).unwrap();

        assert!(sql.contains(
            "INSERT INTO users_audit (audit_operation, audit_operation_timestamp, audit_current_user, id, name) \
             SELECT 'D', now(), current_user, OLD.id, OLD.name;"
        ));
        assert!(sql.contains("SELECT 'U', now(), current_user, NEW.id, NEW.name;"));
        assert!(sql.contains("SELECT 'I', now(), current_user, NEW.id, NEW.name;"));
        assert!(!sql.contains("RAISE EXCEPTION"));
        assert!(sql.contains("AFTER INSERT OR UPDATE OR DELETE ON users"));
    }

    #[test]
    fn test_shadow_with_session_settings() {
        let target = target_columns();
        let settings = vec![
            Column::new("audit_username", ColumnType::varchar(64)).not_null(),
            Column::new("audit_request_id", ColumnType::Uuid),
        ];
        let mut audit = metadata_columns();
        audit.extend(settings.iter().cloned());
        audit.extend(target.iter().map(Column::audit_copy));

        let sql = create_shadow_trigger_ddl(NAMES, &target, &audit, &settings).unwrap();

        let username = "current_setting('audit.username', false)::VARCHAR(64)";
        let request_id = "current_setting('audit.request_id', true)::UUID";
        assert!(sql.contains(&format!(
            "SELECT 'D', now(), current_user, {username}, {request_id}, OLD.id, OLD.name;"
        )));
        assert!(sql.contains(&format!(
            "IF {username}::VARCHAR = '' THEN RAISE EXCEPTION \
             'audit.username session setting must be set to a non null/empty value'; END IF;"
        )));
        assert!(!sql.contains("audit.request_id session setting must be set"));
    }

    #[test]
    fn test_transaction_procedure_records_table_name() {
        let settings = vec![Column::new("audit_username", ColumnType::varchar(64)).not_null()];
        let mut audit = vec![Column::new("id", ColumnType::Integer).primary_key()];
        audit.extend(metadata_columns());
        audit.extend(settings.iter().cloned());
        audit.push(Column::new(AUDIT_TABLE_NAME_COLUMN, ColumnType::varchar(64)).not_null());

        let names = TriggerNames {
            audit_table: "audit_transaction_table",
            ..NAMES
        };
        let sql = create_transaction_trigger_ddl(names, &audit, &settings).unwrap();

        assert!(sql.contains(
            "INSERT INTO audit_transaction_table \
             (audit_operation, audit_operation_timestamp, audit_current_user, audit_username, table_name) \
             SELECT 'I', now(), current_user, current_setting('audit.username', false)::VARCHAR(64), TG_TABLE_NAME;"
        ));
    }

    #[test]
    fn test_data_procedure_stores_json() {
        let names = TriggerNames {
            audit_table: "audit_data_table",
            ..NAMES
        };
        let sql = create_data_trigger_ddl(names);

        assert!(sql.contains("INSERT INTO audit_data_table (data) SELECT to_json(OLD);"));
        assert!(sql.contains("INSERT INTO audit_data_table (data) SELECT to_json(NEW);"));
    }

    #[test]
    fn test_unknown_audit_column_is_rejected() {
        let audit = vec![Column::new("mystery", ColumnType::Text)];
        assert_error_contains(
            create_shadow_trigger_ddl(NAMES, &target_columns(), &audit, &[]),
            "mystery",
        );

        // table_name only has a source in the transaction layout
        let audit = vec![Column::new(AUDIT_TABLE_NAME_COLUMN, ColumnType::Text)];
        assert_error_sqlstate(create_shadow_trigger_ddl(NAMES, &[], &audit, &[]), "22023");
    }

    #[test]
    fn test_invalid_setting_name_is_rejected() {
        let settings = vec![Column::new("audit_bad name", ColumnType::Text)];
        assert_error_sqlstate(
            create_shadow_trigger_ddl(NAMES, &[], &settings, &settings),
            "42602",
        );
    }
}
