//! SQL templates for audit procedures and triggers

/// Inputs of [`make_audit_procedure`]
///
/// `audit_columns` and each of the element lists must line up one to one.
#[derive(Debug, Clone, Copy)]
pub struct AuditProcedure<'a> {
    pub procedure_name: &'a str,
    pub trigger_name: &'a str,
    pub table_full_name: &'a str,
    pub audit_table_full_name: &'a str,
    pub audit_columns: &'a [String],
    pub deletion_elements: &'a [String],
    pub updation_elements: &'a [String],
    pub insertion_elements: &'a [String],
    pub check_settings: &'a [String],
}

/// Render the trigger function and the (re)creation of its trigger
pub fn make_audit_procedure(p: &AuditProcedure<'_>) -> String {
    let function = p.procedure_name;
    let trigger = p.trigger_name;
    let table = p.table_full_name;
    let audit_table = p.audit_table_full_name;
    let columns = p.audit_columns.join(", ");
    let deletion = p.deletion_elements.join(", ");
    let updation = p.updation_elements.join(", ");
    let insertion = p.insertion_elements.join(", ");
    let checks: String = p
        .check_settings
        .iter()
        .map(|check| format!("        {check}\n"))
        .collect();

    format!(
        "CREATE OR REPLACE FUNCTION {function}() RETURNS TRIGGER AS ${function}$
    BEGIN
{checks}        IF (TG_OP = 'DELETE') THEN
            INSERT INTO {audit_table} ({columns}) SELECT {deletion};
        ELSIF (TG_OP = 'UPDATE') THEN
            INSERT INTO {audit_table} ({columns}) SELECT {updation};
        ELSIF (TG_OP = 'INSERT') THEN
            INSERT INTO {audit_table} ({columns}) SELECT {insertion};
        END IF;
        RETURN NULL;
    END;
${function}$ LANGUAGE plpgsql;

DROP TRIGGER IF EXISTS {trigger} ON {table};

CREATE TRIGGER {trigger}
    AFTER INSERT OR UPDATE OR DELETE ON {table}
    FOR EACH ROW EXECUTE PROCEDURE {function}();"
    )
}

/// Render removal of a trigger and its function
pub fn make_drop_audit_procedure(procedure_name: &str, trigger_name: &str, table_full_name: &str) -> String {
    format!(
        "DROP TRIGGER IF EXISTS {trigger_name} ON {table_full_name};\n\
         DROP FUNCTION IF EXISTS {procedure_name}();"
    )
}
