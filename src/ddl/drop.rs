use super::create::TriggerNames;
use super::templates::make_drop_audit_procedure;

/// Statements removing the trigger on the audited table and its function.
///
/// Both statements use `IF EXISTS`, so running them twice is harmless.
pub fn drop_trigger_ddl(names: TriggerNames<'_>) -> String {
    make_drop_audit_procedure(names.function, names.trigger, names.table)
}
