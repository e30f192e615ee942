use thiserror::Error;

pub mod testing;

/// Main error type for audit DDL generation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuditError {
    // ============ Identifier Errors (42xxx) ============
    /// Identifier is empty, too long, or contains characters we refuse to embed
    #[error("Invalid identifier for '{parameter}' (value: '{value}'): {reason}")]
    InvalidIdentifier {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Two columns of the same table ended up with the same name
    #[error("Duplicate column '{column_name}' in {table}")]
    DuplicateColumn {
        column_name: String,
        table: String,
    },

    /// Derived audit table would land on a table it cannot share
    #[error("Table '{name}' already exists and is not a compatible audit table")]
    TableConflict {
        name: String,
    },

    /// Shared audit table declares one column with two different types
    #[error("Column '{column_name}' of {table} is already {existing}, cannot redeclare it as {requested}")]
    ColumnTypeConflict {
        table: String,
        column_name: String,
        existing: String,
        requested: String,
    },

    /// Table not registered in the metadata
    #[error("Table '{name}' not found in metadata")]
    TableNotFound {
        name: String,
    },

    /// Column type text could not be understood
    #[error("Unsupported column type '{type_name}': {reason}")]
    InvalidColumnType {
        type_name: String,
        reason: String,
    },

    // ============ Configuration Errors (F0xxx / 22xxx) ============
    /// Naming convention refers to a placeholder we cannot fill
    #[error("Naming convention '{key}' uses unknown placeholder '%({placeholder})s' in '{template}'")]
    UnknownNamingPlaceholder {
        key: String,
        template: String,
        placeholder: String,
    },

    /// Audit options are enabled but unusable
    #[error("Invalid audit options for table '{table}': {reason}")]
    InvalidAuditOptions {
        table: String,
        reason: String,
    },

    /// Configuration document error
    #[error("Configuration error for '{setting}': {reason} (value: {value})")]
    ConfigError {
        setting: String,
        value: String,
        reason: String,
    },

    // ============ I/O and System Errors (58xxx / XX000) ============
    /// Executor rejected a generated statement
    #[error("Executing DDL failed: {error}\nStatement: {}", truncate(.statement))]
    ExecutionFailed {
        statement: String,
        error: String,
    },

    /// Serialization/deserialization failed
    #[error("Serialization error: {message}")]
    SerializationError {
        message: String,
    },

    /// Reading a file failed
    #[error("I/O error on '{path}': {message}")]
    IoError {
        path: String,
        message: String,
    },

    /// Internal error (bug in the generator)
    #[error("Internal error at {file}:{line}: {message}\nPlease report this bug.")]
    InternalError {
        message: String,
        file: &'static str,
        line: u32,
    },
}

fn truncate(sql: &str) -> &str {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => &sql[..idx],
        None => sql,
    }
}

impl AuditError {
    /// Get PostgreSQL SQLSTATE code for this error
    pub fn sqlstate(&self) -> &'static str {
        use AuditError::*;
        match self {
            InvalidIdentifier { .. } => "42602", // Invalid name
            DuplicateColumn { .. } => "42701",   // Duplicate column
            TableConflict { .. } => "42P07",     // Duplicate table
            TableNotFound { .. } => "42P01",     // Undefined table
            ColumnTypeConflict { .. } => "42804", // Datatype mismatch
            InvalidColumnType { .. } => "42704", // Undefined object

            UnknownNamingPlaceholder { .. } => "22023", // Invalid parameter value
            InvalidAuditOptions { .. } => "22023",
            ConfigError { .. } => "F0000", // Config file error

            ExecutionFailed { .. } => "58000", // System error
            SerializationError { .. } => "22P02", // Invalid text representation
            IoError { .. } => "58030",      // I/O error
            InternalError { .. } => "XX000",
        }
    }

    /// Create internal error with file/line info
    pub fn internal(message: String, file: &'static str, line: u32) -> Self {
        AuditError::InternalError { message, file, line }
    }
}

/// Result type for audit DDL operations
pub type AuditResult<T> = Result<T, AuditError>;

/// Convert serde_json::Error to AuditError
impl From<serde_json::Error> for AuditError {
    fn from(e: serde_json::Error) -> Self {
        AuditError::SerializationError {
            message: format!("JSON error: {e}"),
        }
    }
}

/// Helper macro for creating internal errors with automatic file/line
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::error::AuditError::internal($msg.to_string(), file!(), line!())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::AuditError::internal(format!($fmt, $($arg)*), file!(), line!())
    };
}
