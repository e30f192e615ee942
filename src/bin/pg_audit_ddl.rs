//! pg_audit_ddl CLI
//!
//! Reads a JSON schema document and prints audit DDL to stdout. Logs go to
//! stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use tracing::error;

use pg_audit_ddl::config::SchemaDocument;
use pg_audit_ddl::{
    create_audit_tables, drop_audit_tables, install_audit_triggers, uninstall_audit_triggers,
    AuditError, AuditResult, MetaData,
};

const LOG_ENV: &str = "PG_AUDIT_DDL_LOG";

/// Generate PostgreSQL audit tables, trigger procedures and triggers
#[derive(Debug, Parser)]
#[command(name = "pg_audit_ddl", version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print DDL creating audit tables and triggers
    Install(ScriptArgs),
    /// Print DDL removing audit triggers and tables
    Uninstall(ScriptArgs),
}

#[derive(Debug, Args)]
struct ScriptArgs {
    /// Schema document (JSON)
    #[arg(value_hint = ValueHint::FilePath)]
    schema: PathBuf,

    /// Only audit table statements
    #[arg(long, conflicts_with = "triggers_only")]
    tables_only: bool,

    /// Only trigger and procedure statements
    #[arg(long)]
    triggers_only: bool,
}

impl ScriptArgs {
    fn load(&self) -> AuditResult<MetaData> {
        SchemaDocument::from_path(&self.schema)?.into_metadata()
    }
}

/// Application exit codes
#[repr(u8)]
enum Exit {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    IoError = 3,
    ValidationError = 5,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

impl From<&AuditError> for Exit {
    fn from(err: &AuditError) -> Self {
        match err {
            AuditError::ConfigError { .. } | AuditError::SerializationError { .. } => Exit::ConfigError,
            AuditError::IoError { .. } => Exit::IoError,
            AuditError::InternalError { .. } | AuditError::ExecutionFailed { .. } => Exit::GeneralError,
            _ => Exit::ValidationError,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(sql) => {
            if !sql.is_empty() {
                println!("{sql}");
            }
            Exit::Success.into()
        }
        Err(e) => {
            error!(sqlstate = e.sqlstate(), "{e}");
            Exit::from(&e).into()
        }
    }
}

fn run(cli: &Cli) -> AuditResult<String> {
    let (args, tables, triggers) = match &cli.command {
        Command::Install(args) => {
            let metadata = args.load()?;
            (args, create_audit_tables(&metadata), install_audit_triggers(&metadata))
        }
        Command::Uninstall(args) => {
            let metadata = args.load()?;
            (args, drop_audit_tables(&metadata), uninstall_audit_triggers(&metadata))
        }
    };

    // Tables exist before triggers reference them and outlive them on removal.
    let parts = match (&cli.command, args.tables_only, args.triggers_only) {
        (_, true, _) => vec![tables],
        (_, _, true) => vec![triggers],
        (Command::Install(_), ..) => vec![tables, triggers],
        (Command::Uninstall(_), ..) => vec![triggers, tables],
    };

    Ok(parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n"))
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(verbose >= 2))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOCUMENT: &str = r#"{
        "tables": [
            {
                "name": "users",
                "columns": [{"name": "id", "type": "integer", "primary_key": true}],
                "audit": {"enabled": true}
            }
        ]
    }"#;

    fn document() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();
        file
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_install_orders_tables_first() {
        let file = document();
        let path = file.path().to_str().unwrap();
        let sql = run(&cli(&["pg_audit_ddl", "install", path])).unwrap();

        let table = sql.find("CREATE TABLE users_audit").unwrap();
        let trigger = sql.find("CREATE TRIGGER public_users_audit").unwrap();
        assert!(table < trigger);
    }

    #[test]
    fn test_uninstall_orders_triggers_first() {
        let file = document();
        let path = file.path().to_str().unwrap();
        let sql = run(&cli(&["pg_audit_ddl", "uninstall", path])).unwrap();

        assert!(sql.starts_with("DROP TRIGGER IF EXISTS public_users_audit ON users;"));
        assert!(sql.ends_with("DROP TABLE IF EXISTS users_audit;"));
    }

    #[test]
    fn test_filters() {
        let file = document();
        let path = file.path().to_str().unwrap();

        let tables = run(&cli(&["pg_audit_ddl", "install", path, "--tables-only"])).unwrap();
        assert!(!tables.contains("TRIGGER"));

        let triggers = run(&cli(&["pg_audit_ddl", "install", path, "--triggers-only"])).unwrap();
        assert!(!triggers.contains("CREATE TABLE"));

        assert!(Cli::try_parse_from(["pg_audit_ddl", "install", path, "--tables-only", "--triggers-only"]).is_err());
    }

    #[test]
    fn test_missing_file_exit_code() {
        let err = run(&cli(&["pg_audit_ddl", "install", "/nonexistent/schema.json"])).unwrap_err();
        assert!(matches!(Exit::from(&err), Exit::IoError));
    }
}
