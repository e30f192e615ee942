use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

static VARCHAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:VARCHAR|CHARACTER VARYING)(?:\s*\(\s*(\d+)\s*\))?$")
        .unwrap_or_else(|e| panic!("invalid VARCHAR pattern: {e}"))
});

static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:NUMERIC|DECIMAL)(?:\s*\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\))?$")
        .unwrap_or_else(|e| panic!("invalid NUMERIC pattern: {e}"))
});

// Passed through verbatim after `::` and into CREATE TABLE: a dotted name, one
// numeric modifier list and array brackets, nothing else.
static CUSTOM_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*(?:\s*\(\s*\d+\s*(?:,\s*\d+\s*)?\))?(?:\[\d*\])*$",
    )
    .unwrap_or_else(|e| panic!("invalid custom type pattern: {e}"))
});

/// PostgreSQL column type as used in audit tables and session-setting casts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    SmallInt,
    Integer,
    BigInt,
    /// `SERIAL`: INTEGER backed by a sequence
    Serial,
    /// `BIGSERIAL`: BIGINT backed by a sequence
    BigSerial,
    Boolean,
    Varchar(Option<u32>),
    Text,
    Timestamp { with_time_zone: bool },
    Date,
    Uuid,
    Json,
    Jsonb,
    Numeric { precision: Option<u32>, scale: Option<u32> },
    Real,
    DoublePrecision,
    /// Any other type name, emitted as written
    Custom(String),
}

impl ColumnType {
    /// `VARCHAR(n)`
    pub fn varchar(length: u32) -> Self {
        ColumnType::Varchar(Some(length))
    }

    /// `TIMESTAMP WITHOUT TIME ZONE`
    pub fn timestamp() -> Self {
        ColumnType::Timestamp { with_time_zone: false }
    }

    /// Type of a column holding copies of this one's values; serial types lose
    /// their sequence.
    pub fn storage_type(&self) -> Self {
        match self {
            ColumnType::Serial => ColumnType::Integer,
            ColumnType::BigSerial => ColumnType::BigInt,
            other => other.clone(),
        }
    }

    /// Render the type the way PostgreSQL DDL spells it
    pub fn compile(&self) -> String {
        match self {
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Serial => "SERIAL".to_string(),
            ColumnType::BigSerial => "BIGSERIAL".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Varchar(Some(len)) => format!("VARCHAR({len})"),
            ColumnType::Varchar(None) => "VARCHAR".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Timestamp { with_time_zone: false } => {
                "TIMESTAMP WITHOUT TIME ZONE".to_string()
            }
            ColumnType::Timestamp { with_time_zone: true } => "TIMESTAMP WITH TIME ZONE".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Jsonb => "JSONB".to_string(),
            ColumnType::Numeric { precision: Some(p), scale: Some(s) } => format!("NUMERIC({p}, {s})"),
            ColumnType::Numeric { precision: Some(p), scale: None } => format!("NUMERIC({p})"),
            ColumnType::Numeric { .. } => "NUMERIC".to_string(),
            ColumnType::Real => "REAL".to_string(),
            ColumnType::DoublePrecision => "DOUBLE PRECISION".to_string(),
            ColumnType::Custom(name) => name.clone(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compile())
    }
}

impl FromStr for ColumnType {
    type Err = AuditError;

    fn from_str(s: &str) -> AuditResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AuditError::InvalidColumnType {
                type_name: s.to_string(),
                reason: "type name cannot be empty".to_string(),
            });
        }

        let normalized = trimmed
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();

        let simple = match normalized.as_str() {
            "SMALLINT" | "INT2" => Some(ColumnType::SmallInt),
            "INTEGER" | "INT" | "INT4" => Some(ColumnType::Integer),
            "BIGINT" | "INT8" => Some(ColumnType::BigInt),
            "SERIAL" | "SERIAL4" => Some(ColumnType::Serial),
            "BIGSERIAL" | "SERIAL8" => Some(ColumnType::BigSerial),
            "BOOLEAN" | "BOOL" => Some(ColumnType::Boolean),
            "TEXT" => Some(ColumnType::Text),
            "TIMESTAMP" | "TIMESTAMP WITHOUT TIME ZONE" => Some(ColumnType::timestamp()),
            "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => {
                Some(ColumnType::Timestamp { with_time_zone: true })
            }
            "DATE" => Some(ColumnType::Date),
            "UUID" => Some(ColumnType::Uuid),
            "JSON" => Some(ColumnType::Json),
            "JSONB" => Some(ColumnType::Jsonb),
            "REAL" | "FLOAT4" => Some(ColumnType::Real),
            "DOUBLE PRECISION" | "FLOAT8" => Some(ColumnType::DoublePrecision),
            _ => None,
        };
        if let Some(ty) = simple {
            return Ok(ty);
        }

        if let Some(caps) = VARCHAR_RE.captures(&normalized) {
            let length = caps.get(1).map(|m| parse_modifier(s, m.as_str())).transpose()?;
            return Ok(ColumnType::Varchar(length));
        }

        if let Some(caps) = NUMERIC_RE.captures(&normalized) {
            let precision = caps.get(1).map(|m| parse_modifier(s, m.as_str())).transpose()?;
            let scale = caps.get(2).map(|m| parse_modifier(s, m.as_str())).transpose()?;
            return Ok(ColumnType::Numeric { precision, scale });
        }

        if CUSTOM_TYPE_RE.is_match(trimmed) {
            return Ok(ColumnType::Custom(trimmed.to_string()));
        }

        Err(AuditError::InvalidColumnType {
            type_name: s.to_string(),
            reason: "expected a (schema-qualified) type name with an optional numeric modifier and array brackets"
                .to_string(),
        })
    }
}

fn parse_modifier(type_name: &str, digits: &str) -> AuditResult<u32> {
    digits.parse::<u32>().map_err(|e| AuditError::InvalidColumnType {
        type_name: type_name.to_string(),
        reason: format!("invalid type modifier '{digits}': {e}"),
    })
}

impl TryFrom<String> for ColumnType {
    type Error = AuditError;

    fn try_from(value: String) -> AuditResult<Self> {
        value.parse()
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.compile()
    }
}
