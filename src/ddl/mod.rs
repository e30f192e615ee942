//! DDL Generation: Audit Procedures and Triggers
//!
//! This module turns table-level audit configuration into SQL text:
//! - **spec**: effective audit settings derived from `AuditOptions`
//! - **create**: trigger function + trigger DDL for each audit layout
//! - **drop**: removal DDL
//! - **templates**: the SQL text itself
//!
//! ## Generated Procedure
//!
//! Every procedure is an `AFTER INSERT OR UPDATE OR DELETE ... FOR EACH ROW`
//! trigger function that inserts one audit row per change:
//!
//! ```sql
//! CREATE OR REPLACE FUNCTION public_users_audit() RETURNS TRIGGER AS $public_users_audit$
//!     BEGIN
//!         IF (TG_OP = 'DELETE') THEN
//!             INSERT INTO users_audit (audit_operation, ..., id) SELECT 'D', ..., OLD.id;
//!         ...
//!         END IF;
//!         RETURN NULL;
//!     END;
//! $public_users_audit$ LANGUAGE plpgsql;
//! ```

pub mod create;
pub mod drop;
pub mod spec;
pub mod templates;

pub use create::{
    create_data_trigger_ddl, create_shadow_trigger_ddl, create_transaction_trigger_ddl, TriggerNames,
};
pub use drop::drop_trigger_ddl;
pub use spec::{audit_spec, AuditLayout, AuditOptions, AuditSpec};
