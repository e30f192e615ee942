//! Assertion helpers for audit errors and generated SQL

#![cfg(test)]

use std::fmt::Debug;

use super::{AuditError, AuditResult};

fn expect_error<T: Debug>(result: AuditResult<T>, expecting: &str) -> AuditError {
    match result {
        Err(e) => e,
        Ok(v) => panic!("expected {expecting}, got Ok({v:?})"),
    }
}

/// Assert that `result` failed with the given SQLSTATE
pub fn assert_error_sqlstate<T: Debug>(result: AuditResult<T>, sqlstate: &str) {
    let err = expect_error(result, &format!("SQLSTATE {sqlstate}"));
    assert_eq!(err.sqlstate(), sqlstate, "unexpected error: {err}");
}

/// Assert that `result` failed with a message mentioning `needle`
pub fn assert_error_contains<T: Debug>(result: AuditResult<T>, needle: &str) {
    let err = expect_error(result, &format!("an error mentioning '{needle}'"));
    let message = err.to_string();
    assert!(message.contains(needle), "'{needle}' not found in: {message}");
}

/// Assert that `sql` contains every fragment, in the given order
pub fn assert_sql_in_order(sql: &str, fragments: &[&str]) {
    let mut rest = sql;
    for fragment in fragments {
        match rest.find(fragment) {
            Some(pos) => rest = &rest[pos + fragment.len()..],
            None => panic!("'{fragment}' missing or out of order in:\n{sql}"),
        }
    }
}
