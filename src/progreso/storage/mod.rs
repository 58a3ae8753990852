//! Database helpers for accounts, devices, and progress documents.
//!
//! Uniqueness guarantees (one account per username, one account per device)
//! live in database constraints; these helpers translate constraint violations
//! into outcome enums the handlers can match on.

pub(crate) mod devices;
pub(crate) mod progress;
pub(crate) mod registration;
pub(crate) mod users;

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
