//! Device registration checks.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::Instrument;

/// Whether a device identifier is already bound to an account.
pub(crate) async fn is_registered(pool: &PgPool, device_id: &str) -> Result<bool> {
    let query = "SELECT 1 FROM device_registrations WHERE device_id = $1 LIMIT 1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(device_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check device registration")?;

    Ok(row.is_some())
}
