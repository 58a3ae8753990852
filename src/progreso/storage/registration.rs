//! Atomic account creation: user, device binding, and starting progress.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{is_unique_violation, progress};

/// Freshly created account fields echoed back to the client.
#[derive(Debug)]
pub(crate) struct NewUser {
    pub(crate) id: Uuid,
    pub(crate) username: String,
}

/// Outcome when attempting to create an account.
#[derive(Debug)]
pub(crate) enum RegisterOutcome {
    Created(NewUser),
    UsernameConflict,
    DeviceConflict,
}

/// Create the user, bind the device, and seed the default progress document.
///
/// All three writes share one transaction; a conflict on either unique
/// constraint rolls everything back so no partial account survives.
pub(crate) async fn create_account(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
    device_id: &str,
) -> Result<RegisterOutcome> {
    let mut tx = pool.begin().await.context("begin registration transaction")?;

    let query = r"
        INSERT INTO users (username, password_hash)
        VALUES ($1, $2)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let user_id: Uuid = match row {
        Ok(row) => row.get("id"),
        Err(err) => {
            if is_unique_violation(&err) {
                let _ = tx.rollback().await;
                return Ok(RegisterOutcome::UsernameConflict);
            }
            return Err(err).context("failed to insert user");
        }
    };

    let query = r"
        INSERT INTO device_registrations (device_id, user_id)
        VALUES ($1, $2)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let inserted = sqlx::query(query)
        .bind(device_id)
        .bind(user_id)
        .execute(&mut *tx)
        .instrument(span)
        .await;

    if let Err(err) = inserted {
        if is_unique_violation(&err) {
            let _ = tx.rollback().await;
            return Ok(RegisterOutcome::DeviceConflict);
        }
        return Err(err).context("failed to insert device registration");
    }

    progress::insert_default(&mut tx, user_id).await?;

    tx.commit().await.context("commit registration transaction")?;

    Ok(RegisterOutcome::Created(NewUser {
        id: user_id,
        username: username.to_string(),
    }))
}
