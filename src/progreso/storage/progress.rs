//! Progress document storage.
//!
//! Each user owns exactly one JSON document, replaced wholesale on save.

use anyhow::{Context, Result};
use serde_json::json;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

/// Starting document for accounts with no saved progress yet.
pub(crate) fn default_progress() -> serde_json::Value {
    json!({
        "settings": { "theme": "light" },
        "lectures": {},
    })
}

/// Seed the default document inside the registration transaction.
pub(crate) async fn insert_default(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
) -> Result<()> {
    let data_text =
        serde_json::to_string(&default_progress()).context("failed to serialize progress")?;

    let query = r"
        INSERT INTO progress (user_id, data)
        VALUES ($1, $2::jsonb)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(data_text)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to insert default progress")?;
    Ok(())
}

/// Fetch the user's document, creating the default one on first access.
///
/// Accounts created before progress rows existed (or rows lost to manual
/// cleanup) are healed here instead of surfacing a 404.
pub(crate) async fn get_or_init(pool: &PgPool, user_id: Uuid) -> Result<serde_json::Value> {
    if let Some(data) = fetch(pool, user_id).await? {
        return Ok(data);
    }

    // First access: seed the default document. ON CONFLICT keeps this safe
    // against a concurrent request initializing the same row.
    let data_text =
        serde_json::to_string(&default_progress()).context("failed to serialize progress")?;
    let query = r"
        INSERT INTO progress (user_id, data)
        VALUES ($1, $2::jsonb)
        ON CONFLICT (user_id) DO NOTHING
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(data_text)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to initialize progress")?;

    match fetch(pool, user_id).await? {
        Some(data) => Ok(data),
        None => Ok(default_progress()),
    }
}

/// Replace the user's document.
pub(crate) async fn upsert(pool: &PgPool, user_id: Uuid, data: &serde_json::Value) -> Result<()> {
    let data_text = serde_json::to_string(data).context("failed to serialize progress")?;

    let query = r"
        INSERT INTO progress (user_id, data, updated_at)
        VALUES ($1, $2::jsonb, NOW())
        ON CONFLICT (user_id) DO UPDATE
        SET data = EXCLUDED.data, updated_at = NOW()
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(data_text)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to save progress")?;
    Ok(())
}

async fn fetch(pool: &PgPool, user_id: Uuid) -> Result<Option<serde_json::Value>> {
    let query = "SELECT data::text AS data FROM progress WHERE user_id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch progress")?;

    row.map(|row| {
        let data: String = row.get("data");
        serde_json::from_str(&data).context("failed to parse stored progress")
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::default_progress;

    #[test]
    fn default_progress_shape() {
        let data = default_progress();
        assert_eq!(data["settings"]["theme"], "light");
        assert!(data["lectures"].as_object().is_some_and(|map| map.is_empty()));
    }
}
