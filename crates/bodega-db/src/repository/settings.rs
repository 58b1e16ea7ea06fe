//! # Settings Repository
//!
//! Key/value configuration stored in the database. Values are plain
//! strings; boolean settings use "true"/"false".

use sqlx::SqliteConnection;

use crate::error::DbResult;

/// The setting that controls whether outbound documents may drive stock
/// below zero. Absent means allowed.
pub const ALLOW_NEGATIVE_STOCK: &str = "allow_negative_stock";

/// Gets a setting value.
pub async fn get(conn: &mut SqliteConnection, key: &str) -> DbResult<Option<String>> {
    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(conn)
            .await?;

    Ok(value)
}

/// Sets a setting value, overwriting any previous one.
pub async fn set(conn: &mut SqliteConnection, key: &str, value: &str) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(conn)
    .await?;

    Ok(())
}

/// Reads a boolean setting, with a default for missing keys.
pub async fn get_bool(
    conn: &mut SqliteConnection,
    key: &str,
    default: bool,
) -> DbResult<bool> {
    Ok(match get(conn, key).await?.as_deref() {
        Some("true") | Some("1") => true,
        Some(_) => false,
        None => default,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
