//! Extra utilties for use elsewhere in the API.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use time::OffsetDateTime;

pub fn current_time() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub async fn connect_to_db(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("Failed to connect to the database")
}
