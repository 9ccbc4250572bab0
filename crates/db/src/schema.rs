use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // One slot per participant is enforced by the UNIQUE email column
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS timeslots (
            id BIGSERIAL PRIMARY KEY,
            email VARCHAR(320) NULL UNIQUE,
            start_time TIMESTAMP WITH TIME ZONE NOT NULL,
            end_time TIMESTAMP WITH TIME ZONE NOT NULL,
            CONSTRAINT valid_time_range CHECK (end_time > start_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_timeslots_start_time ON timeslots(start_time);")
        .execute(pool)
        .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
