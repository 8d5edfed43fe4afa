//! PostgreSQL pool factory and module migration runner.

use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use bookshelf_kernel::{settings::DatabaseSettings, Migration};

const LEDGER_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_migrations (
        module      TEXT        NOT NULL,
        id          TEXT        NOT NULL,
        applied_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (module, id)
    )
"#;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Create the connection pool, retrying with exponential backoff.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    let url = settings.connection_url();
    let base_delay = Duration::from_secs(settings.retry_delay_secs);
    let mut attempt = 0;

    loop {
        match try_connect(settings, &url).await {
            Ok(pool) => {
                tracing::info!(
                    target: "bookshelf-db",
                    url = %sanitize_connection_url(&url),
                    max = settings.max_connections,
                    min = settings.min_connections,
                    attempts = attempt + 1,
                    "database pool ready"
                );
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > settings.max_retries {
                    let message = format!(
                        "failed to connect to database at '{}' after {} attempts ({})",
                        sanitize_connection_url(&url),
                        attempt,
                        categorize(&e)
                    );
                    return Err(e).context(message);
                }

                let delay = backoff_delay(base_delay, attempt);
                tracing::warn!(
                    target: "bookshelf-db",
                    attempt,
                    error = %e,
                    "database connection failed, retrying in {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// `base * 2^(attempt - 1)`, capped at [`MAX_RETRY_DELAY`].
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2_u32
        .checked_pow(attempt.saturating_sub(1))
        .unwrap_or(u32::MAX);
    base.checked_mul(factor)
        .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
}

async fn try_connect(settings: &DatabaseSettings, url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect(url)
        .await
}

/// Mask the password of a connection URL for logging.
pub fn sanitize_connection_url(url: &str) -> String {
    let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.rfind('@')) else {
        return url.to_string();
    };
    let credentials_start = scheme_end + 3;
    if at_pos < credentials_start {
        return url.to_string();
    }

    match url[credentials_start..at_pos].find(':') {
        Some(colon) => format!(
            "{}:***{}",
            &url[..credentials_start + colon],
            &url[at_pos..]
        ),
        None => url.to_string(),
    }
}

fn categorize(err: &sqlx::Error) -> &'static str {
    match err {
        sqlx::Error::Configuration(_) => "configuration error",
        sqlx::Error::Io(_) => "network I/O error",
        sqlx::Error::Tls(_) => "TLS error",
        sqlx::Error::PoolTimedOut => "pool timed out",
        sqlx::Error::Database(_) => "database rejected the connection",
        _ => "connection error",
    }
}

/// Apply pending module migrations, recording each in `schema_migrations`.
///
/// Returns the number of migrations applied by this call.
pub async fn run_migrations(
    pool: &PgPool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::raw_sql(LEDGER_TABLE_SQL)
        .execute(pool)
        .await
        .context("failed to create migration ledger")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let mut tx = pool.begin().await.context("failed to open transaction")?;

        // Concurrent runners queue here until this transaction ends.
        sqlx::query("LOCK TABLE schema_migrations IN EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .context("failed to lock migration ledger")?;

        let already_applied: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM schema_migrations WHERE module = $1 AND id = $2")
                .bind(module)
                .bind(migration.id)
                .fetch_optional(&mut *tx)
                .await
                .with_context(|| {
                    format!("failed to read ledger for {}/{}", module, migration.id)
                })?;

        if already_applied.is_some() {
            tracing::debug!(
                target: "bookshelf-db",
                %module,
                id = migration.id,
                "migration already applied"
            );
            continue;
        }

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;

        sqlx::query("INSERT INTO schema_migrations (module, id) VALUES ($1, $2)")
            .bind(module)
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to record {}/{}", module, migration.id))?;

        tx.commit()
            .await
            .with_context(|| format!("failed to commit {}/{}", module, migration.id))?;

        tracing::info!(target: "bookshelf-db", %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}
