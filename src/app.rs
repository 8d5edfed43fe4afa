//! Process-level wiring shared by the `bookshelf` and `bookshelf-cli` binaries.

use anyhow::Context;
use sqlx::PgPool;

use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{
    self,
    books::{seed, store::PgBookStore},
};

/// Registry holding every module this application ships.
pub fn build_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Connect, migrate when enabled, and initialize every module.
async fn bootstrap(settings: &Settings, registry: &ModuleRegistry) -> anyhow::Result<PgPool> {
    let pool = bookshelf_db::connect(&settings.database).await?;

    if settings.database.run_migrations {
        apply_migrations(&pool, registry).await?;
    } else {
        tracing::info!("automatic migrations disabled");
    }

    let ctx = InitCtx {
        settings,
        db: &pool,
    };
    registry.init_modules(&ctx).await?;

    Ok(pool)
}

async fn apply_migrations(pool: &PgPool, registry: &ModuleRegistry) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = bookshelf_db::run_migrations(pool, &migrations).await?;
    tracing::info!(applied, total = migrations.len(), "migrations up to date");
    Ok(applied)
}

/// Run the HTTP server until a shutdown signal, then stop every module.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %bookshelf_db::sanitize_connection_url(&settings.database.connection_url()),
        "bookshelf starting"
    );

    let registry = build_registry();
    let pool = bootstrap(settings, &registry).await?;

    let ctx = InitCtx {
        settings,
        db: &pool,
    };
    registry.start_modules(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, settings).await;

    registry.stop_modules().await?;
    pool.close().await;
    tracing::info!("bookshelf stopped");

    served
}

/// Apply pending migrations regardless of `database.run_migrations`.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let registry = build_registry();
    let pool = bookshelf_db::connect(&settings.database).await?;
    let applied = apply_migrations(&pool, &registry).await;
    pool.close().await;
    applied
}

/// Load the demo catalog, skipping books that are already active.
pub async fn seed(settings: &Settings) -> anyhow::Result<usize> {
    let registry = build_registry();
    let pool = bookshelf_db::connect(&settings.database).await?;
    apply_migrations(&pool, &registry).await?;

    let store = PgBookStore::new(pool.clone());
    let inserted = seed::seed_demo_books(&store)
        .await
        .context("failed to seed demo books")?;

    pool.close().await;
    Ok(inserted)
}

/// `(METHOD, path)` pairs of the mounted HTTP surface, sorted by path.
pub fn route_table(registry: &ModuleRegistry) -> Vec<(String, String)> {
    let openapi = bookshelf_http::router::merged_openapi(registry);
    let mut routes = Vec::new();

    if let Some(paths) = openapi["paths"].as_object() {
        for (path, item) in paths {
            let Some(operations) = item.as_object() else {
                continue;
            };
            for method in operations.keys() {
                routes.push((method.to_uppercase(), path.clone()));
            }
        }
    }

    routes.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    routes
}
