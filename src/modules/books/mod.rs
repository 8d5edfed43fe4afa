pub mod models;
mod openapi;
pub mod routes;
pub mod seed;
pub mod store;

#[cfg(test)]
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use once_cell::sync::OnceCell;

use crate::utils;
use store::{BookStore, PgBookStore};

const CREATE_BOOK: &str = r#"
CREATE TABLE IF NOT EXISTS book (
    id          BIGSERIAL PRIMARY KEY,
    title       VARCHAR(255) NOT NULL CHECK (title <> ''),
    author      VARCHAR(255) NOT NULL CHECK (author <> ''),
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    created_by  VARCHAR(255) NOT NULL DEFAULT 'system',
    deleted_at  TIMESTAMPTZ NULL,
    deleted_by  VARCHAR(255) NULL,
    CONSTRAINT ck_book_deleted_pair
        CHECK ((deleted_at IS NULL) = (deleted_by IS NULL))
);

CREATE INDEX IF NOT EXISTS ix_book_created_at ON book (created_at);
CREATE INDEX IF NOT EXISTS ix_book_deleted_at ON book (deleted_at);
CREATE INDEX IF NOT EXISTS ix_book_title ON book (title);
CREATE INDEX IF NOT EXISTS ix_book_title_lower ON book (lower(title));
CREATE UNIQUE INDEX IF NOT EXISTS ux_book_title_author_active
    ON book (lower(title), lower(author))
    WHERE deleted_at IS NULL;
"#;

/// Book catalog with soft delete, trash and restore.
///
/// The store is bound during `init` from the shared pool, or up front with
/// [`BooksModule::with_store`].
pub struct BooksModule {
    store: OnceCell<Arc<dyn BookStore>>,
}

impl BooksModule {
    pub fn new() -> Self {
        Self {
            store: OnceCell::new(),
        }
    }

    pub fn with_store(store: Arc<dyn BookStore>) -> Self {
        Self {
            store: OnceCell::with_value(store),
        }
    }

    pub fn store(&self) -> Option<&Arc<dyn BookStore>> {
        self.store.get()
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let prefix = utils::log_prefix(self.name());
        if self.store.get().is_some() {
            tracing::debug!(%prefix, "store already bound");
            return Ok(());
        }

        let store: Arc<dyn BookStore> = Arc::new(PgBookStore::new(ctx.db.clone()));
        // A concurrent init may have won; either store serves the same pool
        let _ = self.store.set(store);

        tracing::info!(
            %prefix,
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        match self.store.get() {
            Some(store) => routes::router(store.clone()),
            None => {
                tracing::warn!(
                    module = self.name(),
                    "routes requested before init, mounting nothing"
                );
                Router::new()
            }
        }
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi::document())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_book",
            up: CREATE_BOOK,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use bookshelf_kernel::settings::Settings;
    use memory::MemoryBookStore;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    #[tokio::test]
    async fn routes_are_empty_until_a_store_is_bound() {
        let module = BooksModule::new();
        let response = module
            .routes()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn init_binds_postgres_store_once() {
        let settings = Settings::default();
        let pool = PgPoolOptions::new()
            .connect_lazy(&settings.database.connection_url())
            .unwrap();
        let ctx = InitCtx {
            settings: &settings,
            db: &pool,
        };

        let module = BooksModule::new();
        module.init(&ctx).await.unwrap();
        assert!(module.store().is_some());
        module.init(&ctx).await.unwrap();
    }

    #[tokio::test]
    async fn with_store_serves_routes_without_init() {
        let module = BooksModule::with_store(Arc::new(MemoryBookStore::default()));
        let response = module
            .routes()
            .oneshot(Request::get("/count").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn migration_creates_active_pair_index() {
        let migrations = BooksModule::new().migrations();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].id, "001_create_book");
        assert!(migrations[0].up.contains(store::ACTIVE_PAIR_INDEX));
        assert!(migrations[0].up.contains("WHERE deleted_at IS NULL"));
    }
}
