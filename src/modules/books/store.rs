//! Data access for the `book` table.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use thiserror::Error;

use super::models::{Book, BookFilter, CreateBook, Page, TrashFilter, UpdateBook};
use crate::utils;

/// Partial unique index enforcing one active book per lowered title/author.
pub const ACTIVE_PAIR_INDEX: &str = "ux_book_title_author_active";

const BOOK_COLUMNS: &str = "id, title, author, created_at, created_by, deleted_at, deleted_by";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing, or in the wrong lifecycle state for the operation
    #[error("book {id} not found")]
    NotFound { id: i64 },

    /// An active book with the same title and author exists
    #[error("an active book with this title and author already exists")]
    Duplicate { title: String, author: String },

    /// Hard delete requested for a book that is not in the trash
    #[error("book {id} must be in trash before hard delete")]
    StillActive { id: i64 },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Operations over the book catalog.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list(&self, filter: &BookFilter, page: Page) -> StoreResult<Vec<Book>>;

    async fn count(&self, filter: &BookFilter) -> StoreResult<i64>;

    async fn list_trash(&self, filter: &TrashFilter, page: Page) -> StoreResult<Vec<Book>>;

    async fn count_trash(&self, filter: &TrashFilter) -> StoreResult<i64>;

    /// Soft-deleted books are only returned with `include_deleted`.
    async fn get(&self, id: i64, include_deleted: bool) -> StoreResult<Book>;

    async fn create(&self, book: &CreateBook) -> StoreResult<Book>;

    /// Applies the present fields of `changes` to an active book.
    async fn update(&self, id: i64, changes: &UpdateBook) -> StoreResult<Book>;

    async fn soft_delete(&self, id: i64, deleted_by: &str) -> StoreResult<()>;

    /// Fails as not found when the book is absent, active, or its
    /// title/author pair belongs to another active book.
    async fn restore(&self, id: i64) -> StoreResult<Book>;

    /// Permanently removes a soft-deleted book.
    async fn hard_delete(&self, id: i64) -> StoreResult<()>;
}

/// PostgreSQL-backed [`BookStore`].
#[derive(Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn list(&self, filter: &BookFilter, page: Page) -> StoreResult<Vec<Book>> {
        let mut qb = select_books(filter);
        qb.push(" ORDER BY created_at DESC, id DESC");
        push_page(&mut qb, page);

        Ok(qb.build_query_as::<Book>().fetch_all(&self.pool).await?)
    }

    async fn count(&self, filter: &BookFilter) -> StoreResult<i64> {
        let mut qb = QueryBuilder::new("SELECT count(*) FROM book");
        push_book_conditions(&mut qb, filter);

        Ok(qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?)
    }

    async fn list_trash(&self, filter: &TrashFilter, page: Page) -> StoreResult<Vec<Book>> {
        let mut qb = select_trash(filter);
        qb.push(" ORDER BY deleted_at DESC, id DESC");
        push_page(&mut qb, page);

        Ok(qb.build_query_as::<Book>().fetch_all(&self.pool).await?)
    }

    async fn count_trash(&self, filter: &TrashFilter) -> StoreResult<i64> {
        let mut qb = QueryBuilder::new("SELECT count(*) FROM book");
        push_trash_conditions(&mut qb, filter);

        Ok(qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?)
    }

    async fn get(&self, id: i64, include_deleted: bool) -> StoreResult<Book> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM book WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match book {
            Some(book) if include_deleted || book.is_active() => Ok(book),
            _ => Err(StoreError::NotFound { id }),
        }
    }

    async fn create(&self, book: &CreateBook) -> StoreResult<Book> {
        // The partial unique index turns the duplicate check and the insert
        // into one atomic statement.
        let created = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO book (title, author, created_by) VALUES ($1, $2, $3) \
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.created_by())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_or(e, &book.title, &book.author))?;

        tracing::info!(book_id = created.id, "book created");
        Ok(created)
    }

    async fn update(&self, id: i64, changes: &UpdateBook) -> StoreResult<Book> {
        if changes.is_empty() {
            return self.get(id, false).await;
        }

        let mut tx = self.pool.begin().await?;
        let current = lock_book(&mut tx, id)
            .await?
            .filter(Book::is_active)
            .ok_or(StoreError::NotFound { id })?;

        let updated = sqlx::query_as::<_, Book>(&format!(
            "UPDATE book SET \
                 title = COALESCE($2, title), \
                 author = COALESCE($3, author), \
                 created_by = COALESCE($4, created_by) \
             WHERE id = $1 \
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.author.as_deref())
        .bind(changes.created_by.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            duplicate_or(
                e,
                changes.title.as_deref().unwrap_or(&current.title),
                changes.author.as_deref().unwrap_or(&current.author),
            )
        })?;
        tx.commit().await?;

        tracing::info!(book_id = id, "book updated");
        Ok(updated)
    }

    async fn soft_delete(&self, id: i64, deleted_by: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE book SET deleted_at = now(), deleted_by = $2 \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(deleted_by)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { id });
        }

        tracing::info!(book_id = id, %deleted_by, "book moved to trash");
        Ok(())
    }

    async fn restore(&self, id: i64) -> StoreResult<Book> {
        let mut tx = self.pool.begin().await?;
        let trashed = lock_book(&mut tx, id)
            .await?
            .filter(|book| !book.is_active())
            .ok_or(StoreError::NotFound { id })?;

        let restored = sqlx::query_as::<_, Book>(&format!(
            "UPDATE book SET deleted_at = NULL, deleted_by = NULL \
             WHERE id = $1 \
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_active_pair_violation(&e) {
                tracing::debug!(book_id = id, title = %trashed.title, "pair is active again, cannot restore");
                StoreError::NotFound { id }
            } else {
                StoreError::Database(e)
            }
        })?;
        tx.commit().await?;

        tracing::info!(book_id = id, "book restored");
        Ok(restored)
    }

    async fn hard_delete(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        match lock_book(&mut tx, id).await? {
            None => return Err(StoreError::NotFound { id }),
            Some(book) if book.is_active() => return Err(StoreError::StillActive { id }),
            Some(_) => {}
        }

        sqlx::query("DELETE FROM book WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(book_id = id, "book permanently deleted");
        Ok(())
    }
}

/// Fetch a row and hold its lock until `tx` ends.
///
/// Dropping `tx` without committing, as every early return does, rolls it back.
async fn lock_book(tx: &mut Transaction<'_, Postgres>, id: i64) -> StoreResult<Option<Book>> {
    let book = sqlx::query_as::<_, Book>(&format!(
        "SELECT {BOOK_COLUMNS} FROM book WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(book)
}

fn is_active_pair_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation() && db.constraint() == Some(ACTIVE_PAIR_INDEX))
        .unwrap_or(false)
}

/// Map a violation of [`ACTIVE_PAIR_INDEX`] to [`StoreError::Duplicate`].
fn duplicate_or(err: sqlx::Error, title: &str, author: &str) -> StoreError {
    if is_active_pair_violation(&err) {
        StoreError::Duplicate {
            title: title.to_string(),
            author: author.to_string(),
        }
    } else {
        StoreError::Database(err)
    }
}

fn select_books(filter: &BookFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {BOOK_COLUMNS} FROM book"));
    push_book_conditions(&mut qb, filter);
    qb
}

fn select_trash(filter: &TrashFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {BOOK_COLUMNS} FROM book"));
    push_trash_conditions(&mut qb, filter);
    qb
}

/// Appends `WHERE`/`AND` conjunctions to a query builder.
struct Conditions<'q, 'args> {
    qb: &'q mut QueryBuilder<'args, Postgres>,
    empty: bool,
}

impl<'q, 'args> Conditions<'q, 'args> {
    fn new(qb: &'q mut QueryBuilder<'args, Postgres>) -> Self {
        Self { qb, empty: true }
    }

    fn next(&mut self) -> &mut QueryBuilder<'args, Postgres> {
        self.qb.push(if self.empty { " WHERE " } else { " AND " });
        self.empty = false;
        &mut *self.qb
    }

    fn title_contains(&mut self, q: Option<&str>) {
        if let Some(pattern) = q.and_then(utils::contains_pattern) {
            self.next()
                .push("lower(title) LIKE lower(")
                .push_bind(pattern)
                .push(")");
        }
    }

    fn within_days(
        &mut self,
        column: &str,
        from: Option<chrono::NaiveDate>,
        to: Option<chrono::NaiveDate>,
    ) {
        let (start, end) = utils::day_bounds(from, to);
        if let Some(start) = start {
            self.next().push(column).push(" >= ").push_bind(start);
        }
        if let Some(end) = end {
            self.next().push(column).push(" < ").push_bind(end);
        }
    }
}

fn push_book_conditions(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    let mut conditions = Conditions::new(qb);
    if !filter.include_deleted {
        conditions.next().push("deleted_at IS NULL");
    }
    conditions.title_contains(filter.q.as_deref());
    conditions.within_days("created_at", filter.created_from, filter.created_to);
}

fn push_trash_conditions(qb: &mut QueryBuilder<'_, Postgres>, filter: &TrashFilter) {
    let mut conditions = Conditions::new(qb);
    conditions.next().push("deleted_at IS NOT NULL");
    conditions.title_contains(filter.q.as_deref());
    conditions.within_days("deleted_at", filter.deleted_from, filter.deleted_to);
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Page) {
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
}
