//! HTTP handlers for the books module, mounted under `/api/books`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, put},
    Router,
};
use bookshelf_http::{ApiJson, ApiPath, ApiQuery, AppError};
use garde::Validate;
use serde_json::json;

use super::models::{
    Book, BookPath, CreateBook, DeleteBookQuery, GetBookQuery, ListBooksQuery, Total, TrashQuery,
    UpdateBook,
};
use super::store::{BookStore, StoreError};

type Store = Arc<dyn BookStore>;

/// Router over `store`; paths are relative to the module root.
pub fn router(store: Store) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/count", get(count_books))
        .route("/trash", get(list_trash))
        .route("/trash/count", get(count_trash))
        .route(
            "/{id}",
            get(get_book)
                .put(update_book)
                .patch(update_book)
                .delete(soft_delete_book),
        )
        .route("/{id}/restore", put(restore_book))
        .route("/{id}/hard_delete", delete(hard_delete_book))
        .with_state(store)
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::not_found("Book not found"),
            StoreError::Duplicate { title, author } => AppError::conflict(
                vec![json!({ "title": title, "author": author })],
                "An active book with this title and author already exists",
            ),
            StoreError::StillActive { id } => AppError::conflict(
                vec![json!({ "id": id })],
                "Book must be soft-deleted before hard delete",
            ),
            err @ StoreError::Database(_) => AppError::Internal(err.into()),
        }
    }
}

#[tracing::instrument(skip(store))]
async fn list_books(
    State(store): State<Store>,
    ApiQuery(query): ApiQuery<ListBooksQuery>,
) -> Result<ApiJson<Vec<Book>>, AppError> {
    query.validate()?;
    let books = store.list(&query.filter(), query.page()).await?;
    Ok(ApiJson(books))
}

#[tracing::instrument(skip(store))]
async fn count_books(
    State(store): State<Store>,
    ApiQuery(query): ApiQuery<ListBooksQuery>,
) -> Result<ApiJson<Total>, AppError> {
    query.validate()?;
    let total = store.count(&query.filter()).await?;
    Ok(ApiJson(Total { total }))
}

#[tracing::instrument(skip(store))]
async fn list_trash(
    State(store): State<Store>,
    ApiQuery(query): ApiQuery<TrashQuery>,
) -> Result<ApiJson<Vec<Book>>, AppError> {
    query.validate()?;
    let books = store.list_trash(&query.filter(), query.page()).await?;
    Ok(ApiJson(books))
}

#[tracing::instrument(skip(store))]
async fn count_trash(
    State(store): State<Store>,
    ApiQuery(query): ApiQuery<TrashQuery>,
) -> Result<ApiJson<Total>, AppError> {
    query.validate()?;
    let total = store.count_trash(&query.filter()).await?;
    Ok(ApiJson(Total { total }))
}

#[tracing::instrument(skip(store))]
async fn get_book(
    State(store): State<Store>,
    ApiPath(path): ApiPath<BookPath>,
    ApiQuery(query): ApiQuery<GetBookQuery>,
) -> Result<ApiJson<Book>, AppError> {
    path.validate()?;
    let book = store.get(path.id, query.include_deleted).await?;
    Ok(ApiJson(book))
}

#[tracing::instrument(skip(store))]
async fn create_book(
    State(store): State<Store>,
    ApiJson(payload): ApiJson<CreateBook>,
) -> Result<(StatusCode, ApiJson<Book>), AppError> {
    payload.validate()?;
    let book = store.create(&payload).await?;
    Ok((StatusCode::CREATED, ApiJson(book)))
}

#[tracing::instrument(skip(store))]
async fn update_book(
    State(store): State<Store>,
    ApiPath(path): ApiPath<BookPath>,
    ApiJson(changes): ApiJson<UpdateBook>,
) -> Result<ApiJson<Book>, AppError> {
    path.validate()?;
    changes.validate()?;
    let book = store.update(path.id, &changes).await?;
    Ok(ApiJson(book))
}

#[tracing::instrument(skip(store))]
async fn soft_delete_book(
    State(store): State<Store>,
    ApiPath(path): ApiPath<BookPath>,
    ApiQuery(query): ApiQuery<DeleteBookQuery>,
) -> Result<StatusCode, AppError> {
    path.validate()?;
    query.validate()?;
    store.soft_delete(path.id, query.deleted_by()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(store))]
async fn restore_book(
    State(store): State<Store>,
    ApiPath(path): ApiPath<BookPath>,
) -> Result<ApiJson<Book>, AppError> {
    path.validate()?;
    let book = store.restore(path.id).await?;
    Ok(ApiJson(book))
}

#[tracing::instrument(skip(store))]
async fn hard_delete_book(
    State(store): State<Store>,
    ApiPath(path): ApiPath<BookPath>,
) -> Result<StatusCode, AppError> {
    path.validate()?;
    store.hard_delete(path.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
