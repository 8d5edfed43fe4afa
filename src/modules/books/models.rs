use chrono::{DateTime, NaiveDate, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// Actor recorded when a request does not name one.
pub const DEFAULT_ACTOR: &str = "system";

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 500;

/// A catalogued book.
///
/// `deleted_at` and `deleted_by` are set and cleared together; a book with
/// both unset is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Store-assigned identifier
    pub id: i64,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Creation instant, set by the store
    pub created_at: DateTime<Utc>,
    /// Who created the record
    pub created_by: String,
    /// Soft-delete instant, `None` while active
    pub deleted_at: Option<DateTime<Utc>>,
    /// Who soft-deleted the record
    pub deleted_by: Option<String>,
}

impl Book {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Request model for creating a new book.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateBook {
    #[garde(length(chars, min = 1, max = 255))]
    pub title: String,
    #[garde(length(chars, min = 1, max = 255))]
    pub author: String,
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 255))]
    pub created_by: Option<String>,
}

impl CreateBook {
    pub fn created_by(&self) -> &str {
        self.created_by.as_deref().unwrap_or(DEFAULT_ACTOR)
    }
}

/// Partial update; only the fields present are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateBook {
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 255))]
    pub title: Option<String>,
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 255))]
    pub author: Option<String>,
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 255))]
    pub created_by: Option<String>,
}

impl UpdateBook {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.created_by.is_none()
    }
}

/// Filter over the catalog, by title substring and creation day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub q: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub include_deleted: bool,
}

/// Filter over soft-deleted books, by title substring and deletion day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrashFilter {
    pub q: Option<String>,
    pub deleted_from: Option<NaiveDate>,
    pub deleted_to: Option<NaiveDate>,
}

/// Offset pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Response body of the count endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Total {
    pub total: i64,
}

/// Query string of `GET /books` and `GET /books/count`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListBooksQuery {
    #[garde(skip)]
    pub q: Option<String>,
    #[garde(skip)]
    pub created_from: Option<NaiveDate>,
    #[garde(skip)]
    pub created_to: Option<NaiveDate>,
    #[serde(default)]
    #[garde(skip)]
    pub include_deleted: bool,
    #[garde(range(min = 1, max = 500))]
    pub limit: Option<i64>,
    #[garde(range(min = 0))]
    pub offset: Option<i64>,
}

impl ListBooksQuery {
    pub fn filter(&self) -> BookFilter {
        BookFilter {
            q: self.q.clone(),
            created_from: self.created_from,
            created_to: self.created_to,
            include_deleted: self.include_deleted,
        }
    }

    pub fn page(&self) -> Page {
        page(self.limit, self.offset)
    }
}

/// Query string of `GET /books/trash` and `GET /books/trash/count`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TrashQuery {
    #[garde(skip)]
    pub q: Option<String>,
    #[garde(skip)]
    pub deleted_from: Option<NaiveDate>,
    #[garde(skip)]
    pub deleted_to: Option<NaiveDate>,
    #[garde(range(min = 1, max = 500))]
    pub limit: Option<i64>,
    #[garde(range(min = 0))]
    pub offset: Option<i64>,
}

impl TrashQuery {
    pub fn filter(&self) -> TrashFilter {
        TrashFilter {
            q: self.q.clone(),
            deleted_from: self.deleted_from,
            deleted_to: self.deleted_to,
        }
    }

    pub fn page(&self) -> Page {
        page(self.limit, self.offset)
    }
}

fn page(limit: Option<i64>, offset: Option<i64>) -> Page {
    Page {
        limit: limit.unwrap_or(DEFAULT_LIMIT),
        offset: offset.unwrap_or(0),
    }
}

/// Path of the single-book endpoints.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct BookPath {
    #[garde(range(min = 1))]
    pub id: i64,
}

/// Query string of `GET /books/{id}`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GetBookQuery {
    #[serde(default)]
    pub include_deleted: bool,
}

/// Query string of `DELETE /books/{id}`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DeleteBookQuery {
    #[garde(length(chars, min = 1, max = 255))]
    pub deleted_by: Option<String>,
}

impl DeleteBookQuery {
    pub fn deleted_by(&self) -> &str {
        self.deleted_by.as_deref().unwrap_or(DEFAULT_ACTOR)
    }
}
