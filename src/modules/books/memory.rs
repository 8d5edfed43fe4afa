//! In-memory [`BookStore`] for exercising handlers without Postgres.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{Book, BookFilter, CreateBook, Page, TrashFilter, UpdateBook};
use super::store::{BookStore, StoreError, StoreResult};
use crate::utils;

#[derive(Default)]
pub struct MemoryBookStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    books: BTreeMap<i64, Book>,
}

impl Inner {
    fn active_pair_taken(&self, title: &str, author: &str, except: Option<i64>) -> bool {
        self.books.values().any(|book| {
            book.is_active()
                && Some(book.id) != except
                && book.title.to_lowercase() == title.to_lowercase()
                && book.author.to_lowercase() == author.to_lowercase()
        })
    }
}

impl MemoryBookStore {
    /// Insert an active book with a fixed creation instant.
    pub fn insert_at(&self, title: &str, author: &str, created_at: DateTime<Utc>) -> Book {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let book = Book {
            id: inner.next_id,
            title: title.to_string(),
            author: author.to_string(),
            created_at,
            created_by: "system".to_string(),
            deleted_at: None,
            deleted_by: None,
        };
        inner.books.insert(book.id, book.clone());
        book
    }

    fn matching<F>(&self, keep: F) -> Vec<Book>
    where
        F: Fn(&Book) -> bool,
    {
        let inner = self.inner.lock().unwrap();
        inner.books.values().filter(|b| keep(b)).cloned().collect()
    }
}

fn title_contains(book: &Book, q: Option<&str>) -> bool {
    match q {
        Some(q) if !q.is_empty() => book.title.to_lowercase().contains(&q.to_lowercase()),
        _ => true,
    }
}

fn within_days(
    at: DateTime<Utc>,
    from: Option<chrono::NaiveDate>,
    to: Option<chrono::NaiveDate>,
) -> bool {
    let (start, end) = utils::day_bounds(from, to);
    start.map_or(true, |start| at >= start) && end.map_or(true, |end| at < end)
}

fn book_matches(book: &Book, filter: &BookFilter) -> bool {
    (filter.include_deleted || book.is_active())
        && title_contains(book, filter.q.as_deref())
        && within_days(book.created_at, filter.created_from, filter.created_to)
}

fn trash_matches(book: &Book, filter: &TrashFilter) -> bool {
    match book.deleted_at {
        Some(deleted_at) => {
            title_contains(book, filter.q.as_deref())
                && within_days(deleted_at, filter.deleted_from, filter.deleted_to)
        }
        None => false,
    }
}

fn paginate(books: Vec<Book>, page: Page) -> Vec<Book> {
    books
        .into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn list(&self, filter: &BookFilter, page: Page) -> StoreResult<Vec<Book>> {
        let mut books = self.matching(|b| book_matches(b, filter));
        books.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(paginate(books, page))
    }

    async fn count(&self, filter: &BookFilter) -> StoreResult<i64> {
        Ok(self.matching(|b| book_matches(b, filter)).len() as i64)
    }

    async fn list_trash(&self, filter: &TrashFilter, page: Page) -> StoreResult<Vec<Book>> {
        let mut books = self.matching(|b| trash_matches(b, filter));
        books.sort_by(|a, b| (b.deleted_at, b.id).cmp(&(a.deleted_at, a.id)));
        Ok(paginate(books, page))
    }

    async fn count_trash(&self, filter: &TrashFilter) -> StoreResult<i64> {
        Ok(self.matching(|b| trash_matches(b, filter)).len() as i64)
    }

    async fn get(&self, id: i64, include_deleted: bool) -> StoreResult<Book> {
        let inner = self.inner.lock().unwrap();
        match inner.books.get(&id) {
            Some(book) if include_deleted || book.is_active() => Ok(book.clone()),
            _ => Err(StoreError::NotFound { id }),
        }
    }

    async fn create(&self, book: &CreateBook) -> StoreResult<Book> {
        let mut inner = self.inner.lock().unwrap();
        if inner.active_pair_taken(&book.title, &book.author, None) {
            return Err(StoreError::Duplicate {
                title: book.title.clone(),
                author: book.author.clone(),
            });
        }

        inner.next_id += 1;
        let created = Book {
            id: inner.next_id,
            title: book.title.clone(),
            author: book.author.clone(),
            created_at: Utc::now(),
            created_by: book.created_by().to_string(),
            deleted_at: None,
            deleted_by: None,
        };
        inner.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, changes: &UpdateBook) -> StoreResult<Book> {
        let mut inner = self.inner.lock().unwrap();
        let current = match inner.books.get(&id) {
            Some(book) if book.is_active() => book.clone(),
            _ => return Err(StoreError::NotFound { id }),
        };

        let title = changes.title.clone().unwrap_or(current.title.clone());
        let author = changes.author.clone().unwrap_or(current.author.clone());
        if inner.active_pair_taken(&title, &author, Some(id)) {
            return Err(StoreError::Duplicate { title, author });
        }

        let updated = Book {
            title,
            author,
            created_by: changes
                .created_by
                .clone()
                .unwrap_or(current.created_by.clone()),
            ..current
        };
        inner.books.insert(id, updated.clone());
        Ok(updated)
    }

    async fn soft_delete(&self, id: i64, deleted_by: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.books.get_mut(&id) {
            Some(book) if book.is_active() => {
                book.deleted_at = Some(Utc::now());
                book.deleted_by = Some(deleted_by.to_string());
                Ok(())
            }
            _ => Err(StoreError::NotFound { id }),
        }
    }

    async fn restore(&self, id: i64) -> StoreResult<Book> {
        let mut inner = self.inner.lock().unwrap();
        let trashed = match inner.books.get(&id) {
            Some(book) if !book.is_active() => book.clone(),
            _ => return Err(StoreError::NotFound { id }),
        };

        if inner.active_pair_taken(&trashed.title, &trashed.author, Some(id)) {
            return Err(StoreError::NotFound { id });
        }

        let restored = Book {
            deleted_at: None,
            deleted_by: None,
            ..trashed
        };
        inner.books.insert(id, restored.clone());
        Ok(restored)
    }

    async fn hard_delete(&self, id: i64) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.books.get(&id).map(Book::is_active) {
            None => Err(StoreError::NotFound { id }),
            Some(true) => Err(StoreError::StillActive { id }),
            Some(false) => {
                inner.books.remove(&id);
                Ok(())
            }
        }
    }
}
