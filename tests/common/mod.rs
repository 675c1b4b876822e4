//! Shared fixtures for the router-level tests: an in-memory stub repository
//! seeded with a couple of accounts and leveled books, plus an app builder
//! wiring it into the real router with mock storage.
//!
//! The stub mirrors the documented `Repository` contract: read methods apply
//! the `level <= viewer level` visibility rule, mutations are counted so
//! tests can assert that a blocked request changed nothing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use readshelf::{
    AppConfig, AppState, MockStorageService, create_router,
    auth::{ROLE_ADMIN, ROLE_MEMBER, hash_password},
    models::{
        Author, Book, BookDetail, CatalogStats, CreateBookRequest, CreateFacetRequest, NewUser,
        Publisher, Series, Tag, UpdateBookRequest, UpdateFacetRequest, UpdateUserRequest, User,
        title_sort_key,
    },
    repository::{BookQuery, Page, Repository, RepositoryState},
    storage::StorageState,
};
use std::sync::Arc;

pub const ADMIN_PASSWORD: &str = "adminpass123";
pub const MEMBER_PASSWORD: &str = "password123";

pub struct StubRepository {
    pub users: Vec<User>,
    pub books: Vec<Book>,
    pub authors: Vec<Author>,
    mutation_calls: AtomicUsize,
}

impl StubRepository {
    /// Two accounts (an admin at level 10, a member at level 2) and books at
    /// levels 1, 2 and 5 spanning the word-count buckets.
    pub fn with_fixtures() -> Self {
        let admin = User {
            id: Uuid::new_v4(),
            name: "Site Admin".to_string(),
            username: "admin1".to_string(),
            role: ROLE_ADMIN.to_string(),
            level: 10,
            password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
            created_at: Utc::now(),
        };
        let member = User {
            id: Uuid::new_v4(),
            name: "Casual Reader".to_string(),
            username: "reader55".to_string(),
            role: ROLE_MEMBER.to_string(),
            level: 2,
            password_hash: hash_password(MEMBER_PASSWORD).unwrap(),
            created_at: Utc::now(),
        };

        let book = |title: &str, level: i32, words: i32| Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            title_sort: title_sort_key(title),
            word_count: Some(words),
            level,
            created_at: Utc::now(),
            ..Book::default()
        };

        let author = |name: &str, level: i32| Author {
            id: Uuid::new_v4(),
            name: name.to_string(),
            level,
            created_at: Utc::now(),
        };

        Self {
            users: vec![admin, member],
            books: vec![
                book("The Picture Book", 1, 800),
                book("A Chapter Book", 2, 60_000),
                book("The Restricted Tome", 5, 300_000),
            ],
            authors: vec![author("Open Author", 1), author("Gated Author", 5)],
            mutation_calls: AtomicUsize::new(0),
        }
    }

    pub fn admin(&self) -> &User {
        self.users.iter().find(|u| u.role == ROLE_ADMIN).unwrap()
    }

    pub fn member(&self) -> &User {
        self.users.iter().find(|u| u.role == ROLE_MEMBER).unwrap()
    }

    pub fn mutations(&self) -> usize {
        self.mutation_calls.load(Ordering::SeqCst)
    }

    fn record_mutation(&self) {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn visible_books(&self, viewer_level: i32) -> Vec<Book> {
        let mut books: Vec<Book> = self
            .books
            .iter()
            .filter(|b| b.level <= viewer_level)
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title_sort.cmp(&b.title_sort));
        books
    }
}

#[async_trait]
impl Repository for StubRepository {
    async fn list_books(&self, viewer_level: i32, query: BookQuery, _page: Page) -> Vec<Book> {
        self.visible_books(viewer_level)
            .into_iter()
            .filter(|b| match &query.title {
                Some(t) => b.title.to_lowercase().contains(&t.to_lowercase()),
                None => true,
            })
            .filter(|b| match query.min_words {
                Some(min) => b.word_count.is_some_and(|w| w >= min),
                None => true,
            })
            .filter(|b| match query.max_words {
                Some(max) => b.word_count.is_some_and(|w| w <= max),
                None => true,
            })
            .filter(|b| match query.exact_level {
                Some(level) => b.level == level,
                None => true,
            })
            .collect()
    }

    async fn recent_books(&self, viewer_level: i32, limit: i64) -> Vec<Book> {
        self.visible_books(viewer_level)
            .into_iter()
            .take(limit as usize)
            .collect()
    }

    async fn get_book(&self, id: Uuid, viewer_level: i32) -> Option<BookDetail> {
        let book = self
            .books
            .iter()
            .find(|b| b.id == id && b.level <= viewer_level)?;
        Some(BookDetail {
            id: book.id,
            title: book.title.clone(),
            title_sort: book.title_sort.clone(),
            word_count: book.word_count,
            level: book.level,
            created_at: book.created_at,
            ..BookDetail::default()
        })
    }

    async fn books_by_author(&self, author_id: Uuid, viewer_level: i32) -> Vec<Book> {
        self.visible_books(viewer_level)
            .into_iter()
            .filter(|b| b.author_id == Some(author_id))
            .collect()
    }

    async fn books_in_series(&self, series_id: Uuid, viewer_level: i32) -> Vec<Book> {
        self.visible_books(viewer_level)
            .into_iter()
            .filter(|b| b.series_id == Some(series_id))
            .collect()
    }

    async fn books_with_tag(&self, tag_id: Uuid, viewer_level: i32) -> Vec<Book> {
        self.visible_books(viewer_level)
            .into_iter()
            .filter(|b| b.tag_ids.contains(&tag_id))
            .collect()
    }

    async fn books_by_publisher(&self, publisher_id: Uuid, viewer_level: i32) -> Vec<Book> {
        self.visible_books(viewer_level)
            .into_iter()
            .filter(|b| b.publisher_id == Some(publisher_id))
            .collect()
    }

    async fn create_book(&self, req: CreateBookRequest) -> Result<Book, sqlx::Error> {
        self.record_mutation();
        // Mirrors the real repository's defaulting rules.
        Ok(Book {
            id: Uuid::new_v4(),
            title_sort: req
                .title_sort
                .clone()
                .unwrap_or_else(|| title_sort_key(&req.title)),
            title: req.title,
            author_id: req.author_id,
            series_id: req.series_id,
            series_index: req.series_index,
            tag_ids: req.tag_ids.unwrap_or_default(),
            isbn: req.isbn,
            publisher_id: req.publisher_id,
            word_count: req.word_count,
            description: req.description,
            cover: req.cover,
            level: req.level.unwrap_or(1),
            created_at: Utc::now(),
        })
    }

    async fn update_book(
        &self,
        _id: Uuid,
        _req: UpdateBookRequest,
    ) -> Result<Option<Book>, sqlx::Error> {
        self.record_mutation();
        Ok(None)
    }

    async fn delete_book(&self, _id: Uuid) -> Result<bool, sqlx::Error> {
        self.record_mutation();
        Ok(false)
    }

    async fn list_authors(
        &self,
        viewer_level: i32,
        name: Option<String>,
        _page: Page,
    ) -> Vec<Author> {
        self.authors
            .iter()
            .filter(|a| a.level <= viewer_level)
            .filter(|a| match &name {
                Some(n) => a.name.to_lowercase().contains(&n.to_lowercase()),
                None => true,
            })
            .cloned()
            .collect()
    }

    async fn get_author(&self, id: Uuid, viewer_level: i32) -> Option<Author> {
        self.authors
            .iter()
            .find(|a| a.id == id && a.level <= viewer_level)
            .cloned()
    }

    async fn create_author(&self, req: CreateFacetRequest) -> Result<Author, sqlx::Error> {
        self.record_mutation();
        Ok(Author {
            id: Uuid::new_v4(),
            name: req.name,
            level: req.level.unwrap_or(1),
            created_at: Utc::now(),
        })
    }

    async fn update_author(
        &self,
        _id: Uuid,
        _req: UpdateFacetRequest,
    ) -> Result<Option<Author>, sqlx::Error> {
        self.record_mutation();
        Ok(None)
    }

    async fn delete_author(&self, _id: Uuid) -> Result<bool, sqlx::Error> {
        self.record_mutation();
        Ok(false)
    }

    async fn list_series(
        &self,
        _viewer_level: i32,
        _name: Option<String>,
        _page: Page,
    ) -> Vec<Series> {
        vec![]
    }

    async fn get_series(&self, _id: Uuid, _viewer_level: i32) -> Option<Series> {
        None
    }

    async fn create_series(&self, req: CreateFacetRequest) -> Result<Series, sqlx::Error> {
        self.record_mutation();
        Ok(Series {
            id: Uuid::new_v4(),
            name: req.name,
            level: req.level.unwrap_or(1),
            created_at: Utc::now(),
        })
    }

    async fn update_series(
        &self,
        _id: Uuid,
        _req: UpdateFacetRequest,
    ) -> Result<Option<Series>, sqlx::Error> {
        self.record_mutation();
        Ok(None)
    }

    async fn delete_series(&self, _id: Uuid) -> Result<bool, sqlx::Error> {
        self.record_mutation();
        Ok(false)
    }

    async fn list_tags(&self, _viewer_level: i32, _name: Option<String>, _page: Page) -> Vec<Tag> {
        vec![]
    }

    async fn get_tag(&self, _id: Uuid, _viewer_level: i32) -> Option<Tag> {
        None
    }

    async fn create_tag(&self, req: CreateFacetRequest) -> Result<Tag, sqlx::Error> {
        self.record_mutation();
        Ok(Tag {
            id: Uuid::new_v4(),
            name: req.name,
            level: req.level.unwrap_or(1),
            created_at: Utc::now(),
        })
    }

    async fn update_tag(
        &self,
        _id: Uuid,
        _req: UpdateFacetRequest,
    ) -> Result<Option<Tag>, sqlx::Error> {
        self.record_mutation();
        Ok(None)
    }

    async fn delete_tag(&self, _id: Uuid) -> Result<bool, sqlx::Error> {
        self.record_mutation();
        Ok(false)
    }

    async fn list_publishers(
        &self,
        _viewer_level: i32,
        _name: Option<String>,
        _page: Page,
    ) -> Vec<Publisher> {
        vec![]
    }

    async fn get_publisher(&self, _id: Uuid, _viewer_level: i32) -> Option<Publisher> {
        None
    }

    async fn create_publisher(&self, req: CreateFacetRequest) -> Result<Publisher, sqlx::Error> {
        self.record_mutation();
        Ok(Publisher {
            id: Uuid::new_v4(),
            name: req.name,
            level: req.level.unwrap_or(1),
            created_at: Utc::now(),
        })
    }

    async fn update_publisher(
        &self,
        _id: Uuid,
        _req: UpdateFacetRequest,
    ) -> Result<Option<Publisher>, sqlx::Error> {
        self.record_mutation();
        Ok(None)
    }

    async fn delete_publisher(&self, _id: Uuid) -> Result<bool, sqlx::Error> {
        self.record_mutation();
        Ok(false)
    }

    async fn list_users(&self) -> Vec<User> {
        self.users.clone()
    }

    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.iter().find(|u| u.id == id).cloned()
    }

    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.users.iter().find(|u| u.username == username).cloned()
    }

    async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        self.record_mutation();
        Ok(User {
            id: Uuid::new_v4(),
            name: user.name,
            username: user.username,
            role: user.role,
            level: user.level,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        })
    }

    async fn update_user(
        &self,
        _id: Uuid,
        _req: UpdateUserRequest,
    ) -> Result<Option<User>, sqlx::Error> {
        self.record_mutation();
        Ok(None)
    }

    async fn delete_user(&self, _id: Uuid) -> Result<bool, sqlx::Error> {
        self.record_mutation();
        Ok(false)
    }

    async fn catalog_stats(&self) -> CatalogStats {
        CatalogStats {
            total_books: self.books.len() as i64,
            total_authors: self.authors.len() as i64,
            total_users: self.users.len() as i64,
            ..CatalogStats::default()
        }
    }
}

/// Builds the real router around a stub repository and mock storage, with the
/// default (Local) configuration so the `x-user-id` bypass is active.
pub fn test_app(repo: Arc<StubRepository>, storage: MockStorageService) -> axum::Router {
    let state = AppState {
        repo: repo as RepositoryState,
        storage: Arc::new(storage) as StorageState,
        config: AppConfig::default(),
    };
    create_router(state)
}
