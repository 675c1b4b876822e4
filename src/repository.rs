use crate::models::{
    Author, Book, BookDetail, CatalogStats, CreateBookRequest, CreateFacetRequest, NewUser,
    Publisher, Series, Tag, UpdateBookRequest, UpdateFacetRequest, UpdateUserRequest, User,
    title_sort_key,
};
use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgRow, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Columns selected whenever a plain `Book` row is materialized. The tag ids
/// live in the `book_tags` link table and are folded in as an array so every
/// book query stays a single statement.
const BOOK_COLS: &str = r#"
    b.id, b.title, b.title_sort, b.author_id, b.series_id, b.series_index,
    ARRAY(SELECT bt.tag_id FROM book_tags bt WHERE bt.book_id = b.id ORDER BY bt.tag_id) AS tag_ids,
    b.isbn, b.publisher_id, b.word_count, b.description, b.cover, b.level, b.created_at
"#;

/// Page
///
/// LIMIT/OFFSET pagination for list queries. Out-of-range values are clamped
/// rather than rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Page {
    /// 1-based page number.
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Page {
    const DEFAULT_PER_PAGE: i64 = 50;
    const MAX_PER_PAGE: i64 = 100;

    pub fn limit_offset(self) -> (i64, i64) {
        let per_page = self
            .per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE);
        let page = self.page.unwrap_or(1).max(1);
        (per_page, (page - 1) * per_page)
    }
}

/// BookQuery
///
/// Optional restrictions layered on top of the mandatory level filter when
/// listing books. Word-count bounds are inclusive. `exact_level` backs the
/// level-bucketed browsing view.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    pub title: Option<String>,
    pub min_words: Option<i32>,
    pub max_words: Option<i32>,
    pub exact_level: Option<i32>,
}

/// Repository Trait
///
/// Abstract contract for all persistence operations, shared as
/// `Arc<dyn Repository>` across the router. Handlers never see SQL; in
/// particular the level-gated visibility rule lives entirely down here, so a
/// read path cannot forget it.
///
/// Error surface: read methods log failures and degrade to empty results;
/// write methods return `Result` so handlers can surface a generic failure
/// (and distinguish constraint violations) to the caller.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Books: level-gated reads ---
    async fn list_books(&self, viewer_level: i32, query: BookQuery, page: Page) -> Vec<Book>;
    /// Most recently cataloged visible books, for the home feed.
    async fn recent_books(&self, viewer_level: i32, limit: i64) -> Vec<Book>;
    /// Detail projection with facet names resolved. `None` covers both a
    /// missing row and one above the viewer's level.
    async fn get_book(&self, id: Uuid, viewer_level: i32) -> Option<BookDetail>;
    async fn books_by_author(&self, author_id: Uuid, viewer_level: i32) -> Vec<Book>;
    /// Ordered by `series_index`, the one place title order does not apply.
    async fn books_in_series(&self, series_id: Uuid, viewer_level: i32) -> Vec<Book>;
    async fn books_with_tag(&self, tag_id: Uuid, viewer_level: i32) -> Vec<Book>;
    async fn books_by_publisher(&self, publisher_id: Uuid, viewer_level: i32) -> Vec<Book>;

    // --- Books: admin writes ---
    async fn create_book(&self, req: CreateBookRequest) -> Result<Book, sqlx::Error>;
    async fn update_book(
        &self,
        id: Uuid,
        req: UpdateBookRequest,
    ) -> Result<Option<Book>, sqlx::Error>;
    async fn delete_book(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Authors ---
    async fn list_authors(&self, viewer_level: i32, name: Option<String>, page: Page)
    -> Vec<Author>;
    async fn get_author(&self, id: Uuid, viewer_level: i32) -> Option<Author>;
    async fn create_author(&self, req: CreateFacetRequest) -> Result<Author, sqlx::Error>;
    async fn update_author(
        &self,
        id: Uuid,
        req: UpdateFacetRequest,
    ) -> Result<Option<Author>, sqlx::Error>;
    async fn delete_author(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Series ---
    async fn list_series(&self, viewer_level: i32, name: Option<String>, page: Page)
    -> Vec<Series>;
    async fn get_series(&self, id: Uuid, viewer_level: i32) -> Option<Series>;
    async fn create_series(&self, req: CreateFacetRequest) -> Result<Series, sqlx::Error>;
    async fn update_series(
        &self,
        id: Uuid,
        req: UpdateFacetRequest,
    ) -> Result<Option<Series>, sqlx::Error>;
    async fn delete_series(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Tags ---
    async fn list_tags(&self, viewer_level: i32, name: Option<String>, page: Page) -> Vec<Tag>;
    async fn get_tag(&self, id: Uuid, viewer_level: i32) -> Option<Tag>;
    async fn create_tag(&self, req: CreateFacetRequest) -> Result<Tag, sqlx::Error>;
    async fn update_tag(
        &self,
        id: Uuid,
        req: UpdateFacetRequest,
    ) -> Result<Option<Tag>, sqlx::Error>;
    async fn delete_tag(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Publishers ---
    async fn list_publishers(
        &self,
        viewer_level: i32,
        name: Option<String>,
        page: Page,
    ) -> Vec<Publisher>;
    async fn get_publisher(&self, id: Uuid, viewer_level: i32) -> Option<Publisher>;
    async fn create_publisher(&self, req: CreateFacetRequest) -> Result<Publisher, sqlx::Error>;
    async fn update_publisher(
        &self,
        id: Uuid,
        req: UpdateFacetRequest,
    ) -> Result<Option<Publisher>, sqlx::Error>;
    async fn delete_publisher(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Users ---
    async fn list_users(&self) -> Vec<User>;
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn get_user_by_username(&self, username: &str) -> Option<User>;
    /// Unique-username violations come back as `Err`; the caller maps them
    /// to a conflict response.
    async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error>;
    async fn update_user(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, sqlx::Error>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, sqlx::Error>;

    // --- Dashboard ---
    async fn catalog_stats(&self) -> CatalogStats;
}

/// RepositoryState
///
/// The shared handle stored in the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// Concrete implementation of `Repository` backed by the Postgres pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Shared listing for the four name+level facet tables. `table` is always
    /// one of the static names passed by the trait methods below, never user
    /// input.
    async fn list_facet<T>(
        &self,
        table: &'static str,
        viewer_level: i32,
        name: Option<String>,
        page: Page,
    ) -> Vec<T>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT id, name, level, created_at FROM {table} WHERE level <= "
        ));
        builder.push_bind(viewer_level);

        if let Some(n) = name {
            builder.push(" AND name ILIKE ");
            builder.push_bind(format!("%{n}%"));
        }

        let (limit, offset) = page.limit_offset();
        builder.push(" ORDER BY name ASC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        match builder.build_query_as::<T>().fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(table, "facet list error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_facet<T>(&self, table: &'static str, id: Uuid, viewer_level: i32) -> Option<T>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT id, name, level, created_at FROM {table} WHERE id = $1 AND level <= $2"
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(viewer_level)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(table, "facet fetch error: {:?}", e);
                None
            })
    }

    async fn create_facet<T>(
        &self,
        table: &'static str,
        req: CreateFacetRequest,
    ) -> Result<T, sqlx::Error>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!(
            "INSERT INTO {table} (id, name, level, created_at) VALUES ($1, $2, $3, NOW()) \
             RETURNING id, name, level, created_at"
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.name)
            .bind(req.level.unwrap_or(crate::models::DEFAULT_LEVEL))
            .fetch_one(&self.pool)
            .await
    }

    async fn update_facet<T>(
        &self,
        table: &'static str,
        id: Uuid,
        req: UpdateFacetRequest,
    ) -> Result<Option<T>, sqlx::Error>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!(
            "UPDATE {table} SET name = COALESCE($2, name), level = COALESCE($3, level) \
             WHERE id = $1 RETURNING id, name, level, created_at"
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(req.name)
            .bind(req.level)
            .fetch_optional(&self.pool)
            .await
    }

    /// Deletes from a facet table. Rows still referenced by books trip the
    /// RESTRICT foreign key and surface as `Err`, which the handlers map to
    /// a conflict response.
    async fn delete_facet(&self, table: &'static str, id: Uuid) -> Result<bool, sqlx::Error> {
        let sql = format!("DELETE FROM {table} WHERE id = $1");
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Book listing shared by the filtered views: every variant starts from
    /// the same level predicate and title ordering.
    async fn fetch_books(&self, viewer_level: i32, query: BookQuery, page: Page) -> Vec<Book> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {BOOK_COLS} FROM books b WHERE b.level <= "));
        builder.push_bind(viewer_level);

        if let Some(title) = query.title {
            builder.push(" AND b.title ILIKE ");
            builder.push_bind(format!("%{title}%"));
        }
        if let Some(min) = query.min_words {
            builder.push(" AND b.word_count >= ");
            builder.push_bind(min);
        }
        if let Some(max) = query.max_words {
            builder.push(" AND b.word_count <= ");
            builder.push_bind(max);
        }
        if let Some(level) = query.exact_level {
            builder.push(" AND b.level = ");
            builder.push_bind(level);
        }

        let (limit, offset) = page.limit_offset();
        builder.push(" ORDER BY b.title_sort ASC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        match builder.build_query_as::<Book>().fetch_all(&self.pool).await {
            Ok(books) => books,
            Err(e) => {
                tracing::error!("book list error: {:?}", e);
                vec![]
            }
        }
    }

    /// Books linked to one facet, visible at the viewer's level.
    async fn fetch_books_for_facet(
        &self,
        fk_column: &'static str,
        facet_id: Uuid,
        viewer_level: i32,
        order_by: &'static str,
    ) -> Vec<Book> {
        let sql = format!(
            "SELECT {BOOK_COLS} FROM books b WHERE b.{fk_column} = $1 AND b.level <= $2 \
             ORDER BY {order_by}"
        );
        sqlx::query_as::<_, Book>(&sql)
            .bind(facet_id)
            .bind(viewer_level)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(fk_column, "facet books error: {:?}", e);
                vec![]
            })
    }

    /// Re-reads a full book row inside an open transaction, after its tag
    /// links have been written.
    async fn book_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
    ) -> Result<Book, sqlx::Error> {
        let sql = format!("SELECT {BOOK_COLS} FROM books b WHERE b.id = $1");
        sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }

    async fn replace_tag_links(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        book_id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM book_tags WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;
        for tag_id in tag_ids {
            sqlx::query(
                "INSERT INTO book_tags (book_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(book_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_books(&self, viewer_level: i32, query: BookQuery, page: Page) -> Vec<Book> {
        self.fetch_books(viewer_level, query, page).await
    }

    async fn recent_books(&self, viewer_level: i32, limit: i64) -> Vec<Book> {
        let sql = format!(
            "SELECT {BOOK_COLS} FROM books b WHERE b.level <= $1 \
             ORDER BY b.created_at DESC LIMIT $2"
        );
        sqlx::query_as::<_, Book>(&sql)
            .bind(viewer_level)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("recent books error: {:?}", e);
                vec![]
            })
    }

    /// The detail query resolves facet names in the same statement, and the
    /// level predicate makes an out-of-level book indistinguishable from a
    /// missing one.
    async fn get_book(&self, id: Uuid, viewer_level: i32) -> Option<BookDetail> {
        sqlx::query_as::<_, BookDetail>(
            r#"
            SELECT
                b.id, b.title, b.title_sort,
                b.author_id, a.name AS author_name,
                b.series_id, s.name AS series_name, b.series_index,
                ARRAY(SELECT bt.tag_id FROM book_tags bt
                      WHERE bt.book_id = b.id ORDER BY bt.tag_id) AS tag_ids,
                ARRAY(SELECT t.name FROM book_tags bt JOIN tags t ON t.id = bt.tag_id
                      WHERE bt.book_id = b.id ORDER BY t.name) AS tag_names,
                b.isbn, b.publisher_id, p.name AS publisher_name,
                b.word_count, b.description, b.cover, b.level, b.created_at
            FROM books b
            LEFT JOIN authors a ON a.id = b.author_id
            LEFT JOIN series s ON s.id = b.series_id
            LEFT JOIN publishers p ON p.id = b.publisher_id
            WHERE b.id = $1 AND b.level <= $2
            "#,
        )
        .bind(id)
        .bind(viewer_level)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("book detail error: {:?}", e);
            None
        })
    }

    async fn books_by_author(&self, author_id: Uuid, viewer_level: i32) -> Vec<Book> {
        self.fetch_books_for_facet("author_id", author_id, viewer_level, "b.title_sort ASC")
            .await
    }

    async fn books_in_series(&self, series_id: Uuid, viewer_level: i32) -> Vec<Book> {
        self.fetch_books_for_facet(
            "series_id",
            series_id,
            viewer_level,
            "b.series_index ASC NULLS LAST, b.title_sort ASC",
        )
        .await
    }

    async fn books_with_tag(&self, tag_id: Uuid, viewer_level: i32) -> Vec<Book> {
        let sql = format!(
            "SELECT {BOOK_COLS} FROM books b \
             JOIN book_tags link ON link.book_id = b.id \
             WHERE link.tag_id = $1 AND b.level <= $2 ORDER BY b.title_sort ASC"
        );
        sqlx::query_as::<_, Book>(&sql)
            .bind(tag_id)
            .bind(viewer_level)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("tag books error: {:?}", e);
                vec![]
            })
    }

    async fn books_by_publisher(&self, publisher_id: Uuid, viewer_level: i32) -> Vec<Book> {
        self.fetch_books_for_facet("publisher_id", publisher_id, viewer_level, "b.title_sort ASC")
            .await
    }

    /// Book insert plus its tag links in one transaction: a failed link write
    /// rolls the whole catalog entry back.
    async fn create_book(&self, req: CreateBookRequest) -> Result<Book, sqlx::Error> {
        let id = Uuid::new_v4();
        let title_sort = match req.title_sort {
            Some(ref explicit) if !explicit.trim().is_empty() => explicit.clone(),
            _ => title_sort_key(&req.title),
        };
        let level = req.level.unwrap_or(crate::models::DEFAULT_LEVEL);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO books (id, title, title_sort, author_id, series_id, series_index, \
             isbn, publisher_id, word_count, description, cover, level, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())",
        )
        .bind(id)
        .bind(&req.title)
        .bind(&title_sort)
        .bind(req.author_id)
        .bind(req.series_id)
        .bind(req.series_index)
        .bind(&req.isbn)
        .bind(req.publisher_id)
        .bind(req.word_count)
        .bind(&req.description)
        .bind(&req.cover)
        .bind(level)
        .execute(&mut *tx)
        .await?;

        if let Some(ref tag_ids) = req.tag_ids {
            Self::replace_tag_links(&mut tx, id, tag_ids).await?;
        }

        let book = Self::book_in_tx(&mut tx, id).await?;
        tx.commit().await?;
        Ok(book)
    }

    async fn update_book(
        &self,
        id: Uuid,
        req: UpdateBookRequest,
    ) -> Result<Option<Book>, sqlx::Error> {
        // A retitled book gets a rederived sort key unless one was supplied.
        let title_sort = match (&req.title_sort, &req.title) {
            (Some(explicit), _) => Some(explicit.clone()),
            (None, Some(title)) => Some(title_sort_key(title)),
            (None, None) => None,
        };

        let mut tx = self.pool.begin().await?;

        let updated: Option<(Uuid,)> = sqlx::query_as(
            "UPDATE books SET \
             title = COALESCE($2, title), \
             title_sort = COALESCE($3, title_sort), \
             author_id = COALESCE($4, author_id), \
             series_id = COALESCE($5, series_id), \
             series_index = COALESCE($6, series_index), \
             isbn = COALESCE($7, isbn), \
             publisher_id = COALESCE($8, publisher_id), \
             word_count = COALESCE($9, word_count), \
             description = COALESCE($10, description), \
             cover = COALESCE($11, cover), \
             level = COALESCE($12, level) \
             WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(&req.title)
        .bind(&title_sort)
        .bind(req.author_id)
        .bind(req.series_id)
        .bind(req.series_index)
        .bind(&req.isbn)
        .bind(req.publisher_id)
        .bind(req.word_count)
        .bind(&req.description)
        .bind(&req.cover)
        .bind(req.level)
        .fetch_optional(&mut *tx)
        .await?;

        if updated.is_none() {
            return Ok(None);
        }

        if let Some(ref tag_ids) = req.tag_ids {
            Self::replace_tag_links(&mut tx, id, tag_ids).await?;
        }

        let book = Self::book_in_tx(&mut tx, id).await?;
        tx.commit().await?;
        Ok(Some(book))
    }

    async fn delete_book(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        // book_tags links go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_authors(
        &self,
        viewer_level: i32,
        name: Option<String>,
        page: Page,
    ) -> Vec<Author> {
        self.list_facet("authors", viewer_level, name, page).await
    }

    async fn get_author(&self, id: Uuid, viewer_level: i32) -> Option<Author> {
        self.get_facet("authors", id, viewer_level).await
    }

    async fn create_author(&self, req: CreateFacetRequest) -> Result<Author, sqlx::Error> {
        self.create_facet("authors", req).await
    }

    async fn update_author(
        &self,
        id: Uuid,
        req: UpdateFacetRequest,
    ) -> Result<Option<Author>, sqlx::Error> {
        self.update_facet("authors", id, req).await
    }

    async fn delete_author(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        self.delete_facet("authors", id).await
    }

    async fn list_series(
        &self,
        viewer_level: i32,
        name: Option<String>,
        page: Page,
    ) -> Vec<Series> {
        self.list_facet("series", viewer_level, name, page).await
    }

    async fn get_series(&self, id: Uuid, viewer_level: i32) -> Option<Series> {
        self.get_facet("series", id, viewer_level).await
    }

    async fn create_series(&self, req: CreateFacetRequest) -> Result<Series, sqlx::Error> {
        self.create_facet("series", req).await
    }

    async fn update_series(
        &self,
        id: Uuid,
        req: UpdateFacetRequest,
    ) -> Result<Option<Series>, sqlx::Error> {
        self.update_facet("series", id, req).await
    }

    async fn delete_series(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        self.delete_facet("series", id).await
    }

    async fn list_tags(&self, viewer_level: i32, name: Option<String>, page: Page) -> Vec<Tag> {
        self.list_facet("tags", viewer_level, name, page).await
    }

    async fn get_tag(&self, id: Uuid, viewer_level: i32) -> Option<Tag> {
        self.get_facet("tags", id, viewer_level).await
    }

    async fn create_tag(&self, req: CreateFacetRequest) -> Result<Tag, sqlx::Error> {
        self.create_facet("tags", req).await
    }

    async fn update_tag(
        &self,
        id: Uuid,
        req: UpdateFacetRequest,
    ) -> Result<Option<Tag>, sqlx::Error> {
        self.update_facet("tags", id, req).await
    }

    async fn delete_tag(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        self.delete_facet("tags", id).await
    }

    async fn list_publishers(
        &self,
        viewer_level: i32,
        name: Option<String>,
        page: Page,
    ) -> Vec<Publisher> {
        self.list_facet("publishers", viewer_level, name, page).await
    }

    async fn get_publisher(&self, id: Uuid, viewer_level: i32) -> Option<Publisher> {
        self.get_facet("publishers", id, viewer_level).await
    }

    async fn create_publisher(&self, req: CreateFacetRequest) -> Result<Publisher, sqlx::Error> {
        self.create_facet("publishers", req).await
    }

    async fn update_publisher(
        &self,
        id: Uuid,
        req: UpdateFacetRequest,
    ) -> Result<Option<Publisher>, sqlx::Error> {
        self.update_facet("publishers", id, req).await
    }

    async fn delete_publisher(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        self.delete_facet("publishers", id).await
    }

    async fn list_users(&self) -> Vec<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, username, role, level, password_hash, created_at \
             FROM users ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("user list error: {:?}", e);
            vec![]
        })
    }

    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, username, role, level, password_hash, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or(None)
    }

    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, username, role, level, password_hash, created_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or(None)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, username, role, level, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             RETURNING id, name, username, role, level, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user.name)
        .bind(user.username)
        .bind(user.role)
        .bind(user.level)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user(
        &self,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET \
             name = COALESCE($2, name), \
             username = COALESCE($3, username), \
             level = COALESCE($4, level), \
             role = COALESCE($5, role) \
             WHERE id = $1 \
             RETURNING id, name, username, role, level, password_hash, created_at",
        )
        .bind(id)
        .bind(req.name)
        .bind(req.username)
        .bind(req.level)
        .bind(req.role)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn catalog_stats(&self) -> CatalogStats {
        let count = |sql: &'static str| {
            let pool = self.pool.clone();
            async move {
                sqlx::query_scalar::<_, i64>(sql)
                    .fetch_one(&pool)
                    .await
                    .unwrap_or(0)
            }
        };

        CatalogStats {
            total_books: count("SELECT COUNT(*) FROM books").await,
            total_authors: count("SELECT COUNT(*) FROM authors").await,
            total_series: count("SELECT COUNT(*) FROM series").await,
            total_tags: count("SELECT COUNT(*) FROM tags").await,
            total_publishers: count("SELECT COUNT(*) FROM publishers").await,
            total_users: count("SELECT COUNT(*) FROM users").await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamping() {
        assert_eq!(Page::default().limit_offset(), (50, 0));

        let second_page = Page {
            page: Some(2),
            per_page: Some(25),
        };
        assert_eq!(second_page.limit_offset(), (25, 25));

        let oversized = Page {
            page: Some(1),
            per_page: Some(10_000),
        };
        assert_eq!(oversized.limit_offset(), (100, 0));

        let nonsense = Page {
            page: Some(-3),
            per_page: Some(0),
        };
        assert_eq!(nonsense.limit_offset(), (1, 0));
    }
}
