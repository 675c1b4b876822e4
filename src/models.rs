use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Level assigned to rows created without an explicit one.
pub const DEFAULT_LEVEL: i32 = 1;

// --- Core Catalog Schemas (Mapped to Database) ---

/// User
///
/// Canonical account record from the `users` table. Carries the two fields the
/// access-control model is built on: `role` gates mutation, `level` gates
/// visibility of catalog content. The password hash is a PHC-format argon2id
/// string and is never serialized into a response.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    // Unique login identifier.
    pub username: String,
    // "admin" or "member".
    pub role: String,
    // Reading level; content above it is invisible to this user.
    pub level: i32,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// UserProfile
///
/// The outward-facing projection of a `User`, safe to serialize to clients.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub role: String,
    pub level: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            role: user.role,
            level: user.level,
            created_at: user.created_at,
        }
    }
}

/// Book
///
/// A catalog record from the `books` table. References into the four facet
/// tables are optional; `tag_ids` is aggregated from the `book_tags` link
/// table by the repository queries.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    // Alphabetical ordering key: leading article moved to the end.
    pub title_sort: String,
    pub author_id: Option<Uuid>,
    pub series_id: Option<Uuid>,
    // Position inside the series. Fractional to allow 1.5-style interleaving.
    pub series_index: Option<f64>,
    pub tag_ids: Vec<Uuid>,
    // Stored as text; ISBNs carry leading zeros and check digit 'X'.
    pub isbn: Option<String>,
    pub publisher_id: Option<Uuid>,
    pub word_count: Option<i32>,
    // Markdown body shown on the detail page.
    pub description: Option<String>,
    // URL or object key of the uploaded cover image.
    pub cover: Option<String>,
    pub level: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// BookDetail
///
/// Detail-page projection of a book with the facet names resolved, so the
/// client does not need follow-up lookups to render the page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct BookDetail {
    pub id: Uuid,
    pub title: String,
    pub title_sort: String,
    pub author_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub series_id: Option<Uuid>,
    pub series_name: Option<String>,
    pub series_index: Option<f64>,
    pub tag_ids: Vec<Uuid>,
    pub tag_names: Vec<String>,
    pub isbn: Option<String>,
    pub publisher_id: Option<Uuid>,
    pub publisher_name: Option<String>,
    pub word_count: Option<i32>,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub level: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Author
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub level: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Series
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Series {
    pub id: Uuid,
    pub name: String,
    pub level: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Tag
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub level: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Publisher
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Publisher {
    pub id: Uuid,
    pub name: String,
    pub level: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Facet Detail Responses ---

/// AuthorDetail
///
/// An author plus their books visible at the requesting user's level,
/// ordered by title sort key.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthorDetail {
    pub author: Author,
    pub books: Vec<Book>,
}

/// SeriesDetail
///
/// A series plus its visible books ordered by `series_index`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SeriesDetail {
    pub series: Series,
    pub books: Vec<Book>,
}

/// TagDetail
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TagDetail {
    pub tag: Tag,
    pub books: Vec<Book>,
}

/// PublisherDetail
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PublisherDetail {
    pub publisher: Publisher,
    pub books: Vec<Book>,
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// LoginResponse
///
/// Session token plus the resolved profile, so clients can render the shell
/// without an immediate follow-up `/me` call.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// NewUser
///
/// Repository-facing insert row for an account. Handlers build it from a
/// `CreateUserRequest` after hashing the password and applying defaults.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub role: String,
    pub level: i32,
    pub password_hash: String,
}

/// CreateUserRequest
///
/// Admin payload for provisioning an account. `level` defaults to 1 and
/// `role` to "member" when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub name: String,
    pub username: String,
    pub password: String,
    pub level: Option<i32>,
    pub role: Option<String>,
}

/// UpdateUserRequest
///
/// Partial account update; only provided fields change. The password is
/// deliberately absent, resets go through a separate flow.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// CreateBookRequest
///
/// Admin payload for cataloging a book. `title_sort` is derived from the
/// title when not supplied; `level` defaults to 1.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateBookRequest {
    pub title: String,
    pub title_sort: Option<String>,
    pub author_id: Option<Uuid>,
    pub series_id: Option<Uuid>,
    pub series_index: Option<f64>,
    pub tag_ids: Option<Vec<Uuid>>,
    pub isbn: Option<String>,
    pub publisher_id: Option<Uuid>,
    pub word_count: Option<i32>,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub level: Option<i32>,
}

/// UpdateBookRequest
///
/// Partial update; `None` fields keep their current value (COALESCE
/// semantics in the repository). `tag_ids: Some(...)` replaces the full tag
/// set, `None` leaves the links untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateBookRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_sort: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_index: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<Uuid>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
}

/// CreateFacetRequest
///
/// Shared admin payload for the four name+level facets (authors, series,
/// tags, publishers).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateFacetRequest {
    pub name: String,
    pub level: Option<i32>,
}

/// UpdateFacetRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateFacetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
}

/// PresignedUrlRequest
///
/// Input for requesting a short-lived cover upload URL.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// Original filename, used only to derive the extension.
    #[schema(example = "hobbit-cover.jpg")]
    pub filename: String,
    /// MIME type the upload will be constrained to. Must be an image type.
    #[schema(example = "image/jpeg")]
    pub file_type: String,
}

/// PresignedUrlResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// Time-limited URL for the PUT request.
    pub upload_url: String,
    /// Object key to store in the book's `cover` field after upload.
    pub resource_key: String,
}

/// CatalogStats
///
/// Row counts for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CatalogStats {
    pub total_books: i64,
    pub total_authors: i64,
    pub total_series: i64,
    pub total_tags: i64,
    pub total_publishers: i64,
    pub total_users: i64,
}

// --- Browsing Vocabulary ---

/// WordCountBucket
///
/// Named word-count ranges backing the bucketed browsing view. The four
/// buckets partition the axis: short < 50k, medium < 120k, long < 250k,
/// epic for everything above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCountBucket {
    Short,
    Medium,
    Long,
    Epic,
}

impl WordCountBucket {
    /// Parses a URL path segment. Unknown names map to `None`, which the
    /// handler surfaces as 404.
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "short" => Some(Self::Short),
            "medium" => Some(Self::Medium),
            "long" => Some(Self::Long),
            "epic" => Some(Self::Epic),
            _ => None,
        }
    }

    /// Inclusive word-count bounds for repository filtering.
    pub fn word_range(self) -> (Option<i32>, Option<i32>) {
        match self {
            Self::Short => (None, Some(49_999)),
            Self::Medium => (Some(50_000), Some(119_999)),
            Self::Long => (Some(120_000), Some(249_999)),
            Self::Epic => (Some(250_000), None),
        }
    }

    /// The bucket a given word count belongs to.
    pub fn bucket_for(words: i32) -> Self {
        match words {
            w if w < 50_000 => Self::Short,
            w if w < 120_000 => Self::Medium,
            w if w < 250_000 => Self::Long,
            _ => Self::Epic,
        }
    }
}

/// Derives the alphabetical sort key for a title by moving a leading English
/// article to the end: "The Hobbit" becomes "Hobbit, The". Titles without a
/// leading article (including already-derived keys) pass through unchanged.
pub fn title_sort_key(title: &str) -> String {
    let trimmed = title.trim();
    for article in ["The ", "A ", "An "] {
        if let Some(prefix) = trimmed.get(..article.len()) {
            if prefix.eq_ignore_ascii_case(article) && trimmed.len() > article.len() {
                return format!(
                    "{}, {}",
                    &trimmed[article.len()..],
                    &trimmed[..article.len() - 1]
                );
            }
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_sort_moves_leading_article() {
        assert_eq!(title_sort_key("The Hobbit"), "Hobbit, The");
        assert_eq!(title_sort_key("A Wizard of Earthsea"), "Wizard of Earthsea, A");
        assert_eq!(title_sort_key("An Instance of the Fingerpost"), "Instance of the Fingerpost, An");
    }

    #[test]
    fn title_sort_leaves_plain_titles_alone() {
        assert_eq!(title_sort_key("Dune"), "Dune");
        // "Another" starts with "An" but not the article "An ".
        assert_eq!(title_sort_key("Anathem"), "Anathem");
        assert_eq!(title_sort_key("  Dune  "), "Dune");
    }

    #[test]
    fn title_sort_is_idempotent() {
        let once = title_sort_key("The Left Hand of Darkness");
        assert_eq!(title_sort_key(&once), once);
    }

    #[test]
    fn word_count_buckets_partition_the_axis() {
        // Every boundary lands in exactly the bucket whose range claims it.
        for (words, expected) in [
            (0, WordCountBucket::Short),
            (49_999, WordCountBucket::Short),
            (50_000, WordCountBucket::Medium),
            (119_999, WordCountBucket::Medium),
            (120_000, WordCountBucket::Long),
            (249_999, WordCountBucket::Long),
            (250_000, WordCountBucket::Epic),
            (1_000_000, WordCountBucket::Epic),
        ] {
            let bucket = WordCountBucket::bucket_for(words);
            assert_eq!(bucket, expected, "bucket for {words}");

            let (min, max) = bucket.word_range();
            assert!(min.is_none_or(|m| words >= m));
            assert!(max.is_none_or(|m| words <= m));
        }
    }

    #[test]
    fn word_count_bucket_parsing() {
        assert_eq!(WordCountBucket::parse("short"), Some(WordCountBucket::Short));
        assert_eq!(WordCountBucket::parse("epic"), Some(WordCountBucket::Epic));
        assert_eq!(WordCountBucket::parse("gigantic"), None);
        assert_eq!(WordCountBucket::parse("Short"), None);
    }

    #[test]
    fn user_serialization_never_leaks_the_password_hash() {
        let user = User {
            username: "reader1".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
            ..User::default()
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2id"));
    }

    #[test]
    fn update_book_request_omits_unset_fields() {
        let partial = UpdateBookRequest {
            title: Some("New Title".to_string()),
            ..UpdateBookRequest::default()
        };
        let json = serde_json::to_string(&partial).unwrap();
        assert!(json.contains(r#""title":"New Title""#));
        assert!(!json.contains("word_count"));
        assert!(!json.contains("tag_ids"));
    }
}
