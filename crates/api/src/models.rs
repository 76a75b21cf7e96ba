use shared::api::{ContentKind, ContentView};
use sqlx::FromRow;

/// A shared item as stored in the `contents` table.
///
/// Timestamps are Unix seconds. `deleted` is a one-way tombstone: once set the
/// row is never served again, but it stays in the table so view records keep
/// pointing at something.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ContentItem {
    pub id: i64,
    /// Unguessable token handed out to clients (UUID v4).
    pub public_id: String,
    #[sqlx(try_from = "String")]
    pub kind: ContentKind,
    pub content: Option<String>,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub auto_delete: bool,
    pub delete_after_minutes: i64,
    pub burn_after_read: bool,
    pub ip_restriction: bool,
    /// Start of the auto-delete timer. Set once, on the first successful view.
    pub first_viewed_at: Option<i64>,
    pub created_at: i64,
    pub deleted: bool,
}

impl ContentItem {
    /// Builds the viewer-facing representation.
    pub fn to_view(&self, remaining_seconds: Option<i64>) -> ContentView {
        ContentView {
            kind: self.kind,
            content: self.content.clone(),
            file_name: self.file_name.clone(),
            has_file: self.file_path.is_some(),
            auto_delete: self.auto_delete,
            burn_after_read: self.burn_after_read,
            ip_restriction: self.ip_restriction,
            remaining_seconds,
            created_at: self.created_at,
        }
    }
}

/// Everything needed to insert a new row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContent {
    pub kind: ContentKind,
    pub content: Option<String>,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub auto_delete: bool,
    pub delete_after_minutes: i64,
    pub burn_after_read: bool,
    pub ip_restriction: bool,
    pub created_at: i64,
}
