//! Shared API request/response types used by both CLI and API server.

use std::{fmt, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Serialize};

/// 1MB of inline text is plenty for a note or a link.
pub const MAX_CONTENT_LEN: usize = 1_048_576;
/// Uploaded files are capped at 10MB.
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
/// Image types accepted for upload.
pub const ALLOWED_FILE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
/// Timer length used when `deleteAfterMinutes` is missing or unusable.
pub const DEFAULT_DELETE_AFTER_MINUTES: i64 = 1;

/// Multipart field names accepted by `POST /api/content`.
pub mod form {
    pub const TYPE: &str = "type";
    pub const CONTENT: &str = "content";
    pub const AUTO_DELETE: &str = "autoDelete";
    pub const DELETE_AFTER_MINUTES: &str = "deleteAfterMinutes";
    pub const BURN_AFTER_READ: &str = "burnAfterRead";
    pub const IP_RESTRICTION: &str = "ipRestriction";
    pub const FILE: &str = "file";
}

/// What a shared item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Text,
    Link,
    File,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Link => "link",
            ContentKind::File => "file",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown content type: {0}")]
pub struct ParseContentKindError(pub String);

impl FromStr for ContentKind {
    type Err = ParseContentKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ContentKind::Text),
            "link" => Ok(ContentKind::Link),
            "file" => Ok(ContentKind::File),
            other => Err(ParseContentKindError(other.to_string())),
        }
    }
}

impl TryFrom<String> for ContentKind {
    type Error = ParseContentKindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The accepted image type for a file name, judged by its extension.
pub fn image_mime_for(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Interprets an HTML-form style checkbox value.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}

/// Coerces `deleteAfterMinutes` to a positive integer, falling back to the default.
///
/// Only the leading integer counts, so `"5.5"` and `"10 minutes"` give 5 and 10.
pub fn coerce_minutes(value: Option<&str>) -> i64 {
    value
        .and_then(leading_integer)
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_DELETE_AFTER_MINUTES)
}

fn leading_integer(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let sign = usize::from(value.starts_with(['+', '-']));
    let digits = value[sign..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(value.len(), |end| sign + end);

    value[..digits].parse().ok()
}

/// Text fields of a create request, after form coercion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentPayload {
    #[garde(skip)]
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[garde(length(max = MAX_CONTENT_LEN))]
    pub content: Option<String>,
    #[garde(skip)]
    pub auto_delete: bool,
    #[garde(range(min = 1))]
    pub delete_after_minutes: i64,
    #[garde(skip)]
    pub burn_after_read: bool,
    #[garde(skip)]
    pub ip_restriction: bool,
}

/// Returned after creating shared content.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateContentResponse {
    pub success: bool,
    pub uuid: String,
    /// Relative viewer URL, e.g. `/view/{uuid}`.
    pub url: String,
}

/// What a viewer sees for a visible item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentView {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub content: Option<String>,
    pub file_name: Option<String>,
    pub has_file: bool,
    pub auto_delete: bool,
    pub burn_after_read: bool,
    pub ip_restriction: bool,
    /// Seconds until the auto-delete timer fires, `None` if no timer is running.
    pub remaining_seconds: Option<i64>,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewContentResponse {
    pub success: bool,
    pub content: ContentView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
