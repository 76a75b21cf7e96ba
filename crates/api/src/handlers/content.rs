//! Shared content endpoints.
//!
//! Content is anything a sender wants to hand over once: a note, a link or an
//! image. Items are addressed by an unguessable UUID and disappear according to
//! the flags chosen at creation.
//!
//! ## Lifetime flags
//!
//! - **autoDelete** - a timer of `deleteAfterMinutes` starts on the first view
//! - **burnAfterRead** - purged as soon as one view response has gone out
//! - **ipRestriction** - each client IP gets exactly one view
//!
//! ## Storage
//!
//! ```text
//! contents       → SQLite row per item (tombstoned, never hard-deleted)
//! content_views  → one row per (item, IP) for restricted items
//! {upload_dir}/{uuid}-{name} → backing file for image uploads
//! ```
//!
//! ## Endpoints
//!
//! - POST /api/content - Create an item from a multipart form
//! - GET /api/content/{uuid} - View an item (starts timers, may burn it)
//! - GET /api/content/{uuid}/download - Download the backing file (not a view)
//! - DELETE /api/content/{uuid} - Delete an item (idempotent)

use axum::{
    Json, Router,
    body::{Body, Bytes},
    debug_handler,
    extract::{
        Multipart, Path, State,
        multipart::{Field, MultipartError},
    },
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use garde::Validate;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use shared::api::{
    ALLOWED_FILE_TYPES, ContentKind, CreateContentPayload, CreateContentResponse,
    SuccessResponse, ViewContentResponse, coerce_minutes, form, image_mime_for, parse_flag,
};
use tokio::sync::oneshot;
use tokio_util::io::ReaderStream;

use crate::{
    body::CompletionBody,
    content::ViewOutcome,
    error::AppError,
    middleware::client_ip::ClientIp,
    models::NewContent,
    state::AppState,
};

const CONTENT_NOT_FOUND: &str = "Content not found or has been deleted";
const ALREADY_VIEWED: &str = "This content has already been viewed from your IP address";
const FILE_NOT_FOUND: &str = "File not found";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_content))
        .route("/{uuid}", get(view_content).delete(delete_content))
        .route("/{uuid}/download", get(download_content))
}

/// An uploaded file held in memory until the form has been validated.
struct Upload {
    name: String,
    bytes: Bytes,
}

/// Raw multipart fields, before coercion.
#[derive(Default)]
struct CreateForm {
    kind: Option<String>,
    content: Option<String>,
    auto_delete: Option<String>,
    delete_after_minutes: Option<String>,
    burn_after_read: Option<String>,
    ip_restriction: Option<String>,
    file: Option<Upload>,
}

impl CreateForm {
    async fn read(mut multipart: Multipart, max_file_bytes: usize) -> Result<Self, AppError> {
        let mut parsed = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == form::FILE {
                parsed.file = read_upload(field, max_file_bytes).await?;
                continue;
            }

            let value = field.text().await.map_err(multipart_error)?;
            match name.as_str() {
                form::TYPE => parsed.kind = Some(value),
                form::CONTENT => parsed.content = Some(value),
                form::AUTO_DELETE => parsed.auto_delete = Some(value),
                form::DELETE_AFTER_MINUTES => parsed.delete_after_minutes = Some(value),
                form::BURN_AFTER_READ => parsed.burn_after_read = Some(value),
                form::IP_RESTRICTION => parsed.ip_restriction = Some(value),
                _ => {}
            }
        }

        Ok(parsed)
    }

    /// Coerces the text fields and checks they fit together with the upload.
    fn into_payload(self) -> Result<(CreateContentPayload, Option<Upload>), AppError> {
        let kind = match self.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            None => ContentKind::default(),
            Some(raw) => raw
                .parse::<ContentKind>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
        };

        let flag = |value: Option<&str>| value.is_some_and(parse_flag);

        let payload = CreateContentPayload {
            kind,
            content: self.content.filter(|c| !c.is_empty()),
            auto_delete: flag(self.auto_delete.as_deref()),
            delete_after_minutes: coerce_minutes(self.delete_after_minutes.as_deref()),
            burn_after_read: flag(self.burn_after_read.as_deref()),
            ip_restriction: flag(self.ip_restriction.as_deref()),
        };

        payload
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if payload.kind == ContentKind::File && self.file.is_none() {
            return Err(AppError::Validation("A file is required for file content".into()));
        }
        if payload.content.is_none() && self.file.is_none() {
            return Err(AppError::Validation("Content or a file is required".into()));
        }

        Ok((payload, self.file))
    }
}

async fn read_upload(field: Field<'_>, max_file_bytes: usize) -> Result<Option<Upload>, AppError> {
    // Browsers send an empty part when no file was picked.
    let Some(name) = field
        .file_name()
        .filter(|n| !n.is_empty())
        .map(str::to_string)
    else {
        return Ok(None);
    };

    let mime = field.content_type().unwrap_or_default();
    if !ALLOWED_FILE_TYPES.contains(&mime) {
        return Err(AppError::Validation(format!(
            "Only image files are allowed (got {})",
            if mime.is_empty() { "no content type" } else { mime }
        )));
    }

    let bytes = field.bytes().await.map_err(multipart_error)?;
    if bytes.len() > max_file_bytes {
        return Err(AppError::Validation(format!(
            "File is too large (max {max_file_bytes} bytes)"
        )));
    }

    Ok(Some(Upload { name, bytes }))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::External(StatusCode::PAYLOAD_TOO_LARGE, "Upload is too large");
    }
    AppError::Validation(err.body_text())
}

#[debug_handler]
async fn create_content(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (payload, upload) = CreateForm::read(multipart, state.config.max_upload_bytes)
        .await?
        .into_payload()?;

    let (file_path, file_name) = match &upload {
        Some(upload) => {
            let path = state.stores.files.save(&upload.name, &upload.bytes).await?;
            (Some(path), Some(upload.name.clone()))
        }
        None => (None, None),
    };

    let new_content = NewContent {
        kind: payload.kind,
        content: payload.content,
        file_path: file_path.clone(),
        file_name,
        auto_delete: payload.auto_delete,
        delete_after_minutes: payload.delete_after_minutes,
        burn_after_read: payload.burn_after_read,
        ip_restriction: payload.ip_restriction,
        created_at: state.clock.now(),
    };

    let item = match state.stores.contents.create(new_content).await {
        Ok(item) => item,
        Err(e) => {
            if let Some(path) = &file_path
                && let Err(cleanup) = state.stores.files.delete(path).await
            {
                tracing::warn!(path = %path, error = %cleanup, "failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        content_id = %item.public_id,
        kind = %item.kind,
        has_file = item.file_path.is_some(),
        auto_delete = item.auto_delete,
        burn_after_read = item.burn_after_read,
        ip_restriction = item.ip_restriction,
        "content created"
    );

    Ok(Json(CreateContentResponse {
        success: true,
        url: format!("/view/{}", item.public_id),
        uuid: item.public_id,
    }))
}

#[debug_handler]
async fn view_content(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Path(uuid): Path<String>,
) -> Result<Response, AppError> {
    let coordinator = state.coordinator();

    match coordinator.view(&uuid, &ip, state.clock.now()).await? {
        ViewOutcome::NotFound | ViewOutcome::Expired => {
            Err(AppError::External(StatusCode::NOT_FOUND, CONTENT_NOT_FOUND))
        }
        ViewOutcome::DeniedIp => Err(AppError::External(StatusCode::FORBIDDEN, ALREADY_VIEWED)),
        ViewOutcome::Visible(visible) => {
            let burn = visible.should_burn();
            let response = Json(ViewContentResponse {
                success: true,
                content: visible.view,
            })
            .into_response();

            if !burn {
                return Ok(response);
            }

            // Burn once the body is written out (or the client goes away).
            let (delivered, on_delivered) = oneshot::channel();
            coordinator.burn_after(visible.item, on_delivered);
            Ok(response.map(|body| Body::new(CompletionBody::new(body, delivered))))
        }
    }
}

#[debug_handler]
async fn download_content(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Response, AppError> {
    let not_found = || AppError::External(StatusCode::NOT_FOUND, FILE_NOT_FOUND);

    let item = state
        .coordinator()
        .downloadable(&uuid, state.clock.now())
        .await?
        .ok_or_else(not_found)?;

    let Some(path) = item.file_path.as_deref() else {
        return Err(not_found());
    };

    let Some(file) = state.stores.files.open(path).await? else {
        tracing::warn!(content_id = %item.public_id, path = %path, "file missing on disk");
        return Err(not_found());
    };

    let file_name = item.file_name.as_deref().unwrap_or("download");
    let headers = [
        (
            CONTENT_TYPE,
            image_mime_for(file_name)
                .unwrap_or("application/octet-stream")
                .to_string(),
        ),
        (CONTENT_DISPOSITION, attachment(file_name)),
    ];

    tracing::info!(content_id = %item.public_id, "file downloaded");

    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

#[debug_handler]
async fn delete_content(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.coordinator().delete(&uuid).await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// Bytes that must be escaped in an RFC 5987 `filename*` value.
const ATTR_CHARS: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// `Content-Disposition` value with an ASCII fallback and the UTF-8 name.
fn attachment(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let encoded = utf8_percent_encode(file_name, ATTR_CHARS);

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
