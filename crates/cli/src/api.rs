//! HTTP client for the Vanish API.

use anyhow::Result;
use reqwest::{
    Client, Response,
    multipart::{Form, Part},
};
use shared::api::{
    ContentKind, CreateContentResponse, DEFAULT_DELETE_AFTER_MINUTES, ViewContentResponse, form,
};

/// Everything needed to share one item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShare {
    pub kind: ContentKind,
    pub content: Option<String>,
    pub file: Option<ShareFile>,
    /// Start a deletion timer of this many minutes on the first view.
    pub delete_after_minutes: Option<i64>,
    pub burn_after_read: bool,
    pub ip_restriction: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShareFile {
    pub name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

pub struct Api {
    pub http: Client,
    pub base_url: String,
}

impl Api {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Uploads a new item and returns its id and viewer path.
    pub async fn create_content(&self, share: NewShare) -> Result<CreateContentResponse> {
        let mut form = Form::new()
            .text(form::TYPE, share.kind.as_str())
            .text(
                form::AUTO_DELETE,
                share.delete_after_minutes.is_some().to_string(),
            )
            .text(
                form::DELETE_AFTER_MINUTES,
                share
                    .delete_after_minutes
                    .unwrap_or(DEFAULT_DELETE_AFTER_MINUTES)
                    .to_string(),
            )
            .text(form::BURN_AFTER_READ, share.burn_after_read.to_string())
            .text(form::IP_RESTRICTION, share.ip_restriction.to_string());

        if let Some(content) = share.content {
            form = form.text(form::CONTENT, content);
        }
        if let Some(file) = share.file {
            let part = Part::bytes(file.bytes)
                .file_name(file.name)
                .mime_str(file.mime)?;
            form = form.part(form::FILE, part);
        }

        let response = Self::check_response(
            self.http
                .post(format!("{}/api/content", self.base_url))
                .multipart(form)
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Views an item. This counts as a view: it may start the deletion timer
    /// or burn the item.
    pub async fn view_content(&self, id: &str) -> Result<ViewContentResponse> {
        let response = Self::check_response(
            self.http
                .get(format!("{}/api/content/{}", self.base_url, id))
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Starts downloading an item's file. The caller streams the body.
    pub async fn download_content(&self, id: &str) -> Result<Response> {
        Self::check_response(
            self.http
                .get(format!("{}/api/content/{}/download", self.base_url, id))
                .send()
                .await?,
        )
        .await
    }

    /// Deletes an item. Succeeds if it is already gone.
    pub async fn delete_content(&self, id: &str) -> Result<()> {
        Self::check_response(
            self.http
                .delete(format!("{}/api/content/{}", self.base_url, id))
                .send()
                .await?,
        )
        .await?;

        Ok(())
    }

    async fn check_response(response: Response) -> Result<Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            // Try to extract error message from JSON response
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|json| {
                    json.get("error")
                        .or_else(|| json.get("message"))
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                })
                .unwrap_or_else(|| {
                    if body.is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("Request failed")
                            .to_string()
                    } else {
                        body
                    }
                });

            anyhow::bail!("{}", message);
        }

        Ok(response)
    }
}
