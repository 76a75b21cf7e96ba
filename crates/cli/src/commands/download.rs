//! Download the image behind a file share.
//!
//! Downloads do not count as views, but the server still refuses once the
//! deletion timer has run out.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Result, bail};
use percent_encoding::percent_decode_str;
use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
};

use crate::{api::Api, commands::content_id, config::Config, ui};

pub async fn run(config: &Config, target: &str, output: Option<&Path>) -> Result<()> {
    let id = content_id(target)?;
    let api = Api::new(config.api_url.clone());

    let (path, written) = ui::spin("Downloading...", async {
        let mut response = api.download_content(&id).await?;

        let path = match output {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(attachment_name(response.headers()).unwrap_or_else(|| id.clone())),
        };

        let mut file = open_output(&path, output.is_some()).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        anyhow::Ok((path, written))
    })
    .await?;

    ui::success(&format!(
        "Saved {} ({written} bytes)",
        ui::bold(&path.display().to_string())
    ));

    Ok(())
}

/// File name from `Content-Disposition`, reduced to a bare file name.
fn attachment_name(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    let params = || value.split(';').map(str::trim);

    let name = params()
        .find_map(|p| {
            p.strip_prefix("filename*=UTF-8''")
                .map(|n| percent_decode_str(n).decode_utf8_lossy().into_owned())
        })
        .or_else(|| {
            params()
                .find_map(|p| p.strip_prefix("filename="))
                .map(|n| n.trim_matches('"').to_string())
        })?;

    Path::new(&name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
}

/// Opens the destination. Names chosen by the server never replace an
/// existing file; an explicit `-o` path does.
async fn open_output(path: &Path, overwrite: bool) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    match options.open(path).await {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            bail!("{} already exists", path.display())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::context::TestContext;
    use reqwest::header::HeaderValue;
    use wiremock::{
        Mock, ResponseTemplate,
        matchers::{method, path},
    };

    fn disposition(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_DISPOSITION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn prefers_the_utf8_file_name() {
        let headers = disposition(
            "attachment; filename=\"r_sum_.jpg\"; filename*=UTF-8''r%C3%A9sum%C3%A9.jpg",
        );

        assert_eq!(attachment_name(&headers).as_deref(), Some("résumé.jpg"));
    }

    #[test]
    fn falls_back_to_the_quoted_file_name() {
        let headers = disposition("attachment; filename=\"cat.png\"");

        assert_eq!(attachment_name(&headers).as_deref(), Some("cat.png"));
    }

    #[test]
    fn strips_directories_from_the_file_name() {
        let headers = disposition("attachment; filename=\"../../.bashrc\"");

        assert_eq!(attachment_name(&headers).as_deref(), Some(".bashrc"));
        assert_eq!(attachment_name(&HeaderMap::new()), None);
    }

    #[test]
    fn decodes_malformed_escapes_leniently() {
        let headers = disposition("attachment; filename*=UTF-8''100%25%zz.png");

        assert_eq!(attachment_name(&headers).as_deref(), Some("100%%zz.png"));
    }

    #[tokio::test]
    async fn server_chosen_names_never_replace_existing_files() {
        let ctx = TestContext::new().await;
        let existing = ctx.path(".bashrc");
        std::fs::write(&existing, b"alias ll='ls -l'").unwrap();

        let err = open_output(&existing, false).await.unwrap_err();

        assert!(err.to_string().ends_with(".bashrc already exists"));
        assert_eq!(std::fs::read(&existing).unwrap(), b"alias ll='ls -l'");
    }

    #[tokio::test]
    async fn explicit_output_paths_are_overwritten() {
        let ctx = TestContext::new().await;
        let existing = ctx.path("saved.png");
        std::fs::write(&existing, b"old contents that are longer").unwrap();

        let mut file = open_output(&existing, true).await.unwrap();
        file.write_all(b"new").await.unwrap();
        file.flush().await.unwrap();

        assert_eq!(std::fs::read(&existing).unwrap(), b"new");
    }

    #[tokio::test]
    async fn writes_the_file_to_the_requested_path() {
        let ctx = TestContext::new().await;
        Mock::given(method("GET"))
            .and(path("/api/content/abc/download"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-disposition", "attachment; filename=\"cat.png\"")
                    .set_body_bytes(b"\x89PNG data".to_vec()),
            )
            .expect(1)
            .mount(&ctx.mock_server)
            .await;

        let output = ctx.path("saved.png");
        run(&ctx.config, "abc", Some(&output)).await.unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"\x89PNG data");
    }

    #[tokio::test]
    async fn missing_files_are_reported() {
        let ctx = TestContext::new().await;
        Mock::given(method("GET"))
            .and(path("/api/content/abc/download"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "success": false,
                "error": "File not found",
            })))
            .mount(&ctx.mock_server)
            .await;

        let output = ctx.path("saved.png");
        let err = run(&ctx.config, "abc", Some(&output)).await.unwrap_err();

        assert_eq!(err.to_string(), "File not found");
        assert!(!output.exists());
    }
}
