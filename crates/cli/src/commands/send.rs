//! Share text, a link or an image.
//!
//! Flow:
//! 1. Collect content (argument or stdin) and the optional image
//! 2. Work out the content type the way the web form does
//! 3. Upload to the API
//! 4. Print the share link

use std::io::{self, Read};
use std::path::Path;

use anyhow::{Result, anyhow, bail};
use reqwest::Url;
use shared::api::{ContentKind, MAX_FILE_BYTES, image_mime_for};

use crate::{
    api::{Api, NewShare, ShareFile},
    config::Config,
    ui,
};

pub async fn run(
    config: &Config,
    content: Option<&str>,
    file: Option<&Path>,
    ttl_minutes: Option<i64>,
    burn: bool,
    ip_once: bool,
) -> Result<()> {
    // Read from stdin if content is "-"
    let content = match content {
        Some("-") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Some(buf.trim_end().to_string())
        }
        other => other.map(str::to_string),
    }
    .filter(|c| !c.is_empty());

    let file = match file {
        Some(path) => Some(load_image(path).await?),
        None => None,
    };

    if content.is_none() && file.is_none() {
        bail!("Nothing to send: pass some content, '-' to read stdin, or --file");
    }

    let share = NewShare {
        kind: detect_kind(content.as_deref(), file.is_some()),
        content,
        file,
        delete_after_minutes: ttl_minutes,
        burn_after_read: burn,
        ip_restriction: ip_once,
    };

    let api = Api::new(config.api_url.clone());
    let created = ui::spin("Uploading...", api.create_content(share)).await?;

    // The link goes to stdout so it can be piped.
    println!("{}", config.share_url(&created.url));
    ui::success(&format!("Shared! ID: {}", ui::bold(&created.uuid)));

    if let Some(minutes) = ttl_minutes {
        ui::info(&format!(
            "Deleted {minutes} minute(s) after it is first opened"
        ));
    }
    if burn {
        ui::info("Deleted as soon as it is read");
    }
    if ip_once {
        ui::info("Each IP address can open it once");
    }

    Ok(())
}

/// File when only a file is given, link when the content is a single
/// http(s) URL, text otherwise.
pub fn detect_kind(content: Option<&str>, has_file: bool) -> ContentKind {
    match content {
        None if has_file => ContentKind::File,
        Some(text) if is_link(text) => ContentKind::Link,
        _ => ContentKind::Text,
    }
}

fn is_link(text: &str) -> bool {
    let text = text.trim();
    !text.contains(char::is_whitespace)
        && Url::parse(text).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

async fn load_image(path: &Path) -> Result<ShareFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Not a file: {}", path.display()))?;

    let mime = image_mime_for(&name)
        .ok_or_else(|| anyhow!("Only image files can be shared (jpeg, png, gif, webp): {name}"))?;

    let size = tokio::fs::metadata(path).await?.len();
    if size > MAX_FILE_BYTES as u64 {
        bail!("{name} is too large ({size} bytes, max {MAX_FILE_BYTES})");
    }

    Ok(ShareFile {
        name,
        mime,
        bytes: tokio::fs::read(path).await?,
    })
}
