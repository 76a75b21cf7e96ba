//! Subcommand implementations.

pub mod delete;
pub mod download;
pub mod open;
pub mod send;

use anyhow::{Result, bail};

/// Accepts a bare content id or any link that ends in one: a share link
/// (`.../view/{id}`) or an API URL (`.../api/content/{id}[/download]`).
pub fn content_id(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let path = trimmed.split(['?', '#']).next().unwrap_or(trimmed);

    let mut segments = path.split('/').filter(|s| !s.is_empty()).rev();
    let mut id = segments.next();
    if id == Some("download") {
        id = segments.next();
    }

    match id {
        Some(id) if !id.contains(':') => Ok(id.to_string()),
        _ => bail!("Not a content ID or share link: {input}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_accepts_ids_and_links() {
        let id = "3f1c9a52-6c1e-4f5e-9d1a-2b8f0c7e4a11";

        assert_eq!(content_id(id).unwrap(), id);
        assert_eq!(content_id(&format!(" {id}\n")).unwrap(), id);
        assert_eq!(
            content_id(&format!("https://vanish.example/view/{id}")).unwrap(),
            id
        );
        assert_eq!(
            content_id(&format!("http://localhost:3001/api/content/{id}/download")).unwrap(),
            id
        );
        assert_eq!(
            content_id(&format!("https://vanish.example/view/{id}/?ref=chat#top")).unwrap(),
            id
        );
    }

    #[test]
    fn content_id_rejects_empty_input() {
        assert!(content_id("").is_err());
        assert!(content_id("https://").is_err());
        assert!(content_id("///").is_err());
    }
}
