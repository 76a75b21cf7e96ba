//! Delete shared content before it expires.
//!
//! The command succeeds even if the content is already gone (idempotent).

use anyhow::Result;

use crate::{api::Api, commands::content_id, config::Config, ui};

pub async fn run(config: &Config, target: &str) -> Result<()> {
    let id = content_id(target)?;

    let api = Api::new(config.api_url.clone());
    ui::spin("Deleting...", api.delete_content(&id)).await?;

    ui::success("Deleted");

    Ok(())
}
