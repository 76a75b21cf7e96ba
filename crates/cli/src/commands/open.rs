//! Open shared content.
//!
//! Opening is a view: it starts the deletion timer, uses up this IP's view of
//! restricted content and burns burn-after-read content. The content itself
//! goes to stdout; everything else goes to stderr.

use anyhow::Result;
use owo_colors::OwoColorize;
use shared::api::{ContentKind, ContentView};

use crate::{api::Api, commands::content_id, config::Config, ui};

pub async fn run(config: &Config, target: &str) -> Result<()> {
    let id = content_id(target)?;
    let api = Api::new(config.api_url.clone());

    let viewed = ui::spin("Opening...", api.view_content(&id)).await?;
    let view = viewed.content;

    print_content(&view);

    if view.has_file {
        let name = view.file_name.as_deref().unwrap_or("file");
        ui::info(&format!(
            "Attached {}. Download it with: vanish download {}",
            ui::bold(name),
            id
        ));
    }
    if let Some(seconds) = view.remaining_seconds {
        ui::info(&format!("Deleted in {}", ui::remaining(seconds)));
    }
    if view.ip_restriction {
        ui::info("You will not be able to open this again from this IP address");
    }
    if view.burn_after_read {
        ui::warning("This content has now been deleted (burn after read)");
    }

    Ok(())
}

fn print_content(view: &ContentView) {
    let Some(content) = view.content.as_deref() else {
        return;
    };

    match view.kind {
        ContentKind::Link => println!("{}", content.underline()),
        ContentKind::Text | ContentKind::File => println!("{content}"),
    }
}
