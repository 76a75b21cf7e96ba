mod api;
mod commands;
mod config;
mod ui;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "vanish")]
#[command(about = "Share notes, links and images that delete themselves")]
#[command(version)]
#[command(after_help = "Examples:
  vanish send 'the wifi password is hunter2' --burn    Deleted once read
  vanish send https://example.com/doc --ttl 10         Deleted 10 min after first view
  vanish send --file photo.png --ip-once               One view per IP address
  vanish open <id-or-link>                             View shared content
  vanish download <id-or-link>                         Save a shared image")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Share text, a link or an image
    #[command(after_help = "Examples:
  vanish send 'meet at 6'
  vanish send 'one-time secret' --burn
  vanish send https://example.com --ttl 5
  vanish send --file screenshot.png 'see attached'
  echo 'secret' | vanish send -")]
    Send {
        /// Text or link to share (use '-' to read from stdin)
        content: Option<String>,
        /// Image to attach (jpeg, png, gif or webp, at most 10 MB)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Delete this many minutes after the first view
        #[arg(short, long, value_name = "MINUTES", value_parser = clap::value_parser!(i64).range(1..))]
        ttl: Option<i64>,
        /// Delete as soon as it is read once
        #[arg(short, long)]
        burn: bool,
        /// Allow only one view per IP address
        #[arg(long)]
        ip_once: bool,
    },

    /// View shared content (counts as a view)
    #[command(after_help = "Example: vanish open 3f1c9a52-6c1e-4f5e-9d1a-2b8f0c7e4a11")]
    Open {
        /// Content ID or share link
        id: String,
    },

    /// Save the image behind a file share (does not count as a view)
    #[command(after_help = "Example: vanish download <id> -o photo.png")]
    Download {
        /// Content ID or share link
        id: String,
        /// Where to save the file (default: its original name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete shared content now
    #[command(after_help = "Example: vanish delete 3f1c9a52-6c1e-4f5e-9d1a-2b8f0c7e4a11")]
    Delete {
        /// Content ID or share link
        id: String,
    },

    /// Generate shell completions
    #[command(after_help = "Examples:
  vanish completions bash > ~/.bash_completion.d/vanish
  vanish completions zsh > ~/.zfunc/_vanish
  vanish completions fish > ~/.config/fish/completions/vanish.fish")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        ui::print_error(&err);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = envy::prefixed("VANISH_").from_env::<Config>()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            content,
            file,
            ttl,
            burn,
            ip_once,
        } => {
            commands::send::run(
                &config,
                content.as_deref(),
                file.as_deref(),
                ttl,
                burn,
                ip_once,
            )
            .await
        }
        Commands::Open { id } => commands::open::run(&config, &id).await,
        Commands::Download { id, output } => {
            commands::download::run(&config, &id, output.as_deref()).await
        }
        Commands::Delete { id } => commands::delete::run(&config, &id).await,
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "vanish", &mut std::io::stdout());
            Ok(())
        }
    }
}
