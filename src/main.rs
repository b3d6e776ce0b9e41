use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hbnb::config::Config;
use hbnb::console::Console;
use hbnb::storage::FileStorage;

#[derive(Parser)]
#[command(name = "hbnb")]
#[command(about = "Command shell for creating, inspecting, updating and destroying records")]
struct Cli {
    /// JSON file the registry is loaded from and saved to
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Never print the prompt
    #[arg(long)]
    no_prompt: bool,
}

/// Initialize tracing on stderr so stdout carries only command output
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "hbnb=warn".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let stdin = std::io::stdin();
    let show_prompt = !cli.no_prompt && stdin.is_terminal();
    let config = Config::from_env().with_overrides(cli.file, show_prompt);
    tracing::debug!(?config, "starting shell");

    let storage = FileStorage::open(&config.file_path);
    let mut console = Console::new(storage, std::io::stdout().lock());
    console
        .run(stdin.lock(), config.active_prompt())
        .context("command loop failed")?;

    Ok(())
}
