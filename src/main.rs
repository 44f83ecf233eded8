use anyhow::{Context, Result};
use clap::Parser;
use newsdesk::api::FeedClient;
use newsdesk::config::Config;
use newsdesk::render::{render_items, status_line};
use newsdesk::session::{initial_mode, load_pages, Session};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "newsdesk", about = "Categorized, searchable news feed in the terminal")]
struct Args {
    /// Config file (default: ~/.config/newsdesk/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Feed API base URL (overrides config and NEWSDESK_API_URL)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Start in this category
    #[arg(long, value_name = "ID", conflicts_with = "search")]
    category: Option<String>,

    /// Start with a search
    #[arg(long, value_name = "TEXT")]
    search: Option<String>,

    /// Print this many pages and exit instead of starting the interactive session
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pages: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the feed on stdout
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => Config::default_path().context("HOME environment variable not set")?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config.apply_env();
    if let Some(url) = args.api_url {
        config.api_url = url;
    }

    let settings = config
        .client_settings()
        .context("Invalid feed API configuration")?;
    tracing::debug!(?settings, "Client settings");
    let client = FeedClient::new(settings).context("Failed to create HTTP client")?;

    let mode = initial_mode(&config, args.category, args.search.as_deref())
        .context("--search needs non-blank text")?;

    if let Some(pages) = args.pages {
        let controller = load_pages(&client, mode, pages).await;
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{}", render_items(&controller, 0, config.summary_width))?;
        writeln!(stdout, "{}", status_line(&controller))?;
        return Ok(());
    }

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut session = Session::new(client, config, mode, std::io::stdout());
    session.run(input).await?;
    Ok(())
}
