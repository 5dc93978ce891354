//! Chatlift CLI - extract a conversation from a share URL

use chatlift::export::{self, ExportFormat};
use chatlift::{Config, ExtractError, ParserRegistry};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "chatlift")]
#[command(author = "Chatlift Team")]
#[command(version)]
#[command(about = "Extract normalized conversations from AI chat share pages", long_about = None)]
struct Args {
    /// Share URL to extract (e.g. https://chatgpt.com/share/...)
    url: Option<String>,

    /// Output format: markdown, text, or json
    #[arg(short, long)]
    format: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "~/.chatlift/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initialize a new config file with defaults
    #[arg(long)]
    init: bool,

    /// List supported share URL patterns
    #[arg(long)]
    list_platforms: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("chatlift={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Handle --init flag
    if args.init {
        let config_path = expand_path(&args.config);
        if config_path.exists() {
            tracing::warn!("Config file already exists: {}", config_path.display());
            return Ok(());
        }
        Config::create_default(&config_path)?;
        tracing::info!("Created default config at: {}", config_path.display());
        return Ok(());
    }

    // Load configuration
    let config_path = expand_path(&args.config);
    let config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };

    let registry = ParserRegistry::new(&config)?;

    if args.list_platforms {
        for pattern in registry.supported_patterns() {
            println!("{pattern}");
        }
        return Ok(());
    }

    let Some(url) = args.url else {
        anyhow::bail!("no share URL given; run with --help for usage");
    };

    let format_name = args.format.unwrap_or_else(|| config.output.format.clone());
    let Some(format) = ExportFormat::parse_format(&format_name) else {
        anyhow::bail!("unknown output format: {format_name}");
    };

    match registry.parse(&url).await {
        Ok(result) => {
            print!("{}", export::render(&result, format)?);
            Ok(())
        }
        Err(ExtractError::InvalidUrl(url)) => {
            eprintln!("Not a valid URL: {url}");
            std::process::exit(2);
        }
        Err(ExtractError::UnsupportedPlatform(url)) => {
            eprintln!("No parser for this URL: {url}");
            eprintln!("Run with --list-platforms to see supported share URL patterns.");
            std::process::exit(2);
        }
        Err(ExtractError::ConversationNotFound(url)) => {
            eprintln!("Conversation not found (the share link may have been deleted): {url}");
            std::process::exit(3);
        }
        Err(err @ ExtractError::NoMessagesFound { .. }) => {
            eprintln!("{err}");
            eprintln!("The page format may have changed; try again with --verbose for details.");
            std::process::exit(4);
        }
        Err(err) => Err(err.into()),
    }
}

/// Expand ~ to home directory
fn expand_path(path: &PathBuf) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(path.strip_prefix("~").unwrap());
        }
    }
    path.clone()
}
