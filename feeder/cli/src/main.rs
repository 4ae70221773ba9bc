//! Feeder - Headless Driver for the Feed View Model
//!
//! Wires the engine to a content repository and a silent audio player, reads
//! commands from stdin and prints every view snapshot as one JSON line on
//! stdout. Effects and logs go to stderr so stdout stays machine-readable.
//!
//! # Usage
//!
//! ```bash
//! # Offline, from a seed file
//! feeder --seed feed.json
//!
//! # Remote feed
//! FEEDER_ID_TOKEN=... feeder --feed-url https://example.com/api/feed
//!
//! # Verbose logging
//! RUST_LOG=debug feeder --seed feed.json
//! ```
//!
//! # Commands
//!
//! `reload`, `fav <id>`, `play <id>`, `filter all|favorites`, `quit`

mod commands;
mod player;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use feeder_core::{
    load_config, load_config_from_path, ConfigOverrides, ContentRepository, FeedEvent,
    FeedItem, FeedItemId, FeedViewModel, FeederConfig, HttpFeedRepository, InMemoryRepository,
    LoadState, ViewModelConfig, ViewState,
};
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commands::Command;
use player::SilentPlayer;

/// Feeder - drive the feed view model from the command line
#[derive(Parser, Debug)]
#[command(name = "feeder")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "FEEDER_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Feed endpoint (overrides config and FEEDER_FEED_URL)
    #[arg(long, value_name = "URL")]
    feed_url: Option<String>,

    /// Serve the feed from a JSON file instead of the network
    #[arg(long, value_name = "FILE", conflicts_with = "feed_url")]
    seed: Option<PathBuf>,

    /// Start with the favorites-only filter
    #[arg(long)]
    favorites_only: bool,

    /// Loading time before the progress indicator appears
    #[arg(long, value_name = "MS")]
    show_delay_ms: Option<u64>,

    /// Minimum time the progress indicator stays visible
    #[arg(long, value_name = "MS")]
    min_visible_ms: Option<u64>,

    /// Do not load the feed on start
    #[arg(long)]
    no_refresh: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref url) = self.feed_url {
            overrides = overrides.with_feed_url(url.clone());
        }
        if self.favorites_only {
            overrides = overrides.with_favorites_only(true);
        }
        if self.no_refresh {
            overrides = overrides.with_refresh_on_start(false);
        }
        if let Some(ms) = self.show_delay_ms {
            overrides = overrides.with_show_delay_ms(ms);
        }
        if let Some(ms) = self.min_visible_ms {
            overrides = overrides.with_min_visible_ms(ms);
        }
        overrides
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("feeder=info,feeder_core=info"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn build_repository(args: &Args, config: &FeederConfig) -> Result<Arc<dyn ContentRepository>> {
    if let Some(ref seed) = args.seed {
        let json = std::fs::read_to_string(seed)
            .with_context(|| format!("Failed to read seed file: {}", seed.display()))?;
        let repository = InMemoryRepository::from_json_str(&json)
            .with_context(|| format!("Invalid seed file: {}", seed.display()))?;
        info!(path = %seed.display(), "Serving feed from seed file");
        return Ok(Arc::new(repository));
    }

    let Some(ref url) = config.feed_url else {
        anyhow::bail!("No feed configured: pass --seed or --feed-url, or set [feed] url");
    };
    let repository = HttpFeedRepository::new(url.clone(), config.request_timeout)
        .context("Failed to create HTTP client")?
        .with_id_token(config.id_token.clone());
    info!(url = %url, authenticated = config.id_token.is_some(), "Serving remote feed");
    Ok(Arc::new(repository))
}

/// Keep the full item list so commands can address items hidden by filters
fn spawn_catalog(repository: &Arc<dyn ContentRepository>) -> watch::Receiver<Vec<FeedItem>> {
    let (tx, rx) = watch::channel(Vec::new());
    let mut content = repository.observe_content();
    tokio::spawn(async move {
        while let Some(state) = content.next().await {
            if let LoadState::Success(contents) = state {
                if tx.send(contents.items).is_err() {
                    break;
                }
            }
        }
    });
    rx
}

fn find_item(catalog: &watch::Receiver<Vec<FeedItem>>, id: &FeedItemId) -> Option<FeedItem> {
    catalog.borrow().iter().find(|item| &item.id == id).cloned()
}

fn print_state(state: &ViewState) -> Result<()> {
    let line = serde_json::to_string(state)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}

fn handle_command(
    vm: &FeedViewModel,
    catalog: &watch::Receiver<Vec<FeedItem>>,
    command: Command,
) -> Result<()> {
    let event = match command {
        Command::Reload => FeedEvent::Reload,
        Command::Filter(filters) => FeedEvent::ChangeFilter(filters),
        Command::Favorite(ref id) | Command::Play(ref id) => {
            let Some(item) = find_item(catalog, id) else {
                eprintln!("unknown item: {id}");
                return Ok(());
            };
            if matches!(command, Command::Play(_)) {
                FeedEvent::TogglePlayback(item)
            } else {
                FeedEvent::ToggleFavorite(item)
            }
        }
        Command::Quit => return Ok(()),
    };
    vm.dispatch(event)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    let mut config = match args.config {
        Some(ref path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;
    args.overrides().apply(&mut config);
    config.validate()?;
    info!(source = %config.source(), "Configuration loaded");

    let repository = build_repository(&args, &config)?;
    let catalog = spawn_catalog(&repository);
    let mut vm = FeedViewModel::new(
        Arc::clone(&repository),
        SilentPlayer::default(),
        ViewModelConfig::from(&config),
    );

    let mut effects = vm
        .take_effects()
        .context("Effect stream unavailable")?;
    let mut state = vm.state();
    print_state(&state.borrow_and_update())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    warn!("View model stopped publishing");
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                print_state(&snapshot)?;
            }
            Some(effect) = effects.recv() => {
                eprintln!("effect: {}", effect.message());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => handle_command(&vm, &catalog, command)?,
                    Err(e) => eprintln!("{e}"),
                }
            }
            _ = &mut ctrl_c => {
                info!("Received Ctrl-C, shutting down");
                break;
            }
        }
    }

    vm.shutdown().await;
    Ok(())
}
