use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beatsync_core::{
    load_config, validate_config, CatalogSearchQuery, CatalogStore, Config, ConfigError,
    DownloadOutcome, FileSettings, HttpPageFetcher, ListingPaginator, PageFetcher, SettingsStore,
    SingleFlightDownloader, SqliteCatalog, SyncController,
};

const USAGE: &str = "usage: beatsync [update | search <text> | download <url> <destination>]";

/// What the binary was asked to do.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Update,
    Search(String),
    Download { url: String, destination: PathBuf },
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args {
        [] => Ok(Command::Update),
        [cmd] if cmd == "update" => Ok(Command::Update),
        [cmd, text] if cmd == "search" => Ok(Command::Search(text.clone())),
        [cmd, url, destination] if cmd == "download" => Ok(Command::Download {
            url: url.clone(),
            destination: PathBuf::from(destination),
        }),
        _ => bail!("{}", USAGE),
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging; BEATSYNC_LOG_FORMAT=json switches to JSON lines
    let json = std::env::var("BEATSYNC_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    // Determine config path
    let config_path = std::env::var("BEATSYNC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let config = load_or_default(&config_path)?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Database path: {:?}", config.database.path);
    info!("Settings path: {:?}", config.settings.path);

    match command {
        Command::Update => update(&config).await,
        Command::Search(text) => search(&config, text),
        Command::Download { url, destination } => download(&config, &url, &destination).await,
    }
}

/// Load the config file, falling back to defaults when there is none.
fn load_or_default(path: &Path) -> Result<Config> {
    info!("Loading configuration from {:?}", path);
    match load_config(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            warn!("No configuration file at {:?}, using defaults", path);
            Ok(Config::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load config from {:?}", path)),
    }
}

fn open_catalog(config: &Config) -> Result<SqliteCatalog> {
    Ok(SqliteCatalog::new(&config.database.path)
        .context("Failed to open catalog database")?
        .with_batch_size(config.catalog.batch_size))
}

async fn update(config: &Config) -> Result<()> {
    let fetcher: Arc<dyn PageFetcher> = Arc::new(
        HttpPageFetcher::new(&config.listing).context("Failed to create listing client")?,
    );
    let paginator = ListingPaginator::new(fetcher, config.listing.clone())
        .context("Invalid listing configuration")?;
    let catalog: Arc<dyn CatalogStore> = Arc::new(open_catalog(config)?);
    let settings: Arc<dyn SettingsStore> = Arc::new(FileSettings::new(&config.settings.path));

    let controller = SyncController::new(paginator, catalog, settings);

    // Interrupting drops the run before the watermark moves
    let report = tokio::select! {
        result = controller.update() => result.context("Catalog update failed")?,
        _ = shutdown_signal() => {
            warn!("Interrupted, watermark left unchanged");
            bail!("catalog update interrupted");
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn search(config: &Config, text: String) -> Result<()> {
    let catalog = open_catalog(config)?;
    let results = catalog
        .search(&CatalogSearchQuery {
            query: text,
            limit: 100,
        })
        .context("Catalog search failed")?;

    for record in &results {
        println!("{}\t{}", record.id, record.display_name);
    }
    info!("{} of {} sets matched", results.len(), catalog.count()?);
    Ok(())
}

async fn download(config: &Config, url: &str, destination: &Path) -> Result<()> {
    let downloader =
        SingleFlightDownloader::new(&config.downloader).context("Failed to create downloader")?;

    match downloader.download(url, destination).await {
        DownloadOutcome::Completed { bytes } => {
            println!("{} bytes written to {}", bytes, destination.display());
            Ok(())
        }
        DownloadOutcome::Skipped => bail!("a download to {:?} is already running", destination),
        DownloadOutcome::Failed => bail!("download of {} failed", url),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_update_is_default() {
        assert_eq!(parse_args(&[]).unwrap(), Command::Update);
        assert_eq!(parse_args(&args(&["update"])).unwrap(), Command::Update);
    }

    #[test]
    fn test_parse_search_and_download() {
        assert_eq!(
            parse_args(&args(&["search", "freedom"])).unwrap(),
            Command::Search("freedom".to_string())
        );
        assert_eq!(
            parse_args(&args(&["download", "http://x/1.osz", "maps/1.osz"])).unwrap(),
            Command::Download {
                url: "http://x/1.osz".to_string(),
                destination: PathBuf::from("maps/1.osz"),
            }
        );
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(parse_args(&args(&["frobnicate"])).is_err());
        assert!(parse_args(&args(&["download", "http://x"])).is_err());
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.catalog.batch_size, 500);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[catalog\nbatch_size = ").unwrap();
        assert!(load_or_default(&path).is_err());
    }
}
