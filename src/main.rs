use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use stickerbot::aliases::{AliasStore, AliasTable, SqliteAliasStore};
use stickerbot::apis::foursquare::FoursquareCatalog;
use stickerbot::catalog::CatalogStore;
use stickerbot::commands::CommandHandler;
use stickerbot::config::Config;
use stickerbot::refresh::{RefreshOutcome, RefreshScheduler};
use stickerbot::resolver::{MatchKind, Resolver};
use stickerbot::server::{self, AppState};
use stickerbot::slack::SlackWebhook;
use stickerbot::types::CatalogSource;
use stickerbot::{logging, metrics};

#[derive(Parser)]
#[command(name = "stickerbot")]
#[command(about = "Sticker slash-command webhook")]
#[command(version)]
struct Cli {
    /// Optional TOML config file; environment variables take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the slash-command webhook and keep the catalog refreshed
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Fetch the catalog once and print the valid stickers
    Refresh,
    /// Show which sticker a query resolves to
    Resolve {
        #[arg(required = true)]
        query: Vec<String>,
    },
}

/// Picks the alias store from config: libSQL when built with `db`, else the SQLite file.
async fn open_alias_store(config: &Config) -> Option<Arc<dyn AliasStore>> {
    #[cfg(feature = "db")]
    {
        if let Some(libsql) = &config.libsql {
            match stickerbot::aliases::libsql_store::LibsqlAliasStore::connect(libsql).await {
                Ok(store) => return Some(Arc::new(store)),
                Err(e) => error!("Error connecting to libSQL, falling back: {}", e),
            }
        }
    }
    #[cfg(not(feature = "db"))]
    {
        if config.libsql.is_some() {
            warn!("LIBSQL_URL is set but this build has no `db` feature; ignoring it");
        }
    }

    let path = config.alias_db_path.as_ref()?;
    match SqliteAliasStore::open(path) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            error!("Error opening alias store at {}: {}", path.display(), e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    logging::init_logging(&config.log_dir);

    let catalog = Arc::new(CatalogStore::new());
    let source: Arc<dyn CatalogSource> = Arc::new(FoursquareCatalog::new(
        config.catalog_url.clone(),
        config.catalog_token.clone(),
    ));
    let scheduler = Arc::new(RefreshScheduler::new(
        catalog.clone(),
        source,
        config.refresh_interval,
    ));

    match cli.command {
        Commands::Serve { port } => {
            let metrics = metrics::init_metrics();
            let aliases = Arc::new(AliasTable::load(open_alias_store(&config).await).await);
            let refresh_task = scheduler.clone().spawn();

            let chat = Arc::new(SlackWebhook::new(config.webhook_url.clone()));
            let handler = Arc::new(CommandHandler::new(
                catalog,
                aliases.clone(),
                chat,
                config.default_size,
            ));
            let state = AppState {
                handler,
                slack_token: Arc::from(config.slack_token.as_str()),
                metrics,
            };

            let result = server::start_server(state, port.unwrap_or(config.port)).await;
            refresh_task.abort();
            aliases.flush().await;
            info!("Stopped");
            result?;
        }
        Commands::Refresh => match scheduler.refresh().await {
            RefreshOutcome::Replaced { entries, dropped } => {
                println!("✅ Loaded {entries} stickers ({dropped} records dropped)");
                for entry in catalog.all().iter() {
                    println!("   - {} [{}]", entry.name(), entry.id());
                }
            }
            RefreshOutcome::Failed(message) => {
                anyhow::bail!("catalog refresh failed: {message}");
            }
            RefreshOutcome::Skipped => warn!("Another refresh was already running"),
        },
        Commands::Resolve { query } => {
            if let RefreshOutcome::Failed(message) = scheduler.refresh().await {
                anyhow::bail!("catalog refresh failed: {message}");
            }
            let aliases = Arc::new(AliasTable::load(open_alias_store(&config).await).await);
            let resolver = Resolver::new(catalog, aliases);
            let query = query.join(" ");

            match resolver.resolve(&query) {
                Some(hit) => {
                    let how = match hit.kind {
                        MatchKind::Id => "object id".to_string(),
                        MatchKind::Alias => "alias".to_string(),
                        MatchKind::Fuzzy { distance } => format!("name, distance {distance}"),
                    };
                    println!("🔎 {} [{}] via {}", hit.entry.name(), hit.entry.id(), how);
                    match hit.entry.image_url(config.default_size) {
                        Some(url) => println!("   {url}"),
                        None => println!("   no image at size {}", config.default_size),
                    }
                }
                None => println!("⚠️  No sticker matches \"{query}\""),
            }
        }
    }
    Ok(())
}
