//! babelwiki server — a lazily-materializing encyclopedia.
//!
//! Every `GET /{keyword}` either returns the stored article or generates
//! one on the spot, seeded with context from related prior articles.

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;

use babelwiki_generation::{OpenAiClient, SamplingParams};
use babelwiki_shared::{init_config, load_config, validate_api_key};
use babelwiki_storage::Storage;

use routes::AppState;

/// babelwiki — serve an encyclopedia that writes itself on first visit.
#[derive(Parser)]
#[command(
    name = "babelwiki",
    version,
    about = "Serve an alternate-reality encyclopedia that generates pages on first visit.",
    long_about = None,
)]
struct Cli {
    /// Listen port (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Database file path (overrides config).
    #[arg(long)]
    db: Option<String>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write a default config file to ~/.babelwiki/ and exit.
    #[arg(long)]
    init_config: bool,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Initialize tracing based on CLI flags.
fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "babelwiki=info",
        1 => "babelwiki=debug",
        _ => "babelwiki=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli);

    if cli.init_config {
        let path = init_config()?;
        println!("Config initialized at: {}", path.display());
        return Ok(());
    }

    let config = load_config()?;
    let api_key = validate_api_key(&config)?;

    let db_path = match &cli.db {
        Some(p) => std::path::PathBuf::from(p),
        None => config.storage.resolved_db_path()?,
    };
    let port = cli.port.unwrap_or(config.server.port);

    info!(db = %db_path.display(), "opening article store");
    let storage = Storage::open(&db_path).await?;

    let generator = OpenAiClient::new(&config.openai, api_key)?;
    let params = SamplingParams::from(&config.openai);

    let state = Arc::new(AppState {
        storage,
        generator: Arc::new(generator),
        params,
        index_limit: config.server.index_limit,
    });

    let addr: SocketAddr = format!("{}:{port}", config.server.bind)
        .parse()
        .map_err(|e| eyre!("invalid bind address: {e}"))?;

    info!(%addr, model = %config.openai.model, "babelwiki listening");
    warp::serve(routes::routes(state)).run(addr).await;

    Ok(())
}
