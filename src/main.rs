use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tributary::app::AppContext;
use tributary::cli::{commands, Cli, Commands};
use tributary::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays the item list
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Feed { display } => {
            commands::show_feed(&ctx, display).await?;
        }
        Commands::Search { query, display } => {
            commands::search(&ctx, &query, display).await?;
        }
        Commands::Follow { urls, list } => {
            commands::follow(&ctx, &urls, &list)?;
        }
        Commands::CacheInfo => {
            commands::cache_info(&ctx)?;
        }
    }

    Ok(())
}
