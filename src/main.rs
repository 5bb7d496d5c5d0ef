//! txview main entry point

mod console;

use anyhow::{anyhow, Context};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::runtime::Runtime;
use txview_config::{Config, ConfigError};
use txview_core::TransactionView;
use txview_providers::{FixtureData, ProviderSet};

#[derive(Parser, Debug)]
#[command(name = "txview")]
#[command(version = "0.1.0")]
#[command(about = "Browse, filter and approve card transactions", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Fixture file, overrides data.fixture_path
    #[arg(short, long)]
    fixtures: Option<PathBuf>,

    /// Read commands from a file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let (mut config, config_missing) = match Config::load(&args.config) {
        Ok(config) => (config, false),
        Err(ConfigError::FileNotFound { .. }) => (Config::default(), true),
        Err(e) => return Err(anyhow!("{}", e.to_details())),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if config_missing {
        log::warn!("Config file {} not found, using defaults", args.config.display());
    }
    if let Some(fixtures) = args.fixtures {
        config.data.fixture_path = fixtures;
    }

    let rt = Runtime::new()?;
    rt.block_on(async {
        log::info!("Loading fixtures from {}", config.data.fixture_path.display());
        let data = FixtureData::load(&config.data.fixture_path)
            .await
            .with_context(|| format!("failed to load {}", config.data.fixture_path.display()))?;

        let providers = ProviderSet::in_memory(
            data,
            config.data.page_size,
            Duration::from_millis(config.data.latency_ms),
        );
        let view = TransactionView::new(providers, config.view.clone());

        let mut stdout = std::io::stdout();
        if let Err(error) = view.start().await {
            log::error!("Initial load failed: {}", error);
            println!("{}", error.to_details());
        }
        print!("{}", console::render_transactions(&view));

        match args.script {
            Some(path) => {
                let file = tokio::fs::File::open(&path)
                    .await
                    .with_context(|| format!("failed to open script {}", path.display()))?;
                console::run(&view, BufReader::new(file), &mut stdout).await
            }
            None => console::run(&view, BufReader::new(tokio::io::stdin()), &mut stdout).await,
        }
    })
}
