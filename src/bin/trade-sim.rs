// Trade Cost Simulator - CLI
// Live cost estimation against a streamed order book, plus offline one-shot runs

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use trade_cost_simulator::config::{Config, ConfigError, LoggingConfig};
use trade_cost_simulator::display::{render_dashboard, DashboardView, CLEAR_SCREEN};
use trade_cost_simulator::logging::init_logging;
use trade_cost_simulator::{
    parse_book_message, FeedIngestor, FeedSettings, OrderBookHistory, OrderParams, ResultPublisher,
    SimulationEngine, SimulationWorker, WakeSignal,
};

const DEFAULT_CONFIG: &str = include_str!("../../config.toml.example");

#[derive(Parser)]
#[command(name = "trade-sim")]
#[command(version)]
#[command(about = "Live order book trade cost simulator", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Stream the order book and keep estimating costs until Ctrl+C
    Run {
        #[command(flatten)]
        order: OrderOverrides,
    },

    /// Estimate costs once against a saved order book frame
    Simulate {
        /// JSON file holding one feed frame
        #[arg(short, long)]
        book: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        order: OrderOverrides,
    },
}

/// Command-line replacements for the configured order
#[derive(Args, Debug, Clone, Copy)]
struct OrderOverrides {
    /// Order quantity
    #[arg(short, long)]
    quantity: Option<f64>,

    /// Volatility used by the impact and maker/taker models
    #[arg(long)]
    volatility: Option<f64>,

    /// Fee tier as a fraction (0.001 = 0.1%)
    #[arg(short, long)]
    fee_tier: Option<f64>,
}

impl OrderOverrides {
    fn resolve(&self, config: &Config) -> Result<OrderParams, Box<dyn std::error::Error>> {
        Ok(config
            .simulation
            .with_overrides(self.quantity, self.volatility, self.fee_tier)?)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            init_logging(&LoggingConfig::default(), cli.verbose)?;
            init_config(&cli.config, force)?;
        }

        Commands::Run { order } => {
            let config = load_config_or_exit(&cli.config);
            init_logging(&config.logging, cli.verbose)?;
            let params = order.resolve(&config)?;
            run_live(config, params).await?;
        }

        Commands::Simulate { book, json, order } => {
            let config = load_config_or_exit(&cli.config);
            let console = LoggingConfig {
                log_file: None,
                ..config.logging.clone()
            };
            init_logging(&console, cli.verbose)?;
            let params = order.resolve(&config)?;
            simulate_once(&config, &params, &book, json)?;
        }
    }

    Ok(())
}

/// Load config or exit with a hint
fn load_config_or_exit(path: &str) -> Config {
    match Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration Error");
            eprintln!("{}", e);

            if matches!(e, ConfigError::FileRead(_)) && !Path::new(path).exists() {
                eprintln!();
                eprintln!("💡 Quick fix:");
                eprintln!("   1. Run: trade-sim init");
                eprintln!("   2. Edit {} if needed", path);
                eprintln!("   3. Try again");
            }

            std::process::exit(1);
        }
    }
}

fn init_config(path: &str, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if Path::new(path).exists() && !force {
        warn!("⚠️  {} already exists, skipping (use --force to overwrite)", path);
        return Ok(());
    }

    fs::write(path, DEFAULT_CONFIG)?;
    info!("📝 Created {}", path);
    info!("💡 Next step: trade-sim run");
    Ok(())
}

async fn run_live(config: Config, params: OrderParams) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "🚀 Starting trade cost simulator for {} on {}",
        config.feed.asset, config.feed.exchange
    );

    let history = Arc::new(OrderBookHistory::new(config.history.capacity));
    let publisher = Arc::new(ResultPublisher::new());
    let wake = Arc::new(WakeSignal::new());

    let engine = SimulationEngine::new(config.model.simulation_config());
    let worker = SimulationWorker::new(
        engine,
        params,
        Arc::clone(&history),
        Arc::clone(&publisher),
        Arc::clone(&wake),
    )?;
    let worker_handle = worker.spawn()?;

    let ingestor = Arc::new(FeedIngestor::new(
        FeedSettings::from_config(&config.feed),
        Arc::clone(&history),
        Arc::clone(&wake),
    ));
    let feed_task = {
        let ingestor = Arc::clone(&ingestor);
        tokio::spawn(async move { ingestor.run().await })
    };

    let mut refresh = tokio::time::interval(config.display.refresh_interval());
    refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                let result = publisher.get();
                let latest = history.latest();
                let view = DashboardView {
                    exchange: &config.feed.exchange,
                    asset: &config.feed.asset,
                    params: &params,
                    result: &result,
                    latest_book: latest.as_deref(),
                    history_len: history.len(),
                    history_capacity: history.capacity(),
                    feed: Some(ingestor.stats()),
                    max_latency_ms: config.display.max_latency_ms,
                };
                draw(&render_dashboard(&view));
            }
            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    error!("❌ Failed to listen for Ctrl+C: {}", e);
                }
                info!("🛑 Received shutdown signal");
                break;
            }
        }
    }

    // Producer first, then the consumer
    wake.request_shutdown();
    ingestor.close();
    if let Err(e) = feed_task.await {
        error!("❌ Feed task failed: {}", e);
    }

    match worker_handle.join() {
        Ok(cycles) => info!("✅ Shutdown complete ({} simulation cycles)", cycles),
        Err(_) => error!("❌ Simulation worker panicked"),
    }

    let stats = ingestor.stats();
    println!();
    println!(
        "📊 Session: {} snapshots ingested, {} frames dropped, {} sessions",
        stats.snapshots_ingested, stats.frames_dropped, stats.sessions_established
    );

    Ok(())
}

fn draw(frame: &str) {
    let mut stdout = std::io::stdout().lock();
    let drawn = writeln!(stdout, "{}{}", CLEAR_SCREEN, frame).and_then(|_| stdout.flush());
    if let Err(e) = drawn {
        warn!("Failed to draw dashboard: {}", e);
    }
}

fn simulate_once(
    config: &Config,
    params: &OrderParams,
    book_path: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(book_path)?;
    let book = parse_book_message(&content)?;
    info!("📂 Loaded {} book from {}", book.symbol(), book_path);

    let engine = SimulationEngine::new(config.model.simulation_config());
    let result = engine.compute(params.quantity, params.volatility, params.fee_tier, Some(&book))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let view = DashboardView {
        exchange: &config.feed.exchange,
        asset: book.symbol(),
        params,
        result: &result,
        latest_book: Some(&book),
        history_len: 1,
        history_capacity: 1,
        feed: None,
        max_latency_ms: config.display.max_latency_ms,
    };
    println!("{}", render_dashboard(&view));

    Ok(())
}
