//! Headless simulation entry point.
//!
//! Loads content, populates a world, and ticks it in real time until the
//! tick limit is reached or the process is interrupted.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use combat_content::ContentFactory;
use combat_core::CombatConfig;
use runtime::{EventLog, WorldRuntime};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Settings read from the environment (and `.env`).
struct SimConfig {
    data_dir: PathBuf,
    seed: u64,
    /// Stop after this many ticks; zero runs until interrupted.
    max_ticks: u64,
    /// Wall-clock length of one tick.
    tick_interval: Duration,
}

impl SimConfig {
    fn from_env() -> Self {
        let number = |key: &str, default: u64| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        Self {
            data_dir: std::env::var_os("CONTENT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("crates/game/content/data")),
            seed: number("SIM_SEED", 1),
            max_ticks: number("SIM_TICKS", 0),
            tick_interval: Duration::from_millis(number(
                "SIM_TICK_MS",
                1000 / CombatConfig::TICKS_PER_SECOND,
            )),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = SimConfig::from_env();
    let dirs = directories::ProjectDirs::from("", "", "combat-sim")
        .context("no home directory to keep logs in")?;

    setup_logging(&dirs.cache_dir().join("logs"))?;

    let content = ContentFactory::new(&config.data_dir)
        .load_all()
        .with_context(|| format!("loading content from {}", config.data_dir.display()))?;
    let mut runtime = WorldRuntime::from_content(content, config.seed)?;
    let mut log = EventLog::open(dirs.data_dir().join(format!("events-{}.jsonl", config.seed)))?;
    info!(events = %log.path().display(), seed = config.seed, "simulation starting");

    let mut interval = tokio::time::interval(config.tick_interval);
    let mut now = runtime.now();
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
        now += 1;
        let report = runtime.tick(now)?;
        for (actor, fault) in &report.faults {
            warn!(actor = %actor, error = %fault, "creature fault");
        }
        log.append(now, &report.events)?;
        if config.max_ticks > 0 && now >= config.max_ticks {
            break;
        }
    }

    log.flush()?;
    info!(
        ticks = now,
        events = log.written(),
        actors = runtime.world().actors.len(),
        "simulation stopped"
    );
    Ok(())
}

/// Setup logging to a file under `log_dir`.
fn setup_logging(log_dir: &std::path::Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, "combat-sim.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Keep the file writer alive for the whole process.
    std::mem::forget(guard);

    info!("Log file: {}/combat-sim.log", log_dir.display());
    Ok(())
}
