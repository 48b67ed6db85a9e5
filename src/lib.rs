pub mod audit;
pub mod commands;
pub mod error;
pub mod formats;
pub mod models;
pub mod round;
pub mod session;
pub mod settings;
pub mod store;
pub mod timer;
mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use log::LevelFilter;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};

pub use error::{DebateError, DebateResult};
pub use formats::FormatCatalog;
pub use models::{DebateFormat, DebateSession, SegmentDefinition, TimerEvent};
pub use round::DebateRound;
pub use session::RecentSessions;
pub use settings::{AppConfig, SettingsStore, StorageBackend};
pub use store::Persistence;
pub use timer::{Clock, SystemClock, TimerController, TimerEngine, TimerNotification};

use commands::Reply;
use models::TimerEventKind;
use timer::display::format_clock;

pub fn run() -> anyhow::Result<()> {
    // RUST_LOG still wins; DEBATE_TIMER_DEBUG only raises the default
    let level = if settings::debug_requested(settings::env_lookup) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    log::info!("Debate timer starting up...");

    let data_dir = settings::resolve_data_dir(settings::env_lookup);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let settings_store = SettingsStore::new(&data_dir)?;
    if !settings_store.path().exists() {
        settings_store.update(settings_store.config())?;
    }
    let mut config = settings_store.config();
    config.apply_overrides(settings::env_lookup);
    log::info!(
        "Using {:?} storage in {} (tick {}ms, history {})",
        config.storage,
        data_dir.display(),
        config.tick_interval().as_millis(),
        config.history_capacity()
    );

    let store = settings::open_store(&config, &data_dir)?;
    let catalog = FormatCatalog::load(store.clone());
    let history = RecentSessions::load(store, config.history_capacity());
    let round = DebateRound::new(catalog, history, Arc::new(SystemClock));
    let export_dir = std::env::current_dir().context("failed to resolve working directory")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    runtime.block_on(async move {
        let controller = TimerController::new(round, config.tick_interval());
        drive(controller, export_dir).await
    })
}

/// Reads commands from stdin until `quit`, EOF or Ctrl-C.
async fn drive(controller: TimerController, export_dir: PathBuf) -> anyhow::Result<()> {
    let mut updates = controller.subscribe();
    let announcer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(TimerNotification::Event(event)) if event.kind == TimerEventKind::Over => {
                    println!(
                        "** {} is out of time ({})",
                        event.timer_id,
                        format_clock(event.elapsed_time)
                    );
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => log::debug!("Skipped {skipped} timer updates"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("{}", controller.get_snapshot().await.format);
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let command = match commands::parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match commands::execute(&controller, command, &export_dir).await {
            Ok(Reply::Text(text)) => println!("{text}"),
            Ok(Reply::Quit) => break,
            Err(message) => eprintln!("{message}"),
        }
    }

    controller.shutdown().await;
    announcer.abort();
    log::info!("Debate timer shut down");
    Ok(())
}
