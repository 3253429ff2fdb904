//! Void Stage
//!
//! Composition root for the scene lifecycle engine. Assembles the loading
//! tracker, resource provider, transitions and scene orchestrator once, then
//! tours the configured scenes on the in-memory host.
//!
//! Run with: cargo run -p void_runtime
//!       or: cargo run --bin void-stage
//!
//! Press Ctrl+C to cancel the tour; the stage still shuts down cleanly.

mod stage;
mod stage_config;

use tokio_util::sync::CancellationToken;

use crate::stage::Stage;
use crate::stage_config::{ConfigError, StageConfig};

fn main() {
    // Read config first so it can pick the log filter
    let (config, config_errors) = StageConfig::load();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter())).init();

    for e in &config_errors {
        match e {
            ConfigError::Override { .. } => log::warn!("{}", e),
            _ => log::warn!("{}; using defaults", e),
        }
    }
    config.print_summary();

    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("PANIC: {}", panic_info);
    }));

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, cancelling...");
        on_interrupt.cancel();
    }) {
        log::warn!("Failed to set Ctrl+C handler: {}", e);
    }

    let stage = Stage::assemble(config);
    let result = runtime.block_on(stage.run(&cancel));

    match result {
        Ok(()) => log::info!("Goodbye"),
        Err(e) => {
            log::error!("Stage failed: {}", e);
            std::process::exit(1);
        }
    }
}
