use std::sync::Arc;

use spa_server::compression::CompressionEngine;
use spa_server::config::{AppState, Config, DEFAULT_CONFIG_PATH};
use spa_server::{logger, server, ServerError};

fn main() -> Result<(), ServerError> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;

    // Worker count comes from config, defaulting to the number of CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), ServerError> {
    logger::init(&cfg)?;

    if let Err(e) = run(cfg).await {
        logger::log_error(&e.to_string());
        return Err(e);
    }
    Ok(())
}

async fn run(cfg: Config) -> Result<(), ServerError> {
    let addr = cfg.get_socket_addr()?;
    let state = Arc::new(AppState::new(cfg)?);

    if state.config.compression_enabled() {
        let engine = CompressionEngine::from_config(&state.config);
        let report = tokio::task::spawn_blocking(move || engine.compress_root())
            .await
            .map_err(std::io::Error::other)??;
        logger::log_compression_done(&report);
    }

    let listener = server::create_listener(addr)?;
    logger::log_server_start(&listener.local_addr()?, &state.config);

    server::serve_until(listener, state, server::shutdown_signal()).await;
    Ok(())
}
