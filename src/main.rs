use std::process::ExitCode;
use std::sync::Arc;

use nocache_server::{logger, server, AppState, Config, ServerError};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Logging setup itself may be what failed
            if tracing::dispatcher::has_been_set() {
                tracing::error!("{e}");
            } else {
                eprintln!("nocache-server: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), ServerError> {
    let cfg = Config::load()?;
    logger::init(&cfg.logging)?;

    // Create Tokio runtime; thread count follows the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        tracing::info!("Using {workers} worker threads");
    }

    let runtime = runtime_builder.build().map_err(ServerError::Runtime)?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), ServerError> {
    let cwd = std::env::current_dir().map_err(|source| ServerError::Root {
        path: std::path::PathBuf::from("."),
        source,
    })?;
    let state = Arc::new(AppState::new(cfg, &cwd)?);

    let addr = state.config.socket_addr()?;
    let listener = server::create_listener(addr)?;

    logger::log_server_start(&addr, &state.root);

    server::start_server_loop(listener, state).await;
    Ok(())
}
