use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use neguev_dispatch::api;
use neguev_dispatch::config::Config;
use neguev_dispatch::engine::agent::run_courier_agent;
use neguev_dispatch::error::AppError;
use neguev_dispatch::positioning::SimulatedDevice;
use neguev_dispatch::state::AppState;
use neguev_dispatch::store::Store;
use neguev_dispatch::suggest::GeminiSuggester;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let store = Store::from_config(&config).await?;
    let mut app_state =
        AppState::new(store, config.event_buffer_size).with_poll(config.poll.clone());
    match GeminiSuggester::from_config(&config.suggest) {
        Some(suggester) => {
            app_state = app_state.with_suggester(Arc::new(suggester), config.suggest.max_dishes);
        }
        None => tracing::warn!("SUGGEST_API_KEY not set, menu suggestions disabled"),
    }
    let shared_state = Arc::new(app_state);

    let app = api::rest::router(shared_state.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // the board receiver keeps the agent's channel open
    let mut agent = None;
    if let Some(courier_id) = config.courier_agent_id.clone() {
        let (board_tx, board_rx) = watch::channel(None);
        let device = Arc::new(SimulatedDevice::new(config.courier_origin, config.poll.courier));
        let task = tokio::spawn(run_courier_agent(
            shared_state.clone(),
            courier_id,
            device,
            config.poll.courier,
            board_tx,
            shutdown_rx.clone(),
        ));
        agent = Some((board_rx, task));
    }

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        store = ?config.store_backend,
        courier_agent = agent.is_some(),
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    let _ = shutdown_tx.send(true);
    if let Some((_board_rx, task)) = agent {
        if let Err(err) = task.await {
            tracing::error!(error = %err, "courier agent panicked");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
