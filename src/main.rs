use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use crew_vote::{
    config::Config,
    net::run_vote_client,
    server::{self, status::StatusState},
    types::ClientState,
    vote::VoteSession,
};
use tokio::{net::TcpListener, signal, sync::mpsc};
use tracing_subscriber::EnvFilter;

const VOTE_QUEUE_CAPACITY: usize = 16;
const DEFAULT_RECONNECT_MAX_SECS: u64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".into());
    let config = Config::from_file(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;

    let session = VoteSession::new(
        config.client.local_client_id,
        config.lobby.submarines.clone(),
        config.lobby.game_modes.clone(),
    );
    let state = ClientState::shared(session);

    let (vote_tx, vote_rx) = mpsc::channel(VOTE_QUEUE_CAPACITY);

    {
        let ws_url = config.client.server_url.clone();
        let state = state.clone();
        let max_backoff = Duration::from_secs(
            config.client.reconnect_max_secs.unwrap_or(DEFAULT_RECONNECT_MAX_SECS),
        );
        tokio::spawn(async move {
            run_vote_client(ws_url, state, vote_rx, max_backoff).await;
        });
    }

    let status_state = StatusState {
        token: config.status.token.clone(),
        state,
        vote_tx,
    };
    let router = server::build_status_router(status_state);

    let status_addr: SocketAddr = format!("{}:{}", config.status.host, config.status.port)
        .parse()
        .context("invalid status host/port")?;
    let listener = TcpListener::bind(status_addr).await?;
    tracing::info!("status http listening on {status_addr}");

    tokio::select! {
        res = axum::serve(listener, router) => {
            res.context("status server error")?;
        }
        _ = signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}
