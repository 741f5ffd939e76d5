//! HTTP and WebSocket front end for a browser-side renderer.

use crate::app::{App, BroadcastSurface, LatestState, SharedState};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use kinesis_data::{GenerationReport, Genome, HudState};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

pub struct ServerState {
    pub tx: broadcast::Sender<String>,
    pub latest: SharedState,
    pub clients: AtomicUsize,
}

impl ServerState {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(64);
        Self {
            tx,
            latest: Arc::new(Mutex::new(LatestState::default())),
            clients: AtomicUsize::new(0),
        }
    }

    /// Render surface feeding this server.
    #[must_use]
    pub fn surface(&self) -> BroadcastSurface {
        BroadcastSurface::new(self.tx.clone(), self.latest.clone())
    }

    fn read<T, F: FnOnce(&LatestState) -> T>(&self, f: F) -> T {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        f(&latest)
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    frame: u64,
    clients: usize,
}

#[derive(Serialize)]
pub struct ChampionResponse {
    pub genome: Genome,
    pub hex_dna: String,
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/hud", get(hud))
        .route("/api/history", get(history))
        .route("/api/champion", get(champion))
        .route("/ws", get(websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<Arc<ServerState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        frame: state.read(|l| l.frame),
        clients: state.clients.load(Ordering::Relaxed),
    })
}

async fn hud(State(state): State<Arc<ServerState>>) -> Json<HudState> {
    Json(state.read(|l| l.hud))
}

async fn history(State(state): State<Arc<ServerState>>) -> Json<Vec<GenerationReport>> {
    Json(state.read(|l| l.history.iter().cloned().collect()))
}

async fn champion(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let Some(genome) = state.read(|l| l.champion.clone()) else {
        return (StatusCode::NOT_FOUND, "No generation has completed yet").into_response();
    };
    match kinesis_io::to_hex_dna(&genome) {
        Ok(hex_dna) => Json(ChampionResponse { genome, hex_dna }).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| websocket(socket, state))
}

async fn websocket(stream: WebSocket, state: Arc<ServerState>) {
    let (mut sender, mut receiver) = stream.split();
    let client_id = Uuid::new_v4();
    let total = state.clients.fetch_add(1, Ordering::Relaxed) + 1;
    tracing::info!(client = %client_id, total = total, "Viewer connected");

    let mut rx = state.tx.subscribe();
    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(frame) => {
                    if sender.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                // A slow viewer skips frames instead of stalling the loop.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Viewers only watch; inbound messages are drained until close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    let total = state.clients.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
    tracing::info!(client = %client_id, total = total, "Viewer disconnected");
}

/// Runs the frame loop paced at `harness.target_fps` until `running` is
/// cleared or a frame fails, then shuts the app down.
async fn frame_loop(mut app: App, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let fps = app.harness().population().config().harness.target_fps.max(1);
    let mut interval = tokio::time::interval(Duration::from_micros(1_000_000 / fps));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let outcome = loop {
        interval.tick().await;
        if !running.load(Ordering::Relaxed) {
            break Ok(());
        }
        if let Err(e) = app.harness_mut().frame() {
            tracing::error!(error = %e, "Frame failed");
            break Err(e);
        }
    };
    app.shutdown()?;
    outcome
}

async fn simulation_stopped(running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

/// Serves the API on `127.0.0.1:port` while the frame loop runs. Ctrl-C
/// stops both and tears the cohort down.
pub async fn serve(mut app: App, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(ServerState::new());
    app.harness_mut().add_surface(Box::new(state.surface()));

    let running = app.running();
    let simulation = tokio::spawn(frame_loop(app, running.clone()));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    let shutdown_flag = running.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("Shutdown requested"),
                _ = simulation_stopped(shutdown_flag.clone()) => {
                    tracing::warn!("Simulation stopped, closing server");
                }
            }
            shutdown_flag.store(false, Ordering::Relaxed);
        })
        .await?;

    running.store(false, Ordering::Relaxed);
    simulation.await?
}
