use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use sesgo_core::{
    block::BlockSchedule, config::LabConfig, error::SessionError, participant::ParticipantState,
    participant::RoundOrder, stimuli::StimulusCatalog,
};
use sesgo_session::{ClientMessage, Clock, MonotonicClock, ServerMessage, SessionScheduler};
use sha2::{Digest, Sha256};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

/// Shared state for the gateway server.
///
/// Participant records are checked out of the registry for the duration
/// of a connection, so exactly one task ever mutates a given record.
#[derive(Clone)]
struct AppState {
    config: Arc<LabConfig>,
    blocks: Arc<BlockSchedule>,
    catalog: Arc<StimulusCatalog>,
    /// `None` marks a record currently owned by a live connection.
    registry: Arc<RwLock<HashMap<String, Option<ParticipantState>>>>,
    /// One clock for every session. Trial timestamps persist across
    /// reconnects, so the delay gates must keep reading the same origin.
    clock: Arc<dyn Clock>,
    active_ws: Arc<AtomicUsize>,
}

/// The gateway HTTP + WebSocket server.
///
/// - `GET /ws/:participant/:round` — one session stream per connection
/// - `GET /health` — health check
pub struct GatewayServer {
    config: Arc<LabConfig>,
    registry: Arc<RwLock<HashMap<String, Option<ParticipantState>>>>,
    clock: Arc<dyn Clock>,
    active_ws: Arc<AtomicUsize>,
    host: String,
    port: u16,
}

impl GatewayServer {
    pub fn new(config: LabConfig) -> Self {
        let host = config.gateway.host.clone();
        let port = config.gateway.port;
        Self {
            config: Arc::new(config),
            registry: Arc::new(RwLock::new(HashMap::new())),
            clock: Arc::new(MonotonicClock::new()),
            active_ws: Arc::new(AtomicUsize::new(0)),
            host,
            port,
        }
    }

    /// Number of active WebSocket connections.
    pub fn active_connections(&self) -> Arc<AtomicUsize> {
        self.active_ws.clone()
    }

    /// Start the server. This spawns a background task and returns the join handle.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        let state = AppState {
            blocks: Arc::new(self.config.block_schedule()),
            catalog: Arc::new(self.config.catalog()),
            config: self.config,
            registry: self.registry,
            clock: self.clock,
            active_ws: self.active_ws,
        };

        let app = Router::new()
            .route("/health", get(health))
            .route("/ws/:participant/:round", get(ws_upgrade))
            .layer(CorsLayer::permissive())
            .with_state(state.clone());

        let addr = format!("{}:{}", self.host, self.port);

        tokio::spawn(async move {
            let listener = match tokio::net::TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("Gateway failed to bind {}: {}", addr, e);
                    return;
                }
            };
            tracing::info!("Gateway listening on {}", addr);
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Gateway server error: {}", e);
            }
        })
    }
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

/// GET /ws/:participant/:round — WebSocket upgrade.
async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Path((participant, round)): Path<(String, u32)>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state, participant, round))
}

/// Counterbalancing for first-time participants. Derived from a stable
/// hash of the code, so the assignment survives reconnects, restarts and
/// rebuilds on a newer toolchain.
fn assign_round_order(code: &str) -> RoundOrder {
    let digest = Sha256::digest(code.as_bytes());
    if digest[0] % 2 == 0 {
        RoundOrder::Direct
    } else {
        RoundOrder::Rotated
    }
}

/// Handle one participant's session connection.
///
/// Messages are processed strictly in arrival order, one response per
/// message. The participant record is checked out for the lifetime of
/// the connection and returned on close.
async fn handle_ws(socket: WebSocket, state: AppState, participant: String, round: u32) {
    let checked_out = {
        let mut registry = state.registry.write().await;
        match registry.entry(participant.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().take(),
            Entry::Vacant(entry) => {
                let order = assign_round_order(&participant);
                entry.insert(None);
                Some(ParticipantState::new(participant.clone(), order))
            }
        }
    };

    let (mut ws_tx, mut ws_rx) = socket.split();
    let record = match checked_out {
        Some(record) => record,
        None => {
            // another connection owns this participant
            let err = ServerMessage::error(SessionError::InvalidInput(
                "participant already has a live session",
            ));
            let json = serde_json::to_string(&err).unwrap_or_default();
            let _ = ws_tx.send(Message::Text(json.into())).await;
            return;
        }
    };

    state.active_ws.fetch_add(1, Ordering::Relaxed);
    tracing::info!(participant = %participant, round, "session connected");

    let mut scheduler = SessionScheduler::new(
        &state.config,
        &state.blocks,
        (*state.catalog).clone(),
        record,
        round,
        state.clock.clone(),
    );

    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => {
                let response = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        // a handler panic must not take the connection down
                        // with a half-applied message
                        match std::panic::catch_unwind(AssertUnwindSafe(|| {
                            scheduler.handle(client_msg)
                        })) {
                            Ok(response) => response,
                            Err(_) => {
                                tracing::error!(participant = %participant, "handler panicked");
                                ServerMessage::error(SessionError::Internal(
                                    "message handling failed".to_string(),
                                ))
                            }
                        }
                    }
                    Err(e) => {
                        tracing::debug!(participant = %participant, "undecodable message: {e}");
                        ServerMessage::error(SessionError::UnrecognizedMessage)
                    }
                };
                let json = serde_json::to_string(&response).unwrap_or_default();
                if ws_tx.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // return the record so a reconnect resumes where it left off
    let record = scheduler.into_participant();
    state
        .registry
        .write()
        .await
        .insert(participant.clone(), Some(record));
    state.active_ws.fetch_sub(1, Ordering::Relaxed);
    tracing::info!(participant = %participant, round, "session closed");
}
