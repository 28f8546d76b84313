//! HTTP handlers for the Squelch server.
//!
//! Every request locks the world for its whole duration, so each call is
//! one exclusive simulation tick.

use crate::config::Config;
use crate::metrics;
use crate::world::World;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use squelch_protocol::{codec, ChatRecord, Frame};
use std::sync::Arc;
use tenvis_squelch_core::{ActorId, RouterError, Transmission};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub struct AppState {
    pub world: Mutex<World>,
}

impl AppState {
    /// Build the world described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the world cannot be built from `config`.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            world: Mutex::new(World::from_config(config)?),
        })
    }
}

/// Request errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Router(#[from] RouterError),

    #[error("Unknown actor: {0}")]
    UnknownActor(ActorId),

    #[error("Actor has no power receiver: {0}")]
    NoPowerReceiver(ActorId),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::Router(RouterError::ChannelNotFound(_)) => {
                (StatusCode::NOT_FOUND, "channel_not_found")
            }
            ApiError::Router(RouterError::MessageTooLarge { .. }) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "message_too_large")
            }
            ApiError::Router(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_channel"),
            ApiError::UnknownActor(_) => (StatusCode::NOT_FOUND, "unknown_actor"),
            ApiError::NoPowerReceiver(_) => (StatusCode::UNPROCESSABLE_ENTITY, "no_power_receiver"),
        };
        metrics::record_error(kind);
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Body of `POST /transmit`.
#[derive(Debug, Deserialize)]
pub struct TransmitRequest {
    pub source: ActorId,
    pub message: String,
    pub channel: String,
    #[serde(default)]
    pub device: Option<ActorId>,
    #[serde(default = "default_escape")]
    pub escape_markup: bool,
}

fn default_escape() -> bool {
    true
}

/// Chime played by a transmission.
#[derive(Debug, Serialize)]
pub struct ChimeView {
    pub sound: String,
    pub targets: Vec<ActorId>,
}

/// Response of `POST /transmit`.
#[derive(Debug, Serialize)]
pub struct TransmitResponse {
    pub outcome: &'static str,
    pub recipients: Vec<ActorId>,
    pub chime: Option<ChimeView>,
}

/// Body of `POST /actors/:actor/power`.
#[derive(Debug, Deserialize)]
pub struct PowerRequest {
    pub powered: bool,
}

/// Build the HTTP router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/transmit", post(transmit_handler))
        .route("/sessions/:actor/inbox", get(inbox_handler))
        .route("/actors/:actor/power", post(power_handler))
        .route("/replay", get(replay_handler))
        .with_state(state)
}

/// Build the world, start the exporter and serve HTTP until shutdown.
///
/// # Errors
///
/// Returns an error if the world cannot be built or the listener cannot bind.
/// A failed exporter is logged and serving continues.
pub async fn run_server(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(&config)?);

    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!(error = %e, "Prometheus exporter unavailable");
        }
    }

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Squelch listening");

    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let channels = state.world.lock().await.channel_count();
    Json(serde_json::json!({
        "healthy": true,
        "version": env!("CARGO_PKG_VERSION"),
        "channels": channels,
    }))
}

/// Route one transmission.
async fn transmit_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TransmitRequest>,
) -> Result<Json<TransmitResponse>, ApiError> {
    let world = state.world.lock().await;
    if !world.contains(request.source) {
        return Err(ApiError::UnknownActor(request.source));
    }

    let mut transmission =
        Transmission::new(request.source, request.message, request.channel);
    if let Some(device) = request.device {
        transmission = transmission.via(device);
    }
    if !request.escape_markup {
        transmission = transmission.raw_markup();
    }

    let summary = world.transmit(&transmission)?;
    debug!(
        source = %transmission.source,
        channel = %transmission.channel,
        recipients = summary.recipient_count(),
        "Transmit request handled"
    );

    Ok(Json(TransmitResponse {
        outcome: metrics::outcome_label(summary.outcome),
        chime: summary.chime.map(|cue| ChimeView {
            sound: cue.sound,
            targets: cue.targets,
        }),
        recipients: summary.recipients,
    }))
}

/// Drain an actor's session inbox: chat records and chimes, oldest first.
async fn inbox_handler(
    State(state): State<Arc<AppState>>,
    Path(actor): Path<u64>,
) -> Result<Json<Vec<Frame>>, ApiError> {
    let actor = ActorId(actor);
    let world = state.world.lock().await;
    if !world.contains(actor) {
        return Err(ApiError::UnknownActor(actor));
    }

    let frames = world
        .outbox()
        .drain(actor)
        .iter()
        .filter_map(|bytes| {
            codec::decode(bytes)
                .map_err(|e| {
                    warn!(actor = %actor, error = %e, "Failed to decode queued frame");
                    metrics::record_error("decode");
                })
                .ok()
        })
        .collect();
    Ok(Json(frames))
}

/// Switch a relay's power between ticks.
async fn power_handler(
    State(state): State<Arc<AppState>>,
    Path(actor): Path<u64>,
    Json(request): Json<PowerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = ActorId(actor);
    let mut world = state.world.lock().await;
    match world.set_power(actor, request.powered) {
        Some(powered) => Ok(Json(serde_json::json!({ "actor": actor, "powered": powered }))),
        None if world.contains(actor) => Err(ApiError::NoPowerReceiver(actor)),
        None => Err(ApiError::UnknownActor(actor)),
    }
}

/// Recent chat records kept for replays.
async fn replay_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ChatRecord>> {
    Json(state.world.lock().await.replay().recent())
}
