//! HTTP API server: axum router and request handlers.
//!
//! The server runs on the tokio async runtime while the render thread
//! runs on a plain `std::thread`. Handlers never touch the matrix; they
//! push [`RenderCommand`] values down the channel and read back the
//! shared [`DisplayStatus`].

use crate::config::HardwareGeometry;
use crate::cycle::CyclePhase;
use crate::flight::{Airport, FlightInfo};
use crate::render::{DisplayMode, DisplayStatus, RenderCommand};
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Channel to send commands to the render thread
    pub command_tx: Sender<RenderCommand>,
    /// Shared display status (render thread writes, handlers read)
    pub status: Arc<Mutex<DisplayStatus>>,
    /// Panel geometry, reported by `GET /api/v1/panel`
    pub geometry: HardwareGeometry,
}

type ApiError = (StatusCode, String);

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        get_status,
        get_panel,
        put_flights,
        post_display_message,
        post_display_loading,
        post_display_clear,
        get_display_snapshot,
    ),
    components(schemas(
        DisplayStatus,
        DisplayMode,
        CyclePhase,
        FlightInfo,
        Airport,
        FlightsRequest,
        MessageRequest,
        PanelInfo,
    )),
    tags(
        (name = "display", description = "Display control endpoints"),
        (name = "system", description = "System status endpoints"),
    ),
    info(
        title = "Flight Wall API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP API for the flight card display on a tiled LED matrix"
    )
)]
pub struct ApiDoc;

// ── Request/Response types ───────────────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
pub struct FlightsRequest {
    /// Flights currently in the search area. An empty list shows the loading screen.
    flights: Vec<FlightInfo>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct MessageRequest {
    /// Single line of text, truncated to the panel width
    #[schema(example = "No flights nearby")]
    text: String,
}

#[derive(Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct PanelInfo {
    /// Logical width in pixels
    #[schema(example = 160)]
    width: u32,
    /// Logical height in pixels
    #[schema(example = 32)]
    height: u32,
    tiles_x: u32,
    tiles_y: u32,
    data_pin: u8,
}

impl From<&HardwareGeometry> for PanelInfo {
    fn from(geometry: &HardwareGeometry) -> Self {
        Self {
            width: geometry.width(),
            height: geometry.height(),
            tiles_x: geometry.tiles_x,
            tiles_y: geometry.tiles_y,
            data_pin: geometry.data_pin,
        }
    }
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none")),
        )
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/panel", get(get_panel))
        .route("/api/v1/flights", put(put_flights))
        .route("/api/v1/display/message", post(post_display_message))
        .route("/api/v1/display/loading", post(post_display_loading))
        .route("/api/v1/display/clear", post(post_display_clear))
        .route("/api/v1/display/snapshot", get(get_display_snapshot))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn send(state: &AppState, cmd: RenderCommand) -> Result<StatusCode, ApiError> {
    state.command_tx.send(cmd).map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Render thread gone".to_string(),
        )
    })?;

    Ok(StatusCode::OK)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /api/v1/status: what the display is showing
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "system",
    responses(
        (status = 200, description = "Current display status", body = DisplayStatus)
    )
)]
async fn get_status(State(state): State<AppState>) -> Json<DisplayStatus> {
    let status = state
        .status
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    Json(status)
}

/// GET /api/v1/panel: logical panel size and tiling
#[utoipa::path(
    get,
    path = "/api/v1/panel",
    tag = "system",
    responses(
        (status = 200, description = "Panel geometry", body = PanelInfo)
    )
)]
async fn get_panel(State(state): State<AppState>) -> Json<PanelInfo> {
    Json(PanelInfo::from(&state.geometry))
}

/// PUT /api/v1/flights: replace the flight list and resume cycling
#[utoipa::path(
    put,
    path = "/api/v1/flights",
    tag = "display",
    request_body = FlightsRequest,
    responses(
        (status = 200, description = "Flight list accepted"),
    )
)]
async fn put_flights(
    State(state): State<AppState>,
    Json(req): Json<FlightsRequest>,
) -> Result<StatusCode, ApiError> {
    send(&state, RenderCommand::UpdateFlights(req.flights))
}

/// POST /api/v1/display/message: show one line of text
#[utoipa::path(
    post,
    path = "/api/v1/display/message",
    tag = "display",
    request_body = MessageRequest,
    responses(
        (status = 200, description = "Message displayed"),
    )
)]
async fn post_display_message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<StatusCode, ApiError> {
    send(&state, RenderCommand::ShowMessage(req.text))
}

/// POST /api/v1/display/loading: show the loading screen
#[utoipa::path(
    post,
    path = "/api/v1/display/loading",
    tag = "display",
    responses(
        (status = 200, description = "Loading screen displayed"),
    )
)]
async fn post_display_loading(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    send(&state, RenderCommand::ShowLoading)
}

/// POST /api/v1/display/clear: turn every pixel off
#[utoipa::path(
    post,
    path = "/api/v1/display/clear",
    tag = "display",
    responses(
        (status = 200, description = "Display cleared"),
    )
)]
async fn post_display_clear(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    send(&state, RenderCommand::Clear)
}

/// GET /api/v1/display/snapshot: PNG of the frame on the panel
#[utoipa::path(
    get,
    path = "/api/v1/display/snapshot",
    tag = "display",
    responses(
        (status = 200, description = "PNG image of the panel", body = Vec<u8>, content_type = "image/png"),
        (status = 500, description = "Render thread gone or snapshot could not be encoded"),
    )
)]
async fn get_display_snapshot(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    send(&state, RenderCommand::Snapshot(reply_tx))?;

    let png = reply_rx.await.map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Render thread dropped the request".to_string(),
        )
    })?;

    match png {
        Some(bytes) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response()),
        None => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode snapshot".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc::{self, Receiver};

    fn state() -> (AppState, Receiver<RenderCommand>) {
        let (tx, rx) = mpsc::channel();
        let state = AppState {
            command_tx: tx,
            status: Arc::new(Mutex::new(DisplayStatus::new(5))),
            geometry: HardwareGeometry::default(),
        };
        (state, rx)
    }

    #[test]
    fn flights_request_accepts_partial_records() {
        let req: FlightsRequest = serde_json::from_str(
            r#"{"flights": [{"ident": "UA123", "origin": {"code_icao": "KSFO"}}, {}]}"#,
        )
        .unwrap();

        assert_eq!(req.flights.len(), 2);
        assert_eq!(req.flights[0].ident, "UA123");
        assert_eq!(req.flights[0].origin.code_icao, "KSFO");
        assert_eq!(req.flights[1], FlightInfo::default());
    }

    #[test]
    fn panel_info_reports_logical_size() {
        assert_eq!(
            PanelInfo::from(&HardwareGeometry::default()),
            PanelInfo {
                width: 160,
                height: 32,
                tiles_x: 10,
                tiles_y: 2,
                data_pin: 25,
            }
        );
    }

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/status",
            "/api/v1/panel",
            "/api/v1/flights",
            "/api/v1/display/message",
            "/api/v1/display/loading",
            "/api/v1/display/clear",
            "/api/v1/display/snapshot",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[tokio::test]
    async fn put_flights_forwards_the_list() {
        let (state, rx) = state();
        let req = FlightsRequest {
            flights: vec![FlightInfo::default(); 3],
        };

        let code = put_flights(State(state), Json(req)).await.unwrap();
        assert_eq!(code, StatusCode::OK);
        assert!(matches!(rx.try_recv(), Ok(RenderCommand::UpdateFlights(f)) if f.len() == 3));
    }

    #[tokio::test]
    async fn message_and_clear_forward_commands() {
        let (state, rx) = state();
        let req = MessageRequest {
            text: "Hello".into(),
        };

        post_display_message(State(state.clone()), Json(req)).await.unwrap();
        post_display_loading(State(state.clone())).await.unwrap();
        post_display_clear(State(state)).await.unwrap();

        assert!(matches!(rx.try_recv(), Ok(RenderCommand::ShowMessage(t)) if t == "Hello"));
        assert!(matches!(rx.try_recv(), Ok(RenderCommand::ShowLoading)));
        assert!(matches!(rx.try_recv(), Ok(RenderCommand::Clear)));
    }

    #[tokio::test]
    async fn commands_fail_when_render_thread_is_gone() {
        let (state, rx) = state();
        drop(rx);

        let err = post_display_clear(State(state)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn status_returns_shared_snapshot() {
        let (state, _rx) = state();
        state.status.lock().unwrap().flight_count = 7;

        let Json(status) = get_status(State(state)).await;
        assert_eq!(status.flight_count, 7);
        assert_eq!(status.brightness, 5);
    }

    #[tokio::test]
    async fn snapshot_returns_png_from_render_thread() {
        let (state, rx) = state();
        let responder = std::thread::spawn(move || {
            if let Ok(RenderCommand::Snapshot(reply)) = rx.recv() {
                reply.send(Some(vec![0x89, b'P', b'N', b'G'])).unwrap();
            }
        });

        let response = get_display_snapshot(State(state)).await.unwrap();
        responder.join().unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
    }

    #[tokio::test]
    async fn snapshot_reports_encoding_failure() {
        let (state, rx) = state();
        let responder = std::thread::spawn(move || {
            if let Ok(RenderCommand::Snapshot(reply)) = rx.recv() {
                reply.send(None).unwrap();
            }
        });

        let err = get_display_snapshot(State(state)).await.unwrap_err();
        responder.join().unwrap();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
