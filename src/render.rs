//! Render thread: owns the display engine and processes commands via a channel.
//!
//! The `rpi-led-matrix` C library is not thread-safe, so the matrix is
//! opened and driven on a single dedicated thread. The async HTTP server
//! talks to it by sending [`RenderCommand`] values through an `mpsc` channel.
//!
//! Between commands the thread wakes on a fixed tick and re-renders the
//! latest flight list, which is what moves the card along on the cycle
//! interval.

use crate::config::DisplayConfig;
use crate::cycle::CyclePhase;
use crate::display::{Clock, FlightDisplay, MatrixDisplay, SystemClock};
use crate::error::DisplayResult;
use crate::flight::FlightInfo;
use crate::is_running;
use crate::surface::PixelSurface;
use image::{ImageFormat, RgbImage};
use serde::Serialize;
use std::io::Cursor;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

// ── Commands ─────────────────────────────────────────────────────────

/// Commands sent from the HTTP server to the render thread.
pub enum RenderCommand {
    /// Replace the flight list and go back to cycling through it
    UpdateFlights(Vec<FlightInfo>),
    /// Show one line of text until the next flight update
    ShowMessage(String),
    /// Show the loading screen until the next flight update
    ShowLoading,
    /// Turn every pixel off until the next flight update
    Clear,
    /// Reply with a PNG of the frame on the panel (`None` if encoding failed)
    Snapshot(oneshot::Sender<Option<Vec<u8>>>),
}

// ── Status ───────────────────────────────────────────────────────────

/// What the display is currently showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Matrix not initialized yet
    Starting,
    /// Cycling through the flight list (or loading if it is empty)
    Flights,
    Message,
    Loading,
    Cleared,
}

/// Shared status that the HTTP server can read to report current state.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct DisplayStatus {
    pub mode: DisplayMode,
    /// Cycling phase, while showing flights
    pub phase: Option<CyclePhase>,
    /// Number of flights in the latest list
    pub flight_count: usize,
    /// Index of the flight on screen
    pub current_index: Option<usize>,
    /// One-line summary of the flight on screen
    pub current_flight: Option<String>,
    /// Message on screen
    pub message: Option<String>,
    /// Output brightness (0-255)
    pub brightness: u8,
    /// Server version
    pub version: String,
}

impl DisplayStatus {
    pub fn new(brightness: u8) -> Self {
        Self {
            mode: DisplayMode::Starting,
            phase: None,
            flight_count: 0,
            current_index: None,
            current_flight: None,
            message: None,
            brightness,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// ── Renderer ─────────────────────────────────────────────────────────

/// Display engine plus the latest flight list and what is on screen.
pub struct Renderer<S, C = SystemClock> {
    display: MatrixDisplay<S, C>,
    flights: Vec<FlightInfo>,
    mode: DisplayMode,
    message: Option<String>,
}

impl<S: PixelSurface, C: Clock> Renderer<S, C> {
    /// Wrap an initialized display. Starts out cycling an empty list.
    pub fn new(display: MatrixDisplay<S, C>) -> Self {
        Self {
            display,
            flights: Vec::new(),
            mode: DisplayMode::Flights,
            message: None,
        }
    }

    pub fn display(&self) -> &MatrixDisplay<S, C> {
        &self.display
    }

    pub fn handle(&mut self, cmd: RenderCommand) {
        match cmd {
            RenderCommand::UpdateFlights(flights) => {
                tracing::debug!("Received {} flights", flights.len());
                self.flights = flights;
                self.message = None;
                self.mode = DisplayMode::Flights;
            }

            RenderCommand::ShowMessage(text) => {
                tracing::info!("Displaying message: {}", text);
                self.display.display_message(&text);
                self.message = Some(text);
                self.mode = DisplayMode::Message;
            }

            RenderCommand::ShowLoading => {
                self.display.show_loading();
                self.message = None;
                self.mode = DisplayMode::Loading;
            }

            RenderCommand::Clear => {
                self.display.clear();
                self.message = None;
                self.mode = DisplayMode::Cleared;
            }

            RenderCommand::Snapshot(reply) => {
                if reply.send(self.snapshot_png()).is_err() {
                    tracing::debug!("Snapshot requester went away");
                }
            }
        }
    }

    /// Re-render the flight list if that is what is on screen.
    pub fn tick(&mut self) {
        if self.mode == DisplayMode::Flights {
            self.display.display_flights(&self.flights);
        }
    }

    pub fn status(&self) -> DisplayStatus {
        let mut status = DisplayStatus::new(self.display.config().user.brightness);
        status.mode = self.mode;
        status.flight_count = self.flights.len();
        status.message = self.message.clone();

        if self.mode == DisplayMode::Flights {
            status.phase = Some(CyclePhase::of(self.flights.len()));
            if !self.flights.is_empty() {
                let index = self.display.cycle().current_flight_index() % self.flights.len();
                status.current_index = Some(index);
                status.current_flight = Some(self.flights[index].summary_line());
            }
        }
        status
    }

    fn snapshot_png(&self) -> Option<Vec<u8>> {
        let image = self.display.surface()?.snapshot();
        match encode_png(&image) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::error!("Failed to encode snapshot: {}", e);
                None
            }
        }
    }

    /// Turn the panel off before the display is dropped.
    pub fn shutdown(mut self) {
        self.display.clear();
    }
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

// ── Render loop ──────────────────────────────────────────────────────

/// Main render loop: runs on a dedicated thread and owns the display.
///
/// The outcome of initializing the matrix is sent on `ready` before any
/// command is read; on failure the loop returns straight away. Otherwise it
/// returns when the channel is closed (sender dropped) or `running` is
/// cleared, turning the panel off on the way out.
pub fn render_loop<S: PixelSurface>(
    rx: Receiver<RenderCommand>,
    status: Arc<Mutex<DisplayStatus>>,
    config: DisplayConfig,
    tick: Duration,
    running: Arc<AtomicBool>,
    ready: oneshot::Sender<DisplayResult<()>>,
) {
    let mut display: MatrixDisplay<S> = MatrixDisplay::new(config, SystemClock::new());
    if let Err(e) = display.initialize() {
        tracing::error!("Failed to initialize LED matrix: {}", e);
        if ready.send(Err(e)).is_err() {
            tracing::debug!("Nobody waiting for render thread startup");
        }
        return;
    }
    if ready.send(Ok(())).is_err() {
        tracing::debug!("Nobody waiting for render thread startup");
    }

    let mut renderer = Renderer::new(display);
    tracing::info!("Render thread started, tick every {}ms", tick.as_millis());

    while is_running(&running) {
        match rx.recv_timeout(tick) {
            Ok(cmd) => renderer.handle(cmd),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("Render thread: channel closed, shutting down.");
                break;
            }
        }

        renderer.tick();
        *status.lock().unwrap_or_else(PoisonError::into_inner) = renderer.status();
    }

    renderer.shutdown();
    tracing::info!("Render thread stopped, display cleared");
}
