//! Flight Wall display server
//!
//! Drives a tiled LED matrix that cycles through cards for the flights
//! currently near a configured location. A fetcher on the LAN pushes the
//! flight list over HTTP; this process only renders it.
//!
//! ## Architecture
//! - **Render thread** (std::thread): owns the matrix, re-renders on a tick
//! - **HTTP server** (tokio/axum): accepts API requests, sends commands via channel
//!
//! ## Usage
//! ```sh
//! sudo ./target/release/flightwall-matrix --config flightwall.json --port 8080
//! ```
//!
//! Without a panel attached (or built with `--no-default-features`), pass
//! `--simulate` to render into an in-memory frame buffer; the current frame
//! is still available from `GET /api/v1/display/snapshot`.

use clap::Parser;
use flightwall_matrix::error::DisplayResult;
use flightwall_matrix::render::{DisplayStatus, RenderCommand, render_loop};
use flightwall_matrix::server::{self, AppState};
use flightwall_matrix::{DisplayConfig, FrameBuffer, is_running, setup_signal_handler};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

/// Flight Wall display server
#[derive(Parser, Debug)]
#[command(name = "flightwall-matrix")]
#[command(about = "Cycling flight-card display for tiled RGB LED matrix panels")]
#[command(version)]
struct Args {
    /// JSON config file (geometry, preferences, timing); defaults apply if omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Override the configured brightness (0-255)
    #[arg(long)]
    brightness: Option<u8>,

    /// Override the configured seconds per flight card
    #[arg(long)]
    cycle_seconds: Option<u32>,

    /// Render tick in milliseconds
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,

    /// Render into an in-memory frame buffer instead of the LED matrix
    #[arg(long)]
    simulate: bool,
}

impl Args {
    fn load_config(&self) -> Result<DisplayConfig, flightwall_matrix::ConfigError> {
        let mut config = match &self.config {
            Some(path) => DisplayConfig::load(path)?,
            None => DisplayConfig::default(),
        };

        if let Some(brightness) = self.brightness {
            config.user.brightness = brightness;
        }
        if let Some(seconds) = self.cycle_seconds {
            config.timing.cycle_seconds = seconds;
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();
    let config = args.load_config()?;
    let geometry = config.hardware;
    let area = config.user.location;

    tracing::info!("Flight Wall v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Panel: {}x{} ({}x{} tiles of {}x{}, data pin {})",
        geometry.width(),
        geometry.height(),
        geometry.tiles_x,
        geometry.tiles_y,
        geometry.tile_pixel_width,
        geometry.tile_pixel_height,
        geometry.data_pin
    );
    tracing::info!(
        "Search area: {:.4}, {:.4} within {} km",
        area.center_lat,
        area.center_lon,
        area.radius_km
    );
    tracing::info!(
        "Brightness {}, {} s per card",
        config.user.brightness,
        config.timing.cycle_seconds
    );

    let running = setup_signal_handler()?;

    // Create the channel for sending commands to the render thread.
    let (tx, rx) = mpsc::channel();

    // Shared display status: render thread writes, HTTP handlers read.
    let status = Arc::new(Mutex::new(DisplayStatus::new(config.user.brightness)));

    let (ready_tx, ready_rx) = oneshot::channel();
    let render_handle = spawn_render_thread(
        args.simulate,
        rx,
        status.clone(),
        config,
        Duration::from_millis(args.tick_ms),
        running.clone(),
        ready_tx,
    );

    // Don't serve anything until the matrix is up.
    match ready_rx.await {
        Ok(Ok(())) => {}
        startup => {
            if render_handle.join().is_err() {
                tracing::error!("Render thread panicked");
            }
            return Err(match startup {
                Ok(Err(e)) => e.into(),
                _ => "render thread exited before initializing the display".into(),
            });
        }
    }

    let app = server::create_router(AppState {
        command_tx: tx,
        status,
        geometry,
    });

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", args.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(running))
        .await?;

    // The router (and with it the command sender) is gone by now, so the
    // render thread sees either the flag or a closed channel and clears the panel.
    if render_handle.join().is_err() {
        tracing::error!("Render thread panicked");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn wait_for_shutdown(running: Arc<AtomicBool>) {
    while is_running(&running) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    tracing::info!("Shutting down...");
}

fn spawn_render_thread(
    simulate: bool,
    rx: Receiver<RenderCommand>,
    status: Arc<Mutex<DisplayStatus>>,
    config: DisplayConfig,
    tick: Duration,
    running: Arc<AtomicBool>,
    ready: oneshot::Sender<DisplayResult<()>>,
) -> JoinHandle<()> {
    #[cfg(feature = "hardware")]
    if !simulate {
        use flightwall_matrix::hardware::MatrixSurface;
        return std::thread::spawn(move || {
            render_loop::<MatrixSurface>(rx, status, config, tick, running, ready);
        });
    }

    #[cfg(not(feature = "hardware"))]
    if !simulate {
        tracing::warn!("Built without the 'hardware' feature; rendering to a frame buffer");
    }

    tracing::info!("Simulated display: rendering to an in-memory frame buffer");
    std::thread::spawn(move || {
        render_loop::<FrameBuffer>(rx, status, config, tick, running, ready);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_without_config_file() {
        let args = Args::try_parse_from(["flightwall-matrix"]).unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.tick_ms, 100);
        assert!(!args.simulate);
        assert_eq!(args.load_config().unwrap(), DisplayConfig::default());
    }

    #[test]
    fn command_line_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"user": {{"brightness": 40}}, "timing": {{"cycle_seconds": 8}}}}"#).unwrap();

        let path = file.path().to_str().unwrap();
        let args = Args::try_parse_from(["flightwall-matrix", "--config", path, "--cycle-seconds", "3"]).unwrap();
        let config = args.load_config().unwrap();

        assert_eq!(config.user.brightness, 40);
        assert_eq!(config.timing.cycle_seconds, 3);
    }

    #[test]
    fn tick_must_be_at_least_one_millisecond() {
        assert!(Args::try_parse_from(["flightwall-matrix", "--tick-ms", "0"]).is_err());
        let args = Args::try_parse_from(["flightwall-matrix", "--tick-ms", "1"]).unwrap();
        assert_eq!(args.tick_ms, 1);
    }

    #[test]
    fn brightness_must_fit_a_byte() {
        assert!(Args::try_parse_from(["flightwall-matrix", "--brightness", "300"]).is_err());
        let args = Args::try_parse_from(["flightwall-matrix", "--brightness", "255"]).unwrap();
        assert_eq!(args.load_config().unwrap().user.brightness, 255);
    }
}
