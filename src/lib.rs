//! Flight card renderer for tiled RGB LED matrix panels.
//!
//! This crate provides:
//! - The display engine that cycles through nearby flights ([`display`])
//! - Card, loading, and message layout rules ([`layout`])
//! - Pixel surfaces: an in-memory frame buffer and the HUB75 matrix backend
//! - Configuration descriptors for geometry, preferences, and timing
//!
//! It also exposes the render thread and HTTP API used by the main binary.

pub mod config;
pub mod cycle;
pub mod display;
pub mod error;
pub mod flight;
#[cfg(feature = "hardware")]
pub mod hardware;
pub mod layout;
pub mod render;
pub mod server;
pub mod surface;
pub mod wiring;

pub use config::{DisplayConfig, HardwareGeometry, TimingPolicy, UserPreferences};
pub use display::{FlightDisplay, MatrixDisplay};
pub use error::{ConfigError, DisplayError};
pub use flight::{Airport, FlightInfo};
pub use surface::{FrameBuffer, PixelSurface};

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ── Color ──────────────────────────────────────────────────────────

/// Our own color type, decoupled from the hardware and graphics crates.
///
/// At the boundaries we convert via `Into<LedColor>` or `Into<Rgb888>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale this color by a 0-255 brightness, where 255 leaves it unchanged.
    pub fn scale(self, brightness: u8) -> Self {
        if brightness == u8::MAX {
            return self;
        }
        let factor = brightness as u16 + 1;
        Self {
            r: ((self.r as u16 * factor) >> 8) as u8,
            g: ((self.g as u16 * factor) >> 8) as u8,
            b: ((self.b as u16 * factor) >> 8) as u8,
        }
    }
}

impl From<Color> for Rgb888 {
    fn from(c: Color) -> Self {
        Rgb888::new(c.r, c.g, c.b)
    }
}

impl From<Rgb888> for Color {
    fn from(c: Rgb888) -> Self {
        Color::new(c.r(), c.g(), c.b())
    }
}

/// Convert our Color to the hardware crate's LedColor at the boundary.
#[cfg(feature = "hardware")]
impl From<Color> for rpi_led_matrix::LedColor {
    fn from(c: Color) -> Self {
        rpi_led_matrix::LedColor {
            red: c.r,
            green: c.g,
            blue: c.b,
        }
    }
}

// ── Shutdown signal ────────────────────────────────────────────────

/// Set up a Ctrl+C handler that sets `running` to false.
pub fn setup_signal_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    Ok(running)
}

/// Check if the main loop should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn color_new() {
        let c = Color::new(10, 20, 30);
        assert_eq!(c.r, 10);
        assert_eq!(c.g, 20);
        assert_eq!(c.b, 30);
    }

    #[test]
    fn scale_255_is_identity() {
        let c = Color::new(100, 200, 50);
        assert_eq!(c.scale(255), c);
    }

    #[test]
    fn scale_0_is_black() {
        assert_eq!(Color::WHITE.scale(0), Color::new(0, 0, 0));
    }

    #[rstest]
    #[case(127, Color::new(127, 127, 127))]
    #[case(63, Color::new(63, 63, 63))]
    #[case(4, Color::new(4, 4, 4))]
    fn scale_white_tracks_brightness(#[case] brightness: u8, #[case] expected: Color) {
        assert_eq!(Color::WHITE.scale(brightness), expected);
    }

    #[test]
    fn scale_applies_per_channel() {
        let c = Color::new(200, 100, 0);
        assert_eq!(c.scale(127), Color::new(100, 50, 0));
    }

    #[test]
    fn rgb888_round_trip() {
        let c = Color::new(1, 2, 3);
        let rgb: Rgb888 = c.into();
        assert_eq!(Color::from(rgb), c);
    }

    #[test]
    fn is_running_reads_flag() {
        let flag = AtomicBool::new(true);
        assert!(is_running(&flag));
        flag.store(false, Ordering::SeqCst);
        assert!(!is_running(&flag));
    }
}
