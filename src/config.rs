//! Configuration descriptors: panel geometry, user preferences, timing.
//!
//! Everything the renderer needs is passed in explicitly through
//! [`DisplayConfig`] rather than read from globals, so the layout and cycling
//! code can be exercised with synthetic geometries in tests.
//!
//! A config file is plain JSON. Every field has a default matching the stock
//! hardware (ten 16×16 tiles by two, 160×32 pixels), so an empty object `{}`
//! is a valid configuration.

use crate::Color;
use crate::error::ConfigError;
use crate::wiring::PanelWiring;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ── Hardware geometry ──────────────────────────────────────────────

/// Physical layout of the tiled LED panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareGeometry {
    /// Pixels across one tile.
    pub tile_pixel_width: u32,
    /// Pixels down one tile.
    pub tile_pixel_height: u32,
    /// Tiles across the panel.
    pub tiles_x: u32,
    /// Tiles down the panel.
    pub tiles_y: u32,
    /// GPIO carrying the LED data line.
    pub data_pin: u8,
    pub wiring: PanelWiring,
}

impl HardwareGeometry {
    /// Matrix width in pixels, saturating at `u32::MAX`.
    pub fn width(&self) -> u32 {
        self.tile_pixel_width.saturating_mul(self.tiles_x)
    }

    /// Matrix height in pixels, saturating at `u32::MAX`.
    pub fn height(&self) -> u32 {
        self.tile_pixel_height.saturating_mul(self.tiles_y)
    }

    /// Total number of pixels on the panel, saturating at `usize::MAX`.
    pub fn pixel_count(&self) -> usize {
        (self.width() as usize).saturating_mul(self.height() as usize)
    }

    /// Width and height, or `None` if either dimension or the pixel count
    /// does not fit in a `u32`.
    pub fn checked_dimensions(&self) -> Option<(u32, u32)> {
        let width = self.tile_pixel_width.checked_mul(self.tiles_x)?;
        let height = self.tile_pixel_height.checked_mul(self.tiles_y)?;
        width.checked_mul(height)?;
        Some((width, height))
    }
}

impl Default for HardwareGeometry {
    fn default() -> Self {
        Self {
            tile_pixel_width: 16,
            tile_pixel_height: 16,
            tiles_x: 10,
            tiles_y: 2,
            data_pin: 25,
            wiring: PanelWiring::default(),
        }
    }
}

// ── User preferences ───────────────────────────────────────────────

/// Center and radius of the area searched for flights.
///
/// Only the flight source uses this; rendering ignores it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchArea {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_km: f64,
}

impl Default for SearchArea {
    fn default() -> Self {
        Self {
            center_lat: 37.7749,
            center_lon: -122.4194,
            radius_km: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    /// Overall output brightness (0-255).
    pub brightness: u8,
    /// Color used for all text, and for the flight card border.
    pub text_color: Color,
    pub location: SearchArea,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            brightness: 5,
            text_color: Color::WHITE,
            location: SearchArea::default(),
        }
    }
}

// ── Timing ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingPolicy {
    /// Minimum time a flight stays on screen before the next one is shown.
    pub cycle_seconds: u32,
}

impl TimingPolicy {
    pub fn cycle_interval_ms(&self) -> u64 {
        self.cycle_seconds as u64 * 1000
    }
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self { cycle_seconds: 5 }
    }
}

// ── Combined ───────────────────────────────────────────────────────

/// All descriptors the display engine reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub hardware: HardwareGeometry,
    pub user: UserPreferences,
    pub timing: TimingPolicy,
}

impl DisplayConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }
}
