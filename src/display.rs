//! The display engine: decides between flight card, loading screen, and
//! message, draws it through a [`PixelSurface`], and flushes.
//!
//! [`FlightDisplay`] is the backend-neutral interface; [`MatrixDisplay`] is
//! the LED matrix implementation, generic over the surface it draws on and
//! the clock that drives cycling.
//!
//! Every render entry point is a no-op until [`FlightDisplay::initialize`]
//! has succeeded.

use crate::Color;
use crate::config::DisplayConfig;
use crate::cycle::CycleState;
use crate::error::DisplayResult;
use crate::flight::FlightInfo;
use crate::layout::{self, CardLayout};
use crate::surface::PixelSurface;
use std::time::Instant;

/// A physical output that can show flights.
pub trait FlightDisplay {
    /// Bring up the output. Must succeed before anything is rendered.
    fn initialize(&mut self) -> DisplayResult<()>;

    /// Turn every pixel off.
    fn clear(&mut self);

    /// Render one tick's worth of the current flight list.
    fn display_flights(&mut self, flights: &[FlightInfo]);
}

// ── Clock ────────────────────────────────────────────────────────────

/// Monotonic milliseconds.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since the clock was created.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

// ── MatrixDisplay ────────────────────────────────────────────────────

pub struct MatrixDisplay<S, C = SystemClock> {
    config: DisplayConfig,
    clock: C,
    surface: Option<S>,
    cycle: CycleState,
}

impl<S: PixelSurface, C: Clock> MatrixDisplay<S, C> {
    pub fn new(config: DisplayConfig, clock: C) -> Self {
        let cycle = CycleState::new(clock.now_ms());
        Self {
            config,
            clock,
            surface: None,
            cycle,
        }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn cycle(&self) -> &CycleState {
        &self.cycle
    }

    fn text_color(&self) -> Color {
        self.config.user.text_color
    }

    /// Render one line of text, e.g. a status or error, in place of flights.
    pub fn display_message(&mut self, message: &str) {
        let color = self.text_color();
        let Some(surface) = self.surface.as_mut() else {
            tracing::debug!("display_message before initialize, ignoring");
            return;
        };

        surface.fill(Color::BLACK);
        let (x, y, line) = layout::message_line(surface.width(), surface.height(), message);
        surface.draw_text(x, y, &line, color);
        flush(surface);
    }

    /// Show the loading screen regardless of the flight list.
    pub fn show_loading(&mut self) {
        let color = self.text_color();
        let Some(surface) = self.surface.as_mut() else {
            tracing::debug!("show_loading before initialize, ignoring");
            return;
        };

        surface.fill(Color::BLACK);
        draw_loading_screen(surface, color);
        flush(surface);
    }
}

impl<S: PixelSurface, C: Clock> FlightDisplay for MatrixDisplay<S, C> {
    fn initialize(&mut self) -> DisplayResult<()> {
        let geometry = self.config.hardware;
        let mut surface = S::open(&geometry)?;
        surface.set_brightness(self.config.user.brightness);
        self.surface = Some(surface);

        tracing::info!(
            "Matrix initialized: {}x{} ({}x{} tiles of {}x{}), brightness {}",
            geometry.width(),
            geometry.height(),
            geometry.tiles_x,
            geometry.tiles_y,
            geometry.tile_pixel_width,
            geometry.tile_pixel_height,
            self.config.user.brightness
        );

        self.clear();
        self.cycle = CycleState::new(self.clock.now_ms());
        Ok(())
    }

    fn clear(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.fill(Color::BLACK);
            flush(surface);
        }
    }

    fn display_flights(&mut self, flights: &[FlightInfo]) {
        let color = self.text_color();
        let interval_ms = self.config.timing.cycle_interval_ms();
        let Some(surface) = self.surface.as_mut() else {
            tracing::debug!("display_flights before initialize, ignoring");
            return;
        };

        surface.fill(Color::BLACK);

        let now = self.clock.now_ms();
        match self.cycle.select(flights.len(), now, interval_ms) {
            Some(index) => draw_flight_card(surface, &flights[index], color),
            None => draw_loading_screen(surface, color),
        }

        flush(surface);
    }
}

// ── Drawing ──────────────────────────────────────────────────────────

fn flush<S: PixelSurface>(surface: &mut S) {
    if let Err(e) = surface.flush() {
        tracing::warn!("Failed to flush frame: {}", e);
    }
}

/// Bordered three-line card. The border shares the text color.
fn draw_flight_card<S: PixelSurface>(surface: &mut S, flight: &FlightInfo, color: Color) {
    let (width, height) = (surface.width(), surface.height());
    surface.draw_rect(0, 0, width, height, color);

    let card = CardLayout::new(width, height);
    let lines = layout::card_lines(flight, card.max_columns);
    for (line, y) in lines.iter().zip(card.line_y) {
        surface.draw_text(card.start_x, y, line, color);
    }
}

/// White border with `"..."` in the text color, regardless of text color.
fn draw_loading_screen<S: PixelSurface>(surface: &mut S, color: Color) {
    let (width, height) = (surface.width(), surface.height());
    surface.draw_rect(0, 0, width, height, Color::WHITE);

    let (x, y) = layout::loading_origin(width, height);
    surface.draw_text(x, y, layout::LOADING_TEXT, color);
}
