//! Pixel surfaces: the drawing primitives the display engine renders through.
//!
//! [`PixelSurface`] is the seam between layout and hardware. The engine only
//! ever sets pixels, outlines rectangles, draws glyphs, and flushes; backends
//! decide what a flush means.
//!
//! [`FrameBuffer`] is the in-memory surface. It stores pixels in LED chain
//! order (see [`crate::wiring`]) and rasterizes glyphs with the 5×7 ASCII font
//! from `embedded-graphics`, advancing 6 px per character. Text never wraps
//! and is never scaled.

use crate::config::HardwareGeometry;
use crate::error::{DisplayError, DisplayResult};
use crate::layout::GLYPH_WIDTH;
use crate::wiring::StripMap;
use crate::Color;
use embedded_graphics::mono_font::ascii::FONT_5X7;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, Rectangle, StrokeAlignment};
use embedded_graphics::text::{Baseline, Text};
use image::{Rgb, RgbImage};
use std::convert::Infallible;

/// Drawing primitives over a `width × height` grid of pixels.
///
/// Coordinates outside the grid are clipped, never an error.
pub trait PixelSurface {
    /// Allocate the pixel buffer for `geometry` and bring up the output.
    fn open(geometry: &HardwareGeometry) -> DisplayResult<Self>
    where
        Self: Sized;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Output brightness (0-255) applied when frames are flushed.
    fn set_brightness(&mut self, brightness: u8);

    fn set_pixel(&mut self, x: i32, y: i32, color: Color);

    fn fill(&mut self, color: Color) {
        for y in 0..self.height() as i32 {
            for x in 0..self.width() as i32 {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// One-pixel outline of the rectangle with top-left `(x, y)`.
    fn draw_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        if width == 0 || height == 0 {
            return;
        }
        let right = x + width as i32 - 1;
        let bottom = y + height as i32 - 1;
        for col in x..=right {
            self.set_pixel(col, y, color);
            self.set_pixel(col, bottom, color);
        }
        for row in y..=bottom {
            self.set_pixel(x, row, color);
            self.set_pixel(right, row, color);
        }
    }

    /// Draw one character with its cell's top-left corner at `(x, y)`.
    fn draw_glyph(&mut self, x: i32, y: i32, ch: char, color: Color);

    /// Draw `text` glyph by glyph, left to right, one cell per character.
    fn draw_text(&mut self, x: i32, y: i32, text: &str, color: Color) {
        for (i, ch) in text.chars().enumerate() {
            self.draw_glyph(x + i as i32 * GLYPH_WIDTH, y, ch, color);
        }
    }

    /// Push the drawn frame to the output.
    fn flush(&mut self) -> DisplayResult<()>;

    /// Image of the last flushed frame at full brightness.
    fn snapshot(&self) -> RgbImage;
}

// ── FrameBuffer ─────────────────────────────────────────────────────

/// In-memory pixel surface in LED chain order.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    map: StripMap,
    brightness: u8,
    /// Frame being drawn.
    pixels: Vec<Color>,
    /// Last flushed frame.
    shown: Vec<Color>,
    flushes: usize,
}

fn allocate(count: usize) -> DisplayResult<Vec<Color>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(count)
        .map_err(|_| DisplayError::Allocation { pixels: count })?;
    buffer.resize(count, Color::BLACK);
    Ok(buffer)
}

impl FrameBuffer {
    /// Position of `(x, y)` along the LED chain, or `None` off the grid.
    pub fn chain_index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.map.index(x as u32, y as u32))
    }

    /// Color currently drawn at `(x, y)`, or `None` off the grid.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.chain_index(x, y).map(|i| self.pixels[i])
    }

    /// Color shown at `(x, y)` since the last flush, at full brightness.
    pub fn shown_pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.chain_index(x, y).map(|i| self.shown[i])
    }

    /// The frame being drawn, in chain order.
    pub fn strip(&self) -> &[Color] {
        &self.pixels
    }

    /// The last flushed frame with brightness applied, in chain order. Index
    /// it with [`FrameBuffer::chain_index`].
    pub fn output(&self) -> Vec<Color> {
        self.shown.iter().map(|c| c.scale(self.brightness)).collect()
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl PixelSurface for FrameBuffer {
    fn open(geometry: &HardwareGeometry) -> DisplayResult<Self> {
        let invalid = DisplayError::InvalidGeometry {
            width: geometry.width(),
            height: geometry.height(),
        };
        let Some((width, height)) = geometry.checked_dimensions() else {
            return Err(invalid);
        };
        if width == 0 || height == 0 {
            return Err(invalid);
        }
        let count = width as usize * height as usize;

        Ok(Self {
            width,
            height,
            map: StripMap::new(geometry),
            brightness: u8::MAX,
            pixels: allocate(count)?,
            shown: allocate(count)?,
            flushes: 0,
        })
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.chain_index(x, y) {
            self.pixels[i] = color;
        }
    }

    fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        let style = PrimitiveStyleBuilder::new()
            .stroke_color(Rgb888::from(color))
            .stroke_width(1)
            .stroke_alignment(StrokeAlignment::Inside)
            .build();
        let Ok(()) = Rectangle::new(Point::new(x, y), Size::new(width, height))
            .into_styled(style)
            .draw(self);
    }

    fn draw_glyph(&mut self, x: i32, y: i32, ch: char, color: Color) {
        let mut buf = [0u8; 4];
        let style = MonoTextStyle::new(&FONT_5X7, Rgb888::from(color));
        let text = Text::with_baseline(ch.encode_utf8(&mut buf), Point::new(x, y), style, Baseline::Top);
        let Ok(_) = text.draw(self);
    }

    fn flush(&mut self) -> DisplayResult<()> {
        self.shown.copy_from_slice(&self.pixels);
        self.flushes += 1;
        Ok(())
    }

    fn snapshot(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let c = self.shown[self.map.index(x, y)];
            Rgb([c.r, c.g, c.b])
        })
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.set_pixel(coord.x, coord.y, color.into());
        }
        Ok(())
    }
}
