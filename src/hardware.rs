//! HUB75 matrix backend built on `rpi-led-matrix`.
//!
//! Drawing happens in a [`FrameBuffer`]; on flush the frame is copied to the
//! offscreen canvas with brightness applied and swapped onto the panel on
//! the next vsync. The C library is not thread-safe, so a `MatrixSurface`
//! must stay on the thread that opened it.

use crate::Color;
use crate::config::HardwareGeometry;
use crate::error::{DisplayError, DisplayResult};
use crate::surface::{FrameBuffer, PixelSurface};
use image::RgbImage;
use rpi_led_matrix::{LedCanvas, LedMatrix, LedMatrixOptions, LedRuntimeOptions};

/// Create a matrix configured for our hardware:
/// Pi + Adafruit Bonnet, one chain per tile row.
///
/// Tiles across the panel are daisy-chained; tile rows are driven in
/// parallel.
pub fn create_matrix(geometry: &HardwareGeometry) -> Result<LedMatrix, Box<dyn std::error::Error>> {
    let mut options = LedMatrixOptions::new();
    options.set_rows(geometry.tile_pixel_height);
    options.set_cols(geometry.tile_pixel_width);
    options.set_chain_length(geometry.tiles_x);
    options.set_parallel(geometry.tiles_y);
    options.set_hardware_mapping("adafruit-hat");

    options.set_pwm_bits(8)?; // Full 8-bit color depth
    options.set_pwm_lsb_nanoseconds(130); // Stable timing (~143Hz refresh)

    let mut rt_options = LedRuntimeOptions::new();
    rt_options.set_gpio_slowdown(2); // Pi Zero 2 W requires slowdown=2

    let matrix = LedMatrix::new(Some(options), Some(rt_options))?;

    Ok(matrix)
}

pub struct MatrixSurface {
    frame: FrameBuffer,
    matrix: LedMatrix,
    /// Offscreen canvas; only `None` transiently while being swapped.
    canvas: Option<LedCanvas>,
}

impl PixelSurface for MatrixSurface {
    fn open(geometry: &HardwareGeometry) -> DisplayResult<Self> {
        let frame = FrameBuffer::open(geometry)?;
        let matrix = create_matrix(geometry).map_err(|e| DisplayError::Hardware(e.to_string()))?;
        let canvas = matrix.offscreen_canvas();

        Ok(Self {
            frame,
            matrix,
            canvas: Some(canvas),
        })
    }

    fn width(&self) -> u32 {
        self.frame.width()
    }

    fn height(&self) -> u32 {
        self.frame.height()
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.frame.set_brightness(brightness);
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.frame.set_pixel(x, y, color);
    }

    fn fill(&mut self, color: Color) {
        self.frame.fill(color);
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        self.frame.draw_rect(x, y, width, height, color);
    }

    fn draw_glyph(&mut self, x: i32, y: i32, ch: char, color: Color) {
        self.frame.draw_glyph(x, y, ch, color);
    }

    fn flush(&mut self) -> DisplayResult<()> {
        self.frame.flush()?;

        let mut canvas = self
            .canvas
            .take()
            .ok_or_else(|| DisplayError::Flush("offscreen canvas missing".to_string()))?;

        let output = self.frame.output();
        for y in 0..self.frame.height() as i32 {
            for x in 0..self.frame.width() as i32 {
                let c = self
                    .frame
                    .chain_index(x, y)
                    .map_or(Color::BLACK, |i| output[i]);
                canvas.set(x, y, &c.into());
            }
        }

        self.canvas = Some(self.matrix.swap(canvas));
        Ok(())
    }

    fn snapshot(&self) -> RgbImage {
        self.frame.snapshot()
    }
}
