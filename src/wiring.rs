//! Physical wiring of tiled LED panels.
//!
//! Serial LED matrices are one long chain of pixels snaked through each tile,
//! and tiles are themselves chained in some order. The wiring flags describe
//! both levels the same way: which corner the chain enters from, whether it
//! runs along rows or columns first, and whether alternate lines reverse
//! direction (zigzag) or all run the same way (progressive).

use crate::config::HardwareGeometry;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalEdge {
    Top,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalEdge {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MajorAxis {
    Rows,
    Columns,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sequence {
    Progressive,
    Zigzag,
}

/// Wiring of one grid level (pixels inside a tile, or tiles inside the panel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiringLayout {
    pub vertical: VerticalEdge,
    pub horizontal: HorizontalEdge,
    pub axis: MajorAxis,
    pub sequence: Sequence,
}

impl WiringLayout {
    pub fn new(
        vertical: VerticalEdge,
        horizontal: HorizontalEdge,
        axis: MajorAxis,
        sequence: Sequence,
    ) -> Self {
        Self {
            vertical,
            horizontal,
            axis,
            sequence,
        }
    }

    /// Minor and major coordinates of `(col, row)` measured from the entry
    /// corner, plus the last minor coordinate and the length of a major line.
    fn orient(&self, col: u32, row: u32, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let mut minor = col;
        let mut major = row;
        let mut max_minor = width - 1;
        let mut max_major = height - 1;

        if self.horizontal == HorizontalEdge::Right {
            minor = max_minor - minor;
        }
        if self.vertical == VerticalEdge::Bottom {
            major = max_major - major;
        }

        let major_scale = match self.axis {
            MajorAxis::Rows => width,
            MajorAxis::Columns => {
                std::mem::swap(&mut minor, &mut major);
                std::mem::swap(&mut max_minor, &mut max_major);
                height
            }
        };

        (minor, major, max_minor, major_scale)
    }

    /// Position along the chain of cell `(col, row)` in a `width × height` grid.
    pub fn position(&self, col: u32, row: u32, width: u32, height: u32) -> u32 {
        let (minor, major, max_minor, major_scale) = self.orient(col, row, width, height);

        if self.sequence == Sequence::Progressive || major % 2 == 0 {
            major * major_scale + minor
        } else {
            major * major_scale + max_minor - minor
        }
    }

    /// Whether the chain runs backwards through the line holding `(col, row)`.
    pub fn is_reversed_line(&self, col: u32, row: u32, width: u32, height: u32) -> bool {
        let (_, major, _, _) = self.orient(col, row, width, height);
        self.sequence == Sequence::Zigzag && major % 2 == 1
    }

    /// The same layout entered from the diagonally opposite corner.
    pub fn rotated(self) -> Self {
        let vertical = match self.vertical {
            VerticalEdge::Top => VerticalEdge::Bottom,
            VerticalEdge::Bottom => VerticalEdge::Top,
        };
        let horizontal = match self.horizontal {
            HorizontalEdge::Left => HorizontalEdge::Right,
            HorizontalEdge::Right => HorizontalEdge::Left,
        };
        Self {
            vertical,
            horizontal,
            ..self
        }
    }
}

/// Wiring flags for a whole panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelWiring {
    /// Pixel chain inside each tile.
    pub matrix: WiringLayout,
    /// Order in which tiles are chained.
    pub tiles: WiringLayout,
}

impl Default for PanelWiring {
    /// Stock FlightWall wiring: chain enters each tile at the bottom-right and
    /// snakes up and down columns; tiles are chained top-right first, also in
    /// zigzag columns.
    fn default() -> Self {
        Self {
            matrix: WiringLayout::new(
                VerticalEdge::Bottom,
                HorizontalEdge::Right,
                MajorAxis::Columns,
                Sequence::Zigzag,
            ),
            tiles: WiringLayout::new(
                VerticalEdge::Top,
                HorizontalEdge::Right,
                MajorAxis::Columns,
                Sequence::Zigzag,
            ),
        }
    }
}

/// Maps logical `(x, y)` coordinates to LED chain indices.
#[derive(Clone, Copy, Debug)]
pub struct StripMap {
    tile_width: u32,
    tile_height: u32,
    tiles_x: u32,
    tiles_y: u32,
    wiring: PanelWiring,
}

impl StripMap {
    pub fn new(geometry: &HardwareGeometry) -> Self {
        Self {
            tile_width: geometry.tile_pixel_width,
            tile_height: geometry.tile_pixel_height,
            tiles_x: geometry.tiles_x,
            tiles_y: geometry.tiles_y,
            wiring: geometry.wiring,
        }
    }

    /// Chain index of pixel `(x, y)`. Coordinates must lie on the panel.
    ///
    /// With zigzag tile wiring, tiles on odd tile lines are mounted rotated
    /// 180°, so the chain enters them from the opposite corner.
    pub fn index(&self, x: u32, y: u32) -> usize {
        let mut local_x = x;
        let mut local_y = y;
        let mut tile_offset = 0;
        let mut matrix = self.wiring.matrix;

        if self.tiles_x > 1 || self.tiles_y > 1 {
            let tiles = self.wiring.tiles;
            let tile_col = x / self.tile_width;
            let tile_row = y / self.tile_height;
            let tile = tiles.position(tile_col, tile_row, self.tiles_x, self.tiles_y);
            if tiles.is_reversed_line(tile_col, tile_row, self.tiles_x, self.tiles_y) {
                matrix = matrix.rotated();
            }
            tile_offset = tile as usize * self.tile_width as usize * self.tile_height as usize;
            local_x = x % self.tile_width;
            local_y = y % self.tile_height;
        }

        let pixel = matrix.position(local_x, local_y, self.tile_width, self.tile_height);
        tile_offset + pixel as usize
    }
}
