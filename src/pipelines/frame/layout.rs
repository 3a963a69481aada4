// SPDX-License-Identifier: GPL-3.0-only

//! Frame layouts and the geometry they produce

use crate::constants::{SLOT_COUNT, frame};
use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Arrangement of the four photos inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Layout {
    /// Two columns, two rows of portrait cells
    #[default]
    #[serde(rename = "2x2")]
    Grid2x2,
    /// One column of landscape cells
    #[serde(rename = "1x4")]
    Strip1x4,
}

impl Layout {
    /// All layouts in display order
    pub const ALL: [Layout; 2] = [Layout::Grid2x2, Layout::Strip1x4];

    pub fn id(&self) -> &'static str {
        match self {
            Layout::Grid2x2 => "2x2",
            Layout::Strip1x4 => "1x4",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Layout::Grid2x2 => "Grid 2x2",
            Layout::Strip1x4 => "Vertical strip",
        }
    }

    pub fn columns(&self) -> u32 {
        match self {
            Layout::Grid2x2 => 2,
            Layout::Strip1x4 => 1,
        }
    }

    pub fn rows(&self) -> u32 {
        SLOT_COUNT as u32 / self.columns()
    }

    /// Cell aspect ratio as (width, height)
    pub fn cell_aspect(&self) -> (u32, u32) {
        match self {
            Layout::Grid2x2 => (3, 4),
            Layout::Strip1x4 => (4, 3),
        }
    }

    pub fn frame_width(&self) -> u32 {
        match self {
            Layout::Grid2x2 => frame::GRID_WIDTH,
            Layout::Strip1x4 => frame::STRIP_WIDTH,
        }
    }

    /// Next layout in display order, wrapping around
    pub fn next(&self) -> Layout {
        match self {
            Layout::Grid2x2 => Layout::Strip1x4,
            Layout::Strip1x4 => Layout::Grid2x2,
        }
    }

    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry::for_layout(*self)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Layout {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "2x2" | "grid" => Ok(Layout::Grid2x2),
            "1x4" | "strip" => Ok(Layout::Strip1x4),
            other => Err(ParseError::Layout(other.to_string())),
        }
    }
}

/// Axis-aligned rectangle in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn scaled(&self, factor: u32) -> Rect {
        Rect {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

/// Resolved positions of every element of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub border: u32,
    pub cells: Vec<Rect>,
    pub footer: Rect,
}

impl FrameGeometry {
    pub fn for_layout(layout: Layout) -> Self {
        let columns = layout.columns();
        let rows = layout.rows();
        let (aspect_w, aspect_h) = layout.cell_aspect();
        let width = layout.frame_width();
        let inset = frame::BORDER + frame::PADDING;

        let inner_width = width - 2 * inset;
        let cell_width = (inner_width - (columns - 1) * frame::GAP) / columns;
        let cell_height = cell_width * aspect_h / aspect_w;

        let cells = (0..SLOT_COUNT as u32)
            .map(|i| {
                let col = i % columns;
                let row = i / columns;
                Rect {
                    x: inset + col * (cell_width + frame::GAP),
                    y: inset + row * (cell_height + frame::GAP),
                    width: cell_width,
                    height: cell_height,
                }
            })
            .collect();

        let grid_height = rows * cell_height + (rows - 1) * frame::GAP;
        let footer = Rect {
            x: inset,
            y: inset + grid_height,
            width: inner_width,
            height: frame::FOOTER_HEIGHT,
        };
        let height = footer.y + footer.height + inset;

        Self {
            width,
            height,
            border: frame::BORDER,
            cells,
            footer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_parse() {
        assert_eq!("2x2".parse::<Layout>().unwrap(), Layout::Grid2x2);
        assert_eq!("1X4".parse::<Layout>().unwrap(), Layout::Strip1x4);
        assert_eq!("3x3".parse::<Layout>(), Err(ParseError::Layout("3x3".to_string())));
    }

    #[test]
    fn test_grid_geometry() {
        let geometry = Layout::Grid2x2.geometry();
        assert_eq!(geometry.cells.len(), SLOT_COUNT);
        let first = geometry.cells[0];
        let second = geometry.cells[1];
        // Portrait cells side by side
        assert!(first.height > first.width);
        assert_eq!(first.y, second.y);
        assert_eq!(second.x, first.x + first.width + frame::GAP);
        assert_eq!(geometry.width, frame::GRID_WIDTH);
    }

    #[test]
    fn test_strip_geometry() {
        let geometry = Layout::Strip1x4.geometry();
        let xs: Vec<u32> = geometry.cells.iter().map(|c| c.x).collect();
        assert!(xs.iter().all(|&x| x == xs[0]));
        // Landscape cells stacked top to bottom
        assert!(geometry.cells[0].width > geometry.cells[0].height);
        assert!(geometry.cells[3].y > geometry.cells[2].y);
        assert!(geometry.height > geometry.width);
    }

    #[test]
    fn test_cells_inside_frame() {
        for layout in Layout::ALL {
            let geometry = layout.geometry();
            for cell in &geometry.cells {
                assert!(cell.x + cell.width <= geometry.width - geometry.border);
                assert!(cell.y + cell.height <= geometry.footer.y);
            }
            assert!(geometry.footer.y + geometry.footer.height <= geometry.height - geometry.border);
        }
    }

    #[test]
    fn test_layout_serde_ids() {
        assert_eq!(serde_json::to_string(&Layout::Strip1x4).unwrap(), "\"1x4\"");
    }
}
