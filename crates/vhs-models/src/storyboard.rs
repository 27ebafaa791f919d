//! Storyboard layout and the value types produced while building it.
//!
//! A storyboard is the ordered set of frames sampled from a video every
//! `interval` seconds, starting one second in. Frames are packed row-major
//! into sprite sheets of `cols` x `rows` cells.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seconds between two sampled frames
pub const FRAME_INTERVAL_SECS: f64 = 5.0;
/// Offset of the first sampled frame
pub const FIRST_SAMPLE_OFFSET_SECS: f64 = 1.0;

/// Sprite sheet grid
pub const SPRITE_SHEET_COLS: u32 = 10;
pub const SPRITE_SHEET_ROWS: u32 = 40;

/// Storyboard frame resolution
pub const SPRITE_WIDTH: u32 = 180;
pub const SPRITE_HEIGHT: u32 = 101;

/// Default preview resolution
pub const DEFAULT_PREVIEW_WIDTH: u32 = 1280;
pub const DEFAULT_PREVIEW_HEIGHT: u32 = 720;

/// Largest sheet side a JPEG can encode
pub const MAX_SHEET_DIMENSION: u32 = 65_535;

/// Invalid layout parameters.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("frame interval must be positive, got {0}")]
    InvalidInterval(f64),

    #[error("sprite sheet grid must be at least 1x1, got {cols}x{rows}")]
    EmptyGrid { cols: u32, rows: u32 },

    #[error("cell size must be non-zero, got {width}x{height}")]
    EmptyCell { width: u32, height: u32 },

    #[error("sprite sheet of {cols}x{rows} cells of {width}x{height} exceeds {max}px per side")]
    SheetTooLarge {
        cols: u32,
        rows: u32,
        width: u32,
        height: u32,
        max: u32,
    },
}

/// Sampling interval, sheet grid and cell size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoryboardLayout {
    pub interval: f64,
    pub cols: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl Default for StoryboardLayout {
    fn default() -> Self {
        Self {
            interval: FRAME_INTERVAL_SECS,
            cols: SPRITE_SHEET_COLS,
            rows: SPRITE_SHEET_ROWS,
            cell_width: SPRITE_WIDTH,
            cell_height: SPRITE_HEIGHT,
        }
    }
}

/// Where a frame lands inside the sheet set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPosition {
    pub sheet: usize,
    /// Index within the sheet
    pub local: usize,
    pub col: u32,
    pub row: u32,
}

/// Pixel rectangle of a cell inside its sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl StoryboardLayout {
    /// Reject layouts that cannot produce a storyboard.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return Err(LayoutError::InvalidInterval(self.interval));
        }
        if self.cols == 0 || self.rows == 0 {
            return Err(LayoutError::EmptyGrid {
                cols: self.cols,
                rows: self.rows,
            });
        }
        if self.cell_width == 0 || self.cell_height == 0 {
            return Err(LayoutError::EmptyCell {
                width: self.cell_width,
                height: self.cell_height,
            });
        }
        let sheet_width = self.cols.checked_mul(self.cell_width);
        let sheet_height = self.rows.checked_mul(self.cell_height);
        let fits = |side: Option<u32>| side.is_some_and(|v| v <= MAX_SHEET_DIMENSION);
        if !(fits(sheet_width) && fits(sheet_height)) {
            return Err(LayoutError::SheetTooLarge {
                cols: self.cols,
                rows: self.rows,
                width: self.cell_width,
                height: self.cell_height,
                max: MAX_SHEET_DIMENSION,
            });
        }
        Ok(())
    }

    /// Cells per sheet.
    pub fn capacity(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Sample offsets `1, 1+F, 1+2F, ...` strictly below `duration`.
    pub fn sample_offsets(&self, duration: f64) -> Vec<f64> {
        let mut offsets = Vec::new();
        if !(duration.is_finite() && self.interval > 0.0) {
            return offsets;
        }
        // Offsets are computed from the index so that rounding does not accumulate.
        let mut k = 0usize;
        loop {
            let offset = FIRST_SAMPLE_OFFSET_SECS + k as f64 * self.interval;
            if offset >= duration {
                break;
            }
            offsets.push(offset);
            k += 1;
        }
        offsets
    }

    /// Number of frames sampled from a video of `duration` seconds.
    pub fn frame_count(&self, duration: f64) -> usize {
        self.sample_offsets(duration).len()
    }

    /// Number of sheets needed for `frames` frames.
    pub fn sheet_count(&self, frames: usize) -> usize {
        frames.div_ceil(self.capacity())
    }

    /// Sheet and cell for the frame at global `index`.
    pub fn cell_for(&self, index: usize) -> CellPosition {
        let capacity = self.capacity();
        let local = index % capacity;
        CellPosition {
            sheet: index / capacity,
            local,
            col: (local % self.cols as usize) as u32,
            row: (local / self.cols as usize) as u32,
        }
    }

    /// Pixel rectangle of the frame at global `index` inside its sheet.
    pub fn cell_rect(&self, index: usize) -> CellRect {
        let cell = self.cell_for(index);
        CellRect {
            x: cell.col * self.cell_width,
            y: cell.row * self.cell_height,
            width: self.cell_width,
            height: self.cell_height,
        }
    }

    /// Pixel size of a full sheet.
    pub fn sheet_dimensions(&self) -> (u32, u32) {
        (self.cols * self.cell_width, self.rows * self.cell_height)
    }
}

/// A frame extracted from the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryboardFrame {
    /// Sequence number, starting at 0
    pub index: usize,
    /// Image file on scratch storage
    pub path: PathBuf,
    /// Position in the source video, in seconds
    pub offset: f64,
}

/// One sprite sheet worth of frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub index: usize,
    /// Exactly `capacity` slots in row-major order; trailing slots of the
    /// last sheet are empty.
    pub cells: Vec<Option<StoryboardFrame>>,
}

impl SpriteSheet {
    /// Number of occupied cells.
    pub fn frame_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Target of a cue: a rectangle inside a sprite sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CueTarget {
    /// Externally resolvable URL of the sheet
    pub sheet_url: String,
    pub rect: CellRect,
}

impl CueTarget {
    /// Media-fragment form used in cue files: `url#xywh=x,y,w,h`.
    pub fn to_fragment_url(&self) -> String {
        format!(
            "{}#xywh={},{},{},{}",
            self.sheet_url, self.rect.x, self.rect.y, self.rect.width, self.rect.height
        )
    }
}

/// One timed entry of the cue track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CueEntry {
    /// Start in seconds (inclusive)
    pub start: f64,
    /// End in seconds (exclusive)
    pub end: f64,
    pub target: CueTarget,
}
