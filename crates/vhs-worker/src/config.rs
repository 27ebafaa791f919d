//! Worker configuration.

use std::path::PathBuf;

use vhs_models::storyboard::{
    DEFAULT_PREVIEW_HEIGHT, DEFAULT_PREVIEW_WIDTH, FRAME_INTERVAL_SECS, SPRITE_HEIGHT,
    SPRITE_SHEET_COLS, SPRITE_SHEET_ROWS, SPRITE_WIDTH,
};
use vhs_models::StoryboardLayout;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root of per-video scratch directories
    pub scratch_dir: PathBuf,
    /// Seconds between storyboard frames
    pub frame_interval: f64,
    /// Sprite sheet grid
    pub sheet_cols: u32,
    pub sheet_rows: u32,
    /// Storyboard cell size
    pub sprite_width: u32,
    pub sprite_height: u32,
    /// Generated preview size
    pub preview_width: u32,
    pub preview_height: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from("./data/scratch"),
            frame_interval: FRAME_INTERVAL_SECS,
            sheet_cols: SPRITE_SHEET_COLS,
            sheet_rows: SPRITE_SHEET_ROWS,
            sprite_width: SPRITE_WIDTH,
            sprite_height: SPRITE_HEIGHT,
            preview_width: DEFAULT_PREVIEW_WIDTH,
            preview_height: DEFAULT_PREVIEW_HEIGHT,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            scratch_dir: std::env::var("VHS_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            frame_interval: env_or("VHS_FRAME_INTERVAL_SECS", defaults.frame_interval),
            sheet_cols: env_or("VHS_SHEET_COLS", defaults.sheet_cols),
            sheet_rows: env_or("VHS_SHEET_ROWS", defaults.sheet_rows),
            sprite_width: env_or("VHS_SPRITE_WIDTH", defaults.sprite_width),
            sprite_height: env_or("VHS_SPRITE_HEIGHT", defaults.sprite_height),
            preview_width: env_or("VHS_PREVIEW_WIDTH", defaults.preview_width),
            preview_height: env_or("VHS_PREVIEW_HEIGHT", defaults.preview_height),
        }
    }

    /// Storyboard layout described by this config.
    pub fn layout(&self) -> StoryboardLayout {
        StoryboardLayout {
            interval: self.frame_interval,
            cols: self.sheet_cols,
            rows: self.sheet_rows,
            cell_width: self.sprite_width,
            cell_height: self.sprite_height,
        }
    }

    pub fn preview_size(&self) -> (u32, u32) {
        (self.preview_width, self.preview_height)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
