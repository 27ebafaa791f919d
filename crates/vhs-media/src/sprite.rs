//! Sprite sheet packing.
//!
//! Frames are laid out row-major, filling one sheet before the next. Every
//! sheet has the full `cols` x `rows` canvas; unused cells of the last sheet
//! stay black.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, RgbImage};
use tokio::fs;
use tracing::debug;

use vhs_models::{SpriteSheet, StoryboardFrame, StoryboardLayout};

use crate::error::{MediaError, MediaResult};

/// JPEG quality of encoded sheets.
pub const SHEET_JPEG_QUALITY: u8 = 80;

/// File name of the sheet with index `index`.
pub fn sheet_file_name(index: usize) -> String {
    format!("sheet{:06}.jpg", index)
}

/// Distribute `frames` (in sequence order) over sheets.
pub fn plan_sheets(frames: &[StoryboardFrame], layout: &StoryboardLayout) -> Vec<SpriteSheet> {
    let capacity = layout.capacity();
    let mut sheets: Vec<SpriteSheet> = (0..layout.sheet_count(frames.len()))
        .map(|index| SpriteSheet {
            index,
            cells: vec![None; capacity],
        })
        .collect();

    for (position, frame) in frames.iter().enumerate() {
        let cell = layout.cell_for(position);
        sheets[cell.sheet].cells[cell.local] = Some(frame.clone());
    }

    sheets
}

/// Compose one sheet and write it as JPEG to `output`.
///
/// Blocking; call from `spawn_blocking` in async code.
pub fn render_sheet(
    sheet: &SpriteSheet,
    layout: &StoryboardLayout,
    output: &Path,
) -> MediaResult<()> {
    let (width, height) = layout.sheet_dimensions();
    let mut canvas = RgbImage::new(width, height);

    for (local, frame) in sheet.cells.iter().enumerate() {
        let Some(frame) = frame else {
            continue;
        };

        let mut cell = image::open(&frame.path)
            .map_err(|e| MediaError::image(&frame.path, e))?
            .to_rgb8();
        if cell.dimensions() != (layout.cell_width, layout.cell_height) {
            cell = imageops::resize(
                &cell,
                layout.cell_width,
                layout.cell_height,
                FilterType::Triangle,
            );
        }

        let col = (local % layout.cols as usize) as u32;
        let row = (local / layout.cols as usize) as u32;
        imageops::replace(
            &mut canvas,
            &cell,
            i64::from(col * layout.cell_width),
            i64::from(row * layout.cell_height),
        );
    }

    let mut writer = BufWriter::new(File::create(output)?);
    JpegEncoder::new_with_quality(&mut writer, SHEET_JPEG_QUALITY)
        .encode(canvas.as_raw(), width, height, ColorType::Rgb8)
        .map_err(|e| MediaError::image(output, e))?;

    Ok(())
}

/// Pack `frames` into sheets under `out_dir`, returning sheet paths in order.
pub async fn build_sprite_sheets(
    frames: &[StoryboardFrame],
    layout: &StoryboardLayout,
    out_dir: &Path,
) -> MediaResult<Vec<PathBuf>> {
    layout.validate()?;
    fs::create_dir_all(out_dir).await?;

    let sheets = plan_sheets(frames, layout);
    let mut paths = Vec::with_capacity(sheets.len());

    for sheet in sheets {
        let output = out_dir.join(sheet_file_name(sheet.index));
        debug!(
            sheet = sheet.index,
            frames = sheet.frame_count(),
            "Rendering sprite sheet {}",
            output.display()
        );

        let layout = *layout;
        let target = output.clone();
        tokio::task::spawn_blocking(move || render_sheet(&sheet, &layout, &target))
            .await
            .map_err(|e| MediaError::internal(format!("sprite sheet task failed: {}", e)))??;

        paths.push(output);
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    fn small_layout() -> StoryboardLayout {
        StoryboardLayout {
            interval: 5.0,
            cols: 2,
            rows: 2,
            cell_width: 16,
            cell_height: 16,
        }
    }

    fn write_frames(dir: &Path, count: usize, layout: &StoryboardLayout) -> Vec<StoryboardFrame> {
        (0..count)
            .map(|index| {
                let path = dir.join(format!("img{:06}.png", index));
                let shade = (index as u8 + 1) * 40;
                RgbImage::from_pixel(layout.cell_width, layout.cell_height, Rgb([shade, 0, 0]))
                    .save(&path)
                    .unwrap();
                StoryboardFrame {
                    index,
                    path,
                    offset: 1.0 + index as f64 * layout.interval,
                }
            })
            .collect()
    }

    fn dummy_frame(index: usize) -> StoryboardFrame {
        StoryboardFrame {
            index,
            path: PathBuf::from(format!("img{:06}.jpg", index)),
            offset: 1.0 + index as f64 * 5.0,
        }
    }

    #[test]
    fn test_plan_fills_sheets_in_order() {
        let layout = small_layout();
        let frames: Vec<_> = (0..5).map(dummy_frame).collect();
        let sheets = plan_sheets(&frames, &layout);

        assert_eq!(sheets.len(), 2);
        assert!(sheets.iter().all(|s| s.cells.len() == 4));
        assert_eq!(sheets[0].frame_count(), 4);
        assert_eq!(sheets[1].frame_count(), 1);
        assert_eq!(sheets[1].cells[0].as_ref().unwrap().index, 4);
        assert!(sheets[1].cells[1].is_none());
    }

    #[test]
    fn test_plan_empty() {
        assert!(plan_sheets(&[], &small_layout()).is_empty());
    }

    #[test]
    fn test_plan_default_layout_single_sheet() {
        let layout = StoryboardLayout::default();
        let frames: Vec<_> = (0..3).map(dummy_frame).collect();
        let sheets = plan_sheets(&frames, &layout);
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].cells.len(), 400);
        assert_eq!(sheets[0].frame_count(), 3);
    }

    #[tokio::test]
    async fn test_build_sheets_places_cells_row_major() {
        let dir = TempDir::new().unwrap();
        let layout = small_layout();
        let frames = write_frames(dir.path(), 3, &layout);

        let paths = build_sprite_sheets(&frames, &layout, &dir.path().join("sheets"))
            .await
            .unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("sheets/sheet000000.jpg"));

        let sheet = image::open(&paths[0]).unwrap().to_rgb8();
        assert_eq!(sheet.dimensions(), (32, 32));

        // JPEG is lossy, compare the dominant channel at cell centers only.
        let red = |x: u32, y: u32| sheet.get_pixel(x, y).0[0] as i32;
        assert!((red(8, 8) - 40).abs() < 25, "frame 0 at top-left");
        assert!((red(24, 8) - 80).abs() < 25, "frame 1 at top-right");
        assert!((red(8, 24) - 120).abs() < 25, "frame 2 at bottom-left");
        assert!(red(24, 24) < 25, "empty cell stays black");
    }

    #[tokio::test]
    async fn test_resizes_mismatched_frames() {
        let dir = TempDir::new().unwrap();
        let layout = small_layout();
        let path = dir.path().join("big.png");
        RgbImage::from_pixel(40, 30, Rgb([0, 200, 0])).save(&path).unwrap();
        let frames = vec![StoryboardFrame {
            index: 0,
            path,
            offset: 1.0,
        }];

        let paths = build_sprite_sheets(&frames, &layout, dir.path()).await.unwrap();
        let sheet = image::open(&paths[0]).unwrap().to_rgb8();
        assert!(sheet.get_pixel(8, 8).0[1] > 150);
    }

    #[tokio::test]
    async fn test_missing_frame_is_an_error() {
        let dir = TempDir::new().unwrap();
        let frames = vec![dummy_frame(0)];
        let result = build_sprite_sheets(&frames, &small_layout(), dir.path()).await;
        assert!(matches!(result, Err(MediaError::Image { .. })));
    }

    #[tokio::test]
    async fn test_undecodable_frame_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("img000000.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        let frames = vec![StoryboardFrame {
            index: 0,
            path,
            offset: 1.0,
        }];
        let result = build_sprite_sheets(&frames, &small_layout(), dir.path()).await;
        assert!(matches!(result, Err(MediaError::Image { .. })));
    }
}
