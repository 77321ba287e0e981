use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, GenericImageView};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::ocr::OcrEngine;
use crate::reader::{self, ReaderOptions, Reading};

/// Screen rectangle in absolute coordinates, always normalized so that
/// `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    /// Builds a region from the press and release points of a drag, in any
    /// corner order.
    pub fn from_drag(start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            x1: start.0.min(end.0),
            y1: start.1.min(end.1),
            x2: start.0.max(end.0),
            y2: start.1.max(end.1),
        }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl FromStr for Region {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let nums = value
            .split(',')
            .map(|part| part.trim().parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("invalid region '{}': expected x1,y1,x2,y2", value))?;
        let &[x1, y1, x2, y2] = &nums[..] else {
            return Err(anyhow!(
                "invalid region '{}': expected 4 numbers, got {}",
                value,
                nums.len()
            ));
        };
        Ok(Self::from_drag((x1, y1), (x2, y2)))
    }
}

/// Crops `region` out of a full-screen capture, clamped to the image bounds.
pub fn crop_region(screen: &DynamicImage, region: Region) -> Result<DynamicImage> {
    let (width, height) = screen.dimensions();
    let x1 = region.x1.min(width);
    let y1 = region.y1.min(height);
    let x2 = region.x2.min(width);
    let y2 = region.y2.min(height);
    if x2 <= x1 || y2 <= y1 {
        return Err(anyhow!(
            "region {:?} does not overlap the {}x{} capture",
            region,
            width,
            height
        ));
    }
    Ok(screen.crop_imm(x1, y1, x2 - x1, y2 - y1))
}

/// Capture function backed by a screenshot stored on disk.
pub fn screenshot_file(path: &Path) -> impl FnOnce(Region) -> Result<DynamicImage> + '_ {
    move |region| {
        let screen = image::open(path)
            .with_context(|| format!("failed to open screenshot: {}", path.display()))?;
        crop_region(&screen, region)
    }
}

/// Captures `region`, runs OCR on it and rebuilds the text.
pub fn read_region<F>(
    region: Region,
    capture: F,
    ocr: &dyn OcrEngine,
    options: &ReaderOptions,
) -> Result<Reading>
where
    F: FnOnce(Region) -> Result<DynamicImage>,
{
    if region.is_empty() {
        return Err(anyhow!("selected region is empty: {:?}", region));
    }
    let image = capture(region).with_context(|| "failed to capture region")?;
    let tokens = ocr.recognize(&image)?;
    let reading = reader::process_with(&tokens, options);
    info!(
        "capture {}x{}: {} tokens, {} segments",
        region.width(),
        region.height(),
        tokens.len(),
        reading.segments.len()
    );
    Ok(reading)
}
