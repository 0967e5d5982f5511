//! Painting of the parts and the drawing layer into a single bitmap.
//!
//! [`compose`] reads bitmaps from the [`AssetCache`] only, so its output
//! depends on nothing but its arguments. [`draw_composite`] resolves
//! missing assets first and only paints once every fetch has settled.

use std::collections::HashSet;

use image::RgbaImage;
use image::imageops::{self, FilterType};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::asset::{AssetCache, AssetSource};
use crate::error::AssetError;
use crate::part::Part;

/// How a bitmap is fitted into its part rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FitMode {
    /// Scale uniformly to fit inside the rectangle, centered
    #[default]
    Contain,
    /// Stretch to the rectangle
    Fill,
}

/// A painted frame plus the assets that could not be painted
#[derive(Debug, Clone)]
pub struct Composite {
    pub image: RgbaImage,
    pub failures: Vec<AssetError>,
}

impl Composite {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Pixel placement of a bitmap inside a part rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Snaps a part rectangle to whole pixels, never collapsing to zero
    pub fn from_part(part: &Part) -> Self {
        let rect = part.rect();
        Self {
            x: rect.min.x.round() as i64,
            y: rect.min.y.round() as i64,
            width: (rect.width().round() as u32).max(1),
            height: (rect.height().round() as u32).max(1),
        }
    }
}

/// Where an `image_size` bitmap lands inside `target` under `fit`
pub fn fitted_rect(target: PixelRect, image_size: (u32, u32), fit: FitMode) -> PixelRect {
    let (image_width, image_height) = image_size;
    if fit == FitMode::Fill || image_width == 0 || image_height == 0 {
        return target;
    }

    let scale = (target.width as f32 / image_width as f32)
        .min(target.height as f32 / image_height as f32);
    let width = ((image_width as f32 * scale).round() as u32).clamp(1, target.width);
    let height = ((image_height as f32 * scale).round() as u32).clamp(1, target.height);

    PixelRect {
        x: target.x + i64::from((target.width - width) / 2),
        y: target.y + i64::from((target.height - height) / 2),
        width,
        height,
    }
}

/// Paints `parts` back to front, then `drawing` on top.
///
/// A part whose asset is not cached leaves its region blank and is reported
/// in [`Composite::failures`], once per asset.
pub fn compose(
    canvas: (u32, u32),
    parts: &[Part],
    cache: &AssetCache,
    drawing: &RgbaImage,
    fit: FitMode,
) -> Composite {
    let (width, height) = canvas;
    let mut image = RgbaImage::new(width, height);
    let mut failures = Vec::new();
    let mut reported = HashSet::new();

    for part in parts {
        let Some(bitmap) = cache.get(part.asset()) else {
            if reported.insert(part.asset().clone()) {
                failures.push(AssetError::NotFound(part.asset().clone()));
            }
            continue;
        };

        let placed = fitted_rect(PixelRect::from_part(part), bitmap.dimensions(), fit);
        if bitmap.dimensions() == (placed.width, placed.height) {
            imageops::overlay(&mut image, &*bitmap, placed.x, placed.y);
        } else {
            let scaled = imageops::resize(&*bitmap, placed.width, placed.height, FilterType::Triangle);
            imageops::overlay(&mut image, &scaled, placed.x, placed.y);
        }
    }

    imageops::overlay(&mut image, drawing, 0, 0);

    if !failures.is_empty() {
        debug!("Composite left {} assets blank", failures.len());
    }
    Composite { image, failures }
}

/// Loads every asset `parts` needs from `source`, then paints.
///
/// Painting starts only after all loads have finished, whatever order they
/// finish in.
pub async fn draw_composite<S>(
    canvas: (u32, u32),
    parts: &[Part],
    cache: &AssetCache,
    source: &S,
    drawing: &RgbaImage,
    fit: FitMode,
) -> Composite
where
    S: AssetSource + ?Sized,
{
    let wanted: Vec<_> = parts.iter().map(|part| part.asset().clone()).collect();
    let mut failures = cache.preload(source, &wanted).await;

    let mut composite = compose(canvas, parts, cache, drawing, fit);
    let already: HashSet<_> = failures.iter().map(|err| err.asset().clone()).collect();
    failures.extend(
        composite
            .failures
            .drain(..)
            .filter(|err| !already.contains(err.asset())),
    );
    composite.failures = failures;
    composite
}
