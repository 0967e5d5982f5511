use egui::Pos2;
use image::{Rgba, RgbaImage};

use super::capsule_pixels;
use crate::raster::BlendMode;

const OPAQUE: Rgba<u8> = Rgba([0, 0, 0, u8::MAX]);

/// An in-flight eraser stroke. Erasing is idempotent, so overlapping
/// stamps need no bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct EraserStroke {
    radius: f32,
    points: Vec<Pos2>,
}

impl EraserStroke {
    /// Starts erasing with a circle stamped at `start`
    pub(crate) fn begin(width: f32, start: Pos2, raster: &mut RgbaImage) -> Self {
        let stroke = Self {
            radius: (width / 2.0).max(0.5),
            points: vec![start],
        };
        stroke.erase(raster, start, start);
        stroke
    }

    /// Erases every circle along the motion from the last point to `to`
    pub(crate) fn extend(&mut self, raster: &mut RgbaImage, to: Pos2) {
        let from = self.points.last().copied().unwrap_or(to);
        self.points.push(to);
        self.erase(raster, from, to);
    }

    fn erase(&self, raster: &mut RgbaImage, from: Pos2, to: Pos2) {
        let bounds = raster.dimensions();
        capsule_pixels(bounds, from, to, self.radius, |x, y| {
            let dst = *raster.get_pixel(x, y);
            raster.put_pixel(x, y, BlendMode::DestinationOut.apply(dst, OPAQUE));
        });
    }

    pub(crate) fn into_points(self) -> Vec<Pos2> {
        self.points
    }
}
