use egui::{Color32, Pos2};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use super::capsule_pixels;
use crate::raster::BlendMode;

/// Color and width of the pencil. Changes apply to the next stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PencilSettings {
    pub color: Color32,
    pub width: f32,
}

impl Default for PencilSettings {
    fn default() -> Self {
        Self {
            color: Color32::BLACK,
            width: 2.0,
        }
    }
}

/// An in-flight pencil stroke.
///
/// Consecutive segments overlap at their joints, so the stroke remembers
/// which pixels it already painted and never paints one twice. A
/// translucent color therefore ends up uniform along the whole path.
#[derive(Debug, Clone)]
pub(crate) struct PencilStroke {
    color: Rgba<u8>,
    radius: f32,
    points: Vec<Pos2>,
    painted: Vec<bool>,
    row_len: usize,
}

impl PencilStroke {
    pub(crate) fn begin(settings: PencilSettings, start: Pos2, canvas: &RgbaImage) -> Self {
        Self {
            color: Rgba(settings.color.to_srgba_unmultiplied()),
            radius: (settings.width / 2.0).max(0.5),
            points: vec![start],
            painted: vec![false; canvas.width() as usize * canvas.height() as usize],
            row_len: canvas.width() as usize,
        }
    }

    /// Paints the segment from the last point to `to`
    pub(crate) fn extend(&mut self, raster: &mut RgbaImage, to: Pos2) {
        let from = self.points.last().copied().unwrap_or(to);
        self.points.push(to);

        let bounds = raster.dimensions();
        let color = self.color;
        let painted = &mut self.painted;
        let row_len = self.row_len;
        capsule_pixels(bounds, from, to, self.radius, |x, y| {
            let index = y as usize * row_len + x as usize;
            if !painted[index] {
                painted[index] = true;
                let dst = *raster.get_pixel(x, y);
                raster.put_pixel(x, y, BlendMode::SourceOver.apply(dst, color));
            }
        });
    }

    pub(crate) fn into_points(self) -> Vec<Pos2> {
        self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_translucent_stroke_is_uniform() {
        let mut raster = RgbaImage::new(20, 20);
        let settings = PencilSettings {
            color: Color32::from_rgba_unmultiplied(255, 0, 0, 128),
            width: 4.0,
        };

        let mut stroke = PencilStroke::begin(settings, pos2(2.0, 10.0), &raster);
        stroke.extend(&mut raster, pos2(10.0, 10.0));
        stroke.extend(&mut raster, pos2(18.0, 10.0));

        // The joint at x = 10 is covered by both segments
        assert_eq!(raster.get_pixel(10, 10)[3], raster.get_pixel(5, 10)[3]);
        assert_eq!(raster.get_pixel(10, 10)[3], 128);
        assert_eq!(raster.get_pixel(10, 0)[3], 0);
        assert_eq!(stroke.into_points().len(), 3);
    }
}
