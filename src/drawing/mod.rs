//! The freehand raster layer composited above the parts.
//!
//! The layer is a canvas-sized RGBA8 bitmap. The pencil paints source-over
//! and the eraser paints destination-out. A gesture runs from pointer-down
//! to pointer-up (or pointer-leave) and yields a [`CompletedStroke`], which
//! is the caller's cue to commit history.

use egui::{Color32, Pos2};
use image::RgbaImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{RasterError, RasterResult};
use crate::geometry::distance_to_segment;
use crate::raster::{BlendMode, EncodedRaster};

mod eraser;
mod pencil;

use eraser::EraserStroke;
pub use pencil::PencilSettings;
use pencil::PencilStroke;

/// The active drawing tool. At most one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DrawingTool {
    /// Pointer input goes to the parts instead of the raster
    #[default]
    Idle,
    Pencil,
    Eraser,
}

impl DrawingTool {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Pencil => "Pencil",
            Self::Eraser => "Eraser",
        }
    }

    pub fn is_drawing_tool(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// How the tool's strokes combine with the raster
    pub fn blend_mode(&self) -> Option<BlendMode> {
        match self {
            Self::Idle => None,
            Self::Pencil => Some(BlendMode::SourceOver),
            Self::Eraser => Some(BlendMode::DestinationOut),
        }
    }
}

/// A finished pencil or eraser gesture
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedStroke {
    pub tool: DrawingTool,
    pub points: Vec<Pos2>,
}

#[derive(Debug, Clone)]
enum Gesture {
    Pencil(PencilStroke),
    Eraser(EraserStroke),
}

impl Gesture {
    fn finish(self) -> CompletedStroke {
        match self {
            Self::Pencil(stroke) => CompletedStroke {
                tool: DrawingTool::Pencil,
                points: stroke.into_points(),
            },
            Self::Eraser(stroke) => CompletedStroke {
                tool: DrawingTool::Eraser,
                points: stroke.into_points(),
            },
        }
    }
}

/// The drawing sublayer and its tool state
#[derive(Debug, Clone)]
pub struct DrawingLayer {
    raster: RgbaImage,
    tool: DrawingTool,
    pencil: PencilSettings,
    eraser_width: f32,
    gesture: Option<Gesture>,
}

impl DrawingLayer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raster: RgbaImage::new(width, height),
            tool: DrawingTool::Idle,
            pencil: PencilSettings::default(),
            eraser_width: 20.0,
            gesture: None,
        }
    }

    pub fn with_settings(mut self, pencil: PencilSettings, eraser_width: f32) -> Self {
        self.pencil = pencil;
        self.eraser_width = eraser_width;
        self
    }

    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    pub fn tool(&self) -> DrawingTool {
        self.tool
    }

    pub fn is_drawing(&self) -> bool {
        self.gesture.is_some()
    }

    /// True while every pixel is fully transparent
    pub fn is_blank(&self) -> bool {
        self.raster.pixels().all(|pixel| pixel[3] == 0)
    }

    pub fn pencil(&self) -> PencilSettings {
        self.pencil
    }

    pub fn eraser_width(&self) -> f32 {
        self.eraser_width
    }

    pub fn set_pencil_color(&mut self, color: Color32) {
        self.pencil.color = color;
    }

    pub fn set_pencil_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.pencil.width = width;
        }
    }

    pub fn set_eraser_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.eraser_width = width;
        }
    }

    /// Activates `tool`. A gesture that is still in flight ends first and is
    /// returned so the caller can commit it.
    pub fn select_tool(&mut self, tool: DrawingTool) -> Option<CompletedStroke> {
        let finished = self.gesture.take().map(Gesture::finish);
        if self.tool != tool {
            info!("🛠️ Tool changed: {} -> {}", self.tool.name(), tool.name());
            self.tool = tool;
        }
        finished
    }

    /// Like [`Self::select_tool`], but selecting the active tool goes back to idle
    pub fn toggle_tool(&mut self, tool: DrawingTool) -> Option<CompletedStroke> {
        let next = if self.tool == tool {
            DrawingTool::Idle
        } else {
            tool
        };
        self.select_tool(next)
    }

    /// Begins a gesture with the active tool. Returns false when idle or when
    /// a gesture is already running.
    pub fn pointer_down(&mut self, point: Pos2) -> bool {
        if self.gesture.is_some() {
            debug!("Ignoring pointer down during an active gesture");
            return false;
        }

        self.gesture = match self.tool {
            DrawingTool::Idle => None,
            DrawingTool::Pencil => Some(Gesture::Pencil(PencilStroke::begin(
                self.pencil,
                point,
                &self.raster,
            ))),
            DrawingTool::Eraser => Some(Gesture::Eraser(EraserStroke::begin(
                self.eraser_width,
                point,
                &mut self.raster,
            ))),
        };
        self.gesture.is_some()
    }

    /// Extends the running gesture. Returns false when nothing is being drawn.
    pub fn pointer_move(&mut self, point: Pos2) -> bool {
        match &mut self.gesture {
            Some(Gesture::Pencil(stroke)) => stroke.extend(&mut self.raster, point),
            Some(Gesture::Eraser(stroke)) => stroke.extend(&mut self.raster, point),
            None => return false,
        }
        true
    }

    /// Ends the running gesture. Pointer-leave ends it the same way.
    pub fn pointer_up(&mut self) -> Option<CompletedStroke> {
        let completed = self.gesture.take().map(Gesture::finish)?;
        debug!(
            "{} stroke finished with {} points",
            completed.tool.name(),
            completed.points.len()
        );
        Some(completed)
    }

    /// Erases the whole layer and abandons any gesture
    pub fn clear(&mut self) {
        self.gesture = None;
        for pixel in self.raster.pixels_mut() {
            pixel.0 = [0, 0, 0, 0];
        }
    }

    pub fn encode(&self) -> RasterResult<EncodedRaster> {
        EncodedRaster::encode(&self.raster)
    }

    /// Replaces the raster content, which must match the canvas size
    pub(crate) fn restore(&mut self, raster: RgbaImage) -> RasterResult<()> {
        if raster.dimensions() != self.raster.dimensions() {
            return Err(RasterError::SizeMismatch {
                expected: self.raster.dimensions(),
                actual: raster.dimensions(),
            });
        }
        self.gesture = None;
        self.raster = raster;
        Ok(())
    }
}

/// Calls `visit` for every pixel whose center lies within `radius` of the
/// segment `from..to`, restricted to `bounds`.
pub(crate) fn capsule_pixels(
    bounds: (u32, u32),
    from: Pos2,
    to: Pos2,
    radius: f32,
    mut visit: impl FnMut(u32, u32),
) {
    let (width, height) = bounds;
    if width == 0 || height == 0 || !radius.is_finite() {
        return;
    }

    let min_x = (from.x.min(to.x) - radius).floor().max(0.0);
    let min_y = (from.y.min(to.y) - radius).floor().max(0.0);
    let max_x = (from.x.max(to.x) + radius).ceil().min(width as f32 - 1.0);
    let max_y = (from.y.max(to.y) + radius).ceil().min(height as f32 - 1.0);
    if !(min_x <= max_x && min_y <= max_y) {
        return;
    }

    for y in min_y as u32..=max_y as u32 {
        for x in min_x as u32..=max_x as u32 {
            let center = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
            if distance_to_segment(center, from, to) <= radius {
                visit(x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_idle_ignores_pointer() {
        let mut layer = DrawingLayer::new(10, 10);
        assert!(!layer.pointer_down(pos2(5.0, 5.0)));
        assert!(!layer.pointer_move(pos2(6.0, 6.0)));
        assert!(layer.pointer_up().is_none());
        assert!(layer.is_blank());
    }

    #[test]
    fn test_pencil_gesture_paints() {
        let mut layer = DrawingLayer::new(20, 20);
        layer.select_tool(DrawingTool::Pencil);

        assert!(layer.pointer_down(pos2(2.0, 2.0)));
        assert!(layer.is_blank());
        assert!(layer.pointer_move(pos2(15.0, 15.0)));
        let stroke = layer.pointer_up().unwrap();

        assert_eq!(stroke.tool, DrawingTool::Pencil);
        assert_eq!(stroke.points.len(), 2);
        assert!(!layer.is_blank());
        assert!(!layer.is_drawing());
    }

    #[test]
    fn test_toggle_returns_to_idle() {
        let mut layer = DrawingLayer::new(10, 10);
        layer.toggle_tool(DrawingTool::Eraser);
        assert_eq!(layer.tool(), DrawingTool::Eraser);
        layer.toggle_tool(DrawingTool::Eraser);
        assert_eq!(layer.tool(), DrawingTool::Idle);
    }

    #[test]
    fn test_switching_tool_finishes_gesture() {
        let mut layer = DrawingLayer::new(10, 10);
        layer.select_tool(DrawingTool::Pencil);
        layer.pointer_down(pos2(1.0, 1.0));

        let finished = layer.select_tool(DrawingTool::Eraser).unwrap();
        assert_eq!(finished.tool, DrawingTool::Pencil);
        assert!(!layer.is_drawing());
    }

    #[test]
    fn test_width_change_applies_to_next_stroke() {
        let mut layer = DrawingLayer::new(30, 30);
        layer.select_tool(DrawingTool::Pencil);
        layer.pointer_down(pos2(5.0, 15.0));
        layer.set_pencil_width(10.0);
        layer.pointer_move(pos2(25.0, 15.0));
        layer.pointer_up();

        // Still the 2px stroke
        assert_eq!(layer.raster().get_pixel(15, 11)[3], 0);
        assert_eq!(layer.pencil().width, 10.0);
    }

    #[test]
    fn test_restore_rejects_wrong_size() {
        let mut layer = DrawingLayer::new(10, 10);
        let result = layer.restore(RgbaImage::new(5, 5));
        assert!(matches!(result, Err(RasterError::SizeMismatch { .. })));
    }

    #[test]
    fn test_capsule_clips_to_bounds() {
        let mut visited = Vec::new();
        capsule_pixels((4, 4), pos2(-10.0, 0.5), pos2(0.5, 0.5), 1.0, |x, y| {
            visited.push((x, y))
        });
        assert!(visited.contains(&(0, 0)));
        assert!(visited.iter().all(|(x, y)| *x < 4 && *y < 4));
    }
}
