//! Conversion from host coordinates into canvas space, and clamping of part
//! geometry to the canvas.
//!
//! Everything here is pure. [`clamp`] always returns a rectangle that lies
//! inside the canvas and has a positive size.

use egui::{Pos2, Rect, Vec2, pos2, vec2};

/// Smallest width or height a clamped rectangle can have
pub const MIN_EXTENT: f32 = 1.0;

/// Converts a point in host (screen) space into canvas-local space.
pub fn to_local(screen_point: Pos2, canvas_rect: Rect) -> Pos2 {
    (screen_point - canvas_rect.min).to_pos2()
}

/// Constrains `rect` so it lies within a canvas of `canvas_size`.
///
/// The rectangle is translated back into bounds first. Its size only shrinks
/// when it is larger than the canvas itself.
pub fn clamp(rect: Rect, canvas_size: Vec2) -> Rect {
    debug_assert!(
        canvas_size.x > 0.0 && canvas_size.y > 0.0,
        "canvas must have a non-zero size"
    );

    let width = sanitize_extent(rect.width()).min(canvas_size.x);
    let height = sanitize_extent(rect.height()).min(canvas_size.y);

    let x = sanitize_coord(rect.min.x).clamp(0.0, canvas_size.x - width);
    let y = sanitize_coord(rect.min.y).clamp(0.0, canvas_size.y - height);

    Rect::from_min_size(pos2(x, y), vec2(width, height))
}

/// Returns true if `rect` already satisfies the canvas bounds.
pub fn fits(rect: Rect, canvas_size: Vec2) -> bool {
    rect.min.x >= 0.0
        && rect.min.y >= 0.0
        && rect.width() > 0.0
        && rect.height() > 0.0
        && rect.max.x <= canvas_size.x
        && rect.max.y <= canvas_size.y
}

fn sanitize_extent(value: f32) -> f32 {
    if value.is_finite() && value >= MIN_EXTENT {
        value
    } else {
        MIN_EXTENT
    }
}

fn sanitize_coord(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}
