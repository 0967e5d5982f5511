use crate::engine::SketchEngine;

use super::{InputEvent, RemoveTarget};

/// Dispatches `event` to the matching engine operation.
///
/// Returns true if the engine's observable state changed.
pub fn route_event(engine: &mut SketchEngine, event: InputEvent) -> bool {
    match event {
        InputEvent::AssetDropped {
            asset,
            screen_point,
        } => {
            engine.on_asset_dropped(asset, screen_point);
            true
        }
        InputEvent::PartGestureMove { id, rect } => engine.on_part_gesture_move(id, rect),
        InputEvent::PartGestureEnd { id, rect } => engine.on_part_gesture_end(id, rect),
        InputEvent::CanvasClicked { screen_point } => engine.on_canvas_clicked(screen_point),
        InputEvent::PointerDown { point } => engine.on_pointer_down(point),
        InputEvent::PointerMove { point } => engine.on_pointer_move(point),
        InputEvent::PointerUp { point } => engine.on_pointer_up(point),
        InputEvent::PointerLeave => engine.on_pointer_leave(),
        InputEvent::KeyDown { key, modifiers } => engine.on_key_down(key, modifiers),
        InputEvent::ToolSelected(tool) => engine.on_tool_selected(tool),
        InputEvent::LockToggleRequested => engine.on_lock_toggle_requested(),
        InputEvent::RemoveRequested(RemoveTarget::Part(id)) => engine.remove_part(id),
        InputEvent::RemoveRequested(RemoveTarget::All) => engine.remove_all(),
        InputEvent::ReorderRequested { id, placement } => engine.on_reorder_requested(id, placement),
        InputEvent::UndoRequested => engine.on_undo_requested(),
        InputEvent::RedoRequested => engine.on_redo_requested(),
        InputEvent::StepSelected(index) => engine.on_step_selected(index),
        InputEvent::ClearDrawingRequested => engine.clear_drawing(),
        InputEvent::PencilColorChanged(color) => {
            engine.set_pencil_color(color);
            false
        }
        InputEvent::PencilWidthChanged(width) => {
            engine.set_pencil_width(width);
            false
        }
        InputEvent::EraserWidthChanged(width) => {
            engine.set_eraser_width(width);
            false
        }
    }
}
