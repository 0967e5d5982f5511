//! Host input, expressed as engine-level events.
//!
//! A host can call the [`crate::SketchEngine`] methods directly or queue
//! [`InputEvent`]s and feed them through [`route_event`]. egui hosts can
//! translate raw `egui::Event`s with [`InputEvent::from_egui`].

use egui::{Color32, Key, Modifiers, PointerButton, Pos2, Rect};

use crate::asset::AssetRef;
use crate::drawing::DrawingTool;
use crate::geometry::mapper;
use crate::part::PartId;
use crate::scene::Placement;

mod keyboard;
mod router;

pub use keyboard::{KeyCommand, KeyboardController};
pub use router::route_event;

/// What a remove request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveTarget {
    Part(PartId),
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A palette asset was dropped at a host-space point
    AssetDropped {
        asset: AssetRef,
        screen_point: Pos2,
    },
    /// Live drag/resize feedback; never committed
    PartGestureMove {
        id: PartId,
        rect: Rect,
    },
    /// Drag/resize released
    PartGestureEnd {
        id: PartId,
        rect: Rect,
    },
    CanvasClicked {
        screen_point: Pos2,
    },
    /// Pointer events for the drawing layer, in canvas-local space
    PointerDown {
        point: Pos2,
    },
    PointerMove {
        point: Pos2,
    },
    PointerUp {
        point: Pos2,
    },
    PointerLeave,
    KeyDown {
        key: Key,
        modifiers: Modifiers,
    },
    ToolSelected(DrawingTool),
    LockToggleRequested,
    RemoveRequested(RemoveTarget),
    ReorderRequested {
        id: PartId,
        placement: Placement,
    },
    UndoRequested,
    RedoRequested,
    StepSelected(usize),
    ClearDrawingRequested,
    PencilColorChanged(Color32),
    PencilWidthChanged(f32),
    EraserWidthChanged(f32),
}

impl InputEvent {
    /// Translates a raw egui event on a canvas occupying `canvas_rect`.
    ///
    /// Only primary-button presses, pointer motion, pointer loss and key
    /// presses have an engine meaning; everything else yields `None`.
    pub fn from_egui(event: &egui::Event, canvas_rect: Rect) -> Option<Self> {
        match event {
            egui::Event::PointerButton {
                pos,
                button: PointerButton::Primary,
                pressed,
                ..
            } => {
                let point = mapper::to_local(*pos, canvas_rect);
                Some(if *pressed {
                    Self::PointerDown { point }
                } else {
                    Self::PointerUp { point }
                })
            }
            egui::Event::PointerMoved(pos) => Some(Self::PointerMove {
                point: mapper::to_local(*pos, canvas_rect),
            }),
            egui::Event::PointerGone => Some(Self::PointerLeave),
            egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } => Some(Self::KeyDown {
                key: *key,
                modifiers: *modifiers,
            }),
            _ => None,
        }
    }
}
