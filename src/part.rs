use std::fmt;

use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::AssetRef;

/// A unique identifier for a placed part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(Uuid);

impl PartId {
    /// Creates a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PartId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An image fragment placed on the canvas.
///
/// Geometry is kept in canvas-local units. The [`crate::Scene`] that owns a
/// part is responsible for keeping it inside the canvas; a part has no
/// notion of the canvas size on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    id: PartId,
    asset: AssetRef,
    position: Pos2,
    size: Vec2,
    locked: bool,
}

impl Part {
    pub(crate) fn new(asset: AssetRef, rect: Rect) -> Self {
        Self {
            id: PartId::new(),
            asset,
            position: rect.min,
            size: rect.size(),
            locked: false,
        }
    }

    pub fn id(&self) -> PartId {
        self.id
    }

    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }

    pub fn position(&self) -> Pos2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn width(&self) -> f32 {
        self.size.x
    }

    pub fn height(&self) -> f32 {
        self.size.y
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// True for the synthetic part produced by jumping to a step
    pub fn is_flattened(&self) -> bool {
        self.asset.is_flattened_step()
    }

    pub(crate) fn set_rect(&mut self, rect: Rect) {
        self.position = rect.min;
        self.size = rect.size();
    }

    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }
}
