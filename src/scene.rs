//! The ordered collection of parts on the canvas.
//!
//! Index 0 is the back-most part and the last index the front-most. Every
//! part rectangle is kept inside the canvas by clamping on the way in, so
//! the bounds invariant holds after any sequence of operations.

use egui::{Pos2, Rect, Vec2};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::asset::AssetRef;
use crate::geometry::{hit_testing, mapper};
use crate::part::{Part, PartId};

/// Which end of the stacking order a part moves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    Front,
    Back,
}

/// Result of [`Scene::transform_part`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOutcome {
    /// The part moved; `clamped` is set if the proposal had to be adjusted
    Applied { clamped: bool },
    /// Locked parts keep their geometry
    Locked,
    Missing,
}

#[derive(Debug, Clone)]
pub struct Scene {
    parts: Vec<Part>,
    selected: Option<usize>,
    canvas_size: Vec2,
}

impl Scene {
    pub fn new(canvas_size: Vec2) -> Self {
        Self {
            parts: Vec::new(),
            selected: None,
            canvas_size,
        }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn canvas_size(&self) -> Vec2 {
        self.canvas_size
    }

    pub fn get(&self, id: PartId) -> Option<&Part> {
        self.parts.iter().find(|part| part.id() == id)
    }

    pub fn index_of(&self, id: PartId) -> Option<usize> {
        self.parts.iter().position(|part| part.id() == id)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Part> {
        self.selected.and_then(|index| self.parts.get(index))
    }

    pub fn selected_id(&self) -> Option<PartId> {
        self.selected().map(Part::id)
    }

    /// Places a new unlocked part with its top-left at `point`, in front of
    /// every other part, and selects it
    pub fn add_part(&mut self, asset: AssetRef, point: Pos2, size: Vec2) -> PartId {
        let rect = mapper::clamp(Rect::from_min_size(point, size), self.canvas_size);
        let part = Part::new(asset, rect);
        let id = part.id();

        info!("➕ Added part {id} ({}) at {:?}", part.asset(), rect.min);
        self.parts.push(part);
        self.selected = Some(self.parts.len() - 1);
        id
    }

    /// Moves/resizes a part to `proposed`, clamped to the canvas
    pub fn transform_part(&mut self, id: PartId, proposed: Rect) -> TransformOutcome {
        let canvas_size = self.canvas_size;
        let Some(part) = self.parts.iter_mut().find(|part| part.id() == id) else {
            return TransformOutcome::Missing;
        };
        if part.is_locked() {
            debug!("Part {id} is locked, ignoring transform");
            return TransformOutcome::Locked;
        }

        let rect = mapper::clamp(proposed, canvas_size);
        part.set_rect(rect);
        TransformOutcome::Applied {
            clamped: rect != proposed,
        }
    }

    /// Moves a part to the front or back and selects it. Returns true if
    /// the order changed.
    pub fn reorder(&mut self, id: PartId, placement: Placement) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let target = match placement {
            Placement::Front => self.parts.len() - 1,
            Placement::Back => 0,
        };
        if index == target {
            return false;
        }

        let part = self.parts.remove(index);
        match placement {
            Placement::Front => self.parts.push(part),
            Placement::Back => self.parts.insert(0, part),
        }
        self.selected = Some(target);

        debug!("Moved part {id} to the {placement:?}");
        true
    }

    pub fn reorder_to_front(&mut self, id: PartId) -> bool {
        self.reorder(id, Placement::Front)
    }

    pub fn reorder_to_back(&mut self, id: PartId) -> bool {
        self.reorder(id, Placement::Back)
    }

    /// Flips the lock flag. Returns the new state, or `None` for an unknown id.
    pub fn toggle_lock(&mut self, id: PartId) -> Option<bool> {
        let part = self.parts.iter_mut().find(|part| part.id() == id)?;
        let locked = !part.is_locked();
        part.set_locked(locked);
        info!("{} part {id}", if locked { "🔒 Locked" } else { "🔓 Unlocked" });
        Some(locked)
    }

    pub fn remove_part(&mut self, id: PartId) -> Option<Part> {
        let index = self.index_of(id)?;
        let removed = self.parts.remove(index);

        self.selected = match self.selected {
            Some(selected) if selected == index => None,
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };

        info!("🗑️ Removed part {id}");
        Some(removed)
    }

    /// Removes every part. Returns false if the scene was already empty.
    pub fn remove_all(&mut self) -> bool {
        let had_parts = !self.parts.is_empty();
        self.parts.clear();
        self.selected = None;
        had_parts
    }

    /// Selects `id`, or clears the selection for `None`. Unknown ids leave
    /// the selection alone. Returns true if the selection changed.
    pub fn select(&mut self, id: Option<PartId>) -> bool {
        let next = match id {
            Some(id) => match self.index_of(id) {
                Some(index) => Some(index),
                None => return false,
            },
            None => None,
        };

        let changed = next != self.selected;
        self.selected = next;
        changed
    }

    /// Selects the front-most part under `point`, clearing the selection
    /// when there is none
    pub fn select_at(&mut self, point: Pos2) -> Option<PartId> {
        self.selected = hit_testing::part_at(&self.parts, point);
        self.selected_id()
    }

    /// Replaces all parts, e.g. from a history entry. The selection survives
    /// if its part is still present.
    pub(crate) fn restore_parts(&mut self, parts: Vec<Part>) {
        let selected = self.selected_id();
        self.parts = parts;
        self.selected = selected.and_then(|id| self.index_of(id));
    }

    pub(crate) fn restore_selection(&mut self, index: Option<usize>) {
        self.selected = index.filter(|index| *index < self.parts.len());
    }

    /// Collapses the scene into one part covering the whole canvas
    pub(crate) fn replace_with_flattened(&mut self, asset: AssetRef) -> PartId {
        let rect = Rect::from_min_size(Pos2::ZERO, self.canvas_size);
        let part = Part::new(asset, rect);
        let id = part.id();
        self.parts = vec![part];
        self.selected = None;
        id
    }
}
