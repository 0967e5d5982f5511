use std::fmt;
use std::sync::Arc;

use egui::Rect;
use image::{RgbaImage, imageops};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::AssetRef;
use crate::util::time;

/// A unique identifier for a recorded step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepId(Uuid);

impl StepId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A flattened composite captured just before a part was dropped.
///
/// `rect` is where the bitmap goes when the step is re-hydrated as a part,
/// which is always the whole canvas.
#[derive(Clone)]
pub struct Step {
    id: StepId,
    bitmap: Arc<RgbaImage>,
    rect: Rect,
    timestamp: u64,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("id", &self.id)
            .field("size", &self.bitmap.dimensions())
            .field("rect", &self.rect)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl Step {
    pub(crate) fn from_parts(id: StepId, bitmap: Arc<RgbaImage>, rect: Rect, timestamp: u64) -> Self {
        Self {
            id,
            bitmap,
            rect,
            timestamp,
        }
    }

    pub fn id(&self) -> StepId {
        self.id
    }

    pub fn bitmap(&self) -> &Arc<RgbaImage> {
        &self.bitmap
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The asset under which this step's bitmap is cached once it is jumped to
    pub fn asset_ref(&self) -> AssetRef {
        AssetRef::flattened_step(self.id)
    }

    /// A downscaled copy whose longest edge is at most `max_edge`, keeping the aspect ratio
    pub fn thumbnail(&self, max_edge: u32) -> RgbaImage {
        let (width, height) = self.bitmap.dimensions();
        let longest = width.max(height);
        if longest <= max_edge || max_edge == 0 {
            return (*self.bitmap).clone();
        }

        let scale = max_edge as f32 / longest as f32;
        let thumb_width = ((width as f32 * scale).round() as u32).max(1);
        let thumb_height = ((height as f32 * scale).round() as u32).max(1);
        imageops::thumbnail(&*self.bitmap, thumb_width, thumb_height)
    }
}

/// Append-only log of flattened composites, one per dropped part
#[derive(Debug, Clone, Default)]
pub struct StepLog {
    steps: Vec<Step>,
    selected: Option<usize>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step holding `bitmap`. Recording clears the selection.
    pub fn record(&mut self, bitmap: RgbaImage, rect: Rect) -> &Step {
        let step = Step::from_parts(StepId::new(), Arc::new(bitmap), rect, time::timestamp_secs());
        info!("📸 Recorded step {} ({})", self.steps.len(), step.id);
        self.steps.push(step);
        self.selected = None;
        &self.steps[self.steps.len() - 1]
    }

    /// Selects step `index` and drops every later step.
    ///
    /// Returns `None` when `index` is out of range, leaving the log untouched.
    pub fn jump_to(&mut self, index: usize) -> Option<&Step> {
        if index >= self.steps.len() {
            debug!("Ignoring jump to step {index} of {}", self.steps.len());
            return None;
        }

        let dropped = self.steps.len() - index - 1;
        self.steps.truncate(index + 1);
        self.selected = Some(index);
        info!("⏪ Jumped to step {index}, discarding {dropped} later steps");
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn thumbnails(&self, max_edge: u32) -> Vec<RgbaImage> {
        self.steps.iter().map(|step| step.thumbnail(max_edge)).collect()
    }

    /// Replaces the whole log, e.g. when loading a snapshot
    pub(crate) fn restore(&mut self, steps: Vec<Step>, selected: Option<usize>) {
        self.selected = selected.filter(|index| *index < steps.len());
        self.steps = steps;
    }
}
