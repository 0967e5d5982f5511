//! Serializable engine state for hosts that persist sessions.
//!
//! A snapshot carries the scene, the drawing, the full history and the step
//! log. Bitmaps travel as PNG bytes. The bitmaps of flattened steps that
//! parts still refer to are included, since they exist nowhere else.

use std::collections::BTreeSet;
use std::sync::Arc;

use egui::Rect;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::asset::{AssetCache, AssetRef};
use crate::config::EngineConfig;
use crate::drawing::{DrawingLayer, DrawingTool, PencilSettings};
use crate::engine::SketchEngine;
use crate::error::{SnapshotError, SnapshotResult};
use crate::geometry::mapper;
use crate::history::History;
use crate::part::Part;
use crate::raster::EncodedRaster;
use crate::scene::Scene;
use crate::steps::{Step, StepId, StepLog};
use crate::util::time;

/// A recorded step in serializable form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: StepId,
    pub bitmap: EncodedRaster,
    pub rect: Rect,
    pub timestamp: u64,
}

/// A cached bitmap backing a flattened part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedAsset {
    pub asset: AssetRef,
    pub bitmap: EncodedRaster,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub config: EngineConfig,
    pub parts: Vec<Part>,
    pub selected: Option<usize>,
    pub tool: DrawingTool,
    pub pencil: PencilSettings,
    pub eraser_width: f32,
    pub drawing: EncodedRaster,
    pub history: History,
    pub steps: Vec<StepRecord>,
    pub selected_step: Option<usize>,
    pub flattened_assets: Vec<FlattenedAsset>,
    /// Timestamp of when the snapshot was taken
    pub timestamp: u64,
    /// Version of the crate that wrote the snapshot
    pub version: String,
}

impl EngineSnapshot {
    pub fn capture(engine: &SketchEngine) -> SnapshotResult<Self> {
        let steps = engine
            .steps()
            .steps()
            .iter()
            .map(|step| -> SnapshotResult<StepRecord> {
                Ok(StepRecord {
                    id: step.id(),
                    bitmap: EncodedRaster::encode(step.bitmap())?,
                    rect: step.rect(),
                    timestamp: step.timestamp(),
                })
            })
            .collect::<SnapshotResult<Vec<_>>>()?;

        let drawing = engine.drawing();
        Ok(Self {
            config: engine.config().clone(),
            parts: engine.parts().to_vec(),
            selected: engine.scene().selected_index(),
            tool: drawing.tool(),
            pencil: drawing.pencil(),
            eraser_width: drawing.eraser_width(),
            drawing: drawing.encode()?,
            history: engine.history().clone(),
            steps,
            selected_step: engine.selected_step(),
            flattened_assets: flattened_assets(engine)?,
            timestamp: time::timestamp_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    pub fn to_json(&self) -> SnapshotResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> SnapshotResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks the structural invariants a hand-edited or corrupted snapshot
    /// could break
    pub fn validate(&self) -> SnapshotResult<()> {
        self.config.validate()?;

        // Undo can bring back any part a history entry holds
        let canvas_size = self.config.canvas_size();
        if let Some(part) = self
            .parts
            .iter()
            .chain(self.history.entries().iter().flat_map(|entry| &entry.parts))
            .find(|part| !mapper::fits(part.rect(), canvas_size))
        {
            return Err(invalid(format!("part {} lies outside the canvas", part.id())));
        }
        if self.selected.is_some_and(|index| index >= self.parts.len()) {
            return Err(invalid("selected part index out of range"));
        }
        if self.selected_step.is_some_and(|index| index >= self.steps.len()) {
            return Err(invalid("selected step index out of range"));
        }
        if !self.history.is_consistent() {
            return Err(invalid("history cursor out of range"));
        }

        let canvas = (self.config.canvas_width, self.config.canvas_height);
        let rasters = std::iter::once(&self.drawing)
            .chain(self.history.entries().iter().map(|entry| &entry.drawing));
        for raster in rasters {
            if raster.dimensions() != canvas {
                return Err(invalid(format!(
                    "drawing is {:?} but the canvas is {canvas:?}",
                    raster.dimensions()
                )));
            }
        }
        Ok(())
    }

    /// Rebuilds an engine. Flattened step bitmaps go into `assets`.
    pub fn restore(self, assets: Arc<AssetCache>) -> SnapshotResult<SketchEngine> {
        if self.version != env!("CARGO_PKG_VERSION") {
            warn!(
                "Snapshot version {} differs from current version {}",
                self.version,
                env!("CARGO_PKG_VERSION")
            );
        }
        self.validate()?;

        let mut scene = Scene::new(self.config.canvas_size());
        scene.restore_parts(self.parts);
        scene.restore_selection(self.selected);

        let mut drawing = DrawingLayer::new(self.config.canvas_width, self.config.canvas_height)
            .with_settings(self.pencil, self.eraser_width);
        drawing.select_tool(self.tool);
        drawing.restore(self.drawing.decode()?)?;

        let steps = self
            .steps
            .into_iter()
            .map(|record| -> SnapshotResult<Step> {
                let bitmap = record.bitmap.decode()?;
                Ok(Step::from_parts(
                    record.id,
                    Arc::new(bitmap),
                    record.rect,
                    record.timestamp,
                ))
            })
            .collect::<SnapshotResult<Vec<_>>>()?;
        let mut step_log = StepLog::new();
        step_log.restore(steps, self.selected_step);

        for flattened in self.flattened_assets {
            let bitmap = flattened.bitmap.decode()?;
            assets.insert_decoded(flattened.asset, bitmap);
        }

        info!(
            "📂 Restored snapshot with {} parts and {} steps",
            scene.len(),
            step_log.len()
        );
        Ok(SketchEngine::from_state(
            self.config,
            scene,
            drawing,
            self.history,
            step_log,
            assets,
        ))
    }
}

fn invalid(reason: impl Into<String>) -> SnapshotError {
    SnapshotError::InvalidState(reason.into())
}

/// Cached bitmaps of every flattened part the scene or history refers to
fn flattened_assets(engine: &SketchEngine) -> SnapshotResult<Vec<FlattenedAsset>> {
    let referenced: BTreeSet<&AssetRef> = engine
        .parts()
        .iter()
        .chain(engine.history().entries().iter().flat_map(|entry| &entry.parts))
        .map(Part::asset)
        .filter(|asset| asset.is_flattened_step())
        .collect();

    let mut flattened = Vec::new();
    for asset in referenced {
        match engine.assets().get(asset) {
            Some(bitmap) => flattened.push(FlattenedAsset {
                asset: asset.clone(),
                bitmap: EncodedRaster::encode(&bitmap)?,
            }),
            None => warn!("Flattened asset {asset} is not cached, leaving it out"),
        }
    }
    Ok(flattened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn small_config() -> EngineConfig {
        EngineConfig {
            canvas_width: 64,
            canvas_height: 48,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_rejects_out_of_range_selection() {
        let engine = SketchEngine::new(small_config()).unwrap();
        let mut snapshot = engine.snapshot().unwrap();
        snapshot.selected = Some(3);

        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::InvalidState(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_drawing_size() {
        let mut engine = SketchEngine::new(small_config()).unwrap();
        engine.add_part(AssetRef::from("eye"), pos2(5.0, 5.0));
        let mut snapshot = engine.snapshot().unwrap();
        snapshot.config.canvas_width = 65;

        assert!(snapshot.restore(Arc::new(AssetCache::new())).is_err());
    }
}
