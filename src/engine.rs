//! The engine facade.
//!
//! [`SketchEngine`] owns the scene, the drawing layer, the history and the
//! step log, and decides when a mutation becomes a history entry. Host
//! operations never fail: degraded outcomes are logged and, when the user
//! should hear about them, emitted as [`EngineEvent::ConditionReported`].

use std::sync::Arc;

use egui::{Color32, Key, Modifiers, Pos2, Rect};
use image::RgbaImage;
use log::{debug, error, info, warn};

use crate::asset::{AssetCache, AssetRef, AssetSource};
use crate::compositor::{self, Composite};
use crate::config::EngineConfig;
use crate::drawing::{CompletedStroke, DrawingLayer, DrawingTool};
use crate::error::{Condition, ConfigError, HistoryDirection, SnapshotResult};
use crate::event::{EngineEvent, EventBus, EventHandler};
use crate::geometry::mapper;
use crate::history::{History, HistoryEntry};
use crate::input::{InputEvent, KeyboardController, RemoveTarget, route_event};
use crate::part::{Part, PartId};
use crate::raster::EncodedRaster;
use crate::scene::{Placement, Scene, TransformOutcome};
use crate::snapshot::EngineSnapshot;
use crate::steps::{StepId, StepLog};

#[derive(Debug)]
pub struct SketchEngine {
    config: EngineConfig,
    canvas_rect: Rect,
    scene: Scene,
    drawing: DrawingLayer,
    history: History,
    steps: StepLog,
    assets: Arc<AssetCache>,
    keyboard: KeyboardController,
    event_bus: EventBus,
}

impl SketchEngine {
    /// Creates an engine over an empty canvas, with its own asset cache
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_assets(config, Arc::new(AssetCache::new()))
    }

    /// Creates an engine that paints from a shared asset cache
    pub fn with_assets(config: EngineConfig, assets: Arc<AssetCache>) -> Result<Self, ConfigError> {
        config.validate()?;

        let drawing = DrawingLayer::new(config.canvas_width, config.canvas_height)
            .with_settings(config.pencil(), config.eraser_width);
        let mut engine = Self::from_state(
            config.clone(),
            Scene::new(config.canvas_size()),
            drawing,
            History::with_limit(config.history_limit),
            StepLog::new(),
            assets,
        );

        // The empty canvas is the first undo target
        engine.commit();
        info!(
            "🎨 Sketch engine ready ({}x{} canvas)",
            config.canvas_width, config.canvas_height
        );
        Ok(engine)
    }

    pub(crate) fn from_state(
        config: EngineConfig,
        scene: Scene,
        drawing: DrawingLayer,
        history: History,
        steps: StepLog,
        assets: Arc<AssetCache>,
    ) -> Self {
        Self {
            canvas_rect: config.canvas_rect(Pos2::ZERO),
            keyboard: KeyboardController::from_config(&config),
            config,
            scene,
            drawing,
            history,
            steps,
            assets,
            event_bus: EventBus::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn parts(&self) -> &[Part] {
        self.scene.parts()
    }

    pub fn selected_id(&self) -> Option<PartId> {
        self.scene.selected_id()
    }

    pub fn drawing(&self) -> &DrawingLayer {
        &self.drawing
    }

    pub fn drawing_raster(&self) -> &RgbaImage {
        self.drawing.raster()
    }

    pub fn tool(&self) -> DrawingTool {
        self.drawing.tool()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn steps(&self) -> &StepLog {
        &self.steps
    }

    pub fn selected_step(&self) -> Option<usize> {
        self.steps.selected()
    }

    pub fn assets(&self) -> &Arc<AssetCache> {
        &self.assets
    }

    pub fn canvas_rect(&self) -> Rect {
        self.canvas_rect
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Thumbnails for the step strip, oldest first
    pub fn step_thumbnails(&self) -> Vec<RgbaImage> {
        self.steps.thumbnails(self.config.thumbnail_edge)
    }

    /// Where the canvas sits in host space; screen points are made local against it
    pub fn set_canvas_origin(&mut self, origin: Pos2) {
        self.canvas_rect = self.config.canvas_rect(origin);
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.event_bus.subscribe(handler);
    }

    /// Applies a queued host event. Returns true if anything changed.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        route_event(self, event)
    }

    // ---- parts ----

    /// Drop handler: the point is in host space
    pub fn on_asset_dropped(&mut self, asset: AssetRef, screen_point: Pos2) -> PartId {
        let point = mapper::to_local(screen_point, self.canvas_rect);
        self.add_part(asset, point)
    }

    /// Drop handler that loads assets from `source` before flattening, so
    /// the recorded step never misses a part that is not cached yet
    pub async fn on_asset_dropped_with<S>(
        &mut self,
        asset: AssetRef,
        screen_point: Pos2,
        source: &S,
    ) -> PartId
    where
        S: AssetSource + ?Sized,
    {
        let point = mapper::to_local(screen_point, self.canvas_rect);
        self.add_part_with(asset, point, source).await
    }

    /// Records a step of the current composite, then places a new part with
    /// its top-left at the canvas-local `point`.
    ///
    /// The step is painted from the asset cache as it is. Hosts that load
    /// assets lazily should use [`Self::add_part_with`].
    pub fn add_part(&mut self, asset: AssetRef, point: Pos2) -> PartId {
        self.record_step();
        self.place_part(asset, point)
    }

    /// Like [`Self::add_part`], but the step is flattened only after every
    /// asset of the scene, and the dropped one, has been loaded from `source`
    pub async fn add_part_with<S>(&mut self, asset: AssetRef, point: Pos2, source: &S) -> PartId
    where
        S: AssetSource + ?Sized,
    {
        if !self.scene.parts().iter().any(|part| part.asset() == &asset) {
            let failures = self.assets.preload(source, std::slice::from_ref(&asset)).await;
            for failure in failures {
                self.report(Condition::AssetDecodeFailure(failure));
            }
        }
        self.record_step_with(source).await;
        self.place_part(asset, point)
    }

    /// Flattens the current composite into a new step
    pub fn record_step(&mut self) -> StepId {
        let composite = self.composite();
        self.push_step(composite)
    }

    /// Loads every missing scene asset from `source`, then flattens
    pub async fn record_step_with<S>(&mut self, source: &S) -> StepId
    where
        S: AssetSource + ?Sized,
    {
        let composite = self.draw_composite(source).await;
        self.push_step(composite)
    }

    fn place_part(&mut self, asset: AssetRef, point: Pos2) -> PartId {
        let size = self.config.part_size;
        let id = self.scene.add_part(asset, point, size);
        if self.scene.get(id).map(Part::rect) != Some(Rect::from_min_size(point, size)) {
            self.report(Condition::OutOfBoundsTransform(id));
        }

        self.emit(EngineEvent::PartAdded {
            id,
            index: self.scene.len() - 1,
        });
        self.emit(EngineEvent::SelectionChanged { selected: Some(id) });
        self.commit();
        id
    }

    fn push_step(&mut self, composite: Composite) -> StepId {
        let rect = Rect::from_min_size(Pos2::ZERO, self.config.canvas_size());
        let step = self.steps.record(composite.image, rect);
        let id = step.id();
        self.emit(EngineEvent::StepRecorded {
            id,
            index: self.steps.len() - 1,
        });
        id
    }

    /// Moves/resizes a part without committing, as during a drag
    pub fn transform_part(&mut self, id: PartId, rect: Rect) -> bool {
        self.apply_transform(id, rect, false)
    }

    pub fn on_part_gesture_move(&mut self, id: PartId, rect: Rect) -> bool {
        self.transform_part(id, rect)
    }

    /// Applies the final rectangle of a drag/resize and commits if the
    /// gesture changed anything
    pub fn on_part_gesture_end(&mut self, id: PartId, rect: Rect) -> bool {
        self.apply_transform(id, rect, true);
        if self.parts_changed_since_commit() {
            self.commit();
            true
        } else {
            false
        }
    }

    /// Selects the part under the point, or clears the selection
    pub fn on_canvas_clicked(&mut self, screen_point: Pos2) -> bool {
        let before = self.scene.selected_id();
        let point = mapper::to_local(screen_point, self.canvas_rect);
        let selected = self.scene.select_at(point);
        if selected != before {
            self.emit(EngineEvent::SelectionChanged { selected });
            true
        } else {
            false
        }
    }

    pub fn select(&mut self, id: Option<PartId>) -> bool {
        if let Some(id) = id {
            if self.scene.get(id).is_none() {
                self.report(Condition::InvalidReference(id));
                return false;
            }
        }
        if self.scene.select(id) {
            self.emit(EngineEvent::SelectionChanged {
                selected: self.scene.selected_id(),
            });
            true
        } else {
            false
        }
    }

    /// Keyboard nudge/resize of the selected part. Every effective keypress
    /// commits.
    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> bool {
        let Some(part) = self.scene.selected() else {
            return false;
        };
        let Some(command) = self.keyboard.command_for(key, modifiers) else {
            return false;
        };
        if part.is_locked() {
            debug!("Part {} is locked, ignoring {command:?}", part.id());
            return false;
        }

        let (id, before) = (part.id(), part.rect());
        let Some(proposed) = self.keyboard.proposed_rect(command, before) else {
            return false;
        };
        // Pushing against the canvas edge is not a transform
        if mapper::clamp(proposed, self.scene.canvas_size()) == before {
            debug!("Part {id} is already at the edge, ignoring {command:?}");
            return false;
        }

        self.apply_transform(id, proposed, true);
        self.commit();
        true
    }

    /// Toggles the lock of the selected part
    pub fn on_lock_toggle_requested(&mut self) -> bool {
        match self.scene.selected_id() {
            Some(id) => self.toggle_lock(id),
            None => false,
        }
    }

    pub fn toggle_lock(&mut self, id: PartId) -> bool {
        let Some(locked) = self.scene.toggle_lock(id) else {
            self.report(Condition::InvalidReference(id));
            return false;
        };
        self.emit(EngineEvent::LockToggled { id, locked });
        self.commit();
        true
    }

    pub fn on_remove_requested(&mut self, target: RemoveTarget) -> bool {
        match target {
            RemoveTarget::Part(id) => self.remove_part(id),
            RemoveTarget::All => self.remove_all(),
        }
    }

    pub fn remove_part(&mut self, id: PartId) -> bool {
        let was_selected = self.scene.selected_id() == Some(id);
        if self.scene.remove_part(id).is_none() {
            self.report(Condition::InvalidReference(id));
            return false;
        }

        self.emit(EngineEvent::PartRemoved { id });
        if was_selected {
            self.emit(EngineEvent::SelectionChanged { selected: None });
        }
        self.commit();
        true
    }

    /// Removes every part and clears the drawing as one history entry
    pub fn remove_all(&mut self) -> bool {
        let had_selection = self.scene.selected_id().is_some();
        let had_drawing = !self.drawing.is_blank() || self.drawing.is_drawing();
        let had_parts = self.scene.remove_all();
        if !had_parts && !had_drawing {
            return false;
        }

        self.drawing.clear();
        info!("🧹 Cleared the canvas");
        self.emit(EngineEvent::SceneCleared);
        if had_selection {
            self.emit(EngineEvent::SelectionChanged { selected: None });
        }
        self.commit();
        true
    }

    pub fn on_reorder_requested(&mut self, id: PartId, placement: Placement) -> bool {
        if self.scene.get(id).is_none() {
            self.report(Condition::InvalidReference(id));
            return false;
        }
        let before = self.scene.selected_id();
        if !self.scene.reorder(id, placement) {
            return false;
        }

        self.emit(EngineEvent::PartReordered { id, placement });
        if before != Some(id) {
            self.emit(EngineEvent::SelectionChanged { selected: Some(id) });
        }
        self.commit();
        true
    }

    pub fn reorder_to_front(&mut self, id: PartId) -> bool {
        self.on_reorder_requested(id, Placement::Front)
    }

    pub fn reorder_to_back(&mut self, id: PartId) -> bool {
        self.on_reorder_requested(id, Placement::Back)
    }

    // ---- history and steps ----

    pub fn on_undo_requested(&mut self) -> bool {
        let Some(entry) = self.history.undo().cloned() else {
            self.report(Condition::HistoryBoundary(HistoryDirection::Undo));
            return false;
        };
        self.restore_entry(entry);
        true
    }

    pub fn on_redo_requested(&mut self) -> bool {
        let Some(entry) = self.history.redo().cloned() else {
            self.report(Condition::HistoryBoundary(HistoryDirection::Redo));
            return false;
        };
        self.restore_entry(entry);
        true
    }

    pub fn on_step_selected(&mut self, index: usize) -> bool {
        self.jump_to_step(index)
    }

    /// Collapses the scene into the bitmap of step `index` and drops every
    /// later step. The drawing is part of that bitmap, so it is cleared.
    pub fn jump_to_step(&mut self, index: usize) -> bool {
        let Some(step) = self.steps.jump_to(index).cloned() else {
            return false;
        };

        let asset = step.asset_ref();
        self.assets.insert_shared(asset.clone(), step.bitmap().clone());

        let had_selection = self.scene.selected_id().is_some();
        self.scene.replace_with_flattened(asset);
        self.drawing.clear();

        self.emit(EngineEvent::StepSelected {
            id: step.id(),
            index,
        });
        if had_selection {
            self.emit(EngineEvent::SelectionChanged { selected: None });
        }
        self.commit();
        true
    }

    // ---- drawing ----

    pub fn on_pointer_down(&mut self, point: Pos2) -> bool {
        self.drawing.pointer_down(point)
    }

    pub fn on_pointer_move(&mut self, point: Pos2) -> bool {
        self.drawing.pointer_move(point)
    }

    /// Ends the stroke at `point` and commits it
    pub fn on_pointer_up(&mut self, point: Pos2) -> bool {
        if !self.drawing.is_drawing() {
            return false;
        }
        self.drawing.pointer_move(point);
        let stroke = self.drawing.pointer_up();
        self.finish_stroke(stroke)
    }

    /// Leaving the canvas ends a stroke exactly like releasing the pointer
    pub fn on_pointer_leave(&mut self) -> bool {
        let stroke = self.drawing.pointer_up();
        self.finish_stroke(stroke)
    }

    pub fn on_tool_selected(&mut self, tool: DrawingTool) -> bool {
        let old = self.drawing.tool();
        let stroke = self.drawing.select_tool(tool);
        self.after_tool_change(old, stroke)
    }

    /// Selecting the active tool again returns to idle
    pub fn toggle_tool(&mut self, tool: DrawingTool) -> bool {
        let old = self.drawing.tool();
        let stroke = self.drawing.toggle_tool(tool);
        self.after_tool_change(old, stroke)
    }

    pub fn clear_drawing(&mut self) -> bool {
        if self.drawing.is_blank() && !self.drawing.is_drawing() {
            return false;
        }
        self.drawing.clear();
        self.emit(EngineEvent::DrawingCleared);
        self.commit();
        true
    }

    pub fn set_pencil_color(&mut self, color: Color32) {
        self.drawing.set_pencil_color(color);
    }

    pub fn set_pencil_width(&mut self, width: f32) {
        self.drawing.set_pencil_width(width);
    }

    pub fn set_eraser_width(&mut self, width: f32) {
        self.drawing.set_eraser_width(width);
    }

    // ---- output ----

    /// Paints the scene from cached bitmaps. Parts whose asset is not
    /// cached are left blank and reported.
    pub fn composite(&self) -> Composite {
        let composite = compositor::compose(
            self.drawing.dimensions(),
            self.scene.parts(),
            &self.assets,
            self.drawing.raster(),
            self.config.fit_mode,
        );
        self.report_failures(&composite);
        composite
    }

    /// Loads every missing asset from `source`, then paints
    pub async fn draw_composite<S>(&self, source: &S) -> Composite
    where
        S: AssetSource + ?Sized,
    {
        let composite = compositor::draw_composite(
            self.drawing.dimensions(),
            self.scene.parts(),
            &self.assets,
            source,
            self.drawing.raster(),
            self.config.fit_mode,
        )
        .await;
        self.report_failures(&composite);
        composite
    }

    /// The composite as an image egui can upload
    pub fn composite_color_image(&self) -> egui::ColorImage {
        crate::raster::to_color_image(&self.composite().image)
    }

    pub fn snapshot(&self) -> SnapshotResult<EngineSnapshot> {
        EngineSnapshot::capture(self)
    }

    /// Rebuilds an engine from a snapshot. Flattened step bitmaps are put
    /// back into `assets`.
    pub fn from_snapshot(snapshot: EngineSnapshot, assets: Arc<AssetCache>) -> SnapshotResult<Self> {
        snapshot.restore(assets)
    }

    // ---- internals ----

    fn apply_transform(&mut self, id: PartId, rect: Rect, report_clamp: bool) -> bool {
        match self.scene.transform_part(id, rect) {
            TransformOutcome::Applied { clamped } => {
                if clamped && report_clamp {
                    self.report(Condition::OutOfBoundsTransform(id));
                }
                self.emit(EngineEvent::PartTransformed { id, clamped });
                true
            }
            TransformOutcome::Locked => false,
            TransformOutcome::Missing => {
                self.report(Condition::InvalidReference(id));
                false
            }
        }
    }

    fn after_tool_change(&mut self, old: DrawingTool, stroke: Option<CompletedStroke>) -> bool {
        let committed = self.finish_stroke(stroke);
        let new = self.drawing.tool();
        if old != new {
            self.emit(EngineEvent::ToolChanged { old, new });
        }
        committed || old != new
    }

    /// Ends a gesture. Strokes that left the raster untouched are not
    /// committed. Returns true if a stroke was in flight.
    fn finish_stroke(&mut self, stroke: Option<CompletedStroke>) -> bool {
        let Some(stroke) = stroke else {
            return false;
        };
        self.emit(EngineEvent::StrokeCompleted { tool: stroke.tool });

        let drawing = match self.drawing.encode() {
            Ok(drawing) => drawing,
            Err(err) => {
                error!("❌ Could not encode drawing, skipping commit: {err}");
                return true;
            }
        };
        let unchanged = self.history.current().is_some_and(|entry| {
            entry.drawing == drawing && entry.parts.as_slice() == self.scene.parts()
        });
        if unchanged {
            debug!("{} stroke changed nothing, not committing", stroke.tool.name());
        } else {
            self.commit_drawing(drawing);
        }
        true
    }

    fn parts_changed_since_commit(&self) -> bool {
        self.history
            .current()
            .is_none_or(|entry| entry.parts.as_slice() != self.scene.parts())
    }

    fn restore_entry(&mut self, entry: HistoryEntry) {
        let before = self.scene.selected_id();
        self.scene.restore_parts(entry.parts);

        match entry.drawing.decode() {
            Ok(raster) => {
                if let Err(err) = self.drawing.restore(raster) {
                    error!("❌ Could not restore drawing: {err}");
                }
            }
            Err(err) => error!("❌ Could not decode drawing from history: {err}"),
        }

        if let Some(cursor) = self.history.cursor() {
            self.emit(EngineEvent::Restored { cursor });
        }
        let after = self.scene.selected_id();
        if after != before {
            self.emit(EngineEvent::SelectionChanged { selected: after });
        }
    }

    fn commit(&mut self) {
        match self.drawing.encode() {
            Ok(drawing) => self.commit_drawing(drawing),
            Err(err) => error!("❌ Could not encode drawing, skipping commit: {err}"),
        }
    }

    fn commit_drawing(&mut self, drawing: EncodedRaster) {
        self.history.commit(HistoryEntry {
            parts: self.scene.parts().to_vec(),
            drawing,
        });

        if let Some(cursor) = self.history.cursor() {
            self.emit(EngineEvent::Committed {
                cursor,
                len: self.history.len(),
            });
        }
    }

    fn report_failures(&self, composite: &Composite) {
        for failure in &composite.failures {
            self.report(Condition::AssetDecodeFailure(failure.clone()));
        }
    }

    fn report(&self, condition: Condition) {
        if condition.notifies_host() {
            warn!("⚠️ {condition}");
            self.emit(EngineEvent::ConditionReported(condition));
        } else {
            debug!("{condition}");
        }
    }

    fn emit(&self, event: EngineEvent) {
        self.event_bus.emit(event);
    }
}
