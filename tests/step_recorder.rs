use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use egui::{Pos2, Vec2};
use futures::FutureExt;
use futures::executor::block_on;
use futures::future::{self, BoxFuture};
use image::{ImageFormat, Rgba, RgbaImage};
use sketchboard::{
    AssetCache, AssetError, AssetRef, AssetSource, DrawingTool, EngineConfig, InputEvent,
    SketchEngine,
};

const RED: Rgba<u8> = Rgba([220, 20, 20, 255]);
const GREEN: Rgba<u8> = Rgba([20, 200, 40, 255]);

fn test_config() -> EngineConfig {
    sketchboard::logging::init_for_tests();
    EngineConfig {
        canvas_width: 200,
        canvas_height: 200,
        part_size: Vec2::new(40.0, 40.0),
        ..EngineConfig::default()
    }
}

fn engine_with_assets() -> SketchEngine {
    let assets = Arc::new(AssetCache::new());
    assets.insert_decoded(AssetRef::from("p1"), RgbaImage::from_pixel(40, 40, RED));
    assets.insert_decoded(AssetRef::from("p2"), RgbaImage::from_pixel(40, 40, GREEN));
    SketchEngine::with_assets(test_config(), assets).unwrap()
}

#[test]
fn test_drops_record_the_scene_before_insertion() {
    let mut engine = engine_with_assets();

    let p1 = engine.on_asset_dropped(AssetRef::from("p1"), Pos2::new(100.0, 100.0));
    assert_eq!(engine.parts().len(), 1);
    assert_eq!(engine.selected_id(), Some(p1));
    assert_eq!(engine.steps().len(), 1);
    let step0 = engine.steps().get(0).unwrap().bitmap();
    assert!(step0.pixels().all(|pixel| pixel[3] == 0));

    let p2 = engine.on_asset_dropped(AssetRef::from("p2"), Pos2::new(50.0, 50.0));
    assert_eq!(engine.steps().len(), 2);
    let step1 = engine.steps().get(1).unwrap().bitmap();
    assert_eq!(*step1.get_pixel(110, 110), RED);
    assert_eq!(step1.get_pixel(60, 60)[3], 0);

    let order: Vec<_> = engine.parts().iter().map(|part| part.id()).collect();
    assert_eq!(order, vec![p1, p2]);
    assert_eq!(engine.selected_id(), Some(p2));
}

#[test]
fn test_step_includes_drawing() {
    let mut engine = engine_with_assets();
    engine.on_tool_selected(DrawingTool::Pencil);
    engine.on_pointer_down(Pos2::new(0.0, 190.0));
    engine.on_pointer_up(Pos2::new(199.0, 190.0));
    engine.on_tool_selected(DrawingTool::Idle);

    engine.on_asset_dropped(AssetRef::from("p1"), Pos2::new(0.0, 0.0));
    let step0 = engine.steps().get(0).unwrap().bitmap();
    assert_eq!(step0.get_pixel(100, 190)[3], 255);
}

#[test]
fn test_jump_to_first_step_collapses_scene() {
    let mut engine = engine_with_assets();
    engine.on_asset_dropped(AssetRef::from("p1"), Pos2::new(0.0, 0.0));
    engine.on_asset_dropped(AssetRef::from("p2"), Pos2::new(60.0, 0.0));
    engine.on_asset_dropped(AssetRef::from("p1"), Pos2::new(120.0, 0.0));
    assert_eq!(engine.steps().len(), 3);

    assert!(engine.jump_to_step(0));
    assert_eq!(engine.steps().len(), 1);
    assert_eq!(engine.selected_step(), Some(0));
    assert_eq!(engine.parts().len(), 1);
    assert_eq!(engine.selected_id(), None);

    let flattened = &engine.parts()[0];
    assert!(flattened.is_flattened());
    assert_eq!(flattened.size(), Vec2::new(200.0, 200.0));
    assert_eq!(flattened.position(), Pos2::ZERO);

    engine.on_asset_dropped(AssetRef::from("p2"), Pos2::new(10.0, 10.0));
    assert_eq!(engine.steps().len(), 2);
    assert_eq!(engine.selected_step(), None);
}

#[test]
fn test_flattened_part_paints_its_step() {
    let mut engine = engine_with_assets();
    engine.on_asset_dropped(AssetRef::from("p1"), Pos2::new(20.0, 20.0));
    engine.on_asset_dropped(AssetRef::from("p2"), Pos2::new(90.0, 90.0));
    engine.on_asset_dropped(AssetRef::from("p1"), Pos2::new(150.0, 150.0));

    let expected = engine.steps().get(2).unwrap().bitmap().clone();
    assert!(engine.on_step_selected(2));

    let composite = engine.composite();
    assert!(composite.is_complete());
    assert_eq!(composite.image, *expected);
    assert_eq!(*composite.image.get_pixel(100, 100), GREEN);
}

#[test]
fn test_jump_is_a_history_entry() {
    let mut engine = engine_with_assets();
    engine.on_asset_dropped(AssetRef::from("p1"), Pos2::new(0.0, 0.0));
    engine.on_asset_dropped(AssetRef::from("p2"), Pos2::new(60.0, 0.0));
    engine.on_asset_dropped(AssetRef::from("p1"), Pos2::new(120.0, 0.0));
    let live_parts = engine.parts().to_vec();

    assert!(engine.jump_to_step(1));
    assert_eq!(engine.parts().len(), 1);
    assert_eq!(engine.steps().len(), 2);

    // Undo brings the parts back but not the discarded steps
    assert!(engine.on_undo_requested());
    assert_eq!(engine.parts(), live_parts.as_slice());
    assert_eq!(engine.steps().len(), 2);
}

#[test]
fn test_out_of_range_jump_is_noop() {
    let mut engine = engine_with_assets();
    engine.on_asset_dropped(AssetRef::from("p1"), Pos2::new(0.0, 0.0));
    let history = engine.history().len();

    assert!(!engine.handle(InputEvent::StepSelected(4)));
    assert_eq!(engine.steps().len(), 1);
    assert_eq!(engine.selected_step(), None);
    assert_eq!(engine.history().len(), history);
}

#[test]
fn test_thumbnails_follow_steps() {
    let mut engine = engine_with_assets();
    for x in [0.0, 50.0, 100.0] {
        engine.on_asset_dropped(AssetRef::from("p1"), Pos2::new(x, 0.0));
    }

    let thumbnails = engine.step_thumbnails();
    assert_eq!(thumbnails.len(), 3);
    assert!(thumbnails.iter().all(|thumb| thumb.dimensions() == (96, 96)));
}

/// Serves encoded part bitmaps, as a host loading them lazily would
struct PaletteSource(HashMap<AssetRef, Vec<u8>>);

impl PaletteSource {
    fn new(parts: &[(&str, Rgba<u8>)]) -> Self {
        let files = parts
            .iter()
            .map(|(name, color)| {
                let mut bytes = Vec::new();
                RgbaImage::from_pixel(40, 40, *color)
                    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                    .unwrap();
                (AssetRef::from(*name), bytes)
            })
            .collect();
        Self(files)
    }
}

impl AssetSource for PaletteSource {
    fn fetch<'a>(&'a self, asset: &'a AssetRef) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
        let result = self.0.get(asset).cloned().ok_or_else(|| AssetError::Fetch {
            asset: asset.clone(),
            reason: "not in palette".to_string(),
        });
        future::ready(result).boxed()
    }
}

#[test]
fn test_lazy_drops_flatten_loaded_assets() {
    let source = PaletteSource::new(&[("p1", RED), ("p2", GREEN)]);
    let mut engine = SketchEngine::new(test_config()).unwrap();
    assert!(engine.assets().is_empty());

    block_on(engine.on_asset_dropped_with(AssetRef::from("p1"), Pos2::new(0.0, 0.0), &source));
    block_on(engine.on_asset_dropped_with(AssetRef::from("p2"), Pos2::new(100.0, 100.0), &source));
    assert_eq!(engine.assets().len(), 2);

    let step1 = engine.steps().get(1).unwrap().bitmap().clone();
    assert_eq!(*step1.get_pixel(10, 10), RED);

    assert!(engine.jump_to_step(1));
    let composite = engine.composite();
    assert!(composite.is_complete());
    assert_eq!(*composite.image.get_pixel(10, 10), RED);
    assert_eq!(composite.image.get_pixel(110, 110)[3], 0);
}
