use std::collections::HashMap;
use std::future::Future;
use std::io::Cursor;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use egui::{Pos2, Vec2};
use futures::FutureExt;
use futures::executor::block_on;
use futures::future::BoxFuture;
use image::{ImageFormat, Rgba, RgbaImage};
use parking_lot::Mutex;
use sketchboard::{
    AssetCache, AssetError, AssetRef, AssetSource, Condition, EngineConfig, EngineEvent,
    FitMode, SketchEngine,
};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Yields to the executor a fixed number of times before completing
struct Delay(u32);

impl Future for Delay {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 == 0 {
            Poll::Ready(())
        } else {
            self.0 -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Serves PNG bytes, finishing each fetch after its own delay
struct SlowSource {
    files: HashMap<AssetRef, (Vec<u8>, u32)>,
    completed: Mutex<Vec<AssetRef>>,
}

impl SlowSource {
    fn new() -> Self {
        Self {
            files: HashMap::new(),
            completed: Mutex::new(Vec::new()),
        }
    }

    fn with(mut self, name: &str, bytes: Vec<u8>, delay: u32) -> Self {
        self.files.insert(AssetRef::from(name), (bytes, delay));
        self
    }
}

impl AssetSource for SlowSource {
    fn fetch<'a>(&'a self, asset: &'a AssetRef) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
        async move {
            let Some((bytes, delay)) = self.files.get(asset).cloned() else {
                return Err(AssetError::Fetch {
                    asset: asset.clone(),
                    reason: "no such file".to_string(),
                });
            };
            Delay(delay).await;
            self.completed.lock().push(asset.clone());
            Ok(bytes)
        }
        .boxed()
    }
}

fn png(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(width, height, color)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn test_config() -> EngineConfig {
    sketchboard::logging::init_for_tests();
    EngineConfig {
        canvas_width: 100,
        canvas_height: 100,
        part_size: Vec2::new(40.0, 40.0),
        ..EngineConfig::default()
    }
}

#[test]
fn test_out_of_order_loads_keep_stacking_order() {
    // The back part finishes loading last
    let source = SlowSource::new()
        .with("back", png(40, 40, RED), 10)
        .with("front", png(40, 40, BLUE), 0);

    let mut engine = SketchEngine::new(test_config()).unwrap();
    engine.on_asset_dropped(AssetRef::from("back"), Pos2::new(10.0, 10.0));
    engine.on_asset_dropped(AssetRef::from("front"), Pos2::new(30.0, 30.0));

    let composite = block_on(engine.draw_composite(&source));
    assert!(composite.is_complete());
    assert_eq!(
        *source.completed.lock(),
        vec![AssetRef::from("front"), AssetRef::from("back")]
    );

    assert_eq!(*composite.image.get_pixel(15, 15), RED);
    assert_eq!(*composite.image.get_pixel(40, 40), BLUE);
    assert_eq!(composite.image.get_pixel(90, 90)[3], 0);
}

#[test]
fn test_decode_failure_leaves_region_blank() {
    let source = SlowSource::new()
        .with("good", png(40, 40, RED), 3)
        .with("corrupt", vec![0x89, b'P', b'N', b'G', 0, 0], 1);

    let mut engine = SketchEngine::new(test_config()).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine.subscribe(Box::new(move |event: &EngineEvent| {
        sink.lock().push(event.clone());
    }));

    engine.on_asset_dropped(AssetRef::from("good"), Pos2::new(0.0, 0.0));
    engine.on_asset_dropped(AssetRef::from("corrupt"), Pos2::new(60.0, 60.0));
    events.lock().clear();

    let composite = block_on(engine.draw_composite(&source));
    assert_eq!(composite.failures.len(), 1);
    assert!(matches!(
        &composite.failures[0],
        AssetError::Decode { asset, .. } if asset.as_str() == "corrupt"
    ));
    assert_eq!(*composite.image.get_pixel(20, 20), RED);
    assert_eq!(composite.image.get_pixel(80, 80)[3], 0);

    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        EngineEvent::ConditionReported(Condition::AssetDecodeFailure(AssetError::Decode { .. }))
    ));
}

#[test]
fn test_preload_is_all_or_nothing_per_draw() {
    let cache = AssetCache::new();
    let source = SlowSource::new()
        .with("a", png(4, 4, RED), 5)
        .with("b", png(4, 4, BLUE), 2);
    let wanted = [AssetRef::from("a"), AssetRef::from("b")];

    let mut preload = Box::pin(cache.preload(&source, &wanted));
    let waker = futures::task::noop_waker();
    let mut cx = Context::from_waker(&waker);

    // "b" has finished loading here, but nothing is visible yet
    for _ in 0..4 {
        assert!(preload.as_mut().poll(&mut cx).is_pending());
        assert!(cache.is_empty());
    }
    let failures = block_on(preload);
    assert!(failures.is_empty());
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_contain_fit_preserves_aspect() {
    let assets = Arc::new(AssetCache::new());
    assets.insert_decoded(AssetRef::from("wide"), RgbaImage::from_pixel(80, 40, RED));

    let config = EngineConfig {
        fit_mode: FitMode::Contain,
        ..test_config()
    };
    let mut engine = SketchEngine::with_assets(config, assets).unwrap();
    engine.on_asset_dropped(AssetRef::from("wide"), Pos2::new(0.0, 0.0));

    // 80x40 fitted into 40x40 is 40x20, centered vertically
    let image = engine.composite().image;
    assert_eq!(image.get_pixel(20, 5)[3], 0);
    let center = image.get_pixel(20, 20);
    assert_eq!(center[3], 255);
    assert!(center[0] > 250 && center[2] < 5);
    assert_eq!(image.get_pixel(20, 35)[3], 0);
}

#[test]
fn test_color_image_for_egui() {
    let engine = SketchEngine::new(test_config()).unwrap();
    let color_image = engine.composite_color_image();
    assert_eq!(color_image.size, [100, 100]);
}
