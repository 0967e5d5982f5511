#![warn(clippy::all, rust_2018_idioms)]

pub mod asset;
pub mod compositor;
pub mod config;
pub mod drawing;
pub mod engine;
pub mod error;
pub mod event;
pub mod geometry;
pub mod history;
pub mod input;
pub mod logging;
pub mod part;
pub mod raster;
pub mod scene;
pub mod snapshot;
pub mod steps;
pub mod util;

pub use asset::{AssetCache, AssetCatalog, AssetRef, AssetSource};
pub use compositor::{Composite, FitMode};
pub use config::EngineConfig;
pub use drawing::{DrawingLayer, DrawingTool, PencilSettings};
pub use engine::SketchEngine;
pub use error::{AssetError, Condition, ConfigError, RasterError, SnapshotError};
pub use event::{EngineEvent, EventBus, EventHandler};
pub use history::{History, HistoryEntry};
pub use input::{InputEvent, RemoveTarget};
pub use part::{Part, PartId};
pub use scene::{Placement, Scene};
pub use snapshot::EngineSnapshot;
pub use steps::{Step, StepId, StepLog};
