use std::fmt;

use thiserror::Error;

use crate::asset::AssetRef;
use crate::part::PartId;

/// Errors that can occur while encoding or decoding raster content
#[derive(Error, Debug)]
pub enum RasterError {
    #[error("Failed to encode raster: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to decode raster: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Raster is {actual:?} but the canvas is {expected:?}")]
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Result type for raster operations
pub type RasterResult<T> = Result<T, RasterError>;

/// Errors that can occur while fetching or decoding an asset bitmap
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Asset {0} is not in the cache")]
    NotFound(AssetRef),

    #[error("Failed to fetch asset {asset}: {reason}")]
    Fetch { asset: AssetRef, reason: String },

    #[error("Failed to decode asset {asset}: {reason}")]
    Decode { asset: AssetRef, reason: String },
}

impl AssetError {
    /// The asset this error refers to
    pub fn asset(&self) -> &AssetRef {
        match self {
            Self::NotFound(asset) => asset,
            Self::Fetch { asset, .. } | Self::Decode { asset, .. } => asset,
        }
    }
}

/// Errors raised while loading or validating an [`crate::EngineConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur while capturing or restoring an engine snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to serialize snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid snapshot data: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Which end of the history a request ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl fmt::Display for HistoryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undo => write!(f, "undo"),
            Self::Redo => write!(f, "redo"),
        }
    }
}

/// Degraded outcomes of engine operations.
///
/// None of these abort an operation. They are logged, and the ones a user
/// may want to hear about are forwarded to the host through the event bus.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Condition {
    /// The operation targeted a part that is no longer in the scene
    #[error("Part {0} is not in the scene")]
    InvalidReference(PartId),

    /// A proposed rectangle left the canvas and was clamped
    #[error("Transform of part {0} was clamped to the canvas")]
    OutOfBoundsTransform(PartId),

    /// Undo at the oldest entry or redo at the newest one
    #[error("Nothing to {0}")]
    HistoryBoundary(HistoryDirection),

    /// A part could not be painted; its region was left blank
    #[error("Asset could not be drawn: {0}")]
    AssetDecodeFailure(AssetError),
}

impl Condition {
    /// Whether the host should be told about this condition
    pub fn notifies_host(&self) -> bool {
        matches!(
            self,
            Self::OutOfBoundsTransform(_) | Self::AssetDecodeFailure(_)
        )
    }
}
