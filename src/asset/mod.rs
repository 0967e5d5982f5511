use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, join_all};
use image::RgbaImage;
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::steps::StepId;

mod catalog;

pub use catalog::{AssetCatalog, CatalogEntry, PartCategory};

const FLATTENED_STEP_PREFIX: &str = "step:";

/// Reference to the bitmap a part displays
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The reserved reference under which a step bitmap is re-hydrated
    pub fn flattened_step(step: StepId) -> Self {
        Self(format!("{FLATTENED_STEP_PREFIX}{step}"))
    }

    pub fn is_flattened_step(&self) -> bool {
        self.0.starts_with(FLATTENED_STEP_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for AssetRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A decoded, shareable asset bitmap
pub type DecodedAsset = Arc<RgbaImage>;

/// Where encoded asset bytes come from.
///
/// Fetches may complete in any order; [`AssetCache::preload`] waits for all
/// of them before anything becomes visible in the cache.
pub trait AssetSource {
    fn fetch<'a>(&'a self, asset: &'a AssetRef) -> BoxFuture<'a, Result<Vec<u8>, AssetError>>;
}

/// Synchronous-access cache of decoded asset bitmaps.
///
/// Painting only ever reads from this cache, which makes compositing a pure
/// function of the part list. The lock lets a host decode on worker threads
/// and share the cache through an `Arc`.
#[derive(Default)]
pub struct AssetCache {
    entries: RwLock<HashMap<AssetRef, DecodedAsset>>,
}

impl fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetCache")
            .field("entries", &format!("<{} bitmaps>", self.len()))
            .finish()
    }
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, asset: &AssetRef) -> Option<DecodedAsset> {
        self.entries.read().get(asset).cloned()
    }

    pub fn contains(&self, asset: &AssetRef) -> bool {
        self.entries.read().contains_key(asset)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Stores an already decoded bitmap
    pub fn insert_decoded(&self, asset: AssetRef, image: RgbaImage) -> DecodedAsset {
        let decoded = Arc::new(image);
        self.insert_shared(asset, decoded.clone());
        decoded
    }

    pub fn insert_shared(&self, asset: AssetRef, image: DecodedAsset) {
        self.entries.write().insert(asset, image);
    }

    /// Decodes `bytes` (any format the `image` crate understands) and stores the result
    pub fn insert_encoded(&self, asset: AssetRef, bytes: &[u8]) -> Result<DecodedAsset, AssetError> {
        let image = decode(&asset, bytes)?;
        Ok(self.insert_decoded(asset, image))
    }

    pub fn remove(&self, asset: &AssetRef) -> Option<DecodedAsset> {
        self.entries.write().remove(asset)
    }

    /// The distinct assets of `assets` that are not cached yet, in first-seen order
    pub fn missing<'a>(&self, assets: impl IntoIterator<Item = &'a AssetRef>) -> Vec<AssetRef> {
        let entries = self.entries.read();
        let mut seen = HashSet::new();
        assets
            .into_iter()
            .filter(|asset| !entries.contains_key(*asset) && seen.insert(*asset))
            .cloned()
            .collect()
    }

    /// Fetches and decodes every asset that is not cached yet.
    ///
    /// Nothing is inserted until all fetches have finished, so a paint that
    /// follows this call never observes a partially resolved part list.
    /// Returns the assets that could not be fetched or decoded.
    pub async fn preload<S>(&self, source: &S, assets: &[AssetRef]) -> Vec<AssetError>
    where
        S: AssetSource + ?Sized,
    {
        let missing = self.missing(assets);
        if missing.is_empty() {
            return Vec::new();
        }
        debug!("Preloading {} assets", missing.len());

        let loads = missing.iter().map(|asset| async move {
            let decoded = source
                .fetch(asset)
                .await
                .and_then(|bytes| decode(asset, &bytes));
            (asset, decoded)
        });
        let results = join_all(loads).await;

        let mut failures = Vec::new();
        let mut entries = self.entries.write();
        for (asset, decoded) in results {
            match decoded {
                Ok(image) => {
                    entries.insert(asset.clone(), Arc::new(image));
                }
                Err(err) => {
                    warn!("❌ {err}");
                    failures.push(err);
                }
            }
        }
        info!(
            "🖼️ Preloaded {} of {} assets",
            missing.len() - failures.len(),
            missing.len()
        );
        failures
    }
}

fn decode(asset: &AssetRef, bytes: &[u8]) -> Result<RgbaImage, AssetError> {
    let image = image::load_from_memory(bytes).map_err(|err| AssetError::Decode {
        asset: asset.clone(),
        reason: err.to_string(),
    })?;
    debug!("Decoded asset {asset}: {}x{}", image.width(), image.height());
    Ok(image.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use futures::executor::block_on;
    use image::Rgba;

    use crate::raster::encode_png;

    struct MapSource(HashMap<AssetRef, Vec<u8>>);

    impl AssetSource for MapSource {
        fn fetch<'a>(&'a self, asset: &'a AssetRef) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
            async move {
                self.0
                    .get(asset)
                    .cloned()
                    .ok_or_else(|| AssetError::Fetch {
                        asset: asset.clone(),
                        reason: "unknown asset".to_string(),
                    })
            }
            .boxed()
        }
    }

    fn png(color: [u8; 4]) -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(4, 4, Rgba(color))).unwrap()
    }

    #[test]
    fn test_flattened_step_refs() {
        let asset = AssetRef::flattened_step(StepId::new());
        assert!(asset.is_flattened_step());
        assert!(!AssetRef::from("eyes/01.png").is_flattened_step());
    }

    #[test]
    fn test_missing_is_deduplicated() {
        let cache = AssetCache::new();
        let eye = AssetRef::from("eye");
        let nose = AssetRef::from("nose");
        cache.insert_decoded(nose.clone(), RgbaImage::new(1, 1));

        let missing = cache.missing([&eye, &nose, &eye]);
        assert_eq!(missing, vec![eye]);
    }

    #[test]
    fn test_preload_reports_failures() {
        let eye = AssetRef::from("eye");
        let broken = AssetRef::from("broken");
        let absent = AssetRef::from("absent");

        let mut bytes = HashMap::new();
        bytes.insert(eye.clone(), png([255, 0, 0, 255]));
        bytes.insert(broken.clone(), vec![1, 2, 3]);
        let source = MapSource(bytes);

        let cache = AssetCache::new();
        let failures = block_on(cache.preload(&source, &[eye.clone(), broken.clone(), absent.clone()]));

        assert!(cache.contains(&eye));
        assert!(!cache.contains(&broken));
        assert_eq!(failures.len(), 2);
        assert!(matches!(&failures[0], AssetError::Decode { asset, .. } if *asset == broken));
        assert!(matches!(&failures[1], AssetError::Fetch { asset, .. } if *asset == absent));
    }

    #[test]
    fn test_insert_encoded_rejects_garbage() {
        let cache = AssetCache::new();
        let result = cache.insert_encoded(AssetRef::from("junk"), b"not an image");
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
