use serde::{Deserialize, Serialize};

use super::AssetRef;

/// The kind of face/body fragment an asset depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartCategory {
    Eye,
    Eyebrow,
    Hair,
    Head,
    Lips,
    Nose,
}

impl PartCategory {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Eye => "Eye",
            Self::Eyebrow => "Eyebrow",
            Self::Hair => "Hair",
            Self::Head => "Head",
            Self::Lips => "Lips",
            Self::Nose => "Nose",
        }
    }
}

/// One droppable entry of the palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u32,
    pub name: String,
    pub category: PartCategory,
    pub asset: AssetRef,
}

/// The palette of assets a host offers for dragging onto the canvas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCatalog {
    entries: Vec<CatalogEntry>,
}

impl Default for AssetCatalog {
    /// The stock body-part palette
    fn default() -> Self {
        let stock = [
            (PartCategory::Eye, "eyes/01.png"),
            (PartCategory::Eyebrow, "eyebrows/01.png"),
            (PartCategory::Hair, "hair/01.png"),
            (PartCategory::Head, "head/01.png"),
            (PartCategory::Lips, "lips/01.png"),
            (PartCategory::Nose, "nose/01.png"),
        ];

        let entries = stock
            .into_iter()
            .zip(1..)
            .map(|((category, path), id)| CatalogEntry {
                id,
                name: category.name().to_string(),
                category,
                asset: AssetRef::new(path),
            })
            .collect();

        Self { entries }
    }
}

impl AssetCatalog {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn find(&self, id: u32) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn by_category(&self, category: PartCategory) -> impl Iterator<Item = &CatalogEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.category == category)
    }

    /// Appends an entry; ids are assigned sequentially
    pub fn push(&mut self, name: impl Into<String>, category: PartCategory, asset: AssetRef) -> u32 {
        let id = self.entries.iter().map(|entry| entry.id).max().unwrap_or(0) + 1;
        self.entries.push(CatalogEntry {
            id,
            name: name.into(),
            category,
            asset,
        });
        id
    }

    /// Every asset reference, for preloading into an [`super::AssetCache`]
    pub fn assets(&self) -> Vec<AssetRef> {
        self.entries.iter().map(|entry| entry.asset.clone()).collect()
    }
}
