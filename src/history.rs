use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::part::Part;
use crate::raster::EncodedRaster;

/// An immutable snapshot of the scene parts and the drawing raster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub parts: Vec<Part>,
    pub drawing: EncodedRaster,
}

/// Linear undo/redo log.
///
/// Entries after the cursor are the redo branch and are discarded by the
/// next commit. While the log is non-empty the cursor always points at an
/// existing entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    max_entries: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history that forgets its oldest entries beyond `max_entries`
    pub fn with_limit(max_entries: Option<usize>) -> Self {
        Self {
            max_entries: max_entries.map(|limit| limit.max(1)),
            ..Self::default()
        }
    }

    /// Drops the redo branch and appends `entry` as the current state
    pub fn commit(&mut self, entry: HistoryEntry) {
        if !self.entries.is_empty() {
            let discarded = self.entries.len() - self.cursor - 1;
            if discarded > 0 {
                debug!("Discarding {discarded} redo entries");
            }
            self.entries.truncate(self.cursor + 1);
        }

        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;

        if let Some(limit) = self.max_entries {
            if self.entries.len() > limit {
                let overflow = self.entries.len() - limit;
                self.entries.drain(..overflow);
                self.cursor -= overflow;
            }
        }

        info!("💾 Committed history entry {} of {}", self.cursor + 1, self.entries.len());
    }

    /// Steps back one entry. Returns `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        info!("↩️ Undo to entry {}", self.cursor + 1);
        self.entries.get(self.cursor)
    }

    /// Steps forward one entry. Returns `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        info!("↪️ Redo to entry {}", self.cursor + 1);
        self.entries.get(self.cursor)
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The index of the current entry, `None` while empty
    pub fn cursor(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.cursor)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn max_entries(&self) -> Option<usize> {
        self.max_entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Whether the cursor is consistent with the entries, used when loading
    /// a deserialized history
    pub(crate) fn is_consistent(&self) -> bool {
        if self.entries.is_empty() {
            self.cursor == 0
        } else {
            self.cursor < self.entries.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetRef;
    use egui::{Rect, pos2, vec2};
    use image::RgbaImage;

    fn entry(part_count: usize) -> HistoryEntry {
        let parts = (0..part_count)
            .map(|i| {
                Part::new(
                    AssetRef::from("eye"),
                    Rect::from_min_size(pos2(i as f32, 0.0), vec2(10.0, 10.0)),
                )
            })
            .collect();
        HistoryEntry {
            parts,
            drawing: EncodedRaster::encode(&RgbaImage::new(4, 4)).unwrap(),
        }
    }

    #[test]
    fn test_undo_redo_walks_cursor() {
        let mut history = History::new();
        assert!(!history.can_undo());
        assert_eq!(history.cursor(), None);

        history.commit(entry(0));
        history.commit(entry(1));
        history.commit(entry(2));
        assert_eq!(history.cursor(), Some(2));
        assert!(!history.can_redo());

        assert_eq!(history.undo().unwrap().parts.len(), 1);
        assert_eq!(history.undo().unwrap().parts.len(), 0);
        assert!(history.undo().is_none());
        assert_eq!(history.cursor(), Some(0));

        assert_eq!(history.redo().unwrap().parts.len(), 1);
        assert!(history.can_redo());
    }

    #[test]
    fn test_commit_truncates_redo_branch() {
        let mut history = History::new();
        history.commit(entry(0));
        history.commit(entry(1));
        history.commit(entry(2));
        history.undo();
        history.undo();

        history.commit(entry(5));
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.current().unwrap().parts.len(), 5);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::with_limit(Some(2));
        history.commit(entry(0));
        history.commit(entry(1));
        history.commit(entry(2));

        assert_eq!(history.len(), 2);
        assert_eq!(history.cursor(), Some(1));
        assert_eq!(history.undo().unwrap().parts.len(), 1);
        assert!(!history.can_undo());
    }
}
