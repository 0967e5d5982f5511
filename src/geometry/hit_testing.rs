use egui::Pos2;

use crate::part::Part;

/// Index of the front-most part under `pos`, if any.
///
/// Parts are stored back to front, so the search runs from the end.
pub fn part_at(parts: &[Part], pos: Pos2) -> Option<usize> {
    parts.iter().rposition(|part| part.rect().contains(pos))
}
