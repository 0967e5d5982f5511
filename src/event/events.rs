use crate::drawing::DrawingTool;
use crate::error::Condition;
use crate::part::PartId;
use crate::scene::Placement;
use crate::steps::StepId;

/// Something the host may want to react to, such as a repaint or a toast
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PartAdded {
        id: PartId,
        index: usize,
    },
    PartRemoved {
        id: PartId,
    },
    /// Every part was removed and the drawing cleared
    SceneCleared,
    PartTransformed {
        id: PartId,
        clamped: bool,
    },
    PartReordered {
        id: PartId,
        placement: Placement,
    },
    LockToggled {
        id: PartId,
        locked: bool,
    },
    SelectionChanged {
        selected: Option<PartId>,
    },
    ToolChanged {
        old: DrawingTool,
        new: DrawingTool,
    },
    StrokeCompleted {
        tool: DrawingTool,
    },
    DrawingCleared,
    /// A history entry was committed; `cursor` is its index
    Committed {
        cursor: usize,
        len: usize,
    },
    /// Undo or redo replaced the scene and drawing
    Restored {
        cursor: usize,
    },
    StepRecorded {
        id: StepId,
        index: usize,
    },
    StepSelected {
        id: StepId,
        index: usize,
    },
    ConditionReported(Condition),
}
