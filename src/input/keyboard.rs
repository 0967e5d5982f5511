use egui::{Key, Modifiers, Rect, Vec2, vec2};

use crate::config::EngineConfig;

/// What a keypress does to the selected part
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyCommand {
    Nudge(Vec2),
    Grow,
    Shrink,
}

/// Maps keys onto discrete part transforms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyboardController {
    nudge_step: f32,
    resize_step: f32,
    min_part_size: f32,
}

impl KeyboardController {
    pub fn new(nudge_step: f32, resize_step: f32, min_part_size: f32) -> Self {
        Self {
            nudge_step,
            resize_step,
            min_part_size,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.nudge_step, config.resize_step, config.min_part_size)
    }

    /// Arrow keys nudge. Cmd/Ctrl with `+` (or `=`, its unshifted key) grows
    /// and with `-` shrinks.
    pub fn command_for(&self, key: Key, modifiers: Modifiers) -> Option<KeyCommand> {
        let step = self.nudge_step;
        let command = match key {
            Key::ArrowLeft => KeyCommand::Nudge(vec2(-step, 0.0)),
            Key::ArrowRight => KeyCommand::Nudge(vec2(step, 0.0)),
            Key::ArrowUp => KeyCommand::Nudge(vec2(0.0, -step)),
            Key::ArrowDown => KeyCommand::Nudge(vec2(0.0, step)),
            Key::Plus | Key::Equals if modifiers.command || modifiers.ctrl => KeyCommand::Grow,
            Key::Minus if modifiers.command || modifiers.ctrl => KeyCommand::Shrink,
            _ => return None,
        };
        Some(command)
    }

    /// The rectangle `command` asks for, before clamping. The top-left
    /// corner stays put while resizing. `None` when shrinking is already at
    /// the floor.
    pub fn proposed_rect(&self, command: KeyCommand, rect: Rect) -> Option<Rect> {
        match command {
            KeyCommand::Nudge(delta) => Some(rect.translate(delta)),
            KeyCommand::Grow => {
                let size = rect.size() + Vec2::splat(self.resize_step);
                Some(Rect::from_min_size(rect.min, size))
            }
            KeyCommand::Shrink => {
                let floor = Vec2::splat(self.min_part_size);
                let size = (rect.size() - Vec2::splat(self.resize_step)).max(floor);
                if size.x >= rect.width() && size.y >= rect.height() {
                    return None;
                }
                // Never grow a part that was already below the floor
                Some(Rect::from_min_size(rect.min, size.min(rect.size())))
            }
        }
    }
}
