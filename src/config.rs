use egui::{Color32, Pos2, Rect, Vec2, vec2};
use serde::{Deserialize, Serialize};

use crate::compositor::FitMode;
use crate::drawing::PencilSettings;
use crate::error::ConfigError;

/// Engine settings.
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // missing fields fall back to the defaults below
pub struct EngineConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Size of a freshly dropped part
    pub part_size: Vec2,
    /// Distance an arrow key moves the selected part
    pub nudge_step: f32,
    /// Amount Ctrl/Cmd + `+`/`-` grows or shrinks the selected part
    pub resize_step: f32,
    /// Keyboard shrinking stops at this width/height
    pub min_part_size: f32,
    pub pencil_color: Color32,
    pub pencil_width: f32,
    pub eraser_width: f32,
    /// Longest edge of a step thumbnail
    pub thumbnail_edge: u32,
    pub fit_mode: FitMode,
    /// Oldest history entries are forgotten beyond this; `None` keeps all
    pub history_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let pencil = PencilSettings::default();
        Self {
            canvas_width: 800,
            canvas_height: 700,
            part_size: vec2(80.0, 80.0),
            nudge_step: 5.0,
            resize_step: 5.0,
            min_part_size: 20.0,
            pencil_color: pencil.color,
            pencil_width: pencil.width,
            eraser_width: 20.0,
            thumbnail_edge: 96,
            fit_mode: FitMode::default(),
            history_limit: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }

        let positive = [
            ("part width", self.part_size.x),
            ("part height", self.part_size.y),
            ("nudge step", self.nudge_step),
            ("resize step", self.resize_step),
            ("minimum part size", self.min_part_size),
            ("pencil width", self.pencil_width),
            ("eraser width", self.eraser_width),
        ];
        if let Some((name, value)) = positive
            .iter()
            .find(|(_, value)| !(value.is_finite() && *value > 0.0))
        {
            return Err(ConfigError::Invalid(format!(
                "{name} must be a positive number, got {value}"
            )));
        }

        if self.history_limit == Some(0) {
            return Err(ConfigError::Invalid(
                "history limit must keep at least one entry".to_string(),
            ));
        }
        Ok(())
    }

    pub fn canvas_size(&self) -> Vec2 {
        vec2(self.canvas_width as f32, self.canvas_height as f32)
    }

    /// The canvas rectangle in host space when its top-left sits at `origin`
    pub fn canvas_rect(&self, origin: Pos2) -> Rect {
        Rect::from_min_size(origin, self.canvas_size())
    }

    pub fn pencil(&self) -> PencilSettings {
        PencilSettings {
            color: self.pencil_color,
            width: self.pencil_width,
        }
    }
}
