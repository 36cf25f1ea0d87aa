//! Editing tools
//!
//! The active tool decides what a pointer gesture turns into. Each variant
//! carries the parameters its annotations are created with.

use crate::annotations::{Color, Point};
use serde::{Deserialize, Serialize};

pub const DEFAULT_INK_WIDTH: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Tool {
    /// Navigation only; gestures create nothing
    #[default]
    Select,
    Ink {
        color: Color,
        width: f64,
    },
    Text {
        color: Color,
    },
}

impl Tool {
    pub fn ink() -> Self {
        Tool::Ink {
            color: Color::BLACK,
            width: DEFAULT_INK_WIDTH,
        }
    }

    pub fn text() -> Self {
        Tool::Text {
            color: Color::BLACK,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::Ink { .. } => "ink",
            Tool::Text { .. } => "text",
        }
    }
}

/// A gesture on the current page, as delivered by the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolInput {
    /// Pointer path from press to release
    Stroke { points: Vec<Point> },
    /// Click with the text the user typed for that spot
    Place { x: f64, y: f64, text: String },
}

impl ToolInput {
    pub fn name(&self) -> &'static str {
        match self {
            ToolInput::Stroke { .. } => "stroke",
            ToolInput::Place { .. } => "place",
        }
    }
}
