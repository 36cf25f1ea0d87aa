use crate::annotations::{Color, Point};
use crate::tool::{Tool, ToolInput};
use serde::{Deserialize, Serialize};

/// A mutating session operation, as replayed from a batch of UI events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionCommand {
    AddInkStroke {
        page: usize,
        points: Vec<Point>,
        #[serde(default)]
        color: Color,
        #[serde(default = "default_ink_width")]
        width: f64,
    },
    AddTextNote {
        page: usize,
        text: String,
        x: f64,
        y: f64,
    },
    SelectPage {
        page: usize,
    },
    SelectTool {
        tool: Tool,
    },
    UseTool {
        input: ToolInput,
    },
}

fn default_ink_width() -> f64 {
    crate::tool::DEFAULT_INK_WIDTH
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    /// Commands applied before the batch stopped
    pub applied: usize,
    /// Index of the command that failed, if any
    pub failed_at: Option<usize>,
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed_at.is_none()
    }
}
