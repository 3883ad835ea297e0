//! Tool system for the drawing surface.

use crate::shapes::{Circle, Freehand, Line, Rectangle, Shape, ShapeStyle};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Select,
    /// Neutral tool: pointer-down on a shape starts a transform.
    #[default]
    Move,
    Rect,
    Circle,
    Line,
    Arrow,
    Pencil,
    Eraser,
    Text,
}

impl ToolKind {
    /// All tools in palette order.
    pub const ALL: [ToolKind; 9] = [
        ToolKind::Select,
        ToolKind::Move,
        ToolKind::Rect,
        ToolKind::Circle,
        ToolKind::Line,
        ToolKind::Arrow,
        ToolKind::Pencil,
        ToolKind::Eraser,
        ToolKind::Text,
    ];

    /// Palette name of the tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Move => "move",
            ToolKind::Rect => "rect",
            ToolKind::Circle => "circle",
            ToolKind::Line => "line",
            ToolKind::Arrow => "arrow",
            ToolKind::Pencil => "pencil",
            ToolKind::Eraser => "eraser",
            ToolKind::Text => "text",
        }
    }

    /// Tools that build a shape from a pointer drag.
    pub fn draws_shapes(&self) -> bool {
        matches!(
            self,
            ToolKind::Rect
                | ToolKind::Circle
                | ToolKind::Line
                | ToolKind::Arrow
                | ToolKind::Pencil
                | ToolKind::Eraser
        )
    }

    /// Tools under which clicking a shape selects it.
    pub fn selects_shapes(&self) -> bool {
        matches!(self, ToolKind::Select | ToolKind::Move)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown tool name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for ToolKind {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        ToolKind::ALL
            .into_iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| UnknownTool(s.to_string()))
    }
}

/// Build the initial draft for a drag that starts at `origin`.
///
/// Returns `None` for tools that do not draw by dragging.
pub fn create_draft(tool: ToolKind, origin: Point, style: &ShapeStyle) -> Option<Shape> {
    let mut shape = match tool {
        ToolKind::Rect => Shape::Rect(Rectangle::new(origin, 0.0, 0.0)),
        ToolKind::Circle => Shape::Circle(Circle::new(origin, 0.0)),
        ToolKind::Line => Shape::Line(Line::new(origin, origin, false)),
        ToolKind::Arrow => Shape::Line(Line::new(origin, origin, true)),
        ToolKind::Pencil => Shape::Freehand(Freehand::new(origin, false)),
        ToolKind::Eraser => Shape::Freehand(Freehand::new(origin, true)),
        ToolKind::Select | ToolKind::Move | ToolKind::Text => return None,
    };
    *shape.style_mut() = style.clone();
    Some(shape)
}
