//! Visual styles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const ORANGE: Color = Color([255, 140, 0, 255]);
    pub const TRANSLUCENT_ORANGE: Color = Color([255, 140, 0, 96]);

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color([r, g, b, a])
    }
}

/// Style applied to a graphic.
///
/// The symbol family decides which sketch kinds may use it; see
/// [`SketchKind::supports`](crate::model::SketchKind::supports).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Symbol {
    Marker {
        color: Color,
        size: f64,
    },
    Line {
        color: Color,
        width: f64,
    },
    Fill {
        color: Color,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outline: Option<Color>,
    },
    /// A 3-D model placed at a point.
    Mesh {
        resource: String,
        #[serde(default)]
        height: f64,
        #[serde(default)]
        heading: f64,
    },
}

impl Symbol {
    pub fn marker(color: Color, size: f64) -> Self {
        Symbol::Marker { color, size }
    }

    pub fn line(color: Color, width: f64) -> Self {
        Symbol::Line { color, width }
    }

    pub fn fill(color: Color) -> Self {
        Symbol::Fill {
            color,
            outline: None,
        }
    }

    pub fn mesh(resource: impl Into<String>) -> Self {
        Symbol::Mesh {
            resource: resource.into(),
            height: 0.0,
            heading: 0.0,
        }
    }

    /// Family name used in messages
    pub fn family(&self) -> &'static str {
        match self {
            Symbol::Marker { .. } => "marker",
            Symbol::Line { .. } => "line",
            Symbol::Fill { .. } => "fill",
            Symbol::Mesh { .. } => "mesh",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.family())
    }
}
