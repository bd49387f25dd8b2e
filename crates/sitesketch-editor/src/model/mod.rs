//! Drawable model: graphics, symbols and sketch kinds.

mod graphic;
mod kind;
mod symbol;

pub use graphic::{Attributes, Graphic};
pub use kind::SketchKind;
pub use symbol::{Color, Symbol};
