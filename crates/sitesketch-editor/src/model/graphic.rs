use super::symbol::Symbol;
use serde::{Deserialize, Serialize};
use sitesketch_core::{Geometry, GraphicId};

/// Free-form attributes carried along with a graphic
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// A drawable unit: geometry plus style.
///
/// Graphics live in exactly one [`GraphicsLayer`](crate::layer::GraphicsLayer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graphic {
    id: GraphicId,
    pub geometry: Geometry,
    pub symbol: Symbol,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Graphic {
    pub fn new(geometry: Geometry, symbol: Symbol) -> Self {
        Self {
            id: GraphicId::new(),
            geometry,
            symbol,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn id(&self) -> GraphicId {
        self.id
    }

    /// New graphic with `geometry`, this graphic's symbol and attributes and a fresh id.
    pub fn derive(&self, geometry: Geometry) -> Graphic {
        Graphic {
            id: GraphicId::new(),
            geometry,
            symbol: self.symbol.clone(),
            attributes: self.attributes.clone(),
        }
    }

    /// Structurally identical copy with a fresh id.
    pub fn duplicate(&self) -> Graphic {
        self.derive(self.geometry.clone())
    }

    /// Equality ignoring identity.
    pub fn content_eq(&self, other: &Graphic) -> bool {
        self.geometry == other.geometry
            && self.symbol == other.symbol
            && self.attributes == other.attributes
    }
}
