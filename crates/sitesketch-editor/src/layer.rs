//! Drawing layers.
//!
//! A layer is an ordered graphic sequence; lower indices are drawn first.
//! Layers are supplied by the presentation side and shared with the editor
//! as [`LayerRef`].

use crate::model::Graphic;
use serde::Serialize;
use sitesketch_core::{shared, GraphicId, LayerId, Shared};

/// Shared handle to a layer
pub type LayerRef = Shared<GraphicsLayer>;

/// An ordered collection of graphics.
#[derive(Debug, Clone, Serialize)]
pub struct GraphicsLayer {
    id: LayerId,
    title: String,
    graphics: Vec<Graphic>,
}

impl GraphicsLayer {
    pub fn new(id: impl Into<LayerId>) -> Self {
        let id = id.into();
        Self {
            title: id.to_string(),
            id,
            graphics: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Wrap into a shared handle
    pub fn into_ref(self) -> LayerRef {
        shared(self)
    }

    pub fn id(&self) -> &LayerId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Appends on top and returns the new index.
    pub fn add(&mut self, graphic: Graphic) -> usize {
        self.graphics.push(graphic);
        self.graphics.len() - 1
    }

    /// Inserts at `index`, clamped to the end of the layer.
    pub fn insert_at(&mut self, index: usize, graphic: Graphic) -> usize {
        let index = index.min(self.graphics.len());
        self.graphics.insert(index, graphic);
        index
    }

    /// Removes a graphic by identity. Unknown ids are a no-op.
    pub fn remove(&mut self, id: GraphicId) -> Option<Graphic> {
        let index = self.index_of(id)?;
        Some(self.graphics.remove(index))
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Graphic> {
        (index < self.graphics.len()).then(|| self.graphics.remove(index))
    }

    /// Removes and returns every graphic from `index` upwards.
    pub fn split_off(&mut self, index: usize) -> Vec<Graphic> {
        let index = index.min(self.graphics.len());
        self.graphics.split_off(index)
    }

    pub fn index_of(&self, id: GraphicId) -> Option<usize> {
        self.graphics.iter().position(|g| g.id() == id)
    }

    pub fn contains(&self, id: GraphicId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: GraphicId) -> Option<&Graphic> {
        self.graphics.iter().find(|g| g.id() == id)
    }

    pub fn get_mut(&mut self, id: GraphicId) -> Option<&mut Graphic> {
        self.graphics.iter_mut().find(|g| g.id() == id)
    }

    pub fn at(&self, index: usize) -> Option<&Graphic> {
        self.graphics.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Graphic> {
        self.graphics.iter()
    }

    pub fn graphics(&self) -> &[Graphic] {
        &self.graphics
    }

    pub fn len(&self) -> usize {
        self.graphics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty()
    }
}
