//! Order-preserving layer writes.
//!
//! Layers cannot re-insert a removed identity at an arbitrary offset, so a
//! replace rebuilds everything above the anchor from fresh copies. Visual
//! order and content survive; identity of the re-appended graphics does not.

use crate::layer::GraphicsLayer;
use crate::model::Graphic;
use sitesketch_core::{EditorError, GraphicId};

/// What a [`OrderedLayerWriter::replace`] did
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceSummary {
    /// Index of the first replacement (the old anchor)
    pub anchor_index: usize,
    /// Ids of the inserted replacements, in order
    pub inserted: Vec<GraphicId>,
    /// Number of graphics above the anchor that were re-appended as copies
    pub reappended: usize,
}

/// What a [`OrderedLayerWriter::rewrite`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    /// Graphics whose content changed
    pub changed: usize,
    /// Graphics removed without replacement
    pub dropped: usize,
}

/// Writes clipped graphics into a layer without disturbing draw order.
pub struct OrderedLayerWriter;

impl OrderedLayerWriter {
    /// Replaces the graphic at `anchor_index` by `replacements`.
    ///
    /// Every graphic above the anchor is captured, removed with the original
    /// and re-appended after the replacements as a content-identical copy.
    pub fn replace(
        layer: &mut GraphicsLayer,
        anchor_index: usize,
        replacements: Vec<Graphic>,
    ) -> Result<ReplaceSummary, EditorError> {
        let len = layer.len();
        if anchor_index >= len {
            return Err(EditorError::AnchorOutOfRange {
                index: anchor_index,
                len,
            });
        }

        let above = layer.split_off(anchor_index + 1);
        layer.remove_at(anchor_index);

        let inserted: Vec<GraphicId> = replacements.iter().map(Graphic::id).collect();
        for (offset, graphic) in replacements.into_iter().enumerate() {
            layer.insert_at(anchor_index + offset, graphic);
        }

        let reappended = above.len();
        for graphic in &above {
            layer.add(graphic.duplicate());
        }

        tracing::debug!(
            "Replaced {} at {} with {} graphic(s), re-appended {}",
            layer.id(),
            anchor_index,
            inserted.len(),
            reappended
        );

        Ok(ReplaceSummary {
            anchor_index,
            inserted,
            reappended,
        })
    }

    /// Appends `graphics` on top of the layer and returns the index of the first.
    pub fn append(layer: &mut GraphicsLayer, graphics: Vec<Graphic>) -> usize {
        let start = layer.len();
        for graphic in graphics {
            layer.add(graphic);
        }
        start
    }

    /// Maps every graphic to zero or more replacements in one pass.
    ///
    /// `f` returns `None` to keep a graphic untouched, which also keeps its
    /// identity. Draw order of the result follows the original order.
    pub fn rewrite<F>(layer: &mut GraphicsLayer, mut f: F) -> RewriteSummary
    where
        F: FnMut(&Graphic) -> Option<Vec<Graphic>>,
    {
        let originals = layer.split_off(0);
        let mut summary = RewriteSummary::default();
        for graphic in originals {
            match f(&graphic) {
                None => {
                    layer.add(graphic);
                }
                Some(parts) if parts.is_empty() => summary.dropped += 1,
                Some(parts) => {
                    summary.changed += 1;
                    for part in parts {
                        layer.add(part);
                    }
                }
            }
        }
        summary
    }
}
