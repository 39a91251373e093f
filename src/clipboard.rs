//! Position-independent capture of a region's block states.

use crate::block_position::BlockPosition;
use crate::block_state::BlockState;
use crate::bounding_box::BoundingBox;
use crate::building::{RegionShape, Shape};
use crate::error::{EditError, Result};
use crate::world::BlockReader;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Where a paste places the clipboard relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasteAlignment {
    /// The clipboard's min corner lands on the anchor.
    #[default]
    Corner,
    /// The clipboard keeps the offset it had from the actor that copied it.
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub offset: BlockPosition,
    pub state: BlockState,
}

/// Immutable block buffer keyed by offset from the captured region's min
/// corner. Entries are kept in enumeration order (x, then z, then y).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clipboard {
    size: BlockPosition,
    origin: BlockPosition,
    entries: Vec<ClipboardEntry>,
}

fn enumeration_order(a: &BlockPosition, b: &BlockPosition) -> Ordering {
    (a.y, a.z, a.x).cmp(&(b.y, b.z, b.x))
}

impl Clipboard {
    /// Reads every coordinate of `shape` from `reader`. `anchor` is where the
    /// copying actor stood; it is only used for relative pastes.
    pub fn capture<R: BlockReader + ?Sized>(
        shape: &RegionShape,
        anchor: BlockPosition,
        reader: &R,
    ) -> Clipboard {
        let bounds = shape.bounds();
        let mut builder = ClipboardBuilder::new(bounds, anchor);
        shape.for_each_point(|pos| builder.push(pos, reader.get_block_at(pos)));
        builder.finish()
    }

    /// Builds a clipboard from raw parts, checking that every offset lies
    /// inside `[0, size)` and that entries are ordered without duplicates.
    pub fn from_entries(
        size: BlockPosition,
        origin: BlockPosition,
        entries: Vec<ClipboardEntry>,
    ) -> Result<Clipboard> {
        if size.x <= 0 || size.y <= 0 || size.z <= 0 {
            return Err(EditError::invalid(format!("clipboard size {}", size)));
        }
        let extent = BoundingBox::from_position_and_size(BlockPosition::ZERO, size);
        for entry in &entries {
            if !extent.contains(entry.offset) {
                return Err(EditError::invalid(format!(
                    "clipboard offset {} outside size {}",
                    entry.offset, size
                )));
            }
        }
        let ordered = entries
            .windows(2)
            .all(|w| enumeration_order(&w[0].offset, &w[1].offset) == Ordering::Less);
        if !ordered {
            return Err(EditError::invalid("clipboard entries out of order"));
        }
        Ok(Clipboard {
            size,
            origin,
            entries,
        })
    }

    pub fn size(&self) -> BlockPosition {
        self.size
    }

    /// Offset from the copying actor's position to the region's min corner.
    pub fn origin(&self) -> BlockPosition {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every offset inside `size` has an entry. Masked captures
    /// leave gaps.
    pub fn is_dense(&self) -> bool {
        self.entries.len() as u64 == self.footprint(BlockPosition::ZERO).volume()
    }

    pub fn entries(&self) -> &[ClipboardEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClipboardEntry> {
        self.entries.iter()
    }

    pub fn get(&self, offset: BlockPosition) -> Option<BlockState> {
        self.entries
            .binary_search_by(|entry| enumeration_order(&entry.offset, &offset))
            .ok()
            .map(|index| self.entries[index].state)
    }

    /// World position of offset zero when pasting at `anchor`.
    pub fn placement(&self, anchor: BlockPosition, alignment: PasteAlignment) -> BlockPosition {
        match alignment {
            PasteAlignment::Corner => anchor,
            PasteAlignment::Relative => anchor + self.origin,
        }
    }

    /// Box covered by a paste whose offset zero lands on `base`.
    pub fn footprint(&self, base: BlockPosition) -> BoundingBox {
        BoundingBox::from_position_and_size(base, self.size)
    }
}

/// Accumulates a clipboard in enumeration order.
#[derive(Debug)]
pub(crate) struct ClipboardBuilder {
    min: BlockPosition,
    size: BlockPosition,
    origin: BlockPosition,
    entries: Vec<ClipboardEntry>,
}

impl ClipboardBuilder {
    pub(crate) fn new(bounds: BoundingBox, anchor: BlockPosition) -> Self {
        Self {
            min: bounds.min,
            size: bounds.size(),
            origin: bounds.min - anchor,
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, pos: BlockPosition, state: BlockState) {
        self.entries.push(ClipboardEntry {
            offset: pos - self.min,
            state,
        });
    }

    pub(crate) fn finish(self) -> Clipboard {
        Clipboard {
            size: self.size,
            origin: self.origin,
            entries: self.entries,
        }
    }
}
