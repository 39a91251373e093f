//! The host world as seen by the engine: block reads, block writes and
//! structural block comparison. The engine never owns a world; every
//! operation borrows one from the main execution context.

use crate::block_position::BlockPosition;
use crate::block_state::BlockState;
use crate::bounding_box::BoundingBox;
use rustc_hash::FxHashMap;

/// Read access to block states.
pub trait BlockReader {
    fn get_block_at(&self, pos: BlockPosition) -> BlockState;

    fn block_equals(&self, a: &BlockState, b: &BlockState) -> bool {
        a == b
    }
}

/// Result of a single block write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Written,
    OutOfBounds,
}

/// A mutable world owned by the main execution context.
pub trait World: BlockReader {
    fn set_block_at(&mut self, pos: BlockPosition, state: &BlockState) -> SetOutcome;

    /// Copies the blocks inside `bounds` so they can be read off the main
    /// context.
    fn snapshot(&self, bounds: BoundingBox) -> WorldSnapshot {
        WorldSnapshot::capture(self, bounds)
    }
}

/// Dense, owned copy of a box of blocks. Reads outside the box yield air.
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    bounds: BoundingBox,
    blocks: Vec<BlockState>,
}

impl WorldSnapshot {
    pub fn capture<R: BlockReader + ?Sized>(reader: &R, bounds: BoundingBox) -> Self {
        let volume = bounds.volume();
        let mut blocks = Vec::with_capacity(volume as usize);
        for index in 0..volume {
            blocks.push(reader.get_block_at(bounds.position_at(index)));
        }
        Self { bounds, blocks }
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }
}

impl BlockReader for WorldSnapshot {
    fn get_block_at(&self, pos: BlockPosition) -> BlockState {
        self.bounds
            .index_of(pos)
            .and_then(|index| self.blocks.get(index).copied())
            .unwrap_or(BlockState::AIR)
    }
}

/// Sparse in-memory world with a fixed valid region. Anything outside the
/// region reads as air and rejects writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryWorld {
    limits: BoundingBox,
    blocks: FxHashMap<BlockPosition, BlockState>,
}

impl MemoryWorld {
    pub fn new(limits: BoundingBox) -> Self {
        Self {
            limits,
            blocks: FxHashMap::default(),
        }
    }

    /// A world spanning the classic 0..256 build height and `radius` blocks
    /// around the origin horizontally.
    pub fn with_radius(radius: i32) -> Self {
        Self::new(BoundingBox::new(
            BlockPosition::new(-radius, 0, -radius),
            BlockPosition::new(radius, 255, radius),
        ))
    }

    pub fn limits(&self) -> BoundingBox {
        self.limits
    }

    pub fn count_non_air(&self) -> usize {
        self.blocks.len()
    }
}

impl BlockReader for MemoryWorld {
    fn get_block_at(&self, pos: BlockPosition) -> BlockState {
        self.blocks.get(&pos).copied().unwrap_or(BlockState::AIR)
    }
}

impl World for MemoryWorld {
    fn set_block_at(&mut self, pos: BlockPosition, state: &BlockState) -> SetOutcome {
        if !self.limits.contains(pos) {
            return SetOutcome::OutOfBounds;
        }
        if state.is_air() {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, *state);
        }
        SetOutcome::Written
    }
}
