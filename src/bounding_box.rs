use crate::block_position::BlockPosition;
use serde::{Deserialize, Serialize};

/// Inclusive axis-aligned box. `min <= max` holds on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: BlockPosition,
    pub max: BlockPosition,
}

impl BoundingBox {
    /// Normalizes two arbitrary corners into a min/max box.
    pub fn new(a: BlockPosition, b: BlockPosition) -> Self {
        Self {
            min: a.component_min(b),
            max: a.component_max(b),
        }
    }

    /// Box starting at `position` spanning `size` blocks per axis. Each size
    /// component is clamped to at least one block.
    pub fn from_position_and_size(position: BlockPosition, size: BlockPosition) -> Self {
        let size = size.component_max(BlockPosition::new(1, 1, 1));
        Self {
            min: position,
            max: position + size - BlockPosition::new(1, 1, 1),
        }
    }

    pub fn to_position_and_size(&self) -> (BlockPosition, BlockPosition) {
        (self.min, self.size())
    }

    /// Extent per axis, inclusive of both corners.
    pub fn size(&self) -> BlockPosition {
        self.max - self.min + BlockPosition::new(1, 1, 1)
    }

    pub fn get_dimensions(&self) -> (i32, i32, i32) {
        self.size().as_tuple()
    }

    pub fn volume(&self) -> u64 {
        let (w, h, l) = self.get_dimensions();
        w as u64 * h as u64 * l as u64
    }

    pub fn contains(&self, pos: BlockPosition) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }

    pub fn translate(&self, offset: BlockPosition) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Linear index in x-fastest, then z, then y order.
    pub fn index_of(&self, pos: BlockPosition) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        let (w, _, l) = self.get_dimensions();
        let rel = pos - self.min;
        Some(((rel.y as usize * l as usize) + rel.z as usize) * w as usize + rel.x as usize)
    }

    /// Inverse of [`BoundingBox::index_of`].
    pub fn position_at(&self, index: u64) -> BlockPosition {
        let (w, _, l) = self.get_dimensions();
        let layer = w as u64 * l as u64;
        let y = (index / layer) as i32;
        let rem = index % layer;
        let z = (rem / w as u64) as i32;
        let x = (rem % w as u64) as i32;
        self.min + BlockPosition::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_are_normalized() {
        let bbox = BoundingBox::new(BlockPosition::new(3, 0, -1), BlockPosition::new(-1, 2, 4));
        assert_eq!(bbox.min, BlockPosition::new(-1, 0, -1));
        assert_eq!(bbox.max, BlockPosition::new(3, 2, 4));
        assert_eq!(bbox.get_dimensions(), (5, 3, 6));
        assert_eq!(bbox.volume(), 90);
    }

    #[test]
    fn test_single_point_is_unit_box() {
        let p = BlockPosition::new(7, 7, 7);
        let bbox = BoundingBox::new(p, p);
        assert_eq!(bbox.volume(), 1);
        assert_eq!(bbox.index_of(p), Some(0));
    }

    #[test]
    fn test_index_order_is_x_then_z_then_y() {
        let bbox = BoundingBox::from_position_and_size(BlockPosition::ZERO, BlockPosition::new(2, 2, 3));
        assert_eq!(bbox.index_of(BlockPosition::new(1, 0, 0)), Some(1));
        assert_eq!(bbox.index_of(BlockPosition::new(0, 0, 1)), Some(2));
        assert_eq!(bbox.index_of(BlockPosition::new(0, 1, 0)), Some(6));
        for i in 0..bbox.volume() {
            assert_eq!(bbox.index_of(bbox.position_at(i)), Some(i as usize));
        }
    }
}
