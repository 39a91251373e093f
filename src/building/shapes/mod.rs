mod common;
mod cuboid;

pub use common::{CommonShape, ShapeMask};
pub use cuboid::Cuboid;

use crate::block_position::BlockPosition;
use crate::bounding_box::BoundingBox;

/// Geometry that can be enumerated block by block.
///
/// Enumeration order is fixed for every shape: x varies fastest, then z,
/// then y. It matches the schematic block order so a solid capture lines up
/// with the on-disk arrays.
pub trait Shape {
    fn contains(&self, pos: BlockPosition) -> bool;

    fn bounds(&self) -> BoundingBox;

    fn for_each_point<F>(&self, mut f: F)
    where
        F: FnMut(BlockPosition),
    {
        let bounds = self.bounds();
        for index in 0..bounds.volume() {
            let pos = bounds.position_at(index);
            if self.contains(pos) {
                f(pos);
            }
        }
    }

    fn points(&self) -> Vec<BlockPosition> {
        let mut points = Vec::new();
        self.for_each_point(|pos| points.push(pos));
        points
    }
}
