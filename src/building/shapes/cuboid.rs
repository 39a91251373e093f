use super::Shape;
use crate::block_position::BlockPosition;
use crate::bounding_box::BoundingBox;

/// Solid axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cuboid {
    pub bounds: BoundingBox,
}

impl Cuboid {
    pub fn new(p1: BlockPosition, p2: BlockPosition) -> Self {
        Self {
            bounds: BoundingBox::new(p1, p2),
        }
    }
}

impl Shape for Cuboid {
    fn contains(&self, pos: BlockPosition) -> bool {
        self.bounds.contains(pos)
    }

    fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    fn for_each_point<F>(&self, mut f: F)
    where
        F: FnMut(BlockPosition),
    {
        let BoundingBox { min, max } = self.bounds;
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                for x in min.x..=max.x {
                    f(BlockPosition::new(x, y, z));
                }
            }
        }
    }
}
