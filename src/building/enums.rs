use crate::block_position::BlockPosition;
use crate::bounding_box::BoundingBox;
use crate::building::{CommonShape, Cuboid, Shape, ShapeMask};
use crate::error::Result;
use crate::selection::Selection;

// ============================================================================
// Delegate macro for RegionShape
// ============================================================================

macro_rules! delegate_shape {
    ($self:expr, $method:ident $(, $arg:expr)*) => {
        match $self {
            RegionShape::Cuboid(s) => s.$method($($arg),*),
            RegionShape::Common(s) => s.$method($($arg),*),
        }
    };
}

// ============================================================================
// Shapes
// ============================================================================

/// Closed set of region geometries an edit can run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionShape {
    Cuboid(Cuboid),
    Common(CommonShape),
}

impl RegionShape {
    /// Solid cuboid spanning the selection.
    pub fn from_selection(selection: &Selection) -> Result<Self> {
        let bounds = selection.bounding_box()?;
        Ok(RegionShape::Cuboid(Cuboid { bounds }))
    }

    pub fn from_selection_masked(selection: &Selection, mask: ShapeMask) -> Result<Self> {
        let bounds = selection.bounding_box()?;
        Ok(RegionShape::Common(CommonShape::new(bounds, mask)))
    }

    /// Lazy, restartable walk over the covered coordinates.
    pub fn enumerate(&self) -> ShapePoints {
        ShapePoints::new(*self)
    }

    /// Upper bound on the number of enumerated coordinates.
    pub fn volume(&self) -> u64 {
        self.bounds().volume()
    }
}

impl Shape for RegionShape {
    fn contains(&self, pos: BlockPosition) -> bool {
        delegate_shape!(self, contains, pos)
    }

    fn bounds(&self) -> BoundingBox {
        delegate_shape!(self, bounds)
    }

    fn for_each_point<F>(&self, f: F)
    where
        F: FnMut(BlockPosition),
    {
        delegate_shape!(self, for_each_point, f)
    }
}

/// Iterator over a shape's coordinates. Owns a copy of the shape so it can be
/// moved onto a worker and resumed chunk by chunk.
#[derive(Debug, Clone)]
pub struct ShapePoints {
    shape: RegionShape,
    bounds: BoundingBox,
    cursor: u64,
    volume: u64,
}

impl ShapePoints {
    fn new(shape: RegionShape) -> Self {
        let bounds = shape.bounds();
        Self {
            shape,
            bounds,
            cursor: 0,
            volume: bounds.volume(),
        }
    }

    pub fn shape(&self) -> &RegionShape {
        &self.shape
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.volume
    }
}

impl Iterator for ShapePoints {
    type Item = BlockPosition;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.volume {
            let pos = self.bounds.position_at(self.cursor);
            self.cursor += 1;
            if let RegionShape::Cuboid(_) = self.shape {
                return Some(pos);
            }
            if self.shape.contains(pos) {
                return Some(pos);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.volume - self.cursor) as usize;
        match self.shape {
            RegionShape::Cuboid(_) => (remaining, Some(remaining)),
            RegionShape::Common(_) => (0, Some(remaining)),
        }
    }
}
