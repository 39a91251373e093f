use super::Shape;
use crate::block_position::BlockPosition;
use crate::bounding_box::BoundingBox;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which blocks of the bounding box a [`CommonShape`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeMask {
    #[default]
    Solid,
    /// Only the six faces of the box.
    Hollow,
    /// Only the four vertical sides.
    Walls,
}

impl FromStr for ShapeMask {
    type Err = crate::error::EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "solid" => Ok(ShapeMask::Solid),
            "hollow" => Ok(ShapeMask::Hollow),
            "walls" => Ok(ShapeMask::Walls),
            other => Err(crate::error::EditError::invalid(format!(
                "unknown shape '{}'",
                other
            ))),
        }
    }
}

/// Bounding box with a mask applied during enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonShape {
    pub bounds: BoundingBox,
    pub mask: ShapeMask,
}

impl CommonShape {
    pub fn new(bounds: BoundingBox, mask: ShapeMask) -> Self {
        Self { bounds, mask }
    }
}

impl Shape for CommonShape {
    fn contains(&self, pos: BlockPosition) -> bool {
        if !self.bounds.contains(pos) {
            return false;
        }
        let BoundingBox { min, max } = self.bounds;
        let on_x = pos.x == min.x || pos.x == max.x;
        let on_y = pos.y == min.y || pos.y == max.y;
        let on_z = pos.z == min.z || pos.z == max.z;
        match self.mask {
            ShapeMask::Solid => true,
            ShapeMask::Hollow => on_x || on_y || on_z,
            ShapeMask::Walls => on_x || on_z,
        }
    }

    fn bounds(&self) -> BoundingBox {
        self.bounds
    }
}
