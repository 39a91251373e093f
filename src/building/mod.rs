pub mod enums;
pub mod operations;
pub mod shapes;

pub use enums::{RegionShape, ShapePoints};
pub use operations::{EditChunk, EditOperation, EditPlan};
pub use shapes::*;
