//! Region-edit engine for voxel worlds.
//!
//! An actor marks two corners ([`Selection`]), the corners become a
//! [`RegionShape`], and bulk edits (set, replace, copy, paste, stack,
//! schematic import) run over the shape's coordinates either inline or on a
//! worker pool ([`TaskRunner`]). [`WorldStyler`] ties these together behind
//! one method per edit.

pub mod block_position;
pub mod block_state;
pub mod bounding_box;
pub mod building;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod formats;
pub mod logging;
pub mod selection;
pub mod session;
pub mod styler;
pub mod task;
pub mod world;

pub use block_position::{facing_to_step, BlockPosition};
pub use block_state::{BlockPattern, BlockState};
pub use bounding_box::BoundingBox;
pub use building::{CommonShape, Cuboid, EditOperation, RegionShape, Shape, ShapeMask};
pub use clipboard::{Clipboard, ClipboardEntry, PasteAlignment};
pub use config::StylerConfig;
pub use error::{EditError, Result};
pub use formats::{Schematic, SchematicEntry, SchematicState};
pub use selection::{Selection, SelectionSlot};
pub use session::{ActorId, ActorSession, SessionRegistry};
pub use styler::{EditCallback, PasteOptions, WorldStyler};
pub use task::{ExecutionMode, TaskResult, TaskRunner};
pub use world::{BlockReader, MemoryWorld, SetOutcome, World, WorldSnapshot};
