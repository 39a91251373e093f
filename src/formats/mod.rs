pub mod directory;
pub mod schematic;

pub use directory::{human_size, list_schematics, SchematicEntry};
pub use schematic::{
    from_schematic, is_schematic, schematic_path, to_schematic, Schematic, SchematicState,
};
