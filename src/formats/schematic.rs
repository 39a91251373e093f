//! MCEdit `.schematic` codec and the load/invalidate lifecycle around it.
//!
//! Layout: gzip-compressed NBT, root compound `Schematic` with `Width`,
//! `Height`, `Length` shorts, a `Materials` format tag, `Blocks`/`Data` byte
//! arrays in (y * Length + z) * Width + x order and an optional `AddBlocks`
//! nibble array carrying the high bits of ids above 255.

use crate::block_position::BlockPosition;
use crate::block_state::BlockState;
use crate::bounding_box::BoundingBox;
use crate::clipboard::{Clipboard, ClipboardEntry, PasteAlignment};
use crate::error::{EditError, Result};
use crate::building::EditOperation;
use flate2::read::GzDecoder;
use quartz_nbt::io::Flavor;
use quartz_nbt::{NbtCompound, NbtTag};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub const SCHEMATIC_EXTENSION: &str = "schematic";

const FORMAT_TAG: &str = "Alpha";
const FORMAT_VERSION: i32 = 1;
const MAX_BLOCK_ID: u16 = 0x0FFF;

/// Gzip level used when writing schematics.
const DEFAULT_COMPRESSION: flate2::Compression = flate2::Compression::new(6);

pub fn is_schematic(data: &[u8]) -> bool {
    let mut gz = GzDecoder::new(data);
    match quartz_nbt::io::read_nbt(&mut gz, Flavor::Uncompressed) {
        Ok((root, _)) => root.get::<_, &str>("Materials").is_ok() && root.get::<_, i16>("Width").is_ok(),
        Err(_) => false,
    }
}

/// Encodes a dense clipboard. The format has no notion of an absent block,
/// so clipboards with gaps are rejected rather than filled with air.
pub fn to_schematic(clipboard: &Clipboard) -> Result<Vec<u8>> {
    if !clipboard.is_dense() {
        return Err(EditError::invalid(format!(
            "clipboard holds {} of {} blocks; only solid selections can be saved",
            clipboard.len(),
            clipboard.footprint(BlockPosition::ZERO).volume()
        )));
    }
    let size = clipboard.size();
    let (width, height, length) = (
        dimension_to_u16(size.x, "width")?,
        dimension_to_u16(size.y, "height")?,
        dimension_to_u16(size.z, "length")?,
    );
    let extent = BoundingBox::from_position_and_size(BlockPosition::ZERO, size);
    let volume = extent.volume() as usize;

    let mut blocks = vec![0i8; volume];
    let mut data = vec![0i8; volume];
    let mut add_blocks: Option<Vec<i8>> = None;

    for entry in clipboard.iter() {
        let index = extent.index_of(entry.offset).ok_or_else(|| {
            EditError::invalid(format!("clipboard offset {} outside size {}", entry.offset, size))
        })?;
        let id = entry.state.id;
        if id > MAX_BLOCK_ID {
            return Err(EditError::invalid(format!(
                "block id {} cannot be stored in a schematic",
                id
            )));
        }
        blocks[index] = (id & 0xFF) as u8 as i8;
        data[index] = entry.state.data as i8;
        if id > 0xFF {
            let add = add_blocks.get_or_insert_with(|| vec![0i8; volume.div_ceil(2)]);
            let high = ((id >> 8) & 0x0F) as u8;
            let slot = add[index >> 1] as u8;
            let packed = if index & 1 == 0 {
                (slot & 0xF0) | high
            } else {
                (slot & 0x0F) | (high << 4)
            };
            add[index >> 1] = packed as i8;
        }
    }

    let origin = clipboard.origin();
    let mut root = NbtCompound::new();
    root.insert("Width", NbtTag::Short(width as i16));
    root.insert("Height", NbtTag::Short(height as i16));
    root.insert("Length", NbtTag::Short(length as i16));
    root.insert("Materials", NbtTag::String(FORMAT_TAG.to_string()));
    root.insert("Version", NbtTag::Int(FORMAT_VERSION));
    root.insert("WEOffsetX", NbtTag::Int(origin.x));
    root.insert("WEOffsetY", NbtTag::Int(origin.y));
    root.insert("WEOffsetZ", NbtTag::Int(origin.z));
    root.insert("Blocks", NbtTag::ByteArray(blocks));
    root.insert("Data", NbtTag::ByteArray(data));
    if let Some(add) = add_blocks {
        root.insert("AddBlocks", NbtTag::ByteArray(add));
    }

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), DEFAULT_COMPRESSION);
    quartz_nbt::io::write_nbt(&mut encoder, Some("Schematic"), &root, Flavor::Uncompressed)
        .map_err(|e| EditError::corrupt(format!("failed to write NBT: {}", e)))?;
    Ok(encoder.finish()?)
}

pub fn from_schematic(data: &[u8]) -> Result<Clipboard> {
    let reader = std::io::BufReader::with_capacity(1 << 16, data);
    let mut gz = GzDecoder::new(reader);
    let (root, _) = quartz_nbt::io::read_nbt(&mut gz, Flavor::Uncompressed)
        .map_err(|e| EditError::corrupt(format!("not a gzip NBT file: {}", e)))?;

    let materials = root
        .get::<_, &str>("Materials")
        .map_err(|_| EditError::corrupt("missing Materials tag"))?;
    if materials != FORMAT_TAG {
        return Err(EditError::UnsupportedVersion(format!("materials '{}'", materials)));
    }
    match root.get::<_, i32>("Version") {
        Ok(FORMAT_VERSION) => {}
        Ok(version) => {
            return Err(EditError::UnsupportedVersion(format!("version {}", version)));
        }
        Err(_) if root.contains_key("Version") => {
            return Err(EditError::UnsupportedVersion("Version tag is not an int".to_string()));
        }
        Err(_) => {}
    }

    let width = read_dimension(&root, "Width")?;
    let height = read_dimension(&root, "Height")?;
    let length = read_dimension(&root, "Length")?;
    let size = BlockPosition::new(width as i32, height as i32, length as i32);
    let volume = width as usize * height as usize * length as usize;

    let blocks = read_byte_array(&root, "Blocks")?;
    let block_data = read_byte_array(&root, "Data")?;
    if blocks.len() != volume {
        return Err(EditError::corrupt(format!(
            "Blocks has {} entries, expected {}x{}x{} = {}",
            blocks.len(),
            width,
            height,
            length,
            volume
        )));
    }
    if block_data.len() != volume {
        return Err(EditError::corrupt(format!(
            "Data has {} entries, expected {}",
            block_data.len(),
            volume
        )));
    }
    let add_blocks = match root.get::<_, &[i8]>("AddBlocks") {
        Ok(add) if add.len() == volume.div_ceil(2) => Some(add),
        Ok(add) => {
            return Err(EditError::corrupt(format!(
                "AddBlocks has {} entries, expected {}",
                add.len(),
                volume.div_ceil(2)
            )))
        }
        Err(_) => None,
    };

    let origin = BlockPosition::new(
        root.get::<_, i32>("WEOffsetX").unwrap_or(0),
        root.get::<_, i32>("WEOffsetY").unwrap_or(0),
        root.get::<_, i32>("WEOffsetZ").unwrap_or(0),
    );

    let extent = BoundingBox::from_position_and_size(BlockPosition::ZERO, size);
    let mut entries = Vec::with_capacity(volume);
    for index in 0..volume {
        let low = blocks[index] as u8 as u16;
        let high = match add_blocks {
            Some(add) => {
                let packed = add[index >> 1] as u8;
                let nibble = if index & 1 == 0 { packed & 0x0F } else { packed >> 4 };
                (nibble as u16) << 8
            }
            None => 0,
        };
        entries.push(ClipboardEntry {
            offset: extent.position_at(index as u64),
            state: BlockState::new(high | low).with_data(block_data[index] as u8),
        });
    }

    Clipboard::from_entries(size, origin, entries)
}

fn dimension_to_u16(value: i32, axis: &str) -> Result<u16> {
    u16::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| EditError::invalid(format!("{} {} does not fit a schematic", axis, value)))
}

fn read_dimension(root: &NbtCompound, key: &str) -> Result<u16> {
    let raw = root
        .get::<_, i16>(key)
        .map_err(|_| EditError::corrupt(format!("missing {}", key)))?;
    let value = raw as u16;
    if value == 0 {
        return Err(EditError::corrupt(format!("{} is zero", key)));
    }
    Ok(value)
}

fn read_byte_array<'a>(root: &'a NbtCompound, key: &str) -> Result<&'a [i8]> {
    root.get::<_, &[i8]>(key)
        .map_err(|_| EditError::corrupt(format!("missing {} array", key)))
}

/// `<dir>/<name>.schematic` for a bare file name. Names that are empty,
/// contain a path separator or `..`, or start with `.` are rejected.
pub fn schematic_path(dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) || name.contains("..") {
        return Err(EditError::invalid(format!("invalid schematic name '{}'", name)));
    }
    Ok(dir.join(format!("{}.{}", name, SCHEMATIC_EXTENSION)))
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

/// Observable lifecycle of a [`Schematic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchematicState {
    Unloaded,
    Loaded,
    Invalidated,
}

#[derive(Debug)]
enum Buffer {
    Unloaded,
    Loaded(Arc<Clipboard>),
    Invalidated,
}

/// A schematic file on disk whose decoded blocks are held only between
/// [`Schematic::load`] and [`Schematic::invalidate`].
#[derive(Debug)]
pub struct Schematic {
    path: PathBuf,
    buffer: Buffer,
}

impl Schematic {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            buffer: Buffer::Unloaded,
        }
    }

    /// Resolves `<dir>/<name>.schematic`, failing if no such file exists.
    pub fn open(dir: &Path, name: &str) -> Result<Self> {
        let path = schematic_path(dir, name)?;
        if !path.is_file() {
            return Err(EditError::invalid(format!(
                "File \"{}\" not found.",
                path.display()
            )));
        }
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> SchematicState {
        match self.buffer {
            Buffer::Unloaded => SchematicState::Unloaded,
            Buffer::Loaded(_) => SchematicState::Loaded,
            Buffer::Invalidated => SchematicState::Invalidated,
        }
    }

    /// Reads and decodes the file. A no-op once loaded; a failed load leaves
    /// the schematic unloaded.
    pub fn load(&mut self) -> Result<()> {
        match self.buffer {
            Buffer::Loaded(_) => return Ok(()),
            Buffer::Invalidated => return Err(EditError::AlreadyInvalidated),
            Buffer::Unloaded => {}
        }
        let bytes = std::fs::read(&self.path)?;
        let clipboard = from_schematic(&bytes).inspect_err(|e| {
            warn!(path = %self.path.display(), error = %e, "rejected schematic");
        })?;
        debug!(
            path = %self.path.display(),
            size = %clipboard.size(),
            blocks = clipboard.len(),
            "loaded schematic"
        );
        self.buffer = Buffer::Loaded(Arc::new(clipboard));
        Ok(())
    }

    /// Releases the decoded blocks. The schematic cannot be loaded again.
    pub fn invalidate(&mut self) {
        if let Buffer::Loaded(_) = self.buffer {
            debug!(path = %self.path.display(), "invalidated schematic");
        }
        self.buffer = Buffer::Invalidated;
    }

    pub fn clipboard(&self) -> Result<Arc<Clipboard>> {
        match &self.buffer {
            Buffer::Loaded(clipboard) => Ok(Arc::clone(clipboard)),
            _ => Err(EditError::NotLoaded),
        }
    }

    /// Paste of the loaded blocks at `anchor`, ready to run.
    pub fn paste_operation(
        &self,
        anchor: BlockPosition,
        include_air: bool,
        alignment: PasteAlignment,
    ) -> Result<EditOperation> {
        let clipboard = self.clipboard()?;
        let base = clipboard.placement(anchor, alignment);
        Ok(EditOperation::Paste {
            clipboard,
            base,
            include_air,
        })
    }
}

impl Clipboard {
    /// Writes this clipboard to `path` as an MCEdit schematic.
    pub fn save_schematic(&self, path: &Path) -> Result<()> {
        let bytes = to_schematic(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
