//! Region edits expressed as resumable plans.
//!
//! A plan only reads through a [`BlockReader`] and yields chunks of writes.
//! Whoever drives the plan decides where it runs and applies the writes to
//! the world on the main context, so inline and offloaded execution share
//! one code path.

use crate::block_position::BlockPosition;
use crate::block_state::{BlockPattern, BlockState};
use crate::bounding_box::BoundingBox;
use crate::building::{RegionShape, Shape, ShapePoints};
use crate::clipboard::{Clipboard, ClipboardBuilder};
use crate::error::{EditError, Result};
use crate::world::{BlockReader, SetOutcome, World};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Set,
    Replace,
    Copy,
    Paste,
    Stack,
    SchematicPaste,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Set => "set",
            OperationKind::Replace => "replace",
            OperationKind::Copy => "copy",
            OperationKind::Paste => "paste",
            OperationKind::Stack => "stack",
            OperationKind::SchematicPaste => "schematic paste",
        };
        f.write_str(name)
    }
}

/// One bulk edit with all of its inputs resolved.
#[derive(Debug, Clone)]
pub enum EditOperation {
    Set {
        shape: RegionShape,
        block: BlockState,
    },
    Replace {
        shape: RegionShape,
        from: BlockPattern,
        to: BlockState,
    },
    Copy {
        shape: RegionShape,
        anchor: BlockPosition,
    },
    Paste {
        clipboard: Arc<Clipboard>,
        base: BlockPosition,
        include_air: bool,
    },
    Stack {
        clipboard: Arc<Clipboard>,
        base: BlockPosition,
        direction: BlockPosition,
        repetitions: u32,
        include_air: bool,
    },
}

impl EditOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            EditOperation::Set { .. } => OperationKind::Set,
            EditOperation::Replace { .. } => OperationKind::Replace,
            EditOperation::Copy { .. } => OperationKind::Copy,
            EditOperation::Paste { .. } => OperationKind::Paste,
            EditOperation::Stack { .. } => OperationKind::Stack,
        }
    }

    /// Rejects inputs that must never reach the world.
    pub fn validate(&self) -> Result<()> {
        match self {
            EditOperation::Paste { clipboard, .. } if clipboard.is_empty() => {
                Err(EditError::EmptyClipboard)
            }
            EditOperation::Stack {
                clipboard,
                base,
                direction,
                repetitions,
                ..
            } => {
                if clipboard.is_empty() {
                    return Err(EditError::EmptyClipboard);
                }
                if *repetitions == 0 {
                    return Err(EditError::invalid("repetitions must be at least 1"));
                }
                if direction.is_zero() {
                    return Err(EditError::invalid("stack direction must not be zero"));
                }
                ensure_placement_fits(clipboard, *base, *direction, 1..=*repetitions)
            }
            EditOperation::Paste { clipboard, base, .. } => {
                ensure_placement_fits(clipboard, *base, BlockPosition::ZERO, 0..=0)
            }
            _ => Ok(()),
        }
    }

    /// Box of world blocks the plan reads, if it reads any. Replace compares
    /// against the world when its writes are applied, so it reads nothing
    /// while planning.
    pub fn read_bounds(&self) -> Option<BoundingBox> {
        match self {
            EditOperation::Copy { shape, .. } => Some(shape.bounds()),
            _ => None,
        }
    }

    pub fn into_plan(self, chunk_size: usize) -> Result<EditPlan> {
        self.validate()?;
        let kind = self.kind();
        let cursor = match self {
            EditOperation::Set { shape, block } => PlanCursor::Set {
                points: shape.enumerate(),
                block,
            },
            EditOperation::Replace { shape, from, to } => PlanCursor::Replace {
                points: shape.enumerate(),
                from,
                to,
            },
            EditOperation::Copy { shape, anchor } => PlanCursor::Copy {
                points: shape.enumerate(),
                builder: ClipboardBuilder::new(shape.bounds(), anchor),
            },
            EditOperation::Paste {
                clipboard,
                base,
                include_air,
            } => PlanCursor::Paste {
                clipboard,
                base,
                direction: BlockPosition::ZERO,
                repetition: 0,
                last_repetition: 0,
                entry_index: 0,
                include_air,
            },
            EditOperation::Stack {
                clipboard,
                base,
                direction,
                repetitions,
                include_air,
            } => PlanCursor::Paste {
                clipboard,
                base,
                direction,
                repetition: 1,
                last_repetition: u64::from(repetitions),
                entry_index: 0,
                include_air,
            },
        };
        Ok(EditPlan {
            kind,
            chunk_size: chunk_size.max(1),
            cursor,
        })
    }
}

/// Writes produced by one step of a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditChunk {
    pub writes: Vec<(BlockPosition, BlockState)>,
    /// When set, a write only lands if the block it overwrites matches.
    pub guard: Option<BlockPattern>,
    /// Blocks read into a clipboard during this step.
    pub captured: u64,
}

impl EditChunk {
    /// Applies the writes to `world`, returning how many landed in bounds.
    pub fn apply<W: World + ?Sized>(&self, world: &mut W) -> u64 {
        let mut written = 0;
        for (pos, state) in &self.writes {
            if let Some(guard) = &self.guard {
                let current = world.get_block_at(*pos);
                if !pattern_matches(&*world, guard, &current) {
                    continue;
                }
            }
            if world.set_block_at(*pos, state) == SetOutcome::Written {
                written += 1;
            }
        }
        written
    }
}

#[derive(Debug)]
enum PlanCursor {
    Set {
        points: ShapePoints,
        block: BlockState,
    },
    Replace {
        points: ShapePoints,
        from: BlockPattern,
        to: BlockState,
    },
    Copy {
        points: ShapePoints,
        builder: ClipboardBuilder,
    },
    /// Copy `k` of the clipboard lands at `base + k * (direction ⊙ size)`.
    Paste {
        clipboard: Arc<Clipboard>,
        base: BlockPosition,
        direction: BlockPosition,
        repetition: u64,
        last_repetition: u64,
        entry_index: usize,
        include_air: bool,
    },
}

/// Resumable cursor over one [`EditOperation`].
#[derive(Debug)]
pub struct EditPlan {
    kind: OperationKind,
    chunk_size: usize,
    cursor: PlanCursor,
}

impl EditPlan {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Visits up to `chunk_size` coordinates. Returns `None` once the plan is
    /// exhausted.
    pub fn next_chunk<R: BlockReader + ?Sized>(&mut self, reader: &R) -> Option<EditChunk> {
        let limit = self.chunk_size;
        let mut chunk = EditChunk::default();
        let mut visited = 0usize;

        match &mut self.cursor {
            PlanCursor::Set { points, block } => {
                for pos in points.by_ref().take(limit) {
                    chunk.writes.push((pos, *block));
                    visited += 1;
                }
            }
            PlanCursor::Replace { points, from, to } => {
                chunk.guard = Some(*from);
                for pos in points.by_ref().take(limit) {
                    chunk.writes.push((pos, *to));
                    visited += 1;
                }
            }
            PlanCursor::Copy { points, builder } => {
                for pos in points.by_ref().take(limit) {
                    builder.push(pos, reader.get_block_at(pos));
                    visited += 1;
                }
                chunk.captured = visited as u64;
            }
            PlanCursor::Paste {
                clipboard,
                base,
                direction,
                repetition,
                last_repetition,
                entry_index,
                include_air,
            } => {
                let entries = clipboard.entries();
                let size = clipboard.size();
                while visited < limit && *repetition <= *last_repetition && !entries.is_empty() {
                    let entry = entries[*entry_index];
                    if *include_air || !entry.state.is_air() {
                        if let Some(pos) = displaced(*base, *direction, size, *repetition, entry.offset) {
                            chunk.writes.push((pos, entry.state));
                        }
                    }
                    visited += 1;
                    *entry_index += 1;
                    if *entry_index == entries.len() {
                        *entry_index = 0;
                        *repetition += 1;
                    }
                }
            }
        }

        if visited == 0 {
            None
        } else {
            Some(chunk)
        }
    }

    /// Consumes the plan; copy plans yield the captured clipboard.
    pub fn finish(self) -> Option<Clipboard> {
        match self.cursor {
            PlanCursor::Copy { builder, .. } => Some(builder.finish()),
            _ => None,
        }
    }
}

/// `base + k * (direction ⊙ size) + offset`, or `None` if any axis leaves
/// the `i32` range.
fn displaced(
    base: BlockPosition,
    direction: BlockPosition,
    size: BlockPosition,
    k: u64,
    offset: BlockPosition,
) -> Option<BlockPosition> {
    let axis = |base: i32, direction: i32, size: i32, offset: i32| -> Option<i32> {
        let step = i64::from(direction).checked_mul(i64::from(size))?;
        let shift = step.checked_mul(i64::try_from(k).ok()?)?;
        let value = i64::from(base).checked_add(shift)?.checked_add(i64::from(offset))?;
        i32::try_from(value).ok()
    };
    Some(BlockPosition::new(
        axis(base.x, direction.x, size.x, offset.x)?,
        axis(base.y, direction.y, size.y, offset.y)?,
        axis(base.z, direction.z, size.z, offset.z)?,
    ))
}

/// Every block of every copy in `repetitions` must have a representable
/// position. Placement is linear in both `k` and the offset, so checking
/// the extreme corners of the first and last copy covers the rest.
fn ensure_placement_fits(
    clipboard: &Clipboard,
    base: BlockPosition,
    direction: BlockPosition,
    repetitions: std::ops::RangeInclusive<u32>,
) -> Result<()> {
    let far = clipboard.size() - BlockPosition::new(1, 1, 1);
    for k in [*repetitions.start(), *repetitions.end()] {
        for offset in [BlockPosition::ZERO, far] {
            if displaced(base, direction, clipboard.size(), u64::from(k), offset).is_none() {
                return Err(EditError::invalid(format!(
                    "{} copies along {} from {} leave the coordinate range",
                    repetitions.end(),
                    direction,
                    base
                )));
            }
        }
    }
    Ok(())
}

fn pattern_matches<R: BlockReader + ?Sized>(
    reader: &R,
    pattern: &BlockPattern,
    current: &BlockState,
) -> bool {
    match pattern.as_state() {
        Some(exact) => reader.block_equals(current, &exact),
        None => current.id == pattern.id,
    }
}

/// Runs a plan to completion against `world` on the calling thread.
/// Returns the changed count and, for copies, the clipboard.
pub fn run_inline<W: World + ?Sized>(mut plan: EditPlan, world: &mut W) -> (u64, Option<Clipboard>) {
    let mut changed = 0u64;
    while let Some(chunk) = plan.next_chunk(&*world) {
        changed += chunk.captured + chunk.apply(world);
    }
    (changed, plan.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::{CommonShape, Cuboid, ShapeMask};
    use crate::clipboard::ClipboardEntry;
    use crate::world::MemoryWorld;

    const STONE: BlockState = BlockState::new(1);
    const DIRT: BlockState = BlockState::new(3);

    fn cuboid(a: (i32, i32, i32), b: (i32, i32, i32)) -> RegionShape {
        RegionShape::Cuboid(Cuboid::new(a.into(), b.into()))
    }

    #[test]
    fn test_set_counts_only_in_bounds_writes() {
        let mut world = MemoryWorld::with_radius(8);
        // y = -1 is below the world
        let plan = EditOperation::Set {
            shape: cuboid((0, -1, 0), (1, 0, 1)),
            block: STONE,
        }
        .into_plan(3)
        .unwrap();
        let (changed, clipboard) = run_inline(plan, &mut world);
        assert_eq!(changed, 4);
        assert!(clipboard.is_none());
        assert_eq!(world.get_block_at(BlockPosition::new(1, 0, 1)), STONE);
    }

    #[test]
    fn test_replace_respects_data_pattern() {
        let mut world = MemoryWorld::with_radius(8);
        world.set_block_at(BlockPosition::new(0, 0, 0), &BlockState::new(35).with_data(1));
        world.set_block_at(BlockPosition::new(1, 0, 0), &BlockState::new(35).with_data(2));
        world.set_block_at(BlockPosition::new(2, 0, 0), &STONE);

        let exact = EditOperation::Replace {
            shape: cuboid((0, 0, 0), (2, 0, 0)),
            from: "wool:1".parse().unwrap(),
            to: DIRT,
        };
        assert_eq!(run_inline(exact.into_plan(16).unwrap(), &mut world).0, 1);

        let any = EditOperation::Replace {
            shape: cuboid((0, 0, 0), (2, 0, 0)),
            from: "wool".parse().unwrap(),
            to: DIRT,
        };
        assert_eq!(run_inline(any.into_plan(16).unwrap(), &mut world).0, 1);
        assert_eq!(world.get_block_at(BlockPosition::new(2, 0, 0)), STONE);
    }

    #[test]
    fn test_copy_counts_captured_blocks() {
        let mut world = MemoryWorld::with_radius(8);
        let plan = EditOperation::Copy {
            shape: cuboid((0, 0, 0), (2, 1, 1)),
            anchor: BlockPosition::ZERO,
        }
        .into_plan(5)
        .unwrap();
        let (changed, clipboard) = run_inline(plan, &mut world);
        assert_eq!(changed, 12);
        assert_eq!(clipboard.unwrap().len(), 12);
    }

    #[test]
    fn test_masked_set_leaves_interior() {
        let mut world = MemoryWorld::with_radius(8);
        let bounds = BoundingBox::new((0, 0, 0).into(), (2, 2, 2).into());
        let plan = EditOperation::Set {
            shape: RegionShape::Common(CommonShape::new(bounds, ShapeMask::Walls)),
            block: STONE,
        }
        .into_plan(4)
        .unwrap();
        assert_eq!(run_inline(plan, &mut world).0, 24);
        assert_eq!(world.get_block_at(BlockPosition::new(1, 1, 1)), BlockState::AIR);
        assert_eq!(world.get_block_at(BlockPosition::new(1, 0, 1)), BlockState::AIR);
    }

    #[test]
    fn test_stack_bases_step_by_extent() {
        let mut world = MemoryWorld::with_radius(32);
        world.set_block_at(BlockPosition::new(0, 0, 0), &STONE);
        world.set_block_at(BlockPosition::new(1, 0, 0), &DIRT);
        let clipboard = Clipboard::capture(&cuboid((0, 0, 0), (1, 0, 0)), BlockPosition::ZERO, &world);

        let plan = EditOperation::Stack {
            clipboard: Arc::new(clipboard),
            base: BlockPosition::ZERO,
            direction: BlockPosition::new(-1, 0, 0),
            repetitions: 2,
            include_air: true,
        }
        .into_plan(3)
        .unwrap();
        assert_eq!(run_inline(plan, &mut world).0, 4);
        assert_eq!(world.get_block_at(BlockPosition::new(-2, 0, 0)), STONE);
        assert_eq!(world.get_block_at(BlockPosition::new(-1, 0, 0)), DIRT);
        assert_eq!(world.get_block_at(BlockPosition::new(-4, 0, 0)), STONE);
        assert_eq!(world.get_block_at(BlockPosition::new(-3, 0, 0)), DIRT);
    }

    #[test]
    fn test_validation_happens_before_planning() {
        let empty = Clipboard::from_entries(BlockPosition::new(1, 1, 1), BlockPosition::ZERO, vec![])
            .unwrap();
        let paste = EditOperation::Paste {
            clipboard: Arc::new(empty),
            base: BlockPosition::ZERO,
            include_air: true,
        };
        assert!(matches!(paste.into_plan(8), Err(EditError::EmptyClipboard)));

        let mut world = MemoryWorld::with_radius(4);
        world.set_block_at(BlockPosition::ZERO, &STONE);
        let full = Clipboard::capture(&cuboid((0, 0, 0), (0, 0, 0)), BlockPosition::ZERO, &world);
        let stack = EditOperation::Stack {
            clipboard: Arc::new(full.clone()),
            base: BlockPosition::ZERO,
            direction: BlockPosition::new(1, 0, 0),
            repetitions: 0,
            include_air: true,
        };
        assert!(matches!(stack.into_plan(8), Err(EditError::InvalidArgument(_))));

        let still = EditOperation::Stack {
            clipboard: Arc::new(full),
            base: BlockPosition::ZERO,
            direction: BlockPosition::ZERO,
            repetitions: 2,
            include_air: true,
        };
        assert!(matches!(still.into_plan(8), Err(EditError::InvalidArgument(_))));
    }

    fn row_clipboard(width: i32) -> Arc<Clipboard> {
        let entries = vec![ClipboardEntry {
            offset: BlockPosition::ZERO,
            state: STONE,
        }];
        Arc::new(Clipboard::from_entries(BlockPosition::new(width, 1, 1), BlockPosition::ZERO, entries).unwrap())
    }

    fn stack_along_x(clipboard: Arc<Clipboard>, base: BlockPosition, repetitions: u32) -> EditOperation {
        EditOperation::Stack {
            clipboard,
            base,
            direction: BlockPosition::new(1, 0, 0),
            repetitions,
            include_air: true,
        }
    }

    #[test]
    fn test_stack_rejects_copies_past_coordinate_range() {
        let wide = stack_along_x(row_clipboard(1000), BlockPosition::ZERO, 3_000_000);
        assert!(matches!(wide.validate(), Err(EditError::InvalidArgument(_))));

        let many = stack_along_x(row_clipboard(1), BlockPosition::ZERO, 3_000_000_000);
        assert!(matches!(many.into_plan(8), Err(EditError::InvalidArgument(_))));

        let backwards = EditOperation::Stack {
            clipboard: row_clipboard(2),
            base: BlockPosition::new(i32::MIN + 3, 0, 0),
            direction: BlockPosition::new(-1, 0, 0),
            repetitions: 2,
            include_air: true,
        };
        assert!(matches!(backwards.validate(), Err(EditError::InvalidArgument(_))));
    }

    #[test]
    fn test_stack_reaches_last_representable_column() {
        let edge = BlockPosition::new(i32::MAX - 3, 0, 0);
        assert!(stack_along_x(row_clipboard(1), edge, 3).validate().is_ok());
        assert!(matches!(
            stack_along_x(row_clipboard(1), edge, 4).validate(),
            Err(EditError::InvalidArgument(_))
        ));

        let mut plan = stack_along_x(row_clipboard(1), edge, 3).into_plan(2).unwrap();
        let mut written = Vec::new();
        while let Some(chunk) = plan.next_chunk(&MemoryWorld::with_radius(1)) {
            written.extend(chunk.writes.into_iter().map(|(pos, _)| pos.x));
        }
        assert_eq!(written, vec![i32::MAX - 2, i32::MAX - 1, i32::MAX]);
    }

    #[test]
    fn test_paste_near_range_edge_is_rejected() {
        let paste = EditOperation::Paste {
            clipboard: row_clipboard(4),
            base: BlockPosition::new(i32::MAX - 1, 0, 0),
            include_air: true,
        };
        assert!(matches!(paste.validate(), Err(EditError::InvalidArgument(_))));
    }

    struct IdOnlyWorld(MemoryWorld);

    impl BlockReader for IdOnlyWorld {
        fn get_block_at(&self, pos: BlockPosition) -> BlockState {
            self.0.get_block_at(pos)
        }

        fn block_equals(&self, a: &BlockState, b: &BlockState) -> bool {
            a.id == b.id
        }
    }

    impl World for IdOnlyWorld {
        fn set_block_at(&mut self, pos: BlockPosition, state: &BlockState) -> SetOutcome {
            self.0.set_block_at(pos, state)
        }
    }

    #[test]
    fn test_replace_guard_uses_world_equality() {
        let mut world = IdOnlyWorld(MemoryWorld::with_radius(4));
        world.set_block_at(BlockPosition::ZERO, &BlockState::new(35).with_data(3));

        let mut plan = EditOperation::Replace {
            shape: cuboid((0, 0, 0), (1, 0, 0)),
            from: "wool:1".parse().unwrap(),
            to: STONE,
        }
        .into_plan(8)
        .unwrap();
        // planning reads nothing; the comparison happens on apply
        let chunk = plan.next_chunk(&MemoryWorld::with_radius(1)).unwrap();
        assert_eq!(chunk.writes.len(), 2);
        assert_eq!(chunk.apply(&mut world), 1);
        assert_eq!(world.get_block_at(BlockPosition::ZERO), STONE);
        assert_eq!(world.get_block_at(BlockPosition::new(1, 0, 0)), BlockState::AIR);
    }
}
