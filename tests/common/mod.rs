#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use worldstyler::{
    ActorId, BlockPosition, BlockReader, BlockState, BoundingBox, EditError, MemoryWorld,
    SelectionSlot, SetOutcome, StylerConfig, TaskResult, World, WorldStyler,
};

pub const STONE: BlockState = BlockState::new(1);
pub const DIRT: BlockState = BlockState::new(3);
pub const GLASS: BlockState = BlockState::new(20);
pub const ACTOR: ActorId = ActorId(42);

pub type Outcomes = Rc<RefCell<Vec<Result<TaskResult, EditError>>>>;

/// Collects callback outcomes for later assertions.
pub fn recorder() -> Outcomes {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn record(outcomes: &Outcomes) -> impl FnOnce(Result<TaskResult, EditError>) + 'static {
    let outcomes = Rc::clone(outcomes);
    move |outcome| outcomes.borrow_mut().push(outcome)
}

pub fn last_changed(outcomes: &Outcomes) -> u64 {
    outcomes
        .borrow()
        .last()
        .expect("no callback fired")
        .as_ref()
        .expect("operation failed")
        .changed
}

pub fn styler(config: StylerConfig) -> WorldStyler {
    worldstyler::logging::init_test_logging();
    WorldStyler::new(config).unwrap()
}

pub fn sync_styler() -> WorldStyler {
    styler(StylerConfig::default())
}

pub fn async_styler() -> WorldStyler {
    styler(StylerConfig {
        use_async_tasks: true,
        chunk_size: 7,
        worker_threads: 2,
        ..StylerConfig::default()
    })
}

pub fn select(styler: &mut WorldStyler, a: (i32, i32, i32), b: (i32, i32, i32)) {
    styler.select_position(ACTOR, SelectionSlot::First, a.into());
    styler.select_position(ACTOR, SelectionSlot::Second, b.into());
}

/// Deterministic mix of stone, dirt, glass and air.
pub fn patterned_world(bounds: BoundingBox) -> MemoryWorld {
    let mut world = MemoryWorld::with_radius(64);
    for index in 0..bounds.volume() {
        let pos = bounds.position_at(index);
        let state = match (pos.x * 7 + pos.y * 3 + pos.z * 5).rem_euclid(4) {
            0 => STONE,
            1 => DIRT,
            2 => GLASS.with_data((index % 4) as u8),
            _ => BlockState::AIR,
        };
        world.set_block_at(pos, &state);
    }
    world
}

/// Wraps a world and remembers every coordinate written.
pub struct RecordingWorld {
    pub inner: MemoryWorld,
    pub writes: Vec<BlockPosition>,
}

impl RecordingWorld {
    pub fn new(inner: MemoryWorld) -> Self {
        Self {
            inner,
            writes: Vec::new(),
        }
    }
}

impl BlockReader for RecordingWorld {
    fn get_block_at(&self, pos: BlockPosition) -> BlockState {
        self.inner.get_block_at(pos)
    }
}

impl World for RecordingWorld {
    fn set_block_at(&mut self, pos: BlockPosition, state: &BlockState) -> SetOutcome {
        self.writes.push(pos);
        self.inner.set_block_at(pos, state)
    }
}
