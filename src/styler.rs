//! The command-equivalent surface: one method per edit an actor can issue.
//!
//! [`WorldStyler`] owns the per-actor sessions and the task runner. It
//! enforces one in-flight edit per actor and delivers every completion
//! callback on the thread that calls into it, which must be the thread
//! owning the world.

use crate::block_position::BlockPosition;
use crate::block_state::{BlockPattern, BlockState};
use crate::building::{EditOperation, RegionShape, ShapeMask};
use crate::clipboard::{Clipboard, PasteAlignment};
use crate::config::StylerConfig;
use crate::error::{EditError, Result};
use crate::formats::{list_schematics, schematic_path, Schematic, SchematicEntry};
use crate::selection::SelectionSlot;
use crate::session::{ActorId, SessionRegistry};
use crate::task::{Job, Submission, TaskCompletion, TaskId, TaskResult, TaskRunner};
use crate::world::World;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Receives the outcome of an accepted edit, exactly once.
pub type EditCallback = Box<dyn FnOnce(Result<TaskResult>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteOptions {
    pub include_air: bool,
    pub alignment: PasteAlignment,
}

impl Default for PasteOptions {
    fn default() -> Self {
        Self {
            include_air: true,
            alignment: PasteAlignment::Corner,
        }
    }
}

impl PasteOptions {
    pub fn no_air() -> Self {
        Self {
            include_air: false,
            ..Self::default()
        }
    }
}

pub struct WorldStyler {
    config: StylerConfig,
    sessions: SessionRegistry,
    runner: TaskRunner,
    callbacks: FxHashMap<TaskId, EditCallback>,
}

impl WorldStyler {
    pub fn new(config: StylerConfig) -> Result<Self> {
        let runner = TaskRunner::from_config(&config)?;
        Ok(Self {
            config,
            sessions: SessionRegistry::new(),
            runner,
            callbacks: FxHashMap::default(),
        })
    }

    pub fn config(&self) -> &StylerConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionRegistry {
        &mut self.sessions
    }

    pub fn select_position(&mut self, actor: ActorId, slot: SelectionSlot, pos: BlockPosition) {
        self.sessions.session_mut(actor).selection.set_position(slot, pos);
    }

    /// Drops the actor's selection and clipboard. An edit still in flight
    /// keeps the actor busy until it reports; a pending copy is discarded
    /// rather than landing in a later session.
    pub fn end_session(&mut self, actor: ActorId) {
        self.sessions.end_session(actor);
    }

    pub fn copy<W, F>(&mut self, world: &mut W, actor: ActorId, anchor: BlockPosition, callback: F) -> Result<()>
    where
        W: World + ?Sized,
        F: FnOnce(Result<TaskResult>) + 'static,
    {
        self.ensure_idle(actor)?;
        let shape = self.selected_shape(actor, ShapeMask::Solid)?;
        self.dispatch(world, actor, Job::Edit(EditOperation::Copy { shape, anchor }), callback)
    }

    pub fn paste<W, F>(
        &mut self,
        world: &mut W,
        actor: ActorId,
        anchor: BlockPosition,
        options: PasteOptions,
        callback: F,
    ) -> Result<()>
    where
        W: World + ?Sized,
        F: FnOnce(Result<TaskResult>) + 'static,
    {
        self.ensure_idle(actor)?;
        let clipboard = self
            .sessions
            .session_mut(actor)
            .clipboard()
            .cloned()
            .ok_or(EditError::EmptyClipboard)?;
        let base = clipboard.placement(anchor, options.alignment);
        let op = EditOperation::Paste {
            clipboard,
            base,
            include_air: options.include_air,
        };
        self.dispatch(world, actor, Job::Edit(op), callback)
    }

    /// Pastes the clipboard `repetitions` times, each copy shifted by one
    /// clipboard extent along `direction` from `anchor`. The region at
    /// `anchor` itself is not written.
    #[allow(clippy::too_many_arguments)]
    pub fn stack<W, F>(
        &mut self,
        world: &mut W,
        actor: ActorId,
        anchor: BlockPosition,
        direction: BlockPosition,
        repetitions: i64,
        include_air: bool,
        callback: F,
    ) -> Result<()>
    where
        W: World + ?Sized,
        F: FnOnce(Result<TaskResult>) + 'static,
    {
        self.ensure_idle(actor)?;
        let repetitions = u32::try_from(repetitions)
            .ok()
            .filter(|r| *r > 0)
            .ok_or_else(|| EditError::invalid(format!("repetitions {} (expected a positive count)", repetitions)))?;
        let clipboard = self
            .sessions
            .session_mut(actor)
            .clipboard()
            .cloned()
            .ok_or(EditError::EmptyClipboard)?;
        let op = EditOperation::Stack {
            clipboard,
            base: anchor,
            direction,
            repetitions,
            include_air,
        };
        self.dispatch(world, actor, Job::Edit(op), callback)
    }

    pub fn set<W, F>(&mut self, world: &mut W, actor: ActorId, block: BlockState, callback: F) -> Result<()>
    where
        W: World + ?Sized,
        F: FnOnce(Result<TaskResult>) + 'static,
    {
        self.set_with_mask(world, actor, ShapeMask::Solid, block, callback)
    }

    /// Like [`WorldStyler::set`], restricted to the blocks `mask` keeps.
    pub fn set_with_mask<W, F>(
        &mut self,
        world: &mut W,
        actor: ActorId,
        mask: ShapeMask,
        block: BlockState,
        callback: F,
    ) -> Result<()>
    where
        W: World + ?Sized,
        F: FnOnce(Result<TaskResult>) + 'static,
    {
        self.ensure_idle(actor)?;
        let shape = self.selected_shape(actor, mask)?;
        self.dispatch(world, actor, Job::Edit(EditOperation::Set { shape, block }), callback)
    }

    pub fn replace<W, F>(
        &mut self,
        world: &mut W,
        actor: ActorId,
        from: BlockPattern,
        to: BlockState,
        callback: F,
    ) -> Result<()>
    where
        W: World + ?Sized,
        F: FnOnce(Result<TaskResult>) + 'static,
    {
        self.ensure_idle(actor)?;
        let shape = self.selected_shape(actor, ShapeMask::Solid)?;
        self.dispatch(world, actor, Job::Edit(EditOperation::Replace { shape, from, to }), callback)
    }

    pub fn list_schematics(&self) -> Result<Vec<SchematicEntry>> {
        list_schematics(&self.config.schematic_dir)
    }

    /// Pastes `<schematic-dir>/<name>.schematic` at `anchor`. In asynchronous
    /// mode the file is also read and decoded on the worker.
    pub fn paste_schematic<W, F>(
        &mut self,
        world: &mut W,
        actor: ActorId,
        name: &str,
        anchor: BlockPosition,
        callback: F,
    ) -> Result<()>
    where
        W: World + ?Sized,
        F: FnOnce(Result<TaskResult>) + 'static,
    {
        self.ensure_idle(actor)?;
        let schematic = Schematic::open(&self.config.schematic_dir, name)?;
        let job = Job::SchematicPaste {
            schematic,
            anchor,
            include_air: true,
            alignment: PasteAlignment::Corner,
        };
        self.dispatch(world, actor, job, callback)
    }

    /// Writes the actor's clipboard to `<schematic-dir>/<name>.schematic`.
    pub fn save_schematic(&self, actor: ActorId, name: &str) -> Result<PathBuf> {
        let path = schematic_path(&self.config.schematic_dir, name)?;
        let clipboard = self
            .sessions
            .get(actor)
            .and_then(|s| s.clipboard())
            .ok_or(EditError::EmptyClipboard)?;
        std::fs::create_dir_all(&self.config.schematic_dir)?;
        clipboard.save_schematic(&path)?;
        debug!(actor = actor.0, path = %path.display(), "saved clipboard");
        Ok(path)
    }

    pub fn is_busy(&self, actor: ActorId) -> bool {
        self.sessions.is_busy(actor)
    }

    /// Applies finished worker output and fires callbacks. Call once per
    /// simulation tick from the thread that owns `world`.
    pub fn tick<W: World + ?Sized>(&mut self, world: &mut W) -> usize {
        let completions = self.runner.poll(world);
        let count = completions.len();
        for completion in completions {
            self.complete_pending(completion);
        }
        count
    }

    /// Blocks until all in-flight edits have finished or `timeout` passes.
    pub fn flush<W: World + ?Sized>(&mut self, world: &mut W, timeout: Duration) -> usize {
        let completions = self.runner.wait(world, timeout);
        let count = completions.len();
        for completion in completions {
            self.complete_pending(completion);
        }
        count
    }

    fn ensure_idle(&self, actor: ActorId) -> Result<()> {
        if self.sessions.is_busy(actor) {
            return Err(EditError::OperationInProgress);
        }
        Ok(())
    }

    fn selected_shape(&mut self, actor: ActorId, mask: ShapeMask) -> Result<RegionShape> {
        let selection = &self.sessions.session_mut(actor).selection;
        match mask {
            ShapeMask::Solid => RegionShape::from_selection(selection),
            mask => RegionShape::from_selection_masked(selection, mask),
        }
    }

    fn dispatch<W, F>(&mut self, world: &mut W, actor: ActorId, job: Job, callback: F) -> Result<()>
    where
        W: World + ?Sized,
        F: FnOnce(Result<TaskResult>) + 'static,
    {
        self.ensure_idle(actor)?;
        match self.runner.submit(actor, job, world)? {
            Submission::Completed(completion) => {
                let TaskCompletion {
                    actor,
                    outcome,
                    clipboard,
                    ..
                } = completion;
                self.install(actor, clipboard);
                callback(outcome);
            }
            Submission::Pending(id) => {
                self.sessions.begin(actor, id);
                self.callbacks.insert(id, Box::new(callback));
            }
        }
        Ok(())
    }

    fn complete_pending(&mut self, completion: TaskCompletion) {
        let TaskCompletion {
            id,
            actor,
            outcome,
            clipboard,
            ..
        } = completion;
        let attached = self.sessions.finish(actor, id);
        if attached && outcome.is_ok() {
            self.install(actor, clipboard);
        } else if !attached {
            debug!(task = id, actor = actor.0, "session ended before edit completed");
        }
        if let Some(callback) = self.callbacks.remove(&id) {
            callback(outcome);
        }
    }

    fn install(&mut self, actor: ActorId, clipboard: Option<Clipboard>) {
        if let (Some(clipboard), Some(session)) = (clipboard, self.sessions.get_mut(actor)) {
            session.set_clipboard(clipboard);
        }
    }
}
