//! Scheduling of edit plans: inline on the caller, or on a worker pool with
//! writes marshalled back to the main context.
//!
//! Both modes drive the same [`EditPlan`]; the asynchronous mode only moves
//! the planning loop onto a worker, reading from a
//! [`WorldSnapshot`](crate::world::WorldSnapshot) taken on
//! the main context. Writes always land in [`TaskRunner::poll`] (or
//! [`TaskRunner::wait`]), which the host calls from the thread owning the
//! world.

use crate::block_position::BlockPosition;
use crate::block_state::BlockState;
use crate::building::operations::{run_inline, OperationKind};
use crate::building::{EditChunk, EditOperation, EditPlan};
use crate::clipboard::{Clipboard, PasteAlignment};
use crate::config::StylerConfig;
use crate::error::{EditError, Result};
use crate::formats::Schematic;
use crate::session::ActorId;
use crate::world::{BlockReader, World};
use rustc_hash::FxHashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Synchronous,
    Asynchronous,
}

/// Totals reported once per operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskResult {
    pub elapsed: Duration,
    pub changed: u64,
}

impl TaskResult {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

pub type TaskId = u64;

/// Work handed to the runner.
#[derive(Debug)]
pub enum Job {
    Edit(EditOperation),
    /// Loads the schematic as part of the job, pastes it and invalidates it.
    SchematicPaste {
        schematic: Schematic,
        anchor: BlockPosition,
        include_air: bool,
        alignment: PasteAlignment,
    },
}

impl Job {
    pub fn kind(&self) -> OperationKind {
        match self {
            Job::Edit(op) => op.kind(),
            Job::SchematicPaste { .. } => OperationKind::SchematicPaste,
        }
    }
}

/// A finished operation, ready to be reported on the main context.
#[derive(Debug)]
pub struct TaskCompletion {
    pub id: TaskId,
    pub actor: ActorId,
    pub kind: OperationKind,
    pub outcome: Result<TaskResult>,
    /// Set for copy operations.
    pub clipboard: Option<Clipboard>,
}

/// What [`TaskRunner::submit`] did with a job.
#[derive(Debug)]
pub enum Submission {
    Completed(TaskCompletion),
    Pending(TaskId),
}

enum WorkerMessage {
    Chunk { id: TaskId, chunk: EditChunk },
    Done { id: TaskId, clipboard: Option<Clipboard> },
    Failed { id: TaskId, error: EditError },
}

struct PendingTask {
    actor: ActorId,
    kind: OperationKind,
    started: Instant,
    changed: u64,
}

/// Reader for plans that never look at the world.
struct AirReader;

impl BlockReader for AirReader {
    fn get_block_at(&self, _pos: BlockPosition) -> BlockState {
        BlockState::AIR
    }
}

pub struct TaskRunner {
    mode: ExecutionMode,
    chunk_size: usize,
    pool: Option<rayon::ThreadPool>,
    sender: Sender<WorkerMessage>,
    receiver: Receiver<WorkerMessage>,
    pending: FxHashMap<TaskId, PendingTask>,
    next_id: TaskId,
}

impl TaskRunner {
    pub fn new(mode: ExecutionMode, chunk_size: usize, worker_threads: usize) -> Result<Self> {
        let pool = match mode {
            ExecutionMode::Synchronous => None,
            ExecutionMode::Asynchronous => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(worker_threads.max(1))
                    .thread_name(|i| format!("worldstyler-worker-{}", i))
                    .build()
                    .map_err(|e| EditError::invalid(format!("worker pool: {}", e)))?,
            ),
        };
        let (sender, receiver) = mpsc::channel();
        Ok(Self {
            mode,
            chunk_size: chunk_size.max(1),
            pool,
            sender,
            receiver,
            pending: FxHashMap::default(),
            next_id: 0,
        })
    }

    pub fn from_config(config: &StylerConfig) -> Result<Self> {
        Self::new(config.execution_mode(), config.chunk_size, config.worker_threads)
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Validates and schedules `job`. Validation errors are returned before
    /// the world is touched; once accepted, the job always produces exactly
    /// one completion.
    pub fn submit<W: World + ?Sized>(
        &mut self,
        actor: ActorId,
        job: Job,
        world: &mut W,
    ) -> Result<Submission> {
        let id = self.next_id;
        self.next_id += 1;
        let kind = job.kind();
        debug!(task = id, actor = actor.0, %kind, mode = ?self.mode, "submitting edit");

        match self.mode {
            ExecutionMode::Synchronous => self.run_sync(id, actor, job, world).map(Submission::Completed),
            ExecutionMode::Asynchronous => {
                self.spawn(id, actor, job, world)?;
                Ok(Submission::Pending(id))
            }
        }
    }

    fn run_sync<W: World + ?Sized>(
        &mut self,
        id: TaskId,
        actor: ActorId,
        job: Job,
        world: &mut W,
    ) -> Result<TaskCompletion> {
        let started = Instant::now();
        let kind = job.kind();
        let (changed, clipboard) = match job {
            Job::Edit(op) => run_inline(op.into_plan(self.chunk_size)?, world),
            Job::SchematicPaste {
                mut schematic,
                anchor,
                include_air,
                alignment,
            } => {
                schematic.load()?;
                let plan = schematic
                    .paste_operation(anchor, include_air, alignment)
                    .and_then(|op| op.into_plan(self.chunk_size));
                schematic.invalidate();
                run_inline(plan?, world)
            }
        };
        let result = TaskResult {
            elapsed: started.elapsed(),
            changed,
        };
        log_completion(id, kind, &result);
        Ok(TaskCompletion {
            id,
            actor,
            kind,
            outcome: Ok(result),
            clipboard,
        })
    }

    fn spawn<W: World + ?Sized>(
        &mut self,
        id: TaskId,
        actor: ActorId,
        job: Job,
        world: &W,
    ) -> Result<()> {
        let kind = job.kind();
        let chunk_size = self.chunk_size;
        let sender = self.sender.clone();
        let pool = self
            .pool
            .as_ref()
            .ok_or_else(|| EditError::invalid("no worker pool in asynchronous mode"))?;

        match job {
            Job::Edit(op) => {
                op.validate()?;
                let snapshot = op.read_bounds().map(|bounds| world.snapshot(bounds));
                let plan = op.into_plan(chunk_size)?;
                pool.spawn(move || {
                    let reader: &dyn BlockReader = match &snapshot {
                        Some(snapshot) => snapshot,
                        None => &AirReader,
                    };
                    stream_plan(id, plan, reader, &sender);
                });
            }
            Job::SchematicPaste {
                mut schematic,
                anchor,
                include_air,
                alignment,
            } => {
                pool.spawn(move || {
                    let plan = schematic
                        .load()
                        .and_then(|_| schematic.paste_operation(anchor, include_air, alignment))
                        .and_then(|op| op.into_plan(chunk_size));
                    schematic.invalidate();
                    match plan {
                        Ok(plan) => stream_plan(id, plan, &AirReader, &sender),
                        Err(error) => {
                            let _ = sender.send(WorkerMessage::Failed { id, error });
                        }
                    }
                });
            }
        }

        self.pending.insert(
            id,
            PendingTask {
                actor,
                kind,
                started: Instant::now(),
                changed: 0,
            },
        );
        Ok(())
    }

    /// Applies whatever workers have produced so far. Never blocks.
    pub fn poll<W: World + ?Sized>(&mut self, world: &mut W) -> Vec<TaskCompletion> {
        let mut completed = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            if let Some(completion) = self.handle(message, world) {
                completed.push(completion);
            }
        }
        completed
    }

    /// Blocks until every pending task has completed or `timeout` elapses.
    pub fn wait<W: World + ?Sized>(&mut self, world: &mut W, timeout: Duration) -> Vec<TaskCompletion> {
        let deadline = Instant::now() + timeout;
        let mut completed = Vec::new();
        while !self.pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(message) => {
                    if let Some(completion) = self.handle(message, world) {
                        completed.push(completion);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    warn!(pending = self.pending.len(), "timed out waiting for edits");
                    break;
                }
            }
        }
        completed
    }

    fn handle<W: World + ?Sized>(&mut self, message: WorkerMessage, world: &mut W) -> Option<TaskCompletion> {
        match message {
            WorkerMessage::Chunk { id, chunk } => {
                if let Some(task) = self.pending.get_mut(&id) {
                    task.changed += chunk.captured + chunk.apply(world);
                }
                None
            }
            WorkerMessage::Done { id, clipboard } => {
                let task = self.pending.remove(&id)?;
                let result = TaskResult {
                    elapsed: task.started.elapsed(),
                    changed: task.changed,
                };
                log_completion(id, task.kind, &result);
                Some(TaskCompletion {
                    id,
                    actor: task.actor,
                    kind: task.kind,
                    outcome: Ok(result),
                    clipboard,
                })
            }
            WorkerMessage::Failed { id, error } => {
                let task = self.pending.remove(&id)?;
                warn!(task = id, kind = %task.kind, %error, "edit failed on worker");
                Some(TaskCompletion {
                    id,
                    actor: task.actor,
                    kind: task.kind,
                    outcome: Err(error),
                    clipboard: None,
                })
            }
        }
    }
}

fn stream_plan(id: TaskId, mut plan: EditPlan, reader: &dyn BlockReader, sender: &Sender<WorkerMessage>) {
    while let Some(chunk) = plan.next_chunk(reader) {
        if sender.send(WorkerMessage::Chunk { id, chunk }).is_err() {
            return;
        }
    }
    let clipboard = plan.finish();
    let _ = sender.send(WorkerMessage::Done { id, clipboard });
}

fn log_completion(id: TaskId, kind: OperationKind, result: &TaskResult) {
    info!(
        task = id,
        %kind,
        changed = result.changed,
        elapsed_secs = result.elapsed_secs(),
        "edit complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::{Cuboid, RegionShape};
    use crate::world::MemoryWorld;

    const STONE: BlockState = BlockState::new(1);

    fn set_job() -> Job {
        Job::Edit(EditOperation::Set {
            shape: RegionShape::Cuboid(Cuboid::new((0, 0, 0).into(), (3, 3, 3).into())),
            block: STONE,
        })
    }

    #[test]
    fn test_sync_completes_inline() {
        let mut runner = TaskRunner::new(ExecutionMode::Synchronous, 5, 1).unwrap();
        let mut world = MemoryWorld::with_radius(8);
        match runner.submit(ActorId(1), set_job(), &mut world).unwrap() {
            Submission::Completed(done) => {
                assert_eq!(done.outcome.unwrap().changed, 64);
            }
            Submission::Pending(_) => panic!("synchronous runner deferred a job"),
        }
        assert_eq!(world.count_non_air(), 64);
    }

    #[test]
    fn test_async_writes_only_when_polled() {
        let mut runner = TaskRunner::new(ExecutionMode::Asynchronous, 5, 2).unwrap();
        let mut world = MemoryWorld::with_radius(8);
        let submission = runner.submit(ActorId(1), set_job(), &mut world).unwrap();
        assert!(matches!(submission, Submission::Pending(_)));
        assert_eq!(world.count_non_air(), 0);

        let done = runner.wait(&mut world, Duration::from_secs(10));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].outcome.as_ref().unwrap().changed, 64);
        assert_eq!(world.count_non_air(), 64);
        assert_eq!(runner.pending_count(), 0);
    }

    #[test]
    fn test_async_validation_is_eager() {
        let mut runner = TaskRunner::new(ExecutionMode::Asynchronous, 5, 1).unwrap();
        let mut world = MemoryWorld::with_radius(8);
        let empty = Clipboard::from_entries(BlockPosition::new(1, 1, 1), BlockPosition::ZERO, vec![])
            .unwrap();
        let job = Job::Edit(EditOperation::Paste {
            clipboard: std::sync::Arc::new(empty),
            base: BlockPosition::ZERO,
            include_air: true,
        });
        assert!(matches!(
            runner.submit(ActorId(1), job, &mut world),
            Err(EditError::EmptyClipboard)
        ));
        assert_eq!(runner.pending_count(), 0);
    }
}
