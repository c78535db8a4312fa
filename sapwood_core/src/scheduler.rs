// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative work scheduling.
//!
//! The [`Scheduler`] owns everything that outlives a single work cycle: the
//! update queue, the committed tree of every root, and the live component
//! instances. A host driver calls [`Scheduler::run_slice`] whenever it has
//! spare time; each call performs fiber units until the [`SliceBudget`] runs
//! out, and commits in one shot once a tree has been fully reconciled.
//!
//! Interrupting a cycle between units is always safe: the only host calls made
//! before commit create detached nodes, so the visible host tree never
//! reflects a partially reconciled update.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::CommitStats;
use crate::backend::HostAdapter;
use crate::budget::{SliceBudget, Unbounded};
use crate::commit::commit_root;
use crate::component::{ComponentHandle, InstanceId, InstanceStore};
use crate::element::{Attrs, Element, Props};
use crate::error::ReconcileError;
use crate::fiber::{EffectTag, FiberArena, FiberId, FiberInit, FiberTag, StateNode};
use crate::reconcile::{Reconciler, Step, WorkCycle};
use crate::time::{Duration, HostTime};
use crate::trace::{
    CommitEvent, SliceBeginEvent, SliceEndEvent, Tracer, UpdateDequeuedEvent, UpdateKind,
};
use crate::update::{Update, UpdateQueue};

/// A handle to a root created with [`Scheduler::create_root`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RootId(pub u32);

impl RootId {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a slice reports back to its driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SliceResult {
    /// More work is pending; request another slice.
    Continue,
    /// Nothing is queued or in flight; stop requesting slices.
    Idle,
}

/// Configuration for the [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Slice length drivers use when the host does not provide a deadline.
    pub slice_length: Duration,
    /// Whether a slice that committed may start the next queued update with
    /// its remaining budget. When `false`, every commit ends the slice so the
    /// host can present before more work starts.
    pub continue_after_commit: bool,
}

impl SchedulerConfig {
    /// Configuration for hosts that present between slices (browsers,
    /// desktop event loops).
    #[must_use]
    pub const fn interactive() -> Self {
        Self {
            slice_length: Duration::from_millis(5),
            continue_after_commit: false,
        }
    }

    /// Configuration for headless hosts that only care about throughput.
    #[must_use]
    pub const fn headless() -> Self {
        Self {
            slice_length: Duration::from_millis(50),
            continue_after_commit: true,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Per-root storage: the host container and the committed tree.
#[derive(Debug)]
struct RootSlot<N> {
    container: N,
    current: Option<FiberArena<N>>,
}

/// Owned reconciliation context.
///
/// `N` is the host node type of the [`HostAdapter`] driving this scheduler.
///
/// # Work cycles
///
/// Each queued [`Update`] becomes one work cycle. The cycle builds a fresh
/// [`FiberArena`] whose fibers point back into the root's committed arena.
/// When the walk finishes, the aggregated effects are committed, the new
/// arena becomes the root's current tree, and the old one is dropped.
///
/// # Errors
///
/// If the host fails to create a node, the cycle is abandoned: its arena is
/// dropped, component instances it created are released, and the update that
/// started it is discarded. Later updates are unaffected.
#[derive(Debug)]
pub struct Scheduler<N> {
    config: SchedulerConfig,
    queue: UpdateQueue,
    roots: Vec<RootSlot<N>>,
    instances: InstanceStore,
    work: Option<WorkCycle<N>>,
    next_unit_of_work: Option<FiberId>,
    pending_commit: Option<FiberId>,
    next_generation: u32,
    slice_index: u64,
    last_commit: Option<CommitStats>,
}

impl<N: Clone> Default for Scheduler<N> {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl<N: Clone> Scheduler<N> {
    /// Creates a scheduler with no roots.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            queue: UpdateQueue::new(),
            roots: Vec::new(),
            instances: InstanceStore::default(),
            work: None,
            next_unit_of_work: None,
            pending_commit: None,
            next_generation: 0,
            slice_index: 0,
            last_commit: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Registers `container` as the host node a tree renders into.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "root count never reaches u32::MAX"
    )]
    pub fn create_root(&mut self, container: N) -> RootId {
        let id = RootId(self.roots.len() as u32);
        self.roots.push(RootSlot {
            container,
            current: None,
        });
        id
    }

    /// Queues a render of `elements` as the children of `root`.
    pub fn render(&self, root: RootId, elements: impl IntoIterator<Item = Element>) {
        self.queue.push(Update::RenderRoot {
            root,
            elements: elements.into_iter().collect(),
        });
    }

    /// Queues a merge of `patch` into `instance`'s state.
    pub fn set_state(&self, instance: InstanceId, patch: Attrs) {
        self.queue.push(Update::SetState { instance, patch });
    }

    /// Returns a handle that queues state updates for `instance`.
    #[must_use]
    pub fn handle(&self, instance: InstanceId) -> ComponentHandle {
        ComponentHandle::new(instance, self.queue.clone())
    }

    /// Returns the shared update queue.
    #[must_use]
    pub fn queue(&self) -> &UpdateQueue {
        &self.queue
    }

    /// Returns `true` if an update is queued or a cycle is in flight.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.work.is_some() || !self.queue.is_empty()
    }

    /// Returns the committed tree of `root`, if it has rendered.
    #[must_use]
    pub fn current_tree(&self, root: RootId) -> Option<&FiberArena<N>> {
        self.roots.get(root.index())?.current.as_ref()
    }

    /// Returns the host container of `root`.
    #[must_use]
    pub fn container(&self, root: RootId) -> Option<&N> {
        self.roots.get(root.index()).map(|slot| &slot.container)
    }

    /// Returns whether `instance` is mounted.
    #[must_use]
    pub fn is_mounted(&self, instance: InstanceId) -> bool {
        self.instances.is_alive(instance)
    }

    /// Returns the state of `instance` as of its last render.
    #[must_use]
    pub fn instance_state(&self, instance: InstanceId) -> Option<&Attrs> {
        self.instances.get(instance).map(|record| &record.state)
    }

    /// Returns the number of live component instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Returns the counts from the most recent commit.
    #[must_use]
    pub fn last_commit(&self) -> Option<CommitStats> {
        self.last_commit
    }

    /// Runs one slice without tracing.
    ///
    /// # Errors
    ///
    /// See [`run_slice_traced`](Self::run_slice_traced).
    pub fn run_slice<A>(
        &mut self,
        host: &mut A,
        budget: impl SliceBudget,
    ) -> Result<SliceResult, ReconcileError<A::Error>>
    where
        A: HostAdapter<Node = N>,
    {
        self.run_slice_traced(host, budget, &mut Tracer::none())
    }

    /// Runs one slice: starts the next queued update if no cycle is in
    /// flight, performs fiber units while `budget` allows, and commits when
    /// the tree is complete.
    ///
    /// At least one unit runs per slice, even if the budget is already
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::UnknownRoot`] or
    /// [`ReconcileError::Unmounted`] when the dequeued update has no target,
    /// and [`ReconcileError::Host`] when the host fails to create a node. In
    /// every case the update is dropped and nothing is committed.
    pub fn run_slice_traced<A>(
        &mut self,
        host: &mut A,
        mut budget: impl SliceBudget,
        tracer: &mut Tracer<'_>,
    ) -> Result<SliceResult, ReconcileError<A::Error>>
    where
        A: HostAdapter<Node = N>,
    {
        let slice_index = self.slice_index;
        self.slice_index += 1;
        tracer.slice_begin(&SliceBeginEvent {
            slice_index,
            resumed: self.next_unit_of_work.is_some(),
            timestamp: budget.now(),
        });

        let mut units = 0_u32;
        let outcome = self.work_loop(host, &mut budget, tracer, slice_index, &mut units);
        if outcome.is_err() {
            self.abort_cycle();
        }

        let result = if self.has_pending_work() {
            SliceResult::Continue
        } else {
            SliceResult::Idle
        };
        tracer.slice_end(&SliceEndEvent {
            slice_index,
            units,
            result,
            timestamp: budget.now(),
        });

        outcome.map(|()| result)
    }

    /// Drains the queue with unbounded slices.
    ///
    /// # Errors
    ///
    /// Stops at the first failed update and returns its error; updates queued
    /// behind it stay queued.
    pub fn run_until_idle<A>(&mut self, host: &mut A) -> Result<(), ReconcileError<A::Error>>
    where
        A: HostAdapter<Node = N>,
    {
        while self.run_slice(host, Unbounded)? == SliceResult::Continue {}
        Ok(())
    }

    fn work_loop<A>(
        &mut self,
        host: &mut A,
        budget: &mut impl SliceBudget,
        tracer: &mut Tracer<'_>,
        slice_index: u64,
        units: &mut u32,
    ) -> Result<(), ReconcileError<A::Error>>
    where
        A: HostAdapter<Node = N>,
    {
        let mut committed = false;
        loop {
            if self.next_unit_of_work.is_none() {
                if committed && !self.config.continue_after_commit {
                    return Ok(());
                }
                let Some(update) = self.queue.pop() else {
                    return Ok(());
                };
                self.start_cycle(update, tracer, slice_index)?;
            }

            if !budget.has_time_remaining() && *units > 0 {
                return Ok(());
            }

            let Some(fiber) = self.next_unit_of_work else {
                return Ok(());
            };
            let Some(work) = self.work.as_mut() else {
                panic!("unit of work without a work cycle");
            };
            let mut reconciler = Reconciler {
                host: &mut *host,
                current: self.roots[work.root.index()].current.as_ref(),
                work,
                instances: &mut self.instances,
                queue: &self.queue,
                tracer: &mut *tracer,
            };
            let step = reconciler
                .perform_unit_of_work(fiber)
                .map_err(ReconcileError::Host)?;
            *units += 1;

            match step {
                Step::Next(next) => self.next_unit_of_work = Some(next),
                Step::Done(root) => {
                    self.next_unit_of_work = None;
                    self.pending_commit = Some(root);
                    self.commit_all_work(host, tracer, slice_index, budget.now());
                    committed = true;
                }
            }
        }
    }

    /// Turns a dequeued update into the root fiber of a new work arena.
    fn start_cycle<E>(
        &mut self,
        update: Update,
        tracer: &mut Tracer<'_>,
        slice_index: u64,
    ) -> Result<(), ReconcileError<E>> {
        let generation = self.next_generation;

        let (kind, mut work, props, alternate) = match update {
            Update::RenderRoot { root, elements } => {
                let Some(slot) = self.roots.get(root.index()) else {
                    return Err(ReconcileError::UnknownRoot(root));
                };
                let props = Rc::new(Props {
                    attrs: Attrs::new(),
                    children: elements,
                });
                let alternate = slot.current.as_ref().map(FiberArena::root);
                (
                    UpdateKind::RenderRoot,
                    WorkCycle::new(root, generation),
                    props,
                    alternate,
                )
            }
            Update::SetState { instance, patch } => {
                let Some((root, fiber)) = self
                    .instances
                    .get(instance)
                    .and_then(|record| Some((record.root, record.fiber?)))
                else {
                    return Err(ReconcileError::Unmounted(instance));
                };
                let Some(current) = self
                    .roots
                    .get_mut(root.index())
                    .and_then(|slot| slot.current.as_mut())
                    .filter(|arena| arena.contains(fiber))
                else {
                    return Err(ReconcileError::Unmounted(instance));
                };
                current.stash_pending_state(fiber, patch);
                let top = current.root_of(fiber);
                let props = Rc::clone(current.props(top));
                let mut work = WorkCycle::new(root, generation);
                work.stashed = Some(fiber);
                (UpdateKind::SetState, work, props, Some(top))
            }
        };

        let container = self.roots[work.root.index()].container.clone();
        let root_fiber = work.arena.push(FiberInit {
            parent: None,
            tag: FiberTag::RootAnchor,
            kind: None,
            props,
            pending_state: None,
            state_node: StateNode::Container(container),
            alternate,
            effect_tag: EffectTag::None,
        });

        self.next_generation = self.next_generation.wrapping_add(1);
        tracer.update_dequeued(&UpdateDequeuedEvent {
            slice_index,
            kind,
            root: work.root,
            generation,
            queued: self.queue.len(),
        });
        self.work = Some(work);
        self.next_unit_of_work = Some(root_fiber);
        Ok(())
    }

    fn commit_all_work<A>(
        &mut self,
        host: &mut A,
        tracer: &mut Tracer<'_>,
        slice_index: u64,
        timestamp: Option<HostTime>,
    ) where
        A: HostAdapter<Node = N>,
    {
        let (Some(mut work), Some(root)) = (self.work.take(), self.pending_commit.take()) else {
            panic!("commit without a completed work cycle");
        };
        let slot = &mut self.roots[work.root.index()];
        let stats = commit_root(
            host,
            &work.arena,
            slot.current.as_ref(),
            &mut self.instances,
            root,
            tracer,
        );

        for (instance, fiber) in work.bindings.drain(..) {
            if let Some(record) = self.instances.get_mut(instance) {
                record.fiber = Some(fiber);
            }
        }
        work.arena.clear_effects();
        let generation = work.arena.generation();
        slot.current = Some(work.arena);
        self.last_commit = Some(stats);

        tracer.commit(&CommitEvent {
            slice_index,
            root: work.root,
            generation,
            stats,
            timestamp,
        });
    }

    /// Drops the in-flight cycle without committing.
    fn abort_cycle(&mut self) {
        if let Some(work) = self.work.take() {
            for instance in work.created {
                self.instances.release(instance);
            }
            if let Some(fiber) = work.stashed
                && let Some(current) = self.roots[work.root.index()].current.as_mut()
            {
                current.take_pending_state(fiber);
            }
        }
        self.next_unit_of_work = None;
        self.pending_commit = None;
    }
}
