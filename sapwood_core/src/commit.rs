// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The commit pass.
//!
//! Applies a root's aggregated effect list to the host tree in stored order.
//! The pass is uninterruptible and infallible; all fallible work happened
//! during reconciliation.

use alloc::vec::Vec;

use crate::backend::HostAdapter;
use crate::component::InstanceStore;
use crate::fiber::{EffectTag, FiberArena, FiberId, FiberTag};
use crate::trace::Tracer;

/// Counts of host mutations applied by one commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CommitStats {
    /// Host nodes inserted.
    pub inserted: u32,
    /// Host nodes whose attributes were updated.
    pub updated: u32,
    /// Delete effects executed.
    pub deleted: u32,
    /// Host nodes detached by those deletions.
    pub removed_host_nodes: u32,
    /// Component instances released by those deletions.
    pub released_instances: u32,
}

impl CommitStats {
    /// Returns `true` if the commit touched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Applies the effects aggregated on `root` of `work`.
///
/// Insert and update effects reference `work`; delete effects reference
/// `previous`, the tree `work` is replacing.
pub(crate) fn commit_root<A: HostAdapter>(
    host: &mut A,
    work: &FiberArena<A::Node>,
    previous: Option<&FiberArena<A::Node>>,
    instances: &mut InstanceStore,
    root: FiberId,
    tracer: &mut Tracer<'_>,
) -> CommitStats {
    let mut stats = CommitStats::default();

    for effect in work.effects(root) {
        let fiber = effect.fiber;
        match effect.tag {
            EffectTag::Insert => {
                if work.tag(fiber) == FiberTag::HostNode {
                    let parent = host_parent(work, fiber);
                    host.insert_child(parent, realized(work, fiber));
                    stats.inserted += 1;
                }
            }
            EffectTag::Update => {
                if work.tag(fiber) == FiberTag::HostNode {
                    let Some(alternate) = work.alternate(fiber) else {
                        panic!("updated fiber {fiber:?} has no alternate");
                    };
                    let old = previous_tree(previous).props(alternate);
                    host.update_props(realized(work, fiber), old, work.props(fiber));
                    stats.updated += 1;
                }
            }
            EffectTag::Delete => {
                commit_deletion(host, previous_tree(previous), instances, fiber, &mut stats);
                stats.deleted += 1;
            }
            EffectTag::None => {}
        }

        #[cfg(feature = "trace-rich")]
        tracer.effect_applied(&crate::trace::EffectAppliedEvent {
            fiber,
            tag: effect.tag,
        });
    }

    #[cfg(not(feature = "trace-rich"))]
    let _ = tracer;
    stats
}

/// Detaches the top-most host nodes under `fiber` and releases every
/// component instance in its subtree.
fn commit_deletion<A: HostAdapter>(
    host: &mut A,
    previous: &FiberArena<A::Node>,
    instances: &mut InstanceStore,
    fiber: FiberId,
    stats: &mut CommitStats,
) {
    let parent = host_parent(previous, fiber);

    let mut stack = Vec::from([fiber]);
    while let Some(cur) = stack.pop() {
        if previous.tag(cur) == FiberTag::HostNode {
            host.remove_child(parent, realized(previous, cur));
            stats.removed_host_nodes += 1;
        } else {
            let first = stack.len();
            stack.extend(previous.children(cur));
            stack[first..].reverse();
        }
    }

    for cur in previous.descendants(fiber) {
        if let Some(instance) = previous.state_node(cur).instance()
            && instances.release(instance)
        {
            stats.released_instances += 1;
        }
    }
}

/// Returns the host node of the nearest host ancestor of `fiber`, skipping
/// component fibers.
fn host_parent<N>(arena: &FiberArena<N>, fiber: FiberId) -> &N {
    let mut cur = arena.parent(fiber);
    while let Some(p) = cur {
        if arena.tag(p) != FiberTag::ComponentInstance {
            return realized(arena, p);
        }
        cur = arena.parent(p);
    }
    panic!("fiber {fiber:?} has no host ancestor");
}

fn realized<N>(arena: &FiberArena<N>, fiber: FiberId) -> &N {
    match arena.state_node(fiber).host_node() {
        Some(node) => node,
        None => panic!("host fiber {fiber:?} was never realized"),
    }
}

fn previous_tree<N>(previous: Option<&FiberArena<N>>) -> &FiberArena<N> {
    match previous {
        Some(arena) => arena,
        None => panic!("effect references a previous tree that does not exist"),
    }
}
