// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber arenas and fiber metadata.
//!
//! Each work cycle allocates one [`FiberArena`] with a fresh generation. The
//! committed arena of a root is its *current* tree; the arena under
//! construction is the *work-in-progress* tree. Working fibers reach their
//! predecessors through [`FiberArena::alternate`], which always points into
//! the previous generation. The two trees never share slots, and the previous
//! arena is dropped as a whole once a commit has executed its deletions.

mod arena;
mod id;
mod traverse;

pub use arena::FiberArena;
pub(crate) use arena::FiberInit;
pub use id::FiberId;
pub use traverse::{Children, Descendants};

use crate::component::InstanceId;

/// The kind of work a fiber represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FiberTag {
    /// A host element or text node.
    HostNode,
    /// A component; its single child is whatever `render` returned.
    ComponentInstance,
    /// The top of a tree; its state node is the root's host container.
    RootAnchor,
}

/// The host mutation recorded for a fiber in the current cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EffectTag {
    /// No mutation.
    #[default]
    None,
    /// Attach a new node.
    Insert,
    /// Re-apply attributes on a reused node.
    Update,
    /// Detach an old subtree.
    Delete,
}

/// One entry of an aggregated effect list.
///
/// Deletions reference fibers of the previous generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Effect {
    /// The fiber the mutation applies to.
    pub fiber: FiberId,
    /// What to do with it.
    pub tag: EffectTag,
}

/// What a fiber is bound to outside the arena.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StateNode<N> {
    /// Not realized yet.
    #[default]
    None,
    /// The root's host container (root anchors only).
    Container(N),
    /// A realized host node.
    Host(N),
    /// A live component instance.
    Instance(InstanceId),
}

impl<N> StateNode<N> {
    /// Returns the host node for host fibers and root anchors.
    #[must_use]
    pub fn host_node(&self) -> Option<&N> {
        match self {
            Self::Container(n) | Self::Host(n) => Some(n),
            Self::None | Self::Instance(_) => None,
        }
    }

    /// Returns the instance for component fibers.
    #[must_use]
    pub fn instance(&self) -> Option<InstanceId> {
        match self {
            Self::Instance(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns `true` if nothing is bound yet.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
