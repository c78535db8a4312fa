// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors surfaced by the scheduler.

use core::fmt;

use crate::component::InstanceId;
use crate::scheduler::RootId;

/// An error that aborted a work cycle.
///
/// When returned from [`run_slice`](crate::scheduler::Scheduler::run_slice),
/// the offending update has been dropped, its work-in-progress tree discarded,
/// and nothing has been committed. The scheduler remains usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileError<E> {
    /// A render targeted a root that was never created.
    UnknownRoot(RootId),
    /// A state update targeted an instance that is no longer mounted.
    Unmounted(InstanceId),
    /// The host adapter failed to create a node.
    Host(E),
}

impl<E: fmt::Display> fmt::Display for ReconcileError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRoot(root) => write!(f, "update targets an unknown root: {root:?}"),
            Self::Unmounted(instance) => {
                write!(f, "update targets an unmounted instance: {instance:?}")
            }
            Self::Host(e) => write!(f, "host adapter failed to create a node: {e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> core::error::Error for ReconcileError<E> {}
