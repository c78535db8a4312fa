// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pending update requests.
//!
//! Every call to [`Scheduler::render`](crate::scheduler::Scheduler::render) or
//! [`ComponentHandle::set_state`](crate::component::ComponentHandle::set_state)
//! appends exactly one [`Update`] to the scheduler's [`UpdateQueue`]. Entries
//! are processed strictly in submission order, one work cycle each. There is
//! no priority and no coalescing.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::component::InstanceId;
use crate::element::{Attrs, Element};
use crate::scheduler::RootId;

/// A request to re-render part of the UI.
#[derive(Clone, Debug)]
pub enum Update {
    /// Replace the children of a root with `elements`.
    RenderRoot {
        /// Target root.
        root: RootId,
        /// New top-level elements.
        elements: Vec<Element>,
    },
    /// Merge `patch` into a component instance's state.
    SetState {
        /// Target instance.
        instance: InstanceId,
        /// Partial state to merge.
        patch: Attrs,
    },
}

/// A shared FIFO of [`Update`]s.
///
/// Clones share the same queue. The queue is single-threaded (`!Send`);
/// producers only push, and only the scheduler pops.
#[derive(Clone, Default)]
pub struct UpdateQueue {
    inner: Rc<RefCell<VecDeque<Update>>>,
}

impl fmt::Debug for UpdateQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl UpdateQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an update at the tail.
    pub fn push(&self, update: Update) {
        self.inner.borrow_mut().push_back(update);
    }

    pub(crate) fn pop(&self) -> Option<Update> {
        self.inner.borrow_mut().pop_front()
    }

    /// Returns the number of queued updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::scheduler::RootId;

    fn render(n: u32) -> Update {
        Update::RenderRoot {
            root: RootId(n),
            elements: vec![],
        }
    }

    #[test]
    fn fifo_order_across_clones() {
        let queue = UpdateQueue::new();
        let producer = queue.clone();
        producer.push(render(1));
        queue.push(render(2));
        producer.push(render(3));
        assert_eq!(queue.len(), 3);

        let order: Vec<u32> = core::iter::from_fn(|| queue.pop())
            .map(|u| match u {
                Update::RenderRoot { root, .. } => root.0,
                Update::SetState { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(order, [1, 2, 3]);
        assert!(producer.is_empty());
    }
}
