// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fiber tree traversal.

use super::arena::FiberArena;
use super::id::{FiberId, INVALID};

/// An iterator over the direct children of a fiber.
///
/// Created by [`FiberArena::children`].
#[derive(Debug)]
pub struct Children<'a, N> {
    arena: &'a FiberArena<N>,
    current: u32,
}

impl<'a, N> Children<'a, N> {
    pub(crate) fn new(arena: &'a FiberArena<N>, first: u32) -> Self {
        Self {
            arena,
            current: first,
        }
    }
}

impl<N> Iterator for Children<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.arena.next_sibling[idx as usize];
        Some(self.arena.id(idx))
    }
}

/// A pre-order iterator over a fiber and its subtree.
///
/// Created by [`FiberArena::descendants`].
#[derive(Debug)]
pub struct Descendants<'a, N> {
    arena: &'a FiberArena<N>,
    start: u32,
    current: u32,
}

impl<'a, N> Descendants<'a, N> {
    pub(crate) fn new(arena: &'a FiberArena<N>, start: u32) -> Self {
        Self {
            arena,
            start,
            current: start,
        }
    }

    fn successor(&self, idx: u32) -> u32 {
        let child = self.arena.first_child[idx as usize];
        if child != INVALID {
            return child;
        }
        let mut n = idx;
        loop {
            if n == self.start {
                return INVALID;
            }
            let sibling = self.arena.next_sibling[n as usize];
            if sibling != INVALID {
                return sibling;
            }
            n = self.arena.parent[n as usize];
        }
    }
}

impl<N> Iterator for Descendants<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.successor(idx);
        Some(self.arena.id(idx))
    }
}
