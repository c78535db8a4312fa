// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays fiber storage for one work cycle.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::mem;

use crate::element::{Attrs, ElementKind, Props};

use super::id::{FiberId, INVALID};
use super::traverse::{Children, Descendants};
use super::{Effect, EffectTag, FiberTag, StateNode};

/// Fields of a fiber fixed at creation.
#[derive(Debug)]
pub(crate) struct FiberInit<N> {
    pub(crate) parent: Option<FiberId>,
    pub(crate) tag: FiberTag,
    pub(crate) kind: Option<ElementKind>,
    pub(crate) props: Rc<Props>,
    pub(crate) pending_state: Option<Attrs>,
    pub(crate) state_node: StateNode<N>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect_tag: EffectTag,
}

/// Fiber storage for one generation.
///
/// Fibers are only ever appended; an arena is discarded as a whole. Slot 0 is
/// always the root anchor. All accessors panic with `"stale FiberId"` when
/// handed an id from another generation.
#[derive(Debug)]
pub struct FiberArena<N> {
    generation: u32,

    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    alternate: Vec<Option<FiberId>>,

    // -- Fiber data --
    tag: Vec<FiberTag>,
    kind: Vec<Option<ElementKind>>,
    props: Vec<Rc<Props>>,
    pending_state: Vec<Option<Attrs>>,
    state_node: Vec<StateNode<N>>,

    // -- Effects --
    effect_tag: Vec<EffectTag>,
    effects: Vec<Vec<Effect>>,
}

impl<N> FiberArena<N> {
    pub(crate) fn new(generation: u32) -> Self {
        Self {
            generation,
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            alternate: Vec::new(),
            tag: Vec::new(),
            kind: Vec::new(),
            props: Vec::new(),
            pending_state: Vec::new(),
            state_node: Vec::new(),
            effect_tag: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Appends a fiber. It is not linked into its parent's child chain.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "an arena never holds u32::MAX fibers"
    )]
    pub(crate) fn push(&mut self, init: FiberInit<N>) -> FiberId {
        if let Some(p) = init.parent {
            self.validate(p);
        }
        let idx = self.tag.len() as u32;
        self.parent.push(init.parent.map_or(INVALID, |p| p.idx));
        self.first_child.push(INVALID);
        self.next_sibling.push(INVALID);
        self.alternate.push(init.alternate);
        self.tag.push(init.tag);
        self.kind.push(init.kind);
        self.props.push(init.props);
        self.pending_state.push(init.pending_state);
        self.state_node.push(init.state_node);
        self.effect_tag.push(init.effect_tag);
        self.effects.push(Vec::new());
        FiberId {
            idx,
            generation: self.generation,
        }
    }

    /// Returns the generation of this arena.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Returns the number of fibers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tag.len()
    }

    /// Returns `true` if no fiber has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tag.is_empty()
    }

    /// Returns whether `id` belongs to this arena.
    #[must_use]
    pub fn contains(&self, id: FiberId) -> bool {
        id.generation == self.generation && (id.idx as usize) < self.tag.len()
    }

    /// Returns the root anchor.
    ///
    /// # Panics
    ///
    /// Panics if the arena is empty.
    #[must_use]
    pub fn root(&self) -> FiberId {
        assert!(!self.is_empty(), "fiber arena has no root");
        self.id(0)
    }

    /// Walks `parent` links from `id` to the top of the tree.
    #[must_use]
    pub fn root_of(&self, id: FiberId) -> FiberId {
        let mut cur = id;
        while let Some(p) = self.parent(cur) {
            cur = p;
        }
        cur
    }

    // -- Topology --

    /// Returns the parent fiber.
    #[must_use]
    pub fn parent(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.parent[id.idx as usize])
    }

    /// Returns the first child fiber.
    #[must_use]
    pub fn first_child(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.first_child[id.idx as usize])
    }

    /// Returns the next sibling fiber.
    #[must_use]
    pub fn next_sibling(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.link(self.next_sibling[id.idx as usize])
    }

    /// Returns the predecessor of `id` in the previous generation.
    #[must_use]
    pub fn alternate(&self, id: FiberId) -> Option<FiberId> {
        self.validate(id);
        self.alternate[id.idx as usize]
    }

    /// Iterates the direct children of `id` in sibling order.
    #[must_use]
    pub fn children(&self, id: FiberId) -> Children<'_, N> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Iterates `id` and all its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self, id: FiberId) -> Descendants<'_, N> {
        self.validate(id);
        Descendants::new(self, id.idx)
    }

    pub(crate) fn set_first_child(&mut self, parent: FiberId, child: FiberId) {
        self.validate(parent);
        self.validate(child);
        self.first_child[parent.idx as usize] = child.idx;
    }

    pub(crate) fn set_next_sibling(&mut self, prev: FiberId, next: FiberId) {
        self.validate(prev);
        self.validate(next);
        self.next_sibling[prev.idx as usize] = next.idx;
    }

    // -- Fiber data --

    /// Returns the fiber tag.
    #[must_use]
    pub fn tag(&self, id: FiberId) -> FiberTag {
        self.validate(id);
        self.tag[id.idx as usize]
    }

    /// Returns the element kind, or `None` for the root anchor.
    #[must_use]
    pub fn kind(&self, id: FiberId) -> Option<&ElementKind> {
        self.validate(id);
        self.kind[id.idx as usize].as_ref()
    }

    /// Returns the props snapshot.
    #[must_use]
    pub fn props(&self, id: FiberId) -> &Rc<Props> {
        self.validate(id);
        &self.props[id.idx as usize]
    }

    /// Returns the pending partial-state patch.
    #[must_use]
    pub fn pending_state(&self, id: FiberId) -> Option<&Attrs> {
        self.validate(id);
        self.pending_state[id.idx as usize].as_ref()
    }

    /// Returns what the fiber is bound to.
    #[must_use]
    pub fn state_node(&self, id: FiberId) -> &StateNode<N> {
        self.validate(id);
        &self.state_node[id.idx as usize]
    }

    pub(crate) fn set_state_node(&mut self, id: FiberId, node: StateNode<N>) {
        self.validate(id);
        self.state_node[id.idx as usize] = node;
    }

    /// Merges `patch` into the fiber's pending state.
    pub(crate) fn stash_pending_state(&mut self, id: FiberId, patch: Attrs) {
        self.validate(id);
        match &mut self.pending_state[id.idx as usize] {
            Some(pending) => pending.extend(patch),
            slot @ None => *slot = Some(patch),
        }
    }

    pub(crate) fn take_pending_state(&mut self, id: FiberId) -> Option<Attrs> {
        self.validate(id);
        self.pending_state[id.idx as usize].take()
    }

    // -- Effects --

    /// Returns the effect tag set while reconciling the fiber's parent.
    #[must_use]
    pub fn effect_tag(&self, id: FiberId) -> EffectTag {
        self.validate(id);
        self.effect_tag[id.idx as usize]
    }

    /// Returns the effects aggregated on this fiber so far.
    #[must_use]
    pub fn effects(&self, id: FiberId) -> &[Effect] {
        self.validate(id);
        &self.effects[id.idx as usize]
    }

    pub(crate) fn push_effect(&mut self, id: FiberId, effect: Effect) {
        self.validate(id);
        self.effects[id.idx as usize].push(effect);
    }

    pub(crate) fn append_effects(&mut self, id: FiberId, effects: &mut Vec<Effect>) {
        self.validate(id);
        self.effects[id.idx as usize].append(effects);
    }

    pub(crate) fn take_effects(&mut self, id: FiberId) -> Vec<Effect> {
        self.validate(id);
        mem::take(&mut self.effects[id.idx as usize])
    }

    /// Resets every effect tag and effect list once the arena is committed.
    pub(crate) fn clear_effects(&mut self) {
        self.effect_tag.fill(EffectTag::None);
        for list in &mut self.effects {
            list.clear();
        }
    }

    // -- Internal --

    pub(crate) fn id(&self, idx: u32) -> FiberId {
        FiberId {
            idx,
            generation: self.generation,
        }
    }

    fn link(&self, idx: u32) -> Option<FiberId> {
        (idx != INVALID).then(|| self.id(idx))
    }

    fn validate(&self, id: FiberId) {
        assert!(
            self.contains(id),
            "stale FiberId: {id:?} (arena gen: {}, len: {})",
            self.generation,
            self.tag.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::*;
    use crate::element::PropValue;

    fn init(parent: Option<FiberId>, tag: FiberTag) -> FiberInit<u32> {
        FiberInit {
            parent,
            tag,
            kind: None,
            props: Rc::new(Props::default()),
            pending_state: None,
            state_node: StateNode::None,
            alternate: None,
            effect_tag: EffectTag::None,
        }
    }

    /// root -> [a -> [c], b]
    fn sample() -> (FiberArena<u32>, [FiberId; 4]) {
        let mut arena = FiberArena::new(3);
        let root = arena.push(init(None, FiberTag::RootAnchor));
        let a = arena.push(init(Some(root), FiberTag::HostNode));
        let b = arena.push(init(Some(root), FiberTag::HostNode));
        let c = arena.push(init(Some(a), FiberTag::HostNode));
        arena.set_first_child(root, a);
        arena.set_next_sibling(a, b);
        arena.set_first_child(a, c);
        (arena, [root, a, b, c])
    }

    #[test]
    fn links_and_root() {
        let (arena, [root, a, b, c]) = sample();
        assert_eq!(arena.root(), root);
        assert_eq!(arena.parent(c), Some(a));
        assert_eq!(arena.parent(root), None);
        assert_eq!(arena.first_child(root), Some(a));
        assert_eq!(arena.next_sibling(a), Some(b));
        assert_eq!(arena.next_sibling(b), None);
        assert_eq!(arena.root_of(c), root);
        assert_eq!(arena.generation(), 3);
        assert_eq!(c.generation(), 3);
    }

    #[test]
    fn children_iterate_in_sibling_order() {
        let (arena, [root, a, b, _]) = sample();
        let kids: Vec<_> = arena.children(root).collect();
        assert_eq!(kids, vec![a, b]);
    }

    #[test]
    fn descendants_are_pre_order() {
        let (arena, [root, a, b, c]) = sample();
        let all: Vec<_> = arena.descendants(root).collect();
        assert_eq!(all, vec![root, a, c, b]);
        let sub: Vec<_> = arena.descendants(a).collect();
        assert_eq!(sub, vec![a, c]);
    }

    #[test]
    fn effects_take_and_clear() {
        let (mut arena, [root, a, b, _]) = sample();
        arena.push_effect(
            a,
            Effect {
                fiber: b,
                tag: EffectTag::Delete,
            },
        );
        let mut moved = arena.take_effects(a);
        assert!(arena.effects(a).is_empty());
        arena.append_effects(root, &mut moved);
        assert_eq!(arena.effects(root).len(), 1);
        arena.clear_effects();
        assert!(arena.effects(root).is_empty());
    }

    #[test]
    fn pending_state_merges() {
        let (mut arena, [_, a, _, _]) = sample();
        arena.stash_pending_state(a, crate::element::attrs([("x", 1), ("y", 1)]));
        arena.stash_pending_state(a, crate::element::attrs([("y", 2)]));
        let pending = arena.take_pending_state(a).unwrap();
        assert_eq!(pending.get("x"), Some(&PropValue::Int(1)));
        assert_eq!(pending.get("y"), Some(&PropValue::Int(2)));
        assert!(arena.pending_state(a).is_none());
    }

    #[test]
    #[should_panic(expected = "stale FiberId")]
    fn id_from_other_generation_panics() {
        let (arena, _) = sample();
        let other: FiberArena<u32> = FiberArena::new(4);
        let _ = other.tag(arena.root());
    }

    #[test]
    #[should_panic(expected = "fiber arena has no root")]
    fn empty_arena_has_no_root() {
        let arena: FiberArena<String> = FiberArena::new(0);
        let _ = arena.root();
    }
}
