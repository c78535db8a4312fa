// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Components and component instances.
//!
//! A [`Component`] turns props and state into a single child [`Element`].
//! Components are identified by [`ComponentType`], which pairs a `TypeId`
//! with a constructor, so two elements naming the same Rust type reconcile as
//! the same kind.
//!
//! Live instances are owned by the scheduler's [`InstanceStore`] and addressed
//! by generation-checked [`InstanceId`] handles. A component never mutates its
//! state directly; it calls [`ComponentHandle::set_state`], which queues an
//! update for the next work cycle.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{TypeId, type_name};
use core::fmt;

use crate::element::{Attrs, Element, Props};
use crate::fiber::FiberId;
use crate::scheduler::RootId;
use crate::update::{Update, UpdateQueue};

/// A user-defined component.
pub trait Component {
    /// Produces this component's single child from its props and state.
    fn render(&self, props: &Props, state: &Attrs) -> Element;

    /// Returns the state of a freshly created instance.
    fn initial_state(&self, props: &Props) -> Attrs {
        _ = props;
        Attrs::new()
    }

    /// Receives the handle used to request state updates.
    ///
    /// Called once, right after the instance is created.
    fn attach(&mut self, handle: ComponentHandle) {
        _ = handle;
    }
}

type Constructor = Rc<dyn Fn() -> Box<dyn Component>>;

/// The identity of a component kind.
///
/// Equality compares only the underlying Rust type.
#[derive(Clone)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    construct: Constructor,
}

impl ComponentType {
    /// Identifies `C`, constructed through `Default`.
    #[must_use]
    pub fn of<C: Component + Default + 'static>() -> Self {
        Self::with_constructor(C::default)
    }

    /// Identifies `C`, constructed through `construct`.
    #[must_use]
    pub fn with_constructor<C, F>(construct: F) -> Self
    where
        C: Component + 'static,
        F: Fn() -> C + 'static,
    {
        Self {
            id: TypeId::of::<C>(),
            name: short_name(type_name::<C>()),
            construct: Rc::new(move || Box::new(construct())),
        }
    }

    /// Returns the unqualified type name, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn construct(&self) -> Box<dyn Component> {
        (self.construct)()
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.name)
    }
}

fn short_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}

/// A handle to a live component instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl InstanceId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({}@gen{})", self.idx, self.generation)
    }
}

/// Lets a component request state updates for itself.
#[derive(Clone, Debug)]
pub struct ComponentHandle {
    instance: InstanceId,
    queue: UpdateQueue,
}

impl ComponentHandle {
    pub(crate) fn new(instance: InstanceId, queue: UpdateQueue) -> Self {
        Self { instance, queue }
    }

    /// Returns the instance this handle updates.
    #[must_use]
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Queues a merge of `patch` into the instance's state.
    ///
    /// The state is not touched until a later work cycle processes the update.
    pub fn set_state(&self, patch: Attrs) {
        self.queue.push(Update::SetState {
            instance: self.instance,
            patch,
        });
    }
}

/// A live component: the boxed implementation plus its props and state.
pub(crate) struct ComponentInstance {
    pub(crate) component: Box<dyn Component>,
    pub(crate) props: Rc<Props>,
    pub(crate) state: Attrs,
    pub(crate) root: RootId,
    /// The fiber owning this instance in the root's committed tree.
    pub(crate) fiber: Option<FiberId>,
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("state", &self.state)
            .field("root", &self.root)
            .field("fiber", &self.fiber)
            .finish_non_exhaustive()
    }
}

/// Slot storage for live component instances.
#[derive(Debug, Default)]
pub(crate) struct InstanceStore {
    slots: Vec<Option<ComponentInstance>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
}

impl InstanceStore {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "instance count never reaches u32::MAX"
    )]
    pub(crate) fn insert(&mut self, instance: ComponentInstance) -> InstanceId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx as usize] = Some(instance);
            idx
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Some(instance));
            self.generation.push(0);
            idx
        };
        InstanceId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Frees the slot. Returns `false` if `id` was already released.
    pub(crate) fn release(&mut self, id: InstanceId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.slots[id.idx as usize] = None;
        self.generation[id.idx as usize] += 1;
        self.free_list.push(id.idx);
        true
    }

    pub(crate) fn is_alive(&self, id: InstanceId) -> bool {
        (id.idx as usize) < self.slots.len()
            && self.generation[id.idx as usize] == id.generation
            && self.slots[id.idx as usize].is_some()
    }

    pub(crate) fn get(&self, id: InstanceId) -> Option<&ComponentInstance> {
        if self.is_alive(id) {
            self.slots[id.idx as usize].as_ref()
        } else {
            None
        }
    }

    pub(crate) fn get_mut(&mut self, id: InstanceId) -> Option<&mut ComponentInstance> {
        if self.is_alive(id) {
            self.slots[id.idx as usize].as_mut()
        } else {
            None
        }
    }

    /// Returns the instance, panicking on a released handle.
    pub(crate) fn live_mut(&mut self, id: InstanceId) -> &mut ComponentInstance {
        assert!(self.is_alive(id), "stale InstanceId: {id:?}");
        match &mut self.slots[id.idx as usize] {
            Some(instance) => instance,
            None => unreachable!("live slot is occupied"),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementKind, create_element};

    #[derive(Default)]
    struct Label;

    impl Component for Label {
        fn render(&self, _props: &Props, _state: &Attrs) -> Element {
            create_element(ElementKind::host("span"), None, []).unwrap()
        }
    }

    #[derive(Default)]
    struct Other;

    impl Component for Other {
        fn render(&self, _props: &Props, _state: &Attrs) -> Element {
            Element::text("other")
        }
    }

    fn instance() -> ComponentInstance {
        ComponentInstance {
            component: Box::new(Label),
            props: Rc::new(Props::default()),
            state: Attrs::new(),
            root: RootId(0),
            fiber: None,
        }
    }

    #[test]
    fn type_identity_ignores_constructor() {
        let a = ComponentType::of::<Label>();
        let b = ComponentType::with_constructor(|| Label);
        assert_eq!(a, b);
        assert_ne!(a, ComponentType::of::<Other>());
        assert_eq!(a.name(), "Label");
    }

    #[test]
    fn handle_queues_set_state() {
        let queue = UpdateQueue::new();
        let mut store = InstanceStore::default();
        let id = store.insert(instance());
        let handle = ComponentHandle::new(id, queue.clone());
        handle.set_state(crate::element::attrs([("n", 1)]));
        assert_eq!(queue.len(), 1);
        match queue.pop() {
            Some(Update::SetState { instance, patch }) => {
                assert_eq!(instance, id);
                assert_eq!(patch.len(), 1);
            }
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[test]
    fn released_slots_are_reused_with_new_generation() {
        let mut store = InstanceStore::default();
        let a = store.insert(instance());
        assert!(store.release(a));
        assert!(!store.release(a));
        let b = store.insert(instance());
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(store.get(a).is_none());
        assert!(store.get(b).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    #[should_panic(expected = "stale InstanceId")]
    fn released_handle_panics_on_live_access() {
        let mut store = InstanceStore::default();
        let a = store.insert(instance());
        store.release(a);
        let _ = store.live_mut(a);
    }
}
