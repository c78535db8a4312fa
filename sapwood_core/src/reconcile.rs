// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Begin / complete walk and positional child diff.
//!
//! One call to [`Reconciler::perform_unit_of_work`] processes exactly one
//! fiber: it *begins* the fiber (creating its host node or component
//! instance, then diffing its children into the work arena) and, if the
//! fiber has no children, *completes* fibers upward until a sibling is found.
//! Completing a fiber splices its effect list, followed by the fiber itself
//! when tagged, onto its parent. The root therefore ends up holding every
//! effect of the cycle in child-before-parent order.
//!
//! Nothing here touches the host tree except
//! [`create_node`](crate::backend::HostAdapter::create_node), which produces
//! detached nodes. A cycle can be dropped at any unit boundary without
//! visible effects.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::backend::HostAdapter;
use crate::component::{ComponentHandle, ComponentInstance, InstanceId, InstanceStore};
use crate::element::{Element, ElementKind, Props};
use crate::fiber::{Effect, EffectTag, FiberArena, FiberId, FiberInit, FiberTag, StateNode};
use crate::scheduler::RootId;
use crate::trace::Tracer;
use crate::update::UpdateQueue;

/// In-flight state of one work cycle.
#[derive(Debug)]
pub(crate) struct WorkCycle<N> {
    pub(crate) root: RootId,
    pub(crate) arena: FiberArena<N>,
    /// Instance to fiber bindings applied at commit.
    pub(crate) bindings: Vec<(InstanceId, FiberId)>,
    /// Instances created during this cycle, released if it aborts.
    pub(crate) created: Vec<InstanceId>,
    /// Fiber in the committed tree carrying this cycle's state patch.
    pub(crate) stashed: Option<FiberId>,
}

impl<N> WorkCycle<N> {
    pub(crate) fn new(root: RootId, generation: u32) -> Self {
        Self {
            root,
            arena: FiberArena::new(generation),
            bindings: Vec::new(),
            created: Vec::new(),
            stashed: None,
        }
    }
}

/// Result of one unit of work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// Process this fiber next.
    Next(FiberId),
    /// The walk finished; the root is ready to commit.
    Done(FiberId),
}

/// Borrowed view of everything a unit of work touches.
pub(crate) struct Reconciler<'a, 't, A: HostAdapter> {
    pub(crate) host: &'a mut A,
    pub(crate) work: &'a mut WorkCycle<A::Node>,
    /// The root's committed tree, which alternates point into.
    pub(crate) current: Option<&'a FiberArena<A::Node>>,
    pub(crate) instances: &'a mut InstanceStore,
    pub(crate) queue: &'a UpdateQueue,
    #[cfg_attr(
        not(feature = "trace-rich"),
        expect(dead_code, reason = "only per-unit events read it")
    )]
    pub(crate) tracer: &'a mut Tracer<'t>,
}

impl<'a, A: HostAdapter> Reconciler<'a, '_, A> {
    /// Processes `fiber` and returns the next unit.
    pub(crate) fn perform_unit_of_work(&mut self, fiber: FiberId) -> Result<Step, A::Error> {
        #[cfg(feature = "trace-rich")]
        self.tracer.unit_begin(&crate::trace::UnitBeginEvent {
            fiber,
            tag: self.work.arena.tag(fiber),
        });

        self.begin_work(fiber)?;
        if let Some(child) = self.work.arena.first_child(fiber) {
            return Ok(Step::Next(child));
        }

        let mut cur = fiber;
        loop {
            self.complete_work(cur);
            if let Some(sibling) = self.work.arena.next_sibling(cur) {
                return Ok(Step::Next(sibling));
            }
            match self.work.arena.parent(cur) {
                Some(parent) => cur = parent,
                None => return Ok(Step::Done(cur)),
            }
        }
    }

    fn begin_work(&mut self, fiber: FiberId) -> Result<(), A::Error> {
        match self.work.arena.tag(fiber) {
            FiberTag::ComponentInstance => {
                self.update_component(fiber);
                Ok(())
            }
            FiberTag::HostNode | FiberTag::RootAnchor => self.update_host(fiber),
        }
    }

    fn update_host(&mut self, fiber: FiberId) -> Result<(), A::Error> {
        let props = Rc::clone(self.work.arena.props(fiber));
        if self.work.arena.state_node(fiber).is_none() {
            let Some(kind) = self.work.arena.kind(fiber).and_then(ElementKind::host_kind) else {
                panic!("host fiber {fiber:?} has no host kind");
            };
            let node = self.host.create_node(kind, &props)?;
            self.work.arena.set_state_node(fiber, StateNode::Host(node));
        }

        if let Some(alternate) = self.work.arena.alternate(fiber)
            && Rc::ptr_eq(self.previous().props(alternate), &props)
            && self.work.arena.pending_state(fiber).is_none()
        {
            self.clone_child_fibers(fiber);
            return Ok(());
        }

        self.reconcile_children(fiber, &props.children);
        Ok(())
    }

    fn update_component(&mut self, fiber: FiberId) {
        let props = Rc::clone(self.work.arena.props(fiber));
        let (instance, fresh) = match self.work.arena.state_node(fiber).instance() {
            Some(instance) => (instance, false),
            None => (self.create_instance(fiber, &props), true),
        };
        let pending = self.work.arena.take_pending_state(fiber);

        let record = self.instances.live_mut(instance);
        if !fresh && Rc::ptr_eq(&record.props, &props) && pending.is_none() {
            self.clone_child_fibers(fiber);
            return;
        }

        record.props = Rc::clone(&props);
        if let Some(patch) = pending {
            record.state.extend(patch);
        }
        let child = record.component.render(&props, &record.state);
        self.reconcile_children(fiber, core::slice::from_ref(&child));
    }

    fn create_instance(&mut self, fiber: FiberId, props: &Rc<Props>) -> InstanceId {
        let Some(ElementKind::Component(ty)) = self.work.arena.kind(fiber) else {
            panic!("component fiber {fiber:?} has no component type");
        };
        let component = ty.construct();
        let state = component.initial_state(props);
        let instance = self.instances.insert(ComponentInstance {
            component,
            props: Rc::clone(props),
            state,
            root: self.work.root,
            fiber: None,
        });
        self.instances
            .live_mut(instance)
            .component
            .attach(ComponentHandle::new(instance, self.queue.clone()));
        self.work.created.push(instance);
        self.work
            .arena
            .set_state_node(fiber, StateNode::Instance(instance));
        instance
    }

    /// Diffs `elements` against the alternate's child chain by position.
    fn reconcile_children(&mut self, parent: FiberId, elements: &[Element]) {
        let old_arena = self.current;
        let mut old_fiber = self
            .work
            .arena
            .alternate(parent)
            .and_then(|alt| self.previous().first_child(alt));
        let mut prev: Option<FiberId> = None;
        let mut index = 0;

        while index < elements.len() || old_fiber.is_some() {
            let element = elements.get(index);
            let matched = match (old_fiber, element, old_arena) {
                (Some(old), Some(element), Some(arena)) => {
                    (arena.kind(old) == Some(element.kind())).then_some((old, arena))
                }
                _ => None,
            };

            let new_fiber = match (matched, element) {
                (Some((old, arena)), Some(element)) => {
                    let changed = props_changed(element.kind(), arena.props(old), element.props());
                    Some(self.work.arena.push(FiberInit {
                        parent: Some(parent),
                        tag: arena.tag(old),
                        kind: Some(element.kind().clone()),
                        props: Rc::clone(element.props()),
                        pending_state: arena.pending_state(old).cloned(),
                        state_node: arena.state_node(old).clone(),
                        alternate: Some(old),
                        effect_tag: if changed {
                            EffectTag::Update
                        } else {
                            EffectTag::None
                        },
                    }))
                }
                (None, Some(element)) => Some(self.work.arena.push(FiberInit {
                    parent: Some(parent),
                    tag: if element.kind().is_component() {
                        FiberTag::ComponentInstance
                    } else {
                        FiberTag::HostNode
                    },
                    kind: Some(element.kind().clone()),
                    props: Rc::clone(element.props()),
                    pending_state: None,
                    state_node: StateNode::None,
                    alternate: None,
                    effect_tag: EffectTag::Insert,
                })),
                (_, None) => None,
            };

            if let (Some(old), None) = (old_fiber, matched) {
                self.work.arena.push_effect(
                    parent,
                    Effect {
                        fiber: old,
                        tag: EffectTag::Delete,
                    },
                );
            }

            if let Some(child) = new_fiber {
                self.link(parent, prev, child);
                prev = Some(child);
            }
            old_fiber = old_fiber.and_then(|old| self.previous().next_sibling(old));
            index += 1;
        }
    }

    /// Copies the alternate's children unchanged into the work arena.
    fn clone_child_fibers(&mut self, parent: FiberId) {
        let Some(alternate) = self.work.arena.alternate(parent) else {
            return;
        };
        let old = self.previous();
        let mut prev = None;
        for old_child in old.children(alternate) {
            let child = self.work.arena.push(FiberInit {
                parent: Some(parent),
                tag: old.tag(old_child),
                kind: old.kind(old_child).cloned(),
                props: Rc::clone(old.props(old_child)),
                pending_state: old.pending_state(old_child).cloned(),
                state_node: old.state_node(old_child).clone(),
                alternate: Some(old_child),
                effect_tag: EffectTag::None,
            });
            self.link(parent, prev, child);
            prev = Some(child);
        }
    }

    fn complete_work(&mut self, fiber: FiberId) {
        if let Some(instance) = self.work.arena.state_node(fiber).instance() {
            self.work.bindings.push((instance, fiber));
        }

        let tag = self.work.arena.effect_tag(fiber);

        #[cfg(feature = "trace-rich")]
        self.tracer.unit_complete(&crate::trace::UnitCompleteEvent {
            fiber,
            effect_tag: tag,
        });

        if let Some(parent) = self.work.arena.parent(fiber) {
            let mut effects = self.work.arena.take_effects(fiber);
            if tag != EffectTag::None {
                effects.push(Effect { fiber, tag });
            }
            self.work.arena.append_effects(parent, &mut effects);
        }
    }

    fn link(&mut self, parent: FiberId, prev: Option<FiberId>, child: FiberId) {
        match prev {
            None => self.work.arena.set_first_child(parent, child),
            Some(prev) => self.work.arena.set_next_sibling(prev, child),
        }
    }

    fn previous(&self) -> &'a FiberArena<A::Node> {
        match self.current {
            Some(arena) => arena,
            None => panic!("fiber has an alternate but the root has no committed tree"),
        }
    }
}

/// Whether reusing a fiber for `new` needs an `Update` effect.
///
/// Host nodes only care about attributes; their children are diffed
/// separately. Components compare the whole props snapshot.
fn props_changed(kind: &ElementKind, old: &Rc<Props>, new: &Rc<Props>) -> bool {
    if Rc::ptr_eq(old, new) {
        return false;
    }
    match kind {
        ElementKind::Component(_) => **old != **new,
        ElementKind::Host(_) | ElementKind::Text => old.attrs != new.attrs,
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;
    use crate::backend::HostKind;
    use crate::component::{Component, ComponentType};
    use crate::element::{Attrs, PropValue, TEXT_VALUE, attrs, create_element};

    #[derive(Debug, Default)]
    struct CountingHost {
        created: u32,
        fail_on: Option<&'static str>,
    }

    impl HostAdapter for CountingHost {
        type Node = u32;
        type Error = &'static str;

        fn create_node(&mut self, kind: HostKind<'_>, _props: &Props) -> Result<u32, Self::Error> {
            if let (Some(bad), HostKind::Element(tag)) = (self.fail_on, kind)
                && bad == tag
            {
                return Err("refused");
            }
            self.created += 1;
            Ok(self.created)
        }

        fn update_props(&mut self, _: &u32, _: &Props, _: &Props) {}
        fn insert_child(&mut self, _: &u32, _: &u32) {}
        fn remove_child(&mut self, _: &u32, _: &u32) {}
    }

    struct Harness {
        host: CountingHost,
        instances: InstanceStore,
        queue: UpdateQueue,
        generation: u32,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                host: CountingHost::default(),
                instances: InstanceStore::default(),
                queue: UpdateQueue::new(),
                generation: 0,
            }
        }

        /// Runs one cycle to completion; the returned arena is still uncommitted.
        fn run(
            &mut self,
            current: Option<&FiberArena<u32>>,
            children: Vec<Element>,
        ) -> Result<(FiberArena<u32>, FiberId), &'static str> {
            self.generation += 1;
            let mut work = WorkCycle::new(RootId(0), self.generation);
            let root = work.arena.push(FiberInit {
                parent: None,
                tag: FiberTag::RootAnchor,
                kind: None,
                props: Rc::new(Props {
                    attrs: Attrs::new(),
                    children,
                }),
                pending_state: None,
                state_node: StateNode::Container(0),
                alternate: current.map(FiberArena::root),
                effect_tag: EffectTag::None,
            });
            let mut tracer = Tracer::none();
            let mut reconciler = Reconciler {
                host: &mut self.host,
                work: &mut work,
                current,
                instances: &mut self.instances,
                queue: &self.queue,
                tracer: &mut tracer,
            };
            let mut next = root;
            let done = loop {
                match reconciler.perform_unit_of_work(next)? {
                    Step::Next(fiber) => next = fiber,
                    Step::Done(root) => break root,
                }
            };
            assert_eq!(done, root);
            Ok((work.arena, root))
        }
    }

    fn el(tag: &str, children: Vec<Element>) -> Element {
        create_element(
            ElementKind::host(tag),
            None,
            children.into_iter().map(Into::into),
        )
        .unwrap()
    }

    fn committed(mut arena: FiberArena<u32>) -> FiberArena<u32> {
        arena.clear_effects();
        arena
    }

    #[test]
    fn fresh_tree_effects_are_child_before_parent() {
        let mut h = Harness::new();
        let (arena, root) = h.run(None, vec![el("div", vec![Element::text("hi")])]).unwrap();
        let div = arena.first_child(root).unwrap();
        let text = arena.first_child(div).unwrap();
        assert_eq!(
            arena.effects(root),
            [
                Effect {
                    fiber: text,
                    tag: EffectTag::Insert
                },
                Effect {
                    fiber: div,
                    tag: EffectTag::Insert
                },
            ]
        );
        assert_eq!(h.host.created, 2);
    }

    #[test]
    fn positional_replacement_is_one_delete_and_one_insert() {
        let mut h = Harness::new();
        let b = el("b", vec![]);
        let (old, old_root) = h.run(None, vec![el("a", vec![]), b.clone()]).unwrap();
        let old = committed(old);
        let old_a = old.first_child(old_root).unwrap();

        let (arena, root) = h.run(Some(&old), vec![el("c", vec![]), b]).unwrap();
        let c = arena.first_child(root).unwrap();
        assert_eq!(
            arena.effects(root),
            [
                Effect {
                    fiber: old_a,
                    tag: EffectTag::Delete
                },
                Effect {
                    fiber: c,
                    tag: EffectTag::Insert
                },
            ]
        );
        let reused_b = arena.next_sibling(c).unwrap();
        assert_eq!(arena.effect_tag(reused_b), EffectTag::None);
        assert_eq!(arena.state_node(reused_b), &StateNode::Host(2));
    }

    #[test]
    fn shrink_deletes_tail() {
        let mut h = Harness::new();
        let a = el("a", vec![]);
        let (old, old_root) = h
            .run(None, vec![a.clone(), el("b", vec![]), el("c", vec![])])
            .unwrap();
        let old = committed(old);
        let old_kids: Vec<_> = old.children(old_root).collect();

        let (arena, root) = h.run(Some(&old), vec![a]).unwrap();
        let tags: Vec<_> = arena.effects(root).iter().map(|e| (e.fiber, e.tag)).collect();
        assert_eq!(
            tags,
            [
                (old_kids[1], EffectTag::Delete),
                (old_kids[2], EffectTag::Delete)
            ]
        );
    }

    #[test]
    fn grow_inserts_one() {
        let mut h = Harness::new();
        let a = el("a", vec![]);
        let (old, _) = h.run(None, vec![a.clone()]).unwrap();
        let old = committed(old);

        let (arena, root) = h.run(Some(&old), vec![a, el("b", vec![])]).unwrap();
        let b = arena.children(root).nth(1).unwrap();
        assert_eq!(
            arena.effects(root),
            [Effect {
                fiber: b,
                tag: EffectTag::Insert
            }]
        );
    }

    #[test]
    fn attribute_change_tags_update_only_when_values_differ() {
        let mut h = Harness::new();
        let with = |v: &str| {
            create_element(ElementKind::host("p"), Some(attrs([("class", v)])), []).unwrap()
        };
        let (old, _) = h.run(None, vec![with("x")]).unwrap();
        let old = committed(old);

        // Equal by value, different allocation.
        let (same, root) = h.run(Some(&old), vec![with("x")]).unwrap();
        assert!(same.effects(root).is_empty());

        let (changed, root) = h.run(Some(&old), vec![with("y")]).unwrap();
        let p = changed.first_child(root).unwrap();
        assert_eq!(
            changed.effects(root),
            [Effect {
                fiber: p,
                tag: EffectTag::Update
            }]
        );
    }

    #[test]
    fn identical_props_clone_children_without_creating_nodes() {
        let mut h = Harness::new();
        let tree = el("ul", vec![el("li", vec![]), el("li", vec![])]);
        let (old, _) = h.run(None, vec![tree.clone()]).unwrap();
        let old = committed(old);
        let created = h.host.created;

        let (arena, root) = h.run(Some(&old), vec![tree]).unwrap();
        assert!(arena.effects(root).is_empty());
        assert_eq!(h.host.created, created);
        let ul = arena.first_child(root).unwrap();
        for li in arena.children(ul) {
            let alt = arena.alternate(li).unwrap();
            assert_eq!(arena.state_node(li), old.state_node(alt));
        }
    }

    #[derive(Default)]
    struct Greeting;

    impl Component for Greeting {
        fn render(&self, props: &Props, state: &Attrs) -> Element {
            let who = props.get("who").map(ToString::to_string).unwrap_or_default();
            let punct = state.get("punct").map(ToString::to_string).unwrap_or_default();
            el("h1", vec![Element::text(alloc::format!("hello {who}{punct}"))])
        }

        fn initial_state(&self, _props: &Props) -> Attrs {
            attrs([("punct", "!")])
        }
    }

    #[test]
    fn component_renders_single_child_with_initial_state() {
        let mut h = Harness::new();
        let greeting = create_element(
            ElementKind::Component(ComponentType::of::<Greeting>()),
            Some(attrs([("who", "sap")])),
            [],
        )
        .unwrap();
        let (arena, root) = h.run(None, vec![greeting]).unwrap();
        let comp = arena.first_child(root).unwrap();
        assert_eq!(arena.tag(comp), FiberTag::ComponentInstance);
        let h1 = arena.first_child(comp).unwrap();
        let text = arena.first_child(h1).unwrap();
        assert_eq!(
            arena.props(text).get(TEXT_VALUE),
            Some(&PropValue::from("hello sap!"))
        );
        assert_eq!(h.instances.len(), 1);
        // Component insert is recorded after its rendered subtree.
        assert_eq!(arena.effects(root).last().unwrap().fiber, comp);
    }

    #[test]
    fn host_error_propagates() {
        let mut h = Harness::new();
        h.host.fail_on = Some("bad");
        let err = h
            .run(None, vec![el("div", vec![el("bad", vec![])])])
            .unwrap_err();
        assert_eq!(err, "refused");
    }
}
