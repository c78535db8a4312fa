// Copyright 2026 the Sapwood Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless counter that exercises components, state updates, and sliced
//! rendering against the in-memory host.
//!
//! Each step prints the resulting markup. Trace events go to a
//! [`PrettyPrintSink`] on stderr and a [`RecorderSink`]; pass a path as the
//! first argument to export the recording as Chrome trace JSON.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use sapwood_backend_memory::{IdleDriver, MemoryHost, NodeId};
use sapwood_core::budget::UnitBudget;
use sapwood_core::component::{Component, ComponentHandle, ComponentType};
use sapwood_core::element::{
    Attrs, Child, Element, ElementKind, PropValue, Props, attrs, create_element,
};
use sapwood_core::scheduler::{Scheduler, SliceResult};
use sapwood_core::trace::{
    CommitEvent, EffectAppliedEvent, SliceBeginEvent, SliceEndEvent, TraceSink, Tracer,
    UnitBeginEvent, UnitCompleteEvent, UpdateDequeuedEvent,
};
use sapwood_debug::pretty::PrettyPrintSink;
use sapwood_debug::recorder::RecorderSink;

type Slot = Rc<RefCell<Option<ComponentHandle>>>;

/// A button showing a click count, followed by one list item per click.
struct Counter {
    handle: Slot,
}

fn count_of(state: &Attrs) -> i64 {
    match state.get("count") {
        Some(PropValue::Int(n)) => *n,
        _ => 0,
    }
}

impl Component for Counter {
    fn render(&self, props: &Props, state: &Attrs) -> Element {
        let count = count_of(state);
        let label = props.get("label").cloned().unwrap_or_else(|| "clicks".into());
        let items: Vec<Child> = (0..count)
            .map(|i| Child::from(item(&format!("click #{}", i + 1))))
            .collect();
        element(
            "div",
            Some(attrs([("class", "counter")])),
            vec![
                element(
                    "button",
                    Some(attrs([("aria-label", label)])),
                    vec![Child::Int(count)],
                )
                .into(),
                element("ul", None, vec![Child::List(items)]).into(),
            ],
        )
    }

    fn initial_state(&self, props: &Props) -> Attrs {
        let start = props.get("start").cloned().unwrap_or(PropValue::Int(0));
        attrs([("count", start)])
    }

    fn attach(&mut self, handle: ComponentHandle) {
        *self.handle.borrow_mut() = Some(handle);
    }
}

fn element(tag: &str, attributes: Option<Attrs>, children: Vec<Child>) -> Element {
    match create_element(ElementKind::host(tag), attributes, children) {
        Ok(element) => element,
        Err(e) => panic!("invalid demo element <{tag}>: {e}"),
    }
}

fn item(text: &str) -> Element {
    element("li", None, vec![text.into()])
}

/// Forwards every event to two sinks.
struct Tee<'a> {
    a: &'a mut dyn TraceSink,
    b: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_update_dequeued(&mut self, e: &UpdateDequeuedEvent) {
        self.a.on_update_dequeued(e);
        self.b.on_update_dequeued(e);
    }

    fn on_slice_begin(&mut self, e: &SliceBeginEvent) {
        self.a.on_slice_begin(e);
        self.b.on_slice_begin(e);
    }

    fn on_slice_end(&mut self, e: &SliceEndEvent) {
        self.a.on_slice_end(e);
        self.b.on_slice_end(e);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.a.on_commit(e);
        self.b.on_commit(e);
    }

    fn on_unit_begin(&mut self, e: &UnitBeginEvent) {
        self.a.on_unit_begin(e);
        self.b.on_unit_begin(e);
    }

    fn on_unit_complete(&mut self, e: &UnitCompleteEvent) {
        self.a.on_unit_complete(e);
        self.b.on_unit_complete(e);
    }

    fn on_effect_applied(&mut self, e: &EffectAppliedEvent) {
        self.a.on_effect_applied(e);
        self.b.on_effect_applied(e);
    }
}

struct App {
    host: MemoryHost,
    scheduler: Scheduler<NodeId>,
    container: NodeId,
    driver: IdleDriver,
    pretty: PrettyPrintSink,
    recorder: RecorderSink,
}

impl App {
    /// Drains the queue with wall-clock slices.
    fn settle(&mut self, step: &str) {
        loop {
            let mut tee = Tee {
                a: &mut self.pretty,
                b: &mut self.recorder,
            };
            let result = self.driver.run_slice_traced(
                &mut self.scheduler,
                &mut self.host,
                &mut Tracer::new(&mut tee),
            );
            match result {
                Ok(SliceResult::Idle) => break,
                Ok(SliceResult::Continue) => {}
                Err(e) => eprintln!("update dropped: {e}"),
            }
        }
        println!("{step}: {}", self.host.inner_html(self.container));
    }
}

fn main() {
    let mut host = MemoryHost::new();
    let container = host.create_container("body");
    let mut scheduler = Scheduler::default();
    let root = scheduler.create_root(container);
    let mut app = App {
        host,
        scheduler,
        container,
        driver: IdleDriver::new(),
        pretty: PrettyPrintSink::stderr(),
        recorder: RecorderSink::new(),
    };

    let handle: Slot = Rc::default();
    let counter_type = {
        let handle = Rc::clone(&handle);
        ComponentType::with_constructor(move || Counter {
            handle: Rc::clone(&handle),
        })
    };
    let counter = |label: &str| -> Element {
        match create_element(
            ElementKind::Component(counter_type.clone()),
            Some(attrs([("label", label)])),
            [],
        ) {
            Ok(element) => element,
            Err(e) => panic!("invalid counter element: {e}"),
        }
    };

    app.scheduler.render(
        root,
        [element("h1", None, vec!["Counter".into()]), counter("clicks")],
    );
    app.settle("mount");

    let Some(handle) = handle.borrow().clone() else {
        panic!("counter was never attached");
    };
    for _ in 0..3 {
        let count = app
            .scheduler
            .instance_state(handle.instance())
            .map_or(0, count_of);
        handle.set_state(attrs([("count", count + 1)]));
        app.settle("click");
    }

    // Relabel through a root render; the instance and its state survive.
    app.scheduler.render(
        root,
        [element("h1", None, vec!["Counter".into()]), counter("taps")],
    );
    app.settle("relabel");

    // Interrupt a large update between every unit: the host only changes on
    // the final slice.
    let many: Vec<Child> = (0..50)
        .map(|i| Child::from(item(&format!("row {i}"))))
        .collect();
    app.scheduler
        .render(root, [element("ol", None, vec![Child::List(many)])]);
    app.host.take_log();
    let mut slices = 1;
    while app
        .scheduler
        .run_slice(&mut app.host, UnitBudget::new(1))
        .is_ok_and(|r| r == SliceResult::Continue)
    {
        assert!(app.host.log().is_empty(), "host changed mid-cycle");
        slices += 1;
    }
    println!(
        "replace: {slices} slices, {} mutations, counter mounted: {}",
        app.host.take_log().len(),
        app.scheduler.is_mounted(handle.instance()),
    );

    if let Some(path) = std::env::args().nth(1) {
        let written = File::create(&path).and_then(|file| {
            sapwood_debug::chrome::export(app.recorder.as_bytes(), &mut BufWriter::new(file))
        });
        match written {
            Ok(()) => println!("wrote Chrome trace to {path}"),
            Err(e) => eprintln!("could not write {path}: {e}"),
        }
    }
}
