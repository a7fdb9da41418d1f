//! Behavioral tests of the runtime against the in-memory host.
//!
//! The component used throughout is a to-do list row: a label that switches the row into edit
//! mode on double click, and an input that only exists while editing. Edit mode is component
//! state, so it is what restore has to carry across renders.

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use proptest::prelude::*;

use crate::{
    Component, ComponentId, Element, Error, Event, Handler, Host, HostId, HostOp,
    InvariantViolation, Item, LifecycleCx, ListenerOptions, Markup, MemoryHost, Node, NodeRef,
    PropValue, RenderError, RenderResult, Runtime, RuntimeConfig, Scope, component,
    config::FlushMode, markup, markup::SVG_NAMESPACE, tag, text,
};

// ============================================================================
// Test Infrastructure
// ============================================================================

fn runtime() -> (Runtime<MemoryHost>, HostId) {
    let mut host = MemoryHost::new();
    let container = host.create_element("main", None);
    (Runtime::new(host), container)
}

fn deferred_runtime() -> (Runtime<MemoryHost>, HostId) {
    let mut host = MemoryHost::new();
    let container = host.create_element("main", None);
    let config = RuntimeConfig::new().flush_mode(FlushMode::Deferred);
    (Runtime::with_config(host, config), container)
}

fn class(name: &str) -> Markup {
    Markup::class(name, true).unwrap()
}

fn on(event: &str, handler: Handler) -> Markup {
    Markup::listener(event, ListenerOptions::default(), handler).unwrap()
}

fn count(log: &[HostOp], predicate: impl Fn(&HostOp) -> bool) -> usize {
    log.iter().filter(|op| predicate(op)).count()
}

fn has_class(runtime: &Runtime<MemoryHost>, node: HostId, name: &str) -> bool {
    runtime
        .host()
        .element(node)
        .is_some_and(|element| element.classes.contains(name))
}

/// Shared record of lifecycle events.
#[derive(Clone, Default)]
struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    fn note(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| *e == entry).count()
    }

    fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

const EDIT_FIELD: &str = "edit-field";

struct ItemView {
    title: String,
    editing: bool,
    journal: Journal,
}

impl ItemView {
    fn new(title: &str, journal: &Journal) -> Self {
        Self {
            title: title.to_owned(),
            editing: false,
            journal: journal.clone(),
        }
    }
}

impl Component for ItemView {
    fn render(&self, scope: &Scope<Self>) -> RenderResult {
        self.journal.note(format!("render {}", self.title));
        let field = scope.node_ref(EDIT_FIELD);
        Ok(tag(
            "li",
            markup![
                Markup::class("editing", self.editing).unwrap(),
                tag(
                    "label",
                    markup![
                        on(
                            "dblclick",
                            scope.handler(move |this, _event, cx| {
                                this.editing = true;
                                cx.rerender();
                                cx.focus(field);
                            }),
                        ),
                        text(self.title.clone()),
                    ],
                ),
                self.editing.then(|| {
                    tag(
                        "input",
                        markup![
                            Markup::property("value", self.title.as_str()).unwrap(),
                            field,
                            on(
                                "blur",
                                scope.handler(|this, _event, cx| {
                                    this.editing = false;
                                    cx.rerender();
                                }),
                            ),
                        ],
                    )
                }),
            ],
        ))
    }

    fn restore(&mut self, previous: &Self) {
        self.editing = previous.editing;
    }

    fn mount(&mut self, _cx: &mut LifecycleCx<'_>) {
        self.journal.note(format!("mount {}", self.title));
    }

    fn unmount(&mut self) {
        self.journal.note(format!("unmount {}", self.title));
    }
}

fn todo_list(items: &[(u32, &str)], journal: &Journal) -> Node {
    tag(
        "ul",
        items
            .iter()
            .map(|&(id, title)| Item::from(component(ItemView::new(title, journal)).with_key(id))),
    )
}

fn start_editing(runtime: &mut Runtime<MemoryHost>, row: HostId) {
    let label = runtime.host().find_by_tag(row, "label")[0];
    runtime.simulate(label, &Event::new("dblclick")).unwrap();
}

// ============================================================================
// Mount and Patch
// ============================================================================

#[test]
fn mount_builds_the_described_tree() {
    let (mut runtime, container) = runtime();
    runtime
        .render_into(
            container,
            tag(
                "ul",
                markup![
                    class("todo-list"),
                    tag("li", markup![text("milk")]),
                    None::<Node>,
                    tag("li", markup![text("eggs")]),
                ],
            ),
        )
        .unwrap();

    let host = runtime.host();
    let list = host.children(container)[0];
    assert_eq!(host.element(list).unwrap().tag, "ul");
    assert!(has_class(&runtime, list, "todo-list"));
    // The hole keeps its position without producing a node.
    assert_eq!(host.children(list).len(), 2);
    assert_eq!(host.text_content(container), "milkeggs");
}

#[test]
fn text_is_only_written_when_it_changes() {
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(container, tag("p", markup![text("a")]))
        .unwrap();
    runtime.host_mut().clear_log();

    runtime.update(&mount, tag("p", markup![text("a")])).unwrap();
    assert!(runtime.host().log().is_empty());

    runtime.update(&mount, tag("p", markup![text("b")])).unwrap();
    let log = runtime.host_mut().take_log();
    assert_eq!(count(&log, |op| matches!(op, HostOp::SetText { .. })), 1);
    assert_eq!(count(&log, HostOp::is_create), 0);
    assert_eq!(runtime.host().text_content(container), "b");
}

#[test]
fn markup_is_diffed_in_place() {
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(
            container,
            tag(
                "div",
                markup![
                    class("a"),
                    class("b"),
                    Markup::attribute("title", "old").unwrap(),
                    Markup::style("margin", "0px").unwrap(),
                ],
            ),
        )
        .unwrap();
    let div = runtime.host().children(container)[0];
    runtime.host_mut().clear_log();

    runtime
        .update(
            &mount,
            tag(
                "div",
                markup![class("a"), Markup::attribute("title", "new").unwrap()],
            ),
        )
        .unwrap();

    let element = runtime.host().element(div).unwrap();
    assert_eq!(element.classes.iter().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(element.attributes.get("title").map(String::as_str), Some("new"));
    assert!(element.styles.is_empty());
    let log = runtime.host_mut().take_log();
    assert_eq!(count(&log, HostOp::is_create), 0);
    // Removed class, removed style, changed attribute.
    assert_eq!(count(&log, |op| matches!(op, HostOp::Markup { .. })), 3);
}

#[test]
fn different_tags_are_replaced() {
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(container, tag("div", markup![text("x")]))
        .unwrap();
    let old = runtime.host().children(container)[0];

    runtime
        .update(&mount, tag("span", markup![text("x")]))
        .unwrap();

    let new = runtime.host().children(container)[0];
    assert_ne!(old, new);
    assert!(runtime.host().is_released(old));
    assert_eq!(runtime.host().element(new).unwrap().tag, "span");
    assert!(runtime.host().violations().is_empty());
}

#[test]
fn namespace_changes_force_a_replace() {
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(
            container,
            tag("svg", markup![Markup::namespace(SVG_NAMESPACE).unwrap()]),
        )
        .unwrap();
    let svg = runtime.host().children(container)[0];
    assert_eq!(
        runtime.host().element(svg).unwrap().namespace.as_deref(),
        Some(SVG_NAMESPACE)
    );

    runtime.update(&mount, tag("svg", [])).unwrap();

    let replaced = runtime.host().children(container)[0];
    assert_ne!(svg, replaced);
    assert_eq!(runtime.host().element(replaced).unwrap().namespace, None);
}

#[test]
fn adopted_nodes_are_detached_but_never_released() {
    let (mut runtime, container) = runtime();
    let canvas = runtime.host_mut().create_element("canvas", None);
    let mut embedded = Element::adopt("canvas", canvas);
    embedded.push(class("embedded").into());

    let mount = runtime
        .render_into(container, tag("div", markup![Node::from(embedded)]))
        .unwrap();
    let div = runtime.host().children(container)[0];
    assert_eq!(runtime.host().children(div), &[canvas]);
    assert!(has_class(&runtime, canvas, "embedded"));

    runtime.teardown(mount).unwrap();
    assert!(!runtime.host().is_released(canvas));
    assert!(runtime.host().is_released(div));
    assert_eq!(runtime.host().parent(canvas), None);
    assert!(runtime.host().violations().is_empty());
}

// ============================================================================
// Keyed Children
// ============================================================================

#[test]
fn keyed_swap_reuses_nodes_and_keeps_edit_state() {
    let journal = Journal::default();
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(container, todo_list(&[(1, "A"), (2, "B")], &journal))
        .unwrap();
    let before = runtime.host().find_by_tag(container, "li");
    start_editing(&mut runtime, before[0]);
    assert!(has_class(&runtime, before[0], "editing"));
    runtime.host_mut().clear_log();

    runtime
        .update(&mount, todo_list(&[(2, "B"), (1, "A")], &journal))
        .unwrap();

    let log = runtime.host_mut().take_log();
    let after = runtime.host().find_by_tag(container, "li");
    assert_eq!(after, vec![before[1], before[0]]);
    assert_eq!(count(&log, HostOp::is_create), 0);
    assert_eq!(count(&log, HostOp::is_release), 0);
    assert_eq!(count(&log, HostOp::is_move), 1);
    assert!(has_class(&runtime, before[0], "editing"));
    assert!(!has_class(&runtime, before[1], "editing"));
    assert_eq!(journal.count("mount A"), 1);
}

#[test]
fn keyed_reverse_moves_without_rebuilding() {
    let (mut runtime, container) = runtime();
    let list = |order: &[u32]| {
        tag(
            "ol",
            order.iter().map(|&id| {
                Item::from(tag("li", markup![text(id.to_string())]).with_key(id))
            }),
        )
    };
    let mount = runtime
        .render_into(container, list(&[1, 2, 3, 4, 5]))
        .unwrap();
    let before = runtime.host().find_by_tag(container, "li");
    runtime.host_mut().clear_log();

    runtime.update(&mount, list(&[5, 4, 3, 2, 1])).unwrap();

    let log = runtime.host_mut().take_log();
    let after = runtime.host().find_by_tag(container, "li");
    assert_eq!(after, before.iter().rev().copied().collect::<Vec<_>>());
    assert_eq!(count(&log, HostOp::is_create), 0);
    assert_eq!(count(&log, HostOp::is_release), 0);
    // One node of the reversed run stays in place.
    assert_eq!(count(&log, HostOp::is_move), 4);
    assert_eq!(runtime.host().text_content(container), "54321");
}

#[test]
fn keyed_children_match_before_unkeyed_ones() {
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(
            container,
            tag(
                "div",
                markup![
                    tag("p", markup![text("loose")]),
                    tag("p", markup![text("pinned")]).with_key("pinned"),
                ],
            ),
        )
        .unwrap();
    let before = runtime.host().find_by_tag(container, "p");
    let (loose, pinned) = (before[0], before[1]);

    runtime
        .update(
            &mount,
            tag(
                "div",
                markup![
                    tag("p", markup![text("pinned")]).with_key("pinned"),
                    tag("p", markup![text("loose")]),
                ],
            ),
        )
        .unwrap();

    // The keyed paragraph follows its key; position 1 is unkeyed now but the old child at
    // position 1 was keyed, so the unkeyed paragraph gets a fresh node.
    let after = runtime.host().find_by_tag(container, "p");
    assert_eq!(after[0], pinned);
    assert_ne!(after[1], loose);
    assert!(runtime.host().is_released(loose));
    assert_eq!(runtime.host().text_content(container), "pinnedloose");
}

#[test]
fn same_key_with_a_different_kind_is_replaced() {
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(
            container,
            tag("ul", markup![tag("li", []).with_key(7)]),
        )
        .unwrap();
    let old = runtime.host().find_by_tag(container, "li")[0];

    runtime
        .update(&mount, tag("ul", markup![text("seven").with_key(7)]))
        .unwrap();

    assert!(runtime.host().is_released(old));
    assert_eq!(runtime.host().text_content(container), "seven");
}

// ============================================================================
// Component State
// ============================================================================

#[test]
fn edit_mode_survives_a_parent_render() {
    let journal = Journal::default();
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(container, todo_list(&[(1, "A"), (2, "B")], &journal))
        .unwrap();
    let row = runtime.host().find_by_tag(container, "li")[0];
    start_editing(&mut runtime, row);

    runtime
        .update(&mount, todo_list(&[(1, "A (renamed)"), (2, "B")], &journal))
        .unwrap();

    assert!(has_class(&runtime, row, "editing"));
    let input = runtime.host().find_by_tag(row, "input")[0];
    assert_eq!(
        runtime.host().element(input).unwrap().properties.get("value"),
        Some(&PropValue::from("A (renamed)"))
    );
    assert_eq!(runtime.host().text_content(row), "A (renamed)");
    assert_eq!(journal.count("mount A (renamed)"), 0);
}

#[test]
fn changing_the_component_kind_discards_state() {
    struct Placeholder;

    impl Component for Placeholder {
        fn render(&self, _scope: &Scope<Self>) -> RenderResult {
            Ok(tag("li", markup![text("...")]))
        }
    }

    let journal = Journal::default();
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(container, todo_list(&[(1, "A")], &journal))
        .unwrap();
    let row = runtime.host().find_by_tag(container, "li")[0];
    start_editing(&mut runtime, row);

    runtime
        .update(
            &mount,
            tag("ul", markup![component(Placeholder).with_key(1)]),
        )
        .unwrap();
    assert_eq!(journal.count("unmount A"), 1);

    runtime
        .update(&mount, todo_list(&[(1, "A")], &journal))
        .unwrap();
    let row = runtime.host().find_by_tag(container, "li")[0];
    assert!(!has_class(&runtime, row, "editing"));
    assert_eq!(journal.count("mount A"), 2);
}

#[test]
fn lifecycle_hooks_run_once_per_slot() {
    let journal = Journal::default();
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(container, todo_list(&[(1, "A"), (2, "B")], &journal))
        .unwrap();
    for _ in 0..3 {
        runtime
            .update(&mount, todo_list(&[(1, "A"), (2, "B")], &journal))
            .unwrap();
    }
    assert_eq!(journal.count("mount A"), 1);
    assert_eq!(journal.count("mount B"), 1);
    assert_eq!(journal.count("render A"), 4);
    assert_eq!(runtime.component_count(), 2);

    runtime.teardown(mount).unwrap();
    assert_eq!(journal.count("unmount A"), 1);
    assert_eq!(journal.count("unmount B"), 1);
    assert_eq!(runtime.component_count(), 0);
    assert!(runtime.host().children(container).is_empty());
    assert_eq!(runtime.host().live_count(), 1);
    assert!(runtime.host().violations().is_empty());
}

#[test]
fn should_rerender_can_skip_unchanged_props() {
    struct Badge {
        count: u32,
        journal: Journal,
    }

    impl Component for Badge {
        fn render(&self, _scope: &Scope<Self>) -> RenderResult {
            self.journal.note("render badge");
            Ok(tag("span", markup![text(self.count.to_string())]))
        }

        fn should_rerender(&self, previous: &Self) -> bool {
            self.count != previous.count
        }
    }

    let journal = Journal::default();
    let badge = |count| {
        component(Badge {
            count,
            journal: journal.clone(),
        })
    };
    let (mut runtime, container) = runtime();
    let mount = runtime.render_into(container, badge(1)).unwrap();
    runtime.update(&mount, badge(1)).unwrap();
    assert_eq!(journal.count("render badge"), 1);

    runtime.update(&mount, badge(2)).unwrap();
    assert_eq!(journal.count("render badge"), 2);
    assert_eq!(runtime.host().text_content(container), "2");
}

#[test]
fn conditional_holes_do_not_disturb_siblings() {
    let journal = Journal::default();
    let row = |middle: bool| {
        tag(
            "div",
            markup![
                component(ItemView::new("first", &journal)),
                middle.then(|| text("middle")),
                component(ItemView::new("last", &journal)),
            ],
        )
    };
    let (mut runtime, container) = runtime();
    let mount = runtime.render_into(container, row(false)).unwrap();
    let rows = runtime.host().find_by_tag(container, "li");
    start_editing(&mut runtime, rows[1]);
    runtime.host_mut().clear_log();

    runtime.update(&mount, row(true)).unwrap();

    let log = runtime.host_mut().take_log();
    assert_eq!(runtime.host().find_by_tag(container, "li"), rows);
    assert_eq!(count(&log, HostOp::is_create), 1);
    assert_eq!(count(&log, HostOp::is_release), 0);
    assert!(has_class(&runtime, rows[1], "editing"));
    assert_eq!(runtime.host().text_content(container), "firstmiddlelast");

    runtime.update(&mount, row(false)).unwrap();
    assert_eq!(runtime.host().find_by_tag(container, "li"), rows);
    assert!(has_class(&runtime, rows[1], "editing"));
    assert_eq!(journal.count("mount last"), 1);
}

// ============================================================================
// Render Failures
// ============================================================================

struct Flaky {
    fail: bool,
    label: &'static str,
}

impl Component for Flaky {
    fn render(&self, _scope: &Scope<Self>) -> RenderResult {
        if self.fail {
            return Err(RenderError::new("boom"));
        }
        Ok(tag("p", markup![text(self.label)]))
    }
}

fn flaky_page(fail: bool, label: &'static str, sibling: &str) -> Node {
    tag(
        "div",
        markup![
            component(Flaky { fail, label }),
            tag("span", markup![text(sibling.to_owned())]),
        ],
    )
}

#[test]
fn failed_render_keeps_previous_output_and_updates_siblings() {
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(container, flaky_page(false, "one", "sibling v1"))
        .unwrap();
    let paragraph = runtime.host().find_by_tag(container, "p")[0];

    let error = runtime
        .update(&mount, flaky_page(true, "two", "sibling v2"))
        .unwrap_err();

    let failures = error.render_failures().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures.failures()[0].type_name.ends_with("Flaky"));
    assert_eq!(failures.failures()[0].error.message(), "boom");
    assert_eq!(runtime.host().text_content(container), "onesibling v2");
    assert_eq!(runtime.host().find_by_tag(container, "p"), vec![paragraph]);

    runtime
        .update(&mount, flaky_page(false, "three", "sibling v2"))
        .unwrap();
    assert_eq!(runtime.host().text_content(container), "threesibling v2");
}

#[test]
fn failed_first_render_mounts_nothing() {
    let (mut runtime, container) = runtime();
    let error = runtime
        .render_into(container, flaky_page(true, "one", "sibling"))
        .unwrap_err();

    assert!(matches!(error, Error::Render(_)));
    assert!(runtime.host().children(container).is_empty());
    assert_eq!(runtime.component_count(), 0);
    assert!(runtime.host().violations().is_empty());
}

#[test]
fn attached_trees_keep_partial_output() {
    let (mut runtime, container) = runtime();
    let mount = runtime.attach(container).unwrap();
    assert!(runtime
        .update(&mount, flaky_page(true, "one", "sibling"))
        .is_err());
    assert_eq!(runtime.host().text_content(container), "sibling");

    runtime
        .update(&mount, flaky_page(false, "one", "sibling"))
        .unwrap();
    assert_eq!(runtime.host().text_content(container), "onesibling");
}

/// A form whose submit handler breaks its own next render.
struct BrokenForm {
    broken: bool,
}

impl Component for BrokenForm {
    fn render(&self, scope: &Scope<Self>) -> RenderResult {
        if self.broken {
            return Err(RenderError::new("cannot render a broken form"));
        }
        let options = ListenerOptions {
            prevent_default: true,
            stop_propagation: true,
            ..ListenerOptions::default()
        };
        Ok(tag(
            "form",
            markup![
                Markup::listener(
                    "submit",
                    options,
                    scope.handler(|this, _event, cx| {
                        this.broken = true;
                        cx.rerender();
                    }),
                )
                .unwrap(),
                tag("input", markup![]),
                text("ready"),
            ],
        ))
    }
}

#[test]
fn listener_options_survive_a_failed_rerender() {
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(container, component(BrokenForm { broken: false }))
        .unwrap();
    let id = runtime.root_component(&mount).unwrap();
    let form = runtime.host().find_by_tag(container, "form")[0];
    runtime.host_mut().clear_log();

    let outcome = runtime.dispatch(form, &Event::new("submit")).unwrap();

    assert!(outcome.handled);
    assert!(outcome.prevent_default);
    assert!(outcome.stop_propagation);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures.failures()[0].component, id);
    assert!(runtime.host_mut().take_log().is_empty());
    assert_eq!(runtime.host().find_by_tag(container, "form"), vec![form]);
    assert_eq!(runtime.host().text_content(container), "ready");
    assert!(matches!(outcome.into_result(), Err(Error::Render(_))));
}

#[test]
fn bubbling_reports_options_and_failures_together() {
    let (mut runtime, container) = runtime();
    runtime
        .render_into(container, component(BrokenForm { broken: false }))
        .unwrap();
    let input = runtime.host().find_by_tag(container, "input")[0];

    let outcome = runtime.simulate(input, &Event::new("submit")).unwrap();

    assert!(outcome.prevent_default);
    assert!(outcome.stop_propagation);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(runtime.host().text_content(container), "ready");
}

#[test]
fn failed_scheduled_render_is_reported_once_and_not_retried() {
    let (mut runtime, container) = deferred_runtime();
    let mount = runtime
        .render_into(container, component(BrokenForm { broken: false }))
        .unwrap();
    let id = runtime.root_component(&mount).unwrap();
    let form = runtime.host().find_by_tag(container, "form")[0];
    let input = runtime.host().find_by_tag(container, "input")[0];

    let outcome = runtime.dispatch(form, &Event::new("submit")).unwrap();
    assert!(outcome.failures.is_empty());
    assert_eq!(runtime.pending_renders(), 1);
    runtime.host_mut().clear_log();

    let Err(Error::Render(failures)) = runtime.flush() else {
        panic!("flush should report the failed render");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures.failures()[0].component, id);
    assert_eq!(runtime.pending_renders(), 0);
    assert!(runtime.host_mut().take_log().is_empty());
    assert_eq!(runtime.host().find_by_tag(container, "form"), vec![form]);
    assert_eq!(runtime.host().find_by_tag(container, "input"), vec![input]);
    assert_eq!(runtime.host().text_content(container), "ready");

    runtime.flush().unwrap();
    assert!(runtime.host().violations().is_empty());
}

// ============================================================================
// Scheduling
// ============================================================================

struct Counter {
    clicks: u32,
    journal: Journal,
}

impl Component for Counter {
    fn render(&self, scope: &Scope<Self>) -> RenderResult {
        self.journal.note("render counter");
        Ok(tag(
            "button",
            markup![
                on(
                    "click",
                    scope.handler(|this, _event, cx| {
                        this.clicks += 1;
                        cx.rerender();
                    }),
                ),
                text(self.clicks.to_string()),
            ],
        ))
    }

    fn restore(&mut self, previous: &Self) {
        self.clicks = previous.clicks;
    }
}

#[test]
fn immediate_mode_flushes_before_dispatch_returns() {
    let journal = Journal::default();
    let (mut runtime, container) = runtime();
    runtime
        .render_into(
            container,
            component(Counter {
                clicks: 0,
                journal: journal.clone(),
            }),
        )
        .unwrap();
    let button = runtime.host().children(container)[0];

    let outcome = runtime.dispatch(button, &Event::new("click")).unwrap();

    assert!(outcome.handled);
    assert_eq!(runtime.host().text_content(container), "1");
    assert_eq!(runtime.pending_renders(), 0);
}

#[test]
fn requests_coalesce_until_the_next_flush() {
    let journal = Journal::default();
    let (mut runtime, container) = deferred_runtime();
    runtime
        .render_into(
            container,
            component(Counter {
                clicks: 0,
                journal: journal.clone(),
            }),
        )
        .unwrap();
    let button = runtime.host().children(container)[0];
    journal.clear();

    runtime.dispatch(button, &Event::new("click")).unwrap();
    runtime.dispatch(button, &Event::new("click")).unwrap();
    assert_eq!(runtime.pending_renders(), 1);
    assert_eq!(journal.count("render counter"), 0);
    assert_eq!(runtime.host().text_content(container), "0");

    runtime.flush().unwrap();
    assert_eq!(journal.count("render counter"), 1);
    assert_eq!(runtime.host().text_content(container), "2");
}

#[test]
fn parent_renders_first_and_children_render_once() {
    struct Shell {
        journal: Journal,
    }

    impl Component for Shell {
        fn render(&self, _scope: &Scope<Self>) -> RenderResult {
            self.journal.note("render shell");
            Ok(tag(
                "section",
                markup![component(Counter {
                    clicks: 0,
                    journal: self.journal.clone(),
                })],
            ))
        }
    }

    let journal = Journal::default();
    let (mut runtime, container) = deferred_runtime();
    let mount = runtime
        .render_into(
            container,
            component(Shell {
                journal: journal.clone(),
            }),
        )
        .unwrap();
    let shell = runtime.root_component(&mount).unwrap();
    let button = runtime.host().find_by_tag(container, "button")[0];
    journal.clear();

    runtime.dispatch(button, &Event::new("click")).unwrap();
    runtime.rerender(shell);
    assert_eq!(runtime.pending_renders(), 2);
    runtime.flush().unwrap();

    assert_eq!(journal.count("render shell"), 1);
    assert_eq!(journal.count("render counter"), 1);
    assert_eq!(runtime.host().text_content(container), "1");
}

#[test]
fn runaway_render_requests_hit_the_flush_limit() {
    struct Looper {
        generation: Cell<u32>,
    }

    struct Echo {
        parent: ComponentId,
    }

    impl Component for Looper {
        fn render(&self, scope: &Scope<Self>) -> RenderResult {
            let generation = self.generation.get() + 1;
            self.generation.set(generation);
            Ok(tag(
                "div",
                markup![component(Echo { parent: scope.id() }).with_key(generation)],
            ))
        }
    }

    impl Component for Echo {
        fn render(&self, _scope: &Scope<Self>) -> RenderResult {
            Ok(Node::Hole)
        }

        fn mount(&mut self, cx: &mut LifecycleCx<'_>) {
            cx.rerender_component(self.parent);
        }
    }

    let mut host = MemoryHost::new();
    let container = host.create_element("main", None);
    let mut runtime = Runtime::with_config(host, RuntimeConfig::new().max_flush_rounds(3));
    let mount = runtime.attach(container).unwrap();

    let error = runtime
        .update(
            &mount,
            component(Looper {
                generation: Cell::new(0),
            }),
        )
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Invariant(InvariantViolation::FlushLimit(3))
    ));
    assert_eq!(runtime.pending_renders(), 1);
    assert!(!matches!(runtime.flush(), Err(Error::Poisoned)));
}

#[test]
fn mounts_from_another_runtime_are_rejected() {
    let (mut first, container) = runtime();
    let mount = first.render_into(container, text("x")).unwrap();
    let (mut second, _) = runtime();

    assert!(matches!(
        second.update(&mount, text("y")),
        Err(Error::Invariant(InvariantViolation::UnknownMount(_)))
    ));
    assert!(second.flush().is_ok());
}

// ============================================================================
// Events and Effects
// ============================================================================

#[test]
fn focus_is_applied_after_the_flush() {
    let journal = Journal::default();
    let (mut runtime, container) = runtime();
    runtime
        .render_into(container, todo_list(&[(1, "A")], &journal))
        .unwrap();
    let row = runtime.host().find_by_tag(container, "li")[0];

    start_editing(&mut runtime, row);

    let input = runtime.host().find_by_tag(row, "input")[0];
    assert_eq!(runtime.host().focused(), Some(input));

    runtime.simulate(input, &Event::new("blur")).unwrap();
    assert!(runtime.host().find_by_tag(row, "input").is_empty());
    assert_eq!(runtime.host().focused(), None);
}

#[test]
fn node_refs_resolve_while_mounted() {
    let search = NodeRef::new("search");
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(container, tag("div", markup![tag("input", markup![search])]))
        .unwrap();
    let input = runtime.host().find_by_tag(container, "input")[0];
    assert_eq!(runtime.resolve(search), Some(input));

    runtime.update(&mount, tag("div", [])).unwrap();
    assert_eq!(runtime.resolve(search), None);
}

#[test]
fn events_bubble_until_stopped() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let record = |name: &'static str| {
        let order = Rc::clone(&order);
        Handler::free(move |_event, _cx| order.borrow_mut().push(name))
    };
    let page = |stop: bool, capture: bool| {
        tag(
            "div",
            markup![
                Markup::listener(
                    "click",
                    ListenerOptions {
                        capture,
                        ..ListenerOptions::default()
                    },
                    record("outer"),
                )
                .unwrap(),
                tag(
                    "button",
                    markup![Markup::listener(
                        "click",
                        ListenerOptions {
                            stop_propagation: stop,
                            prevent_default: true,
                            ..ListenerOptions::default()
                        },
                        record("inner"),
                    )
                    .unwrap()],
                ),
            ],
        )
    };

    let (mut runtime, container) = runtime();
    let mount = runtime.render_into(container, page(false, false)).unwrap();
    let button = runtime.host().find_by_tag(container, "button")[0];
    let outcome = runtime.simulate(button, &Event::new("click")).unwrap();
    assert_eq!(*order.borrow(), vec!["inner", "outer"]);
    assert!(outcome.prevent_default);

    order.borrow_mut().clear();
    runtime.update(&mount, page(true, false)).unwrap();
    let outcome = runtime.simulate(button, &Event::new("click")).unwrap();
    assert_eq!(*order.borrow(), vec!["inner"]);
    assert!(outcome.stop_propagation);

    order.borrow_mut().clear();
    runtime.update(&mount, page(true, true)).unwrap();
    runtime.simulate(button, &Event::new("click")).unwrap();
    assert_eq!(*order.borrow(), vec!["outer", "inner"]);
}

#[test]
fn swapping_handlers_does_not_touch_the_host() {
    let hits = Rc::new(Cell::new(0));
    let adder = |amount: u32| {
        let hits = Rc::clone(&hits);
        Handler::free(move |_event, _cx| hits.set(hits.get() + amount))
    };
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(container, tag("button", markup![on("click", adder(1))]))
        .unwrap();
    let button = runtime.host().children(container)[0];
    runtime.host_mut().clear_log();

    runtime
        .update(&mount, tag("button", markup![on("click", adder(10))]))
        .unwrap();
    assert!(runtime.host().log().is_empty());

    runtime.dispatch(button, &Event::new("click")).unwrap();
    assert_eq!(hits.get(), 10);

    runtime.update(&mount, tag("button", [])).unwrap();
    let log = runtime.host_mut().take_log();
    assert_eq!(count(&log, |op| matches!(op, HostOp::Unlisten { .. })), 1);
    assert!(!runtime.dispatch(button, &Event::new("click")).unwrap().handled);
}

#[test]
fn teardown_drops_every_listener() {
    let journal = Journal::default();
    let (mut runtime, container) = runtime();
    let mount = runtime
        .render_into(container, todo_list(&[(1, "A"), (2, "B")], &journal))
        .unwrap();
    runtime.host_mut().clear_log();

    runtime.teardown(mount).unwrap();

    let log = runtime.host_mut().take_log();
    let listens = count(&log, |op| matches!(op, HostOp::Unlisten { .. }));
    assert_eq!(listens, 2);
    assert_eq!(
        count(&log, |op| matches!(op, HostOp::Remove { .. })),
        1,
        "only the top node is detached"
    );
    assert!(runtime.host().violations().is_empty());
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug, Clone)]
enum Shape {
    Text(String),
    Hole,
    Element {
        tag: &'static str,
        key: Option<u8>,
        classes: Vec<&'static str>,
        title: Option<String>,
        children: Vec<Shape>,
    },
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        "[a-c]{0,3}".prop_map(Shape::Text),
        Just(Shape::Hole),
    ];
    leaf.prop_recursive(3, 32, 5, |inner| {
        (
            prop::sample::select(vec!["div", "span", "li"]),
            prop::option::of(0u8..6),
            prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 0..3),
            prop::option::of("[x-z]{1,2}"),
            prop::collection::vec(inner, 0..5),
        )
            .prop_map(|(tag, key, classes, title, children)| Shape::Element {
                tag,
                key,
                classes,
                title,
                children,
            })
    })
}

fn build(shape: &Shape) -> Node {
    match shape {
        Shape::Text(content) => text(content.clone()),
        Shape::Hole => Node::Hole,
        Shape::Element {
            tag: name,
            key,
            classes,
            title,
            children,
        } => {
            let mut items: Vec<Item> = classes.iter().map(|&c| class(c).into()).collect();
            if let Some(title) = title {
                items.push(Markup::attribute("title", title.clone()).unwrap().into());
            }
            items.extend(children.iter().map(|child| Item::from(build(child))));
            let node = tag(name, items);
            match key {
                Some(key) => node.with_key(*key),
                None => node,
            }
        }
    }
}

fn markup_value() -> impl Strategy<Value = Markup> {
    prop_oneof![
        ("[a-z]{1,6}", "[a-z0-9 ]{0,6}")
            .prop_map(|(name, value)| Markup::attribute(&format!("x-{name}"), value).unwrap()),
        ("[a-z]{1,6}", any::<bool>())
            .prop_map(|(name, value)| Markup::property(&format!("p{name}"), value).unwrap()),
        ("[a-z]{1,6}", "[a-z0-9]{1,4}")
            .prop_map(|(name, value)| Markup::style(&format!("margin-{name}"), value).unwrap()),
        ("[a-z]{1,6}", any::<bool>()).prop_map(|(name, present)| Markup::class(&name, present).unwrap()),
        ("[a-z]{1,6}", "[a-z]{0,4}").prop_map(|(name, value)| Markup::dataset(&name, value).unwrap()),
    ]
}

proptest! {
    #[test]
    fn patching_converges_with_a_fresh_mount(a in shape(), b in shape()) {
        let (mut patched, container) = runtime();
        let mount = patched.render_into(container, build(&a)).unwrap();
        patched.update(&mount, build(&b)).unwrap();

        let (mut fresh, fresh_container) = runtime();
        fresh.render_into(fresh_container, build(&b)).unwrap();

        prop_assert_eq!(
            patched.host().snapshot(container),
            fresh.host().snapshot(fresh_container)
        );
        prop_assert!(patched.host().violations().is_empty());
    }

    #[test]
    fn keyed_permutations_only_move(order in Just((0u32..8).collect::<Vec<_>>()).prop_shuffle()) {
        let list = |order: &[u32]| {
            tag("ul", order.iter().map(|&id| Item::from(tag("li", [Item::from(text(id.to_string()))]).with_key(id))))
        };
        let (mut runtime, container) = runtime();
        let mount = runtime.render_into(container, list(&(0..8).collect::<Vec<_>>())).unwrap();
        runtime.host_mut().clear_log();

        runtime.update(&mount, list(&order)).unwrap();

        let log = runtime.host_mut().take_log();
        prop_assert_eq!(count(&log, HostOp::is_create), 0);
        prop_assert_eq!(count(&log, HostOp::is_release), 0);
        prop_assert!(count(&log, HostOp::is_move) <= order.len());
        let expected: String = order.iter().map(ToString::to_string).collect();
        prop_assert_eq!(runtime.host().text_content(container), expected);
    }

    #[test]
    fn applying_markup_twice_is_idempotent(value in markup_value()) {
        let mut once = MemoryHost::new();
        let a = once.create_element("div", None);
        value.apply(&mut once, a);

        let mut twice = MemoryHost::new();
        let b = twice.create_element("div", None);
        value.apply(&mut twice, b);
        value.apply(&mut twice, b);

        prop_assert_eq!(once.snapshot(a), twice.snapshot(b));
    }

    #[test]
    fn removing_markup_restores_the_node(base in markup_value(), value in markup_value()) {
        let mut host = MemoryHost::new();
        let node = host.create_element("div", None);
        prop_assume!(base.kind() != value.kind() || base.name() != value.name());
        base.apply(&mut host, node);
        let before = host.snapshot(node);

        value.apply(&mut host, node);
        value.remove(&mut host, node);

        prop_assert_eq!(host.snapshot(node), before);
    }
}
