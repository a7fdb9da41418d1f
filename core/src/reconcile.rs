//! Diff and patch: moves the host tree from the committed tree to a new description.
//!
//! Each pair of positions falls into one of five cases:
//!
//! - nothing before, something now: mount a detached subtree and let the parent place it;
//! - something before, nothing now: detach the top host node, then release the subtree;
//! - same kind (tag and namespace, or component type): patch in place;
//! - different kind: mount the replacement, then destroy the old subtree;
//! - two holes: nothing to do.
//!
//! Component renders happen before anything of their subtree is touched, so a failing render
//! leaves the committed subtree exactly as it was. Failures are collected in the [`Pass`] and
//! the rest of the pass goes on.

use core::mem;
use std::collections::{HashMap, HashSet};

use crate::{
    component::{ComponentId, Components, LifecycleCx, NodeRef},
    error::{InvariantViolation, RenderError, RenderFailure},
    event::Effect,
    host::{Host, HostId},
    markup::{Markup, MarkupSet},
    node::{ComponentNode, Element, Key, Node},
    tree::{Live, LiveComponent, LiveElement, LiveText, Tree, VNodeId},
};

type Result<T> = core::result::Result<T, InvariantViolation>;

/// Host work done during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PassStats {
    pub created: usize,
    pub markup: usize,
    pub moved: usize,
    pub released: usize,
    pub rendered: usize,
}

/// Bookkeeping of one reconciliation pass.
#[derive(Debug, Default)]
pub(crate) struct Pass {
    pub failures: Vec<RenderFailure>,
    /// Slots whose first subtree was attached during the pass, children before parents.
    pub mounted: Vec<ComponentId>,
    /// Slots rendered during the pass; queued requests for them are already satisfied.
    pub rendered: HashSet<ComponentId>,
    pub stats: PassStats,
}

/// The committed tree together with the host it describes.
#[derive(Debug)]
pub(crate) struct Engine<H> {
    pub host: H,
    pub tree: Tree,
    pub components: Components,
    pub refs: HashMap<NodeRef, HostId>,
}

impl<H: Host> Engine<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            tree: Tree::default(),
            components: Components::default(),
            refs: HashMap::new(),
        }
    }

    /// Creates the committed node standing for a container owned by the caller.
    pub fn create_root(&mut self, container: HostId) -> VNodeId {
        self.tree.insert(
            None,
            Live::Element(LiveElement {
                host: container,
                tag: "".into(),
                namespace: None,
                key: None,
                markup: MarkupSet::new(),
                children: Vec::new(),
                host_children: Vec::new(),
                node_ref: None,
                adopted: true,
            }),
        )
    }

    /// Unmounts everything below `root` and forgets the container.
    pub fn destroy_root(&mut self, root: VNodeId, pass: &mut Pass) -> Result<()> {
        self.reconcile_children(root, Vec::new(), pass)?;
        self.tree.remove(root)?;
        Ok(())
    }

    // ---- mount path ----

    /// Builds a detached subtree for `node` below `parent`.
    ///
    /// A component whose first render fails leaves a hole at its position.
    fn mount(&mut self, parent: VNodeId, node: Node, pass: &mut Pass) -> Result<VNodeId> {
        match node {
            Node::Element(element) => self.mount_element(parent, element, pass),
            Node::Text(text) => {
                let (content, key) = text.into_parts();
                let host = self.host.create_text(&content);
                pass.stats.created += 1;
                Ok(self.tree.insert(
                    Some(parent),
                    Live::Text(LiveText { host, content, key }),
                ))
            }
            Node::Component(component) => match self.mount_component(parent, component, pass)? {
                Some(id) => Ok(id),
                None => Ok(self.tree.insert(Some(parent), Live::Hole)),
            },
            Node::Hole => Ok(self.tree.insert(Some(parent), Live::Hole)),
        }
    }

    fn mount_element(&mut self, parent: VNodeId, element: Element, pass: &mut Pass) -> Result<VNodeId> {
        let parts = element.into_parts();
        let (host, adopted) = match parts.adopted {
            Some(node) => (node, true),
            None => {
                pass.stats.created += 1;
                (
                    self.host
                        .create_element(&parts.tag, parts.namespace.as_deref()),
                    false,
                )
            }
        };
        parts.markup.apply_all(&mut self.host, host);
        pass.stats.markup += parts.markup.len();
        if let Some(node_ref) = parts.node_ref {
            self.refs.insert(node_ref, host);
        }

        let id = self.tree.insert(
            Some(parent),
            Live::Element(LiveElement {
                host,
                tag: parts.tag,
                namespace: parts.namespace,
                key: parts.key,
                markup: parts.markup,
                children: Vec::new(),
                host_children: Vec::new(),
                node_ref: parts.node_ref,
                adopted,
            }),
        );

        let mut children = Vec::with_capacity(parts.children.len());
        for child in parts.children {
            children.push(self.mount(id, child, pass)?);
        }
        let mut host_children = Vec::with_capacity(children.len());
        for &child in &children {
            if let Some(child_host) = self.tree.host_of(child)? {
                self.host.insert_before(host, child_host, None);
                host_children.push(child_host);
            }
        }

        let live = self.tree.element_mut(id)?;
        live.children = children;
        live.host_children = host_children;
        Ok(id)
    }

    /// Creates a slot, renders it and mounts its output.
    ///
    /// Returns `None` when the first render failed; the slot is discarded in that case.
    fn mount_component(
        &mut self,
        parent: VNodeId,
        node: ComponentNode,
        pass: &mut Pass,
    ) -> Result<Option<VNodeId>> {
        let type_id = node.type_id();
        let (instance, key) = node.into_parts();
        let type_name = instance.type_name();
        let id = self.components.insert(instance);
        let rendered = self
            .components
            .get(id)
            .ok_or(InvariantViolation::MissingComponent(id))?
            .instance
            .render_in(id);
        pass.stats.rendered += 1;

        let output = match rendered {
            Ok(output) => output,
            Err(error) => {
                self.components.remove(id);
                record_failure(pass, id, type_name, error);
                return Ok(None);
            }
        };
        tracing::debug!(component = %id, type_name, "mounting component");

        let vnode = self.tree.insert(
            Some(parent),
            Live::Component(LiveComponent {
                id,
                type_id,
                key,
                child: None,
            }),
        );
        if let Some(slot) = self.components.get_mut(id) {
            slot.vnode = Some(vnode);
        }
        let child = self.mount(vnode, output, pass)?;
        self.tree.component_mut(vnode)?.child = Some(child);
        pass.rendered.insert(id);
        pass.mounted.push(id);
        Ok(Some(vnode))
    }

    // ---- patch path ----

    /// Patches the committed node `old` to match `new`; returns the node now at that position.
    fn patch(&mut self, old: VNodeId, new: Node, pass: &mut Pass) -> Result<VNodeId> {
        let entry = self.tree.get(old)?;
        let compatible = match (&entry.live, &new) {
            (Live::Hole, Node::Hole) | (Live::Text(_), Node::Text(_)) => true,
            (Live::Element(live), Node::Element(next)) => {
                *live.tag == *next.tag()
                    && live.namespace.as_deref() == next.namespace()
                    && live.adopted.then_some(live.host) == next.adopted()
            }
            (Live::Component(live), Node::Component(next)) => live.type_id == next.type_id(),
            _ => false,
        };
        let parent = entry.parent;

        if !compatible {
            let parent = parent.ok_or(InvariantViolation::StaleNode(old))?;
            return self.replace(parent, old, new, pass);
        }

        match new {
            Node::Hole => {}
            Node::Text(text) => {
                let (content, key) = text.into_parts();
                if let Live::Text(live) = &mut self.tree.get_mut(old)?.live {
                    live.key = key;
                    if live.content != content {
                        self.host.set_text(live.host, &content);
                        live.content = content;
                        pass.stats.markup += 1;
                    }
                }
            }
            Node::Element(element) => self.patch_element(old, element, pass)?,
            Node::Component(component) => self.patch_component(old, component, pass)?,
        }
        Ok(old)
    }

    fn patch_element(&mut self, old: VNodeId, element: Element, pass: &mut Pass) -> Result<()> {
        let parts = element.into_parts();
        let live = self.tree.element_mut(old)?;
        let host = live.host;

        let operations = live.markup.patch(&parts.markup, &mut self.host, host);
        if operations > 0 {
            tracing::trace!(node = %host, operations, "patched markup");
        }
        pass.stats.markup += operations;
        // Handlers are read from here at dispatch time, so this also rebinds them.
        live.markup = parts.markup;
        live.key = parts.key;

        let previous_ref = mem::replace(&mut live.node_ref, parts.node_ref);
        if previous_ref != parts.node_ref {
            if let Some(previous) = previous_ref {
                if self.refs.get(&previous) == Some(&host) {
                    self.refs.remove(&previous);
                }
            }
        }
        if let Some(node_ref) = parts.node_ref {
            self.refs.insert(node_ref, host);
        }

        self.reconcile_children(old, parts.children, pass)
    }

    fn patch_component(&mut self, old: VNodeId, node: ComponentNode, pass: &mut Pass) -> Result<()> {
        let (mut instance, key) = node.into_parts();
        let live = self.tree.component_mut(old)?;
        live.key = key;
        let (id, child) = (live.id, live.child);

        let slot = self
            .components
            .get_mut(id)
            .ok_or(InvariantViolation::MissingComponent(id))?;
        instance.restore_from(&*slot.instance);
        if !instance.should_rerender_after(&*slot.instance) {
            slot.instance = instance;
            return Ok(());
        }

        let rendered = instance.render_in(id);
        pass.stats.rendered += 1;
        match rendered {
            Ok(output) => {
                slot.instance = instance;
                pass.rendered.insert(id);
                self.commit_render(old, child, output, pass)
            }
            Err(error) => {
                let type_name = instance.type_name();
                record_failure(pass, id, type_name, error);
                Ok(())
            }
        }
    }

    /// Applies the output of a successful render to the component node `vnode`.
    fn commit_render(
        &mut self,
        vnode: VNodeId,
        child: Option<VNodeId>,
        output: Node,
        pass: &mut Pass,
    ) -> Result<()> {
        let child = match child {
            Some(child) => self.patch(child, output, pass)?,
            None => self.mount(vnode, output, pass)?,
        };
        self.tree.component_mut(vnode)?.child = Some(child);
        Ok(())
    }

    fn replace(&mut self, parent: VNodeId, old: VNodeId, new: Node, pass: &mut Pass) -> Result<VNodeId> {
        tracing::debug!(node = %old, "replacing node of a different kind");
        let replacement = match new {
            Node::Component(component) => match self.mount_component(parent, component, pass)? {
                Some(id) => id,
                // Keep showing what was there.
                None => return Ok(old),
            },
            other => self.mount(parent, other, pass)?,
        };
        self.destroy(old, pass)?;
        Ok(replacement)
    }

    // ---- children ----

    /// Matches the children of `parent` against `next`, patches, mounts and destroys, then
    /// fixes the order of host nodes.
    pub fn reconcile_children(&mut self, parent: VNodeId, next: Vec<Node>, pass: &mut Pass) -> Result<()> {
        let old = mem::take(&mut self.tree.element_mut(parent)?.children);

        let mut keyed: HashMap<Key, usize> = HashMap::new();
        let mut unkeyed = vec![false; old.len()];
        for (index, &child) in old.iter().enumerate() {
            match self.tree.key_of(child)? {
                Some(key) => {
                    keyed.entry(key.clone()).or_insert(index);
                }
                None => unkeyed[index] = true,
            }
        }

        // Keys first, anywhere in the old list.
        let mut claimed = vec![false; old.len()];
        let mut matches: Vec<Option<usize>> = next
            .iter()
            .map(|node| {
                let index = node.key().and_then(|key| keyed.get(key).copied())?;
                if claimed[index] {
                    return None;
                }
                claimed[index] = true;
                Some(index)
            })
            .collect();
        // Then unkeyed children by position.
        for (index, node) in next.iter().enumerate() {
            if node.key().is_none() && index < old.len() && unkeyed[index] && !claimed[index] {
                claimed[index] = true;
                matches[index] = Some(index);
            }
        }

        for (index, &child) in old.iter().enumerate() {
            if !claimed[index] {
                self.destroy(child, pass)?;
            }
        }

        let mut children = Vec::with_capacity(next.len());
        for (node, matched) in next.into_iter().zip(matches) {
            children.push(match matched {
                Some(index) => self.patch(old[index], node, pass)?,
                None => self.mount(parent, node, pass)?,
            });
        }
        self.tree.element_mut(parent)?.children = children;
        self.place_children(parent, pass)
    }

    /// Reorders the host children of `parent` to follow its committed children.
    ///
    /// Nodes on a longest increasing run of current positions stay put; everything else is
    /// inserted before its successor, walking from the end.
    ///
    /// A keyed reorder of `n` children therefore costs at most `n` moves rather than exactly
    /// `n`: swapping two children moves one, reversing five moves four. Nodes are never
    /// created or released here.
    pub fn place_children(&mut self, parent: VNodeId, pass: &mut Pass) -> Result<()> {
        let element = self.tree.element(parent)?;
        let parent_host = element.host;
        let mut desired = Vec::with_capacity(element.children.len());
        for &child in &element.children {
            if let Some(host) = self.tree.host_of(child)? {
                desired.push(host);
            }
        }

        let current: HashMap<HostId, usize> = element
            .host_children
            .iter()
            .enumerate()
            .map(|(index, &host)| (host, index))
            .collect();
        let wanted: HashSet<HostId> = desired.iter().copied().collect();
        if current.keys().any(|host| !wanted.contains(host)) {
            tracing::error!(parent = %parent_host, "host children diverged from the committed tree");
            return Err(InvariantViolation::HostOrder {
                parent: parent_host,
            });
        }

        let sources: Vec<Option<usize>> = desired
            .iter()
            .map(|host| current.get(host).copied())
            .collect();
        let stable = longest_increasing(&sources);
        let mut next = None;
        for index in (0..desired.len()).rev() {
            let host = desired[index];
            if !stable[index] {
                self.host.insert_before(parent_host, host, next);
                if sources[index].is_some() {
                    pass.stats.moved += 1;
                }
            }
            next = Some(host);
        }

        self.tree.element_mut(parent)?.host_children = desired;
        Ok(())
    }

    // ---- unmount path ----

    /// Detaches the host node of `vnode` from its parent, then releases the subtree.
    fn destroy(&mut self, vnode: VNodeId, pass: &mut Pass) -> Result<()> {
        if let (Some(host), Some(parent)) = (self.tree.host_of(vnode)?, self.tree.host_parent(vnode)?) {
            let parent = self.tree.element_mut(parent)?;
            if let Some(position) = parent.host_children.iter().position(|&child| child == host) {
                parent.host_children.remove(position);
                self.host.remove_child(parent.host, host);
            }
        }
        self.release(vnode, pass)
    }

    fn release(&mut self, vnode: VNodeId, pass: &mut Pass) -> Result<()> {
        match self.tree.remove(vnode)?.live {
            Live::Element(element) => {
                for markup in element.markup.iter() {
                    if let Markup::Listener(listener) = markup {
                        self.host
                            .remove_listener(element.host, listener.event().as_str(), listener.options());
                    }
                }
                if let Some(node_ref) = element.node_ref {
                    if self.refs.get(&node_ref) == Some(&element.host) {
                        self.refs.remove(&node_ref);
                    }
                }
                // Nodes that outlive this subtree must not stay attached to it.
                for &child in &element.host_children {
                    if element.adopted || self.tree.is_adopted(child) {
                        self.host.remove_child(element.host, child);
                    }
                }
                for child in element.children {
                    self.release(child, pass)?;
                }
                if !element.adopted {
                    self.host.release(element.host);
                    pass.stats.released += 1;
                }
            }
            Live::Text(text) => {
                self.host.release(text.host);
                pass.stats.released += 1;
            }
            Live::Component(component) => {
                if let Some(mut slot) = self.components.remove(component.id) {
                    tracing::debug!(component = %component.id, type_name = slot.instance.type_name(), "unmounting component");
                    if slot.mounted {
                        slot.instance.unmount_in();
                    }
                }
                if let Some(child) = component.child {
                    self.release(child, pass)?;
                }
            }
            Live::Hole => {}
        }
        Ok(())
    }

    // ---- scheduled renders ----

    /// Renders the slot `id` again with its current state and patches its subtree.
    ///
    /// Requests for slots that were destroyed in the meantime are dropped.
    pub fn rerender(&mut self, id: ComponentId, pass: &mut Pass) -> Result<()> {
        let Some(slot) = self.components.get(id) else {
            tracing::trace!(component = %id, "dropping render request for unmounted component");
            return Ok(());
        };
        let Some(vnode) = slot.vnode else {
            return Ok(());
        };
        let rendered = slot.instance.render_in(id);
        let type_name = slot.instance.type_name();
        pass.stats.rendered += 1;

        match rendered {
            Ok(output) => {
                pass.rendered.insert(id);
                let child = match &self.tree.get(vnode)?.live {
                    Live::Component(component) => component.child,
                    _ => return Err(InvariantViolation::MissingComponent(id)),
                };
                self.commit_render(vnode, child, output, pass)?;
                if let Some(parent) = self.tree.host_parent(vnode)? {
                    self.place_children(parent, pass)?;
                }
                Ok(())
            }
            Err(error) => {
                record_failure(pass, id, type_name, error);
                Ok(())
            }
        }
    }

    /// Depth of the slot in the committed tree; `None` once the slot is gone.
    pub fn component_depth(&self, id: ComponentId) -> Option<usize> {
        let vnode = self.components.get(id)?.vnode?;
        self.tree.depth(vnode).ok()
    }

    /// Runs `mount` for every slot attached during `pass`, exactly once per slot.
    pub fn run_mount_hooks(
        &mut self,
        pass: &mut Pass,
        requests: &mut Vec<ComponentId>,
        effects: &mut Vec<Effect>,
    ) {
        for id in mem::take(&mut pass.mounted) {
            let Some(slot) = self.components.get_mut(id) else {
                continue;
            };
            if slot.mounted {
                continue;
            }
            slot.mounted = true;
            let mut cx = LifecycleCx::new(id, &self.refs, requests, effects);
            slot.instance.mount_in(&mut cx);
        }
    }
}

fn record_failure(pass: &mut Pass, component: ComponentId, type_name: &'static str, error: RenderError) {
    tracing::warn!(%component, type_name, %error, "render failed; keeping the previous output");
    pass.failures.push(RenderFailure {
        component,
        type_name,
        error,
    });
}

/// Marks the entries of `sources` that form a longest strictly increasing run.
///
/// `None` entries are never part of the run.
fn longest_increasing(sources: &[Option<usize>]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; sources.len()];
    for (index, source) in sources.iter().enumerate() {
        if source.is_none() {
            continue;
        }
        let at = tails.partition_point(|&tail| sources[tail] < *source);
        if at > 0 {
            previous[index] = Some(tails[at - 1]);
        }
        if at == tails.len() {
            tails.push(index);
        } else {
            tails[at] = index;
        }
    }

    let mut stable = vec![false; sources.len()];
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        stable[index] = true;
        cursor = previous[index];
    }
    stable
}
