//! The committed tree: what the reconciler last applied to the host.
//!
//! Every position of every mounted description is a slot in an arena addressed by
//! [`VNodeId`]. Slots link to their parent, elements own their ordered children, and component
//! slots point at the single child their last successful render produced. Holes occupy a
//! slot too, so sibling positions stay stable, but they have no host node.

use alloc::rc::Rc;
use core::{any::TypeId, fmt};
use std::collections::HashMap;

use crate::{
    arena::{Arena, Slot},
    component::{ComponentId, NodeRef},
    error::InvariantViolation,
    host::HostId,
    markup::MarkupSet,
    node::Key,
};

/// Identifier of a committed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VNodeId(Slot);

impl fmt::Display for VNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.0.index, self.0.generation)
    }
}

#[derive(Debug)]
pub(crate) struct Entry {
    pub parent: Option<VNodeId>,
    pub live: Live,
}

#[derive(Debug)]
pub(crate) enum Live {
    Element(LiveElement),
    Text(LiveText),
    Component(LiveComponent),
    Hole,
}

#[derive(Debug)]
pub(crate) struct LiveElement {
    pub host: HostId,
    pub tag: Rc<str>,
    pub namespace: Option<String>,
    pub key: Option<Key>,
    pub markup: MarkupSet,
    pub children: Vec<VNodeId>,
    /// Host nodes of `children` in the order they are attached to `host`.
    pub host_children: Vec<HostId>,
    pub node_ref: Option<NodeRef>,
    /// Created outside the engine: never created or released here, only detached.
    pub adopted: bool,
}

#[derive(Debug)]
pub(crate) struct LiveText {
    pub host: HostId,
    pub content: String,
    pub key: Option<Key>,
}

#[derive(Debug)]
pub(crate) struct LiveComponent {
    pub id: ComponentId,
    pub type_id: TypeId,
    pub key: Option<Key>,
    pub child: Option<VNodeId>,
}

#[derive(Debug, Default)]
pub(crate) struct Tree {
    nodes: Arena<Entry>,
    by_host: HashMap<HostId, VNodeId>,
}

impl Tree {
    pub fn insert(&mut self, parent: Option<VNodeId>, live: Live) -> VNodeId {
        let host = match &live {
            Live::Element(element) => Some(element.host),
            _ => None,
        };
        let id = VNodeId(self.nodes.insert(Entry { parent, live }));
        if let Some(host) = host {
            self.by_host.insert(host, id);
        }
        id
    }

    pub fn remove(&mut self, id: VNodeId) -> Result<Entry, InvariantViolation> {
        let entry = self
            .nodes
            .remove(id.0)
            .ok_or(InvariantViolation::StaleNode(id))?;
        if let Live::Element(element) = &entry.live {
            if self.by_host.get(&element.host) == Some(&id) {
                self.by_host.remove(&element.host);
            }
        }
        Ok(entry)
    }

    pub fn get(&self, id: VNodeId) -> Result<&Entry, InvariantViolation> {
        self.nodes.get(id.0).ok_or(InvariantViolation::StaleNode(id))
    }

    pub fn get_mut(&mut self, id: VNodeId) -> Result<&mut Entry, InvariantViolation> {
        self.nodes
            .get_mut(id.0)
            .ok_or(InvariantViolation::StaleNode(id))
    }

    pub fn element(&self, id: VNodeId) -> Result<&LiveElement, InvariantViolation> {
        match &self.get(id)?.live {
            Live::Element(element) => Ok(element),
            _ => Err(InvariantViolation::NotAnElement(id)),
        }
    }

    pub fn element_mut(&mut self, id: VNodeId) -> Result<&mut LiveElement, InvariantViolation> {
        match &mut self.get_mut(id)?.live {
            Live::Element(element) => Ok(element),
            _ => Err(InvariantViolation::NotAnElement(id)),
        }
    }

    pub fn component_mut(&mut self, id: VNodeId) -> Result<&mut LiveComponent, InvariantViolation> {
        match &mut self.get_mut(id)?.live {
            Live::Component(component) => Ok(component),
            _ => Err(InvariantViolation::StaleNode(id)),
        }
    }

    /// Returns the element that owns the host node `host`.
    pub fn by_host(&self, host: HostId) -> Option<VNodeId> {
        self.by_host.get(&host).copied()
    }

    pub fn key_of(&self, id: VNodeId) -> Result<Option<&Key>, InvariantViolation> {
        Ok(match &self.get(id)?.live {
            Live::Element(element) => element.key.as_ref(),
            Live::Text(text) => text.key.as_ref(),
            Live::Component(component) => component.key.as_ref(),
            Live::Hole => None,
        })
    }

    /// Returns the host node standing for `id` among its host siblings.
    ///
    /// Components are transparent: they stand for whatever their child stands for.
    pub fn host_of(&self, id: VNodeId) -> Result<Option<HostId>, InvariantViolation> {
        let mut current = id;
        loop {
            match &self.get(current)?.live {
                Live::Element(element) => return Ok(Some(element.host)),
                Live::Text(text) => return Ok(Some(text.host)),
                Live::Hole => return Ok(None),
                Live::Component(component) => match component.child {
                    Some(child) => current = child,
                    None => return Ok(None),
                },
            }
        }
    }

    /// Returns the nearest element above `id`, i.e. the owner of its host node's parent.
    pub fn host_parent(&self, id: VNodeId) -> Result<Option<VNodeId>, InvariantViolation> {
        let mut current = self.get(id)?.parent;
        while let Some(parent) = current {
            let entry = self.get(parent)?;
            if matches!(entry.live, Live::Element(_)) {
                return Ok(Some(parent));
            }
            current = entry.parent;
        }
        Ok(None)
    }

    /// Number of ancestors of `id`.
    pub fn depth(&self, id: VNodeId) -> Result<usize, InvariantViolation> {
        let mut depth = 0;
        let mut current = self.get(id)?.parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.get(parent)?.parent;
        }
        Ok(depth)
    }

    pub fn is_adopted(&self, host: HostId) -> bool {
        self.by_host(host)
            .and_then(|id| self.element(id).ok())
            .is_some_and(|element| element.adopted)
    }

    pub const fn len(&self) -> usize {
        self.nodes.len()
    }
}
