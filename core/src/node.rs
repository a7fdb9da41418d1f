//! Node descriptions: the immutable, per-render output of rendering.
//!
//! A description is built with [`tag`], [`text`] and [`component`]. The tree-building
//! primitive takes a tag name plus an ordered list of [`Item`]s, where each item is either
//! markup (collected into the element's [`MarkupSet`]) or a child. An absent child
//! (`None::<Node>`) is kept as a positional [`Node::Hole`] so that conditionally rendered
//! siblings keep their positions across renders.

use alloc::rc::Rc;
use core::{any::TypeId, fmt};

use crate::{
    component::{AnyComponent, Component, NodeRef},
    host::HostId,
    markup::{ClassMap, Markup, MarkupList, MarkupSet},
};

/// Identity hint for list children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Key {
    /// An integer key.
    Int(i64),
    /// An unsigned key above `i64::MAX`.
    Uint(u64),
    /// A string key.
    Str(Rc<str>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Uint(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value:?}"),
        }
    }
}

macro_rules! int_keys {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

int_keys!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::Uint(value), Self::Int)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        u64::try_from(value).map_or_else(|_| Self::Str(Rc::from(value.to_string())), Self::from)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(Rc::from(value))
    }
}

/// A description of one position in the tree.
pub enum Node {
    /// A tagged element.
    Element(Element),
    /// A text leaf.
    Text(Text),
    /// A component placeholder, rendered by the runtime.
    Component(ComponentNode),
    /// Nothing. Keeps its position in the parent's child list.
    Hole,
}

impl Node {
    /// Attaches an identity key. Has no effect on holes.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        let key = Some(key.into());
        match &mut self {
            Self::Element(element) => element.key = key,
            Self::Text(text) => text.key = key,
            Self::Component(component) => component.key = key,
            Self::Hole => {}
        }
        self
    }

    /// Captures the live node of an element under `node_ref`. Has no effect on other kinds.
    #[must_use]
    pub fn with_ref(mut self, node_ref: NodeRef) -> Self {
        if let Self::Element(element) = &mut self {
            element.node_ref = Some(node_ref);
        }
        self
    }

    /// Returns the identity key.
    #[must_use]
    pub const fn key(&self) -> Option<&Key> {
        match self {
            Self::Element(element) => element.key.as_ref(),
            Self::Text(text) => text.key.as_ref(),
            Self::Component(component) => component.key.as_ref(),
            Self::Hole => None,
        }
    }

    /// Returns `true` for [`Node::Hole`].
    #[must_use]
    pub const fn is_hole(&self) -> bool {
        matches!(self, Self::Hole)
    }

    /// Returns the element description, if this is one.
    #[must_use]
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(element) => fmt::Debug::fmt(element, f),
            Self::Text(text) => fmt::Debug::fmt(text, f),
            Self::Component(component) => fmt::Debug::fmt(component, f),
            Self::Hole => f.write_str("Hole"),
        }
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Self::Element(value)
    }
}

impl From<Text> for Node {
    fn from(value: Text) -> Self {
        Self::Text(value)
    }
}

/// A tagged element description.
#[derive(Debug)]
pub struct Element {
    tag: Rc<str>,
    namespace: Option<String>,
    markup: MarkupSet,
    children: Vec<Node>,
    key: Option<Key>,
    node_ref: Option<NodeRef>,
    adopted: Option<HostId>,
}

impl Element {
    /// Creates an element with no markup and no children.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: Rc::from(tag),
            namespace: None,
            markup: MarkupSet::new(),
            children: Vec::new(),
            key: None,
            node_ref: None,
            adopted: None,
        }
    }

    /// Creates a description for a live node that was created outside this engine.
    ///
    /// The reconciler applies markup and children to `node` but never creates or releases it;
    /// destroying the description only detaches the node.
    #[must_use]
    pub fn adopt(tag: &str, node: HostId) -> Self {
        Self {
            adopted: Some(node),
            ..Self::new(tag)
        }
    }

    /// Adds one argument of the tree-building primitive.
    pub fn push(&mut self, item: Item) {
        match item {
            Item::Markup(Markup::Namespace(uri)) => self.namespace = Some(uri),
            Item::Markup(markup) => {
                self.markup.insert(markup);
            }
            Item::Markups(list) => {
                for markup in list {
                    self.push(Item::Markup(markup));
                }
            }
            Item::Child(child) => self.children.push(child),
            Item::Key(key) => self.key = Some(key),
            Item::Ref(node_ref) => self.node_ref = Some(node_ref),
        }
    }

    /// Returns the tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the namespace the element is created in.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the markup values.
    #[must_use]
    pub const fn markup(&self) -> &MarkupSet {
        &self.markup
    }

    /// Returns the children, holes included.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Returns the identity key.
    #[must_use]
    pub const fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Returns the node reference the live node is captured under.
    #[must_use]
    pub const fn node_ref(&self) -> Option<NodeRef> {
        self.node_ref
    }

    /// Returns the adopted live node.
    #[must_use]
    pub const fn adopted(&self) -> Option<HostId> {
        self.adopted
    }

    pub(crate) fn into_parts(self) -> ElementParts {
        ElementParts {
            tag: self.tag,
            namespace: self.namespace,
            markup: self.markup,
            children: self.children,
            key: self.key,
            node_ref: self.node_ref,
            adopted: self.adopted,
        }
    }
}

pub(crate) struct ElementParts {
    pub tag: Rc<str>,
    pub namespace: Option<String>,
    pub markup: MarkupSet,
    pub children: Vec<Node>,
    pub key: Option<Key>,
    pub node_ref: Option<NodeRef>,
    pub adopted: Option<HostId>,
}

/// A text leaf description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    content: String,
    key: Option<Key>,
}

impl Text {
    /// Returns the literal content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    pub(crate) fn into_parts(self) -> (String, Option<Key>) {
        (self.content, self.key)
    }
}

/// A component placeholder: the component value carrying its property bag.
pub struct ComponentNode {
    component: Box<dyn AnyComponent>,
    key: Option<Key>,
}

impl ComponentNode {
    /// Returns the Rust type name of the component.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.component.type_name()
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.component.as_any().type_id()
    }

    pub(crate) fn into_parts(self) -> (Box<dyn AnyComponent>, Option<Key>) {
        (self.component, self.key)
    }
}

impl fmt::Debug for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentNode")
            .field("type", &self.component.type_name())
            .field("key", &self.key)
            .finish()
    }
}

/// One argument of the tree-building primitive: markup or a child.
#[derive(Debug)]
pub enum Item {
    /// A markup value for the element being built.
    Markup(Markup),
    /// Several markup values.
    Markups(MarkupList),
    /// A child description. [`Node::Hole`] keeps its position without producing a node.
    Child(Node),
    /// The identity key of the element being built.
    Key(Key),
    /// Captures the live node of the element being built.
    Ref(NodeRef),
}

impl From<Markup> for Item {
    fn from(value: Markup) -> Self {
        Self::Markup(value)
    }
}

impl From<MarkupList> for Item {
    fn from(value: MarkupList) -> Self {
        Self::Markups(value)
    }
}

impl From<ClassMap> for Item {
    fn from(value: ClassMap) -> Self {
        Self::Markups(value.into())
    }
}

impl From<Node> for Item {
    fn from(value: Node) -> Self {
        Self::Child(value)
    }
}

impl From<Option<Node>> for Item {
    fn from(value: Option<Node>) -> Self {
        Self::Child(value.unwrap_or(Node::Hole))
    }
}

impl From<Key> for Item {
    fn from(value: Key) -> Self {
        Self::Key(value)
    }
}

impl From<NodeRef> for Item {
    fn from(value: NodeRef) -> Self {
        Self::Ref(value)
    }
}

/// Builds an element from a tag name and an ordered list of markup and children.
///
/// Markup is collected in order with last-write-wins per kind and name; every other argument
/// becomes a child in order.
pub fn tag(name: &str, items: impl IntoIterator<Item = Item>) -> Node {
    let mut element = Element::new(name);
    for item in items {
        element.push(item);
    }
    Node::Element(element)
}

/// Builds a text leaf.
pub fn text(content: impl Into<String>) -> Node {
    Node::Text(Text {
        content: content.into(),
        key: None,
    })
}

/// Wraps a component value, with its properties set, as a placeholder.
pub fn component<C: Component>(component: C) -> Node {
    Node::Component(ComponentNode {
        component: Box::new(component),
        key: None,
    })
}
