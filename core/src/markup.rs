//! Markup values: composable descriptors of one effect on a node.
//!
//! A [`Markup`] value names exactly one attribute, property, inline style declaration, class,
//! dataset entry, event listener or namespace. Values carry no reference to a node; the
//! reconciler applies and removes them while patching. Applying the same value twice leaves the
//! node as applying it once, and removing a value undoes only that value's effect, so sibling
//! classes and style declarations are never disturbed.
//!
//! Names are validated when a value is constructed. Names that would collide with slots the
//! engine manages itself (the `class` and `style` attributes, `innerHTML`, `textContent`, ...)
//! are rejected with a [`ConstructionError`] before any node is touched.

use alloc::rc::Rc;
use core::{borrow::Borrow, fmt};

use indexmap::IndexMap;

use crate::{
    error::ConstructionError,
    event::{Handler, Listener, ListenerOptions},
    host::{Host, HostId, PropValue},
};

/// Namespace of embedded SVG content.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Namespace of embedded `MathML` content.
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

const RESERVED_ATTRIBUTES: &[&str] = &["class", "style"];

const RESERVED_PROPERTIES: &[&str] = &[
    "className",
    "classList",
    "style",
    "dataset",
    "innerHTML",
    "outerHTML",
    "innerText",
    "outerText",
    "textContent",
    "nodeValue",
];

/// The kind of effect a [`Markup`] value has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkupKind {
    /// A serialized attribute.
    Attribute,
    /// A live object property.
    Property,
    /// One inline style declaration.
    Style,
    /// One class name.
    Class,
    /// One dataset entry.
    Dataset,
    /// An event listener.
    Listener,
    /// The namespace an element is created in.
    Namespace,
}

impl fmt::Display for MarkupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Attribute => "attribute",
            Self::Property => "property",
            Self::Style => "style",
            Self::Class => "class",
            Self::Dataset => "dataset",
            Self::Listener => "event",
            Self::Namespace => "namespace",
        })
    }
}

/// A validated markup name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Rc<str>);

impl Name {
    /// Validates `name` for use as a value of `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error when the name is empty, contains characters the host tree cannot
    /// represent, or is reserved for the engine.
    pub fn new(kind: MarkupKind, name: &str) -> Result<Self, ConstructionError> {
        validate(kind, name)?;
        Ok(Self(Rc::from(name)))
    }

    /// Creates a name from a compile-time vocabulary.
    ///
    /// Validity is checked in debug builds only.
    #[must_use]
    pub fn from_static(kind: MarkupKind, name: &'static str) -> Self {
        debug_assert!(
            validate(kind, name).is_ok(),
            "`{name}` is not a valid {kind} name"
        );
        Self(Rc::from(name))
    }

    fn unnamed() -> Self {
        Self(Rc::from(""))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

fn validate(kind: MarkupKind, name: &str) -> Result<(), ConstructionError> {
    if name.is_empty() {
        return Err(ConstructionError::EmptyName { kind });
    }

    let valid = match kind {
        MarkupKind::Class | MarkupKind::Namespace => {
            !name.chars().any(|c| c.is_whitespace() || c.is_control())
        }
        MarkupKind::Style | MarkupKind::Dataset => name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_')),
        MarkupKind::Listener => name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')),
        MarkupKind::Attribute | MarkupKind::Property => !name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '=')
        }),
    };
    if !valid {
        return Err(ConstructionError::InvalidName {
            kind,
            name: name.to_owned(),
        });
    }

    let reserved = match kind {
        MarkupKind::Attribute => {
            let lower = name.to_ascii_lowercase();
            RESERVED_ATTRIBUTES.contains(&lower.as_str()) || lower.starts_with("data-")
        }
        MarkupKind::Property => RESERVED_PROPERTIES.contains(&name),
        _ => false,
    };
    if reserved {
        return Err(ConstructionError::Reserved {
            kind,
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// One effect on a node.
#[derive(Debug, Clone)]
pub enum Markup {
    /// Sets an attribute.
    Attribute {
        /// Attribute name.
        name: Name,
        /// Attribute value.
        value: String,
    },
    /// Assigns a property.
    Property {
        /// Property name.
        name: Name,
        /// Property value.
        value: PropValue,
    },
    /// Sets one inline style declaration.
    Style {
        /// Style property, e.g. `margin-top`.
        name: Name,
        /// Declaration value, e.g. `0px`.
        value: String,
    },
    /// Adds (`present`) or withholds one class name.
    Class {
        /// Class name.
        name: Name,
        /// Whether the class is applied.
        present: bool,
    },
    /// Sets one dataset entry.
    Dataset {
        /// Entry name, without the `data-` prefix.
        name: Name,
        /// Entry value.
        value: String,
    },
    /// Attaches an event listener.
    Listener(Listener),
    /// Creates the element in another namespace.
    Namespace(String),
}

impl Markup {
    /// Creates an attribute value.
    ///
    /// # Errors
    ///
    /// Fails for invalid names, for `class` and `style`, and for `data-*` names, which must
    /// go through [`Markup::class`], [`Markup::style`] and [`Markup::dataset`].
    pub fn attribute(name: &str, value: impl Into<String>) -> Result<Self, ConstructionError> {
        Ok(Self::Attribute {
            name: Name::new(MarkupKind::Attribute, name)?,
            value: value.into(),
        })
    }

    /// Creates a property value.
    ///
    /// # Errors
    ///
    /// Fails for invalid names and for properties the engine manages itself.
    pub fn property(name: &str, value: impl Into<PropValue>) -> Result<Self, ConstructionError> {
        Ok(Self::Property {
            name: Name::new(MarkupKind::Property, name)?,
            value: value.into(),
        })
    }

    /// Creates an inline style declaration.
    ///
    /// # Errors
    ///
    /// Fails when `name` is not a CSS property name.
    pub fn style(name: &str, value: impl Into<String>) -> Result<Self, ConstructionError> {
        Ok(Self::Style {
            name: Name::new(MarkupKind::Style, name)?,
            value: value.into(),
        })
    }

    /// Creates a class value.
    ///
    /// # Errors
    ///
    /// Fails when `name` is empty or contains whitespace.
    pub fn class(name: &str, present: bool) -> Result<Self, ConstructionError> {
        Ok(Self::Class {
            name: Name::new(MarkupKind::Class, name)?,
            present,
        })
    }

    /// Creates a dataset entry.
    ///
    /// # Errors
    ///
    /// Fails when `name` is not alphanumeric with dashes or underscores.
    pub fn dataset(name: &str, value: impl Into<String>) -> Result<Self, ConstructionError> {
        Ok(Self::Dataset {
            name: Name::new(MarkupKind::Dataset, name)?,
            value: value.into(),
        })
    }

    /// Creates an event listener.
    ///
    /// # Errors
    ///
    /// Fails when `event` is not a valid event type name.
    pub fn listener(
        event: &str,
        options: ListenerOptions,
        handler: Handler,
    ) -> Result<Self, ConstructionError> {
        Ok(Self::Listener(Listener::new(
            Name::new(MarkupKind::Listener, event)?,
            options,
            handler,
        )))
    }

    /// Creates a namespace value.
    ///
    /// # Errors
    ///
    /// Fails when `uri` is empty or contains whitespace.
    pub fn namespace(uri: impl Into<String>) -> Result<Self, ConstructionError> {
        let uri = uri.into();
        validate(MarkupKind::Namespace, &uri)?;
        Ok(Self::Namespace(uri))
    }

    /// Returns the kind of effect.
    #[must_use]
    pub const fn kind(&self) -> MarkupKind {
        match self {
            Self::Attribute { .. } => MarkupKind::Attribute,
            Self::Property { .. } => MarkupKind::Property,
            Self::Style { .. } => MarkupKind::Style,
            Self::Class { .. } => MarkupKind::Class,
            Self::Dataset { .. } => MarkupKind::Dataset,
            Self::Listener(_) => MarkupKind::Listener,
            Self::Namespace(_) => MarkupKind::Namespace,
        }
    }

    /// Returns the name the value is keyed by. Namespaces have an empty name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Attribute { name, .. }
            | Self::Property { name, .. }
            | Self::Style { name, .. }
            | Self::Class { name, .. }
            | Self::Dataset { name, .. } => name.as_str(),
            Self::Listener(listener) => listener.event().as_str(),
            Self::Namespace(_) => "",
        }
    }

    fn key(&self) -> MarkupKey {
        let name = match self {
            Self::Attribute { name, .. }
            | Self::Property { name, .. }
            | Self::Style { name, .. }
            | Self::Class { name, .. }
            | Self::Dataset { name, .. } => name.clone(),
            Self::Listener(listener) => listener.event().clone(),
            Self::Namespace(_) => Name::unnamed(),
        };
        MarkupKey {
            kind: self.kind(),
            name,
        }
    }

    /// Returns `true` when applying `other` after `self` would not change the node.
    ///
    /// Listener handlers are not compared: the runtime swaps handlers without touching the
    /// host registration, so only the registration options matter here.
    #[must_use]
    pub fn same_effect(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Attribute { name, value },
                Self::Attribute {
                    name: other_name,
                    value: other_value,
                },
            )
            | (
                Self::Style { name, value },
                Self::Style {
                    name: other_name,
                    value: other_value,
                },
            )
            | (
                Self::Dataset { name, value },
                Self::Dataset {
                    name: other_name,
                    value: other_value,
                },
            ) => name == other_name && value == other_value,
            (
                Self::Property { name, value },
                Self::Property {
                    name: other_name,
                    value: other_value,
                },
            ) => name == other_name && value == other_value,
            (
                Self::Class { name, present },
                Self::Class {
                    name: other_name,
                    present: other_present,
                },
            ) => name == other_name && present == other_present,
            (Self::Listener(a), Self::Listener(b)) => {
                a.event() == b.event() && a.options() == b.options()
            }
            (Self::Namespace(a), Self::Namespace(b)) => a == b,
            _ => false,
        }
    }

    /// Applies this value to `node`.
    pub fn apply<H: Host + ?Sized>(&self, host: &mut H, node: HostId) {
        match self {
            Self::Attribute { name, value } => host.set_attribute(node, name.as_str(), value),
            Self::Property { name, value } => host.set_property(node, name.as_str(), value),
            Self::Style { name, value } => host.set_style(node, name.as_str(), value),
            Self::Class {
                name,
                present: true,
            } => host.add_class(node, name.as_str()),
            Self::Class {
                name,
                present: false,
            } => host.remove_class(node, name.as_str()),
            Self::Dataset { name, value } => host.set_dataset(node, name.as_str(), value),
            Self::Listener(listener) => {
                host.add_listener(node, listener.event().as_str(), listener.options());
            }
            // Fixed when the element is created.
            Self::Namespace(_) => {}
        }
    }

    /// Undoes the effect of [`Markup::apply`] on `node`.
    pub fn remove<H: Host + ?Sized>(&self, host: &mut H, node: HostId) {
        match self {
            Self::Attribute { name, .. } => host.remove_attribute(node, name.as_str()),
            Self::Property { name, .. } => host.remove_property(node, name.as_str()),
            Self::Style { name, .. } => host.remove_style(node, name.as_str()),
            Self::Class {
                name,
                present: true,
            } => host.remove_class(node, name.as_str()),
            Self::Dataset { name, .. } => host.remove_dataset(node, name.as_str()),
            Self::Listener(listener) => {
                host.remove_listener(node, listener.event().as_str(), listener.options());
            }
            Self::Class { present: false, .. } | Self::Namespace(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MarkupKey {
    kind: MarkupKind,
    name: Name,
}

/// An ordered set of markup values, unique per kind and name.
///
/// Inserting a value whose kind and name are already present replaces the earlier value in
/// place. Values of different kinds never replace each other, even when their names match.
#[derive(Debug, Clone, Default)]
pub struct MarkupSet {
    entries: IndexMap<MarkupKey, Markup>,
}

impl MarkupSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the value it replaced.
    pub fn insert(&mut self, markup: Markup) -> Option<Markup> {
        self.entries.insert(markup.key(), markup)
    }

    /// Looks up the value of `kind` named `name`.
    #[must_use]
    pub fn get(&self, kind: MarkupKind, name: &str) -> Option<&Markup> {
        self.entries
            .iter()
            .find(|(key, _)| key.kind == kind && key.name.as_str() == name)
            .map(|(_, markup)| markup)
    }

    /// Returns the listener registered for `event`.
    #[must_use]
    pub fn listener(&self, event: &str) -> Option<&Listener> {
        match self.get(MarkupKind::Listener, event) {
            Some(Markup::Listener(listener)) => Some(listener),
            _ => None,
        }
    }

    /// Iterates the values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Markup> {
        self.entries.values()
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies every value to `node`.
    pub fn apply_all<H: Host + ?Sized>(&self, host: &mut H, node: HostId) {
        for markup in self.entries.values() {
            markup.apply(host, node);
        }
    }

    /// Removes every value from `node`.
    pub fn remove_all<H: Host + ?Sized>(&self, host: &mut H, node: HostId) {
        for markup in self.entries.values() {
            markup.remove(host, node);
        }
    }

    /// Mutates `node` from the state described by `self` to the one described by `next`.
    ///
    /// Removed values are undone first, then changed and added values are applied. Returns
    /// the number of host operations issued.
    pub fn patch<H: Host + ?Sized>(&self, next: &Self, host: &mut H, node: HostId) -> usize {
        let mut operations = 0;
        for (key, markup) in &self.entries {
            if !next.entries.contains_key(key) {
                markup.remove(host, node);
                operations += 1;
            }
        }
        for (key, markup) in &next.entries {
            match self.entries.get(key) {
                Some(previous) if previous.same_effect(markup) => {}
                Some(previous @ Markup::Listener(_)) => {
                    previous.remove(host, node);
                    markup.apply(host, node);
                    operations += 2;
                }
                _ => {
                    markup.apply(host, node);
                    operations += 1;
                }
            }
        }
        operations
    }
}

impl FromIterator<Markup> for MarkupSet {
    fn from_iter<T: IntoIterator<Item = Markup>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Markup> for MarkupSet {
    fn extend<T: IntoIterator<Item = Markup>>(&mut self, iter: T) {
        for markup in iter {
            self.insert(markup);
        }
    }
}

/// Several markup values passed as one argument.
#[derive(Debug, Clone, Default)]
pub struct MarkupList(Vec<Markup>);

impl MarkupList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a value.
    pub fn push(&mut self, markup: Markup) {
        self.0.push(markup);
    }

    /// Returns the values.
    #[must_use]
    pub fn as_slice(&self) -> &[Markup] {
        &self.0
    }

    /// Returns `true` if the list holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Markup>> for MarkupList {
    fn from(value: Vec<Markup>) -> Self {
        Self(value)
    }
}

impl From<Markup> for MarkupList {
    fn from(value: Markup) -> Self {
        Self(vec![value])
    }
}

impl FromIterator<Markup> for MarkupList {
    fn from_iter<T: IntoIterator<Item = Markup>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for MarkupList {
    type Item = Markup;
    type IntoIter = alloc::vec::IntoIter<Markup>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Returns `markup` when `condition` holds and an empty list otherwise.
pub fn markup_if(condition: bool, markup: impl Into<MarkupList>) -> MarkupList {
    if condition {
        markup.into()
    } else {
        MarkupList::new()
    }
}

/// A map from class names to whether they are applied.
///
/// Every entry produces a [`Markup::Class`] value, so toggling an entry to `false` removes
/// the class on the next patch without touching other classes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMap(IndexMap<Name, bool>);

impl ClassMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether `class` is applied.
    ///
    /// # Errors
    ///
    /// Fails when `class` is empty or contains whitespace.
    pub fn insert(&mut self, class: &str, present: bool) -> Result<(), ConstructionError> {
        self.0.insert(Name::new(MarkupKind::Class, class)?, present);
        Ok(())
    }
}

impl<'a> FromIterator<(&'a str, bool)> for ClassMap {
    /// Builds a map from `(names, present)` pairs. Keys holding several whitespace separated
    /// names set each of them.
    fn from_iter<T: IntoIterator<Item = (&'a str, bool)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (names, present) in iter {
            for class in names.split_whitespace() {
                if let Err(error) = map.insert(class, present) {
                    tracing::warn!(%error, "skipping class map entry");
                }
            }
        }
        map
    }
}

impl From<ClassMap> for MarkupList {
    fn from(value: ClassMap) -> Self {
        value
            .0
            .into_iter()
            .map(|(name, present)| Markup::Class { name, present })
            .collect()
    }
}
