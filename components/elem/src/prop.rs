//! Attribute and property helpers.
//!
//! Helper names are fixed, so none of these can fail. Values that live on the node object
//! (`value`, `checked`, `disabled`, `autofocus`) are set as properties; the rest are attributes.

use core::fmt;

use trellis_core::{ClassMap, Markup, MarkupKind, MarkupList, Name, PropValue};

fn attribute(name: &'static str, value: impl Into<String>) -> Markup {
    Markup::Attribute {
        name: Name::from_static(MarkupKind::Attribute, name),
        value: value.into(),
    }
}

fn property(name: &'static str, value: impl Into<PropValue>) -> Markup {
    Markup::Property {
        name: Name::from_static(MarkupKind::Property, name),
        value: value.into(),
    }
}

/// Adds every whitespace separated class in `names`.
///
/// Each class is its own markup value, so classes added elsewhere on the same element are not
/// disturbed. Names that cannot be classes are skipped with a warning.
pub fn class(names: &str) -> MarkupList {
    [(names, true)].into_iter().collect::<ClassMap>().into()
}

/// Sets the `id` attribute.
pub fn id(value: impl Into<String>) -> Markup {
    attribute("id", value)
}

/// Sets the live `value` of a form control.
pub fn value(value: impl Into<String>) -> Markup {
    property("value", PropValue::String(value.into()))
}

/// Sets whether a checkbox or radio button is checked.
pub fn checked(checked: bool) -> Markup {
    property("checked", checked)
}

/// Sets whether a control is disabled.
pub fn disabled(disabled: bool) -> Markup {
    property("disabled", disabled)
}

/// Sets whether a control takes focus when the page loads.
pub fn autofocus(autofocus: bool) -> Markup {
    property("autofocus", autofocus)
}

/// Sets the `type` attribute of an `<input>`.
pub fn input_type(kind: InputType) -> Markup {
    attribute("type", kind.as_str())
}

/// Sets the `placeholder` attribute.
pub fn placeholder(text: impl Into<String>) -> Markup {
    attribute("placeholder", text)
}

/// Sets the `href` attribute.
pub fn href(url: impl Into<String>) -> Markup {
    attribute("href", url)
}

/// Sets the `for` attribute of a `<label>`.
pub fn for_(id: impl Into<String>) -> Markup {
    attribute("for", id)
}

/// Sets the `name` attribute.
pub fn name(name: impl Into<String>) -> Markup {
    attribute("name", name)
}

/// Kinds of `<input>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum InputType {
    Button,
    Checkbox,
    Color,
    Date,
    DateTimeLocal,
    Email,
    File,
    Hidden,
    Image,
    Month,
    Number,
    Password,
    Radio,
    Range,
    Reset,
    Search,
    Submit,
    Tel,
    Text,
    Time,
    Url,
    Week,
}

impl InputType {
    /// Returns the attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Checkbox => "checkbox",
            Self::Color => "color",
            Self::Date => "date",
            Self::DateTimeLocal => "datetime-local",
            Self::Email => "email",
            Self::File => "file",
            Self::Hidden => "hidden",
            Self::Image => "image",
            Self::Month => "month",
            Self::Number => "number",
            Self::Password => "password",
            Self::Radio => "radio",
            Self::Range => "range",
            Self::Reset => "reset",
            Self::Search => "search",
            Self::Submit => "submit",
            Self::Tel => "tel",
            Self::Text => "text",
            Self::Time => "time",
            Self::Url => "url",
            Self::Week => "week",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_splits_on_whitespace() {
        let list = class("toggle  view\tdone");
        let names: Vec<_> = list.as_slice().iter().map(Markup::name).collect();
        assert_eq!(names, ["toggle", "view", "done"]);
    }

    #[test]
    fn form_state_is_set_as_properties() {
        assert_eq!(value("x").kind(), MarkupKind::Property);
        assert_eq!(checked(true).kind(), MarkupKind::Property);
        assert_eq!(for_("field").name(), "for");
        assert!(matches!(
            input_type(InputType::DateTimeLocal),
            Markup::Attribute { value, .. } if value == "datetime-local"
        ));
    }
}
