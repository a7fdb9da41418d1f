//! Inline style helpers.
//!
//! Every helper sets one declaration. Removing it later leaves the element's other
//! declarations alone.

use core::fmt;

use trellis_core::{Markup, MarkupKind, Name};

/// A CSS length.
#[derive(Debug, Clone, PartialEq)]
pub struct Size(String);

impl Size {
    /// Pixels.
    #[must_use]
    pub fn px(value: f64) -> Self {
        Self(format!("{value}px"))
    }

    /// Percent of the containing block.
    #[must_use]
    pub fn percent(value: f64) -> Self {
        Self(format!("{value}%"))
    }

    /// Multiples of the element's font size.
    #[must_use]
    pub fn em(value: f64) -> Self {
        Self(format!("{value}em"))
    }

    /// `auto`.
    #[must_use]
    pub fn auto() -> Self {
        Self(String::from("auto"))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Size> for String {
    fn from(value: Size) -> Self {
        value.0
    }
}

fn declaration(name: &'static str, value: impl Into<String>) -> Markup {
    Markup::Style {
        name: Name::from_static(MarkupKind::Style, name),
        value: value.into(),
    }
}

/// Sets `margin`.
pub fn margin(size: Size) -> Markup {
    declaration("margin", size)
}

/// Sets `padding`.
pub fn padding(size: Size) -> Markup {
    declaration("padding", size)
}

/// Sets `width`.
pub fn width(size: Size) -> Markup {
    declaration("width", size)
}

/// Sets `height`.
pub fn height(size: Size) -> Markup {
    declaration("height", size)
}

/// Sets `color`.
pub fn color(value: impl Into<String>) -> Markup {
    declaration("color", value)
}

/// Sets `background-color`.
pub fn background_color(value: impl Into<String>) -> Markup {
    declaration("background-color", value)
}

/// Sets `display`, e.g. `none` or `flex`.
pub fn display(value: impl Into<String>) -> Markup {
    declaration("display", value)
}
