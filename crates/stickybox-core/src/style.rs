#![forbid(unsafe_code)]

//! Style values written to the positioned element.

use core::fmt;

use crate::machine::{StickyGeometry, StickyMode, StickyState};
use crate::transform::TransformProperty;

/// CSS `position` value used by the sticky element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Positioning {
    Fixed,
    Absolute,
}

impl Positioning {
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Absolute => "absolute",
        }
    }
}

impl fmt::Display for Positioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_css())
    }
}

/// Logical style for one mode: `position`, `top`, and a vertical
/// `translate3d`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickyStyle {
    pub position: Positioning,
    pub top: f64,
    pub translate_y: f64,
}

impl StickyStyle {
    /// Style for `state` under `geo`. `None` for [`StickyMode::NotSet`],
    /// which is never written.
    #[must_use]
    pub fn for_state(state: StickyState, geo: &StickyGeometry) -> Option<Self> {
        match state.mode {
            StickyMode::NotSet => None,
            StickyMode::FixedTop => Some(Self {
                position: Positioning::Fixed,
                top: 0.0,
                translate_y: 0.0,
            }),
            StickyMode::FixedBottom => Some(Self {
                position: Positioning::Fixed,
                top: 0.0,
                translate_y: geo.viewport_height - geo.node_height() + geo.vertical_margin(),
            }),
            StickyMode::Absolute => Some(Self {
                position: Positioning::Absolute,
                top: geo.padding_top,
                translate_y: state.offset + geo.parent_top,
            }),
        }
    }

    /// `translate3d(0, <y>px, 0)`.
    #[must_use]
    pub fn transform_value(&self) -> String {
        format!("translate3d(0, {}px, 0)", css_number(self.translate_y))
    }

    /// `0` or `<n>px`.
    #[must_use]
    pub fn top_value(&self) -> String {
        if self.top == 0.0 {
            "0".to_owned()
        } else {
            format!("{}px", css_number(self.top))
        }
    }

    /// Declarations in the order a host should apply them.
    #[must_use]
    pub fn declarations(&self, transform: &TransformProperty) -> [StyleDeclaration; 3] {
        [
            StyleDeclaration::new("top", self.top_value()),
            StyleDeclaration::new("position", self.position.as_css()),
            StyleDeclaration::new(transform.as_str(), self.transform_value()),
        ]
    }
}

/// One `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDeclaration {
    pub property: String,
    pub value: String,
}

impl StyleDeclaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for StyleDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value)
    }
}

/// Format like a JS number: integral values without a fractional part.
fn css_number(value: f64) -> String {
    if value == 0.0 {
        // Also folds -0.0.
        "0".to_owned()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
