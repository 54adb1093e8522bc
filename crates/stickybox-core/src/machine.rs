#![forbid(unsafe_code)]

//! The position state machine.
//!
//! [`decide`] is a pure function of the previous [`StickyState`], a
//! [`StickyGeometry`] snapshot, and the scroll direction. It never touches the
//! host; [`crate::instance`] measures geometry, calls it, and applies the
//! resulting style only when [`needs_write`] says so.
//!
//! # Modes
//!
//! ```text
//!            scroll down (taller than viewport)
//!   FixedTop ───────────────────────────────▶ Absolute
//!      ▲                                        │  ▲
//!      │ top caught up          bottom reached │  │ scroll up
//!      └────────────── Absolute ◀──────────────┘  │
//!                                   FixedBottom ───┘
//! ```
//!
//! Two clamps override everything: above the container's top the element is
//! absolute at offset 0; past the container's bottom it is absolute at
//! `container_height - node_height`.

use core::fmt;

/// How the element is currently positioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StickyMode {
    /// No evaluation has run yet.
    #[default]
    NotSet,
    /// Pinned to the top of the viewport.
    FixedTop,
    /// Pinned so its bottom meets the bottom of the viewport.
    FixedBottom,
    /// Flowing inside the container at [`StickyState::offset`].
    Absolute,
}

impl StickyMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotSet => "not_set",
            Self::FixedTop => "fixed_top",
            Self::FixedBottom => "fixed_bottom",
            Self::Absolute => "absolute",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_fixed(self) -> bool {
        matches!(self, Self::FixedTop | Self::FixedBottom)
    }
}

impl fmt::Display for StickyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode plus the last absolute offset.
///
/// `offset` is only meaningful in [`StickyMode::Absolute`]; other modes carry
/// the previous absolute offset forward untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickyState {
    pub mode: StickyMode,
    pub offset: f64,
}

impl StickyState {
    #[inline]
    #[must_use]
    pub const fn new(mode: StickyMode, offset: f64) -> Self {
        Self { mode, offset }
    }

    #[inline]
    #[must_use]
    pub const fn absolute(offset: f64) -> Self {
        Self::new(StickyMode::Absolute, offset)
    }

    #[inline]
    #[must_use]
    const fn with_mode(self, mode: StickyMode) -> Self {
        Self::new(mode, self.offset)
    }
}

/// Geometry sampled for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickyGeometry {
    /// Offset height of the container.
    pub container_height: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
    /// Bounding height of the element itself, without container padding.
    pub element_height: f64,
    /// Document top of the container.
    pub parent_top: f64,
    /// Visible height of the scroll pane.
    pub viewport_height: f64,
    /// Document top of the scroll pane plus the current scroll.
    pub scroll_pane_offset_top: f64,
}

impl StickyGeometry {
    #[inline]
    #[must_use]
    pub fn vertical_margin(&self) -> f64 {
        self.padding_top + self.padding_bottom
    }

    /// Element height plus the container's vertical padding.
    #[inline]
    #[must_use]
    pub fn node_height(&self) -> f64 {
        self.element_height + self.vertical_margin()
    }

    /// Whether the element fits entirely inside the viewport.
    #[inline]
    #[must_use]
    pub fn fits_viewport(&self) -> bool {
        self.viewport_height >= self.node_height()
    }

    /// Scroll position below which the element is clamped to the top.
    #[inline]
    #[must_use]
    pub fn top_clamp_threshold(&self) -> f64 {
        self.parent_top + self.padding_top
    }

    /// Scroll position at or beyond which the element is clamped to the
    /// bottom of the container.
    ///
    /// The `min` subtracts `padding_top` on one side and adds
    /// `padding_bottom` on the other; this boundary is kept exactly as is.
    #[inline]
    #[must_use]
    pub fn bottom_clamp_threshold(&self) -> f64 {
        self.parent_top + self.container_height
            - (self.viewport_height + self.padding_bottom)
                .min(self.node_height() - self.padding_top)
    }

    /// Offset that rests the element on the container's bottom edge.
    #[inline]
    #[must_use]
    pub fn bottom_offset(&self) -> f64 {
        self.container_height - self.node_height()
    }
}

/// Which clamp or rule produced a decision. Used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionRule {
    TopClamp,
    BottomClamp,
    FirstEvaluation,
    FitsViewport,
    ReleaseFromBottom,
    CatchTop,
    ReleaseFromTop,
    CatchBottom,
    Hold,
}

/// Result of one decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub next: StickyState,
    pub rule: DecisionRule,
}

/// Decide the next mode and offset. First matching rule wins.
#[must_use]
pub fn decide(state: StickyState, geo: &StickyGeometry, scroll_delta: f64) -> Decision {
    let scroll_top = geo.scroll_pane_offset_top;
    let node_height = geo.node_height();

    if scroll_top < geo.top_clamp_threshold() {
        return Decision {
            next: StickyState::absolute(0.0),
            rule: DecisionRule::TopClamp,
        };
    }

    if scroll_top >= geo.bottom_clamp_threshold() {
        return Decision {
            next: StickyState::absolute(geo.bottom_offset()),
            rule: DecisionRule::BottomClamp,
        };
    }

    if state.mode == StickyMode::NotSet {
        return Decision {
            next: StickyState::absolute(scroll_top - geo.parent_top),
            rule: DecisionRule::FirstEvaluation,
        };
    }

    if geo.fits_viewport() {
        return Decision {
            next: state.with_mode(StickyMode::FixedTop),
            rule: DecisionRule::FitsViewport,
        };
    }

    let hold = Decision {
        next: state,
        rule: DecisionRule::Hold,
    };

    if scroll_delta < 0.0 {
        match state.mode {
            StickyMode::FixedBottom => Decision {
                next: StickyState::absolute(
                    scroll_top - geo.parent_top - node_height
                        + geo.viewport_height
                        + geo.padding_bottom,
                ),
                rule: DecisionRule::ReleaseFromBottom,
            },
            StickyMode::Absolute
                if scroll_top <= geo.parent_top + state.offset + geo.padding_top =>
            {
                Decision {
                    next: state.with_mode(StickyMode::FixedTop),
                    rule: DecisionRule::CatchTop,
                }
            }
            _ => hold,
        }
    } else if scroll_delta > 0.0 {
        match state.mode {
            StickyMode::FixedTop => Decision {
                next: StickyState::absolute(scroll_top - geo.parent_top - geo.padding_top),
                rule: DecisionRule::ReleaseFromTop,
            },
            StickyMode::Absolute
                if scroll_top + geo.viewport_height
                    >= node_height + geo.parent_top + state.offset - geo.padding_bottom =>
            {
                Decision {
                    next: state.with_mode(StickyMode::FixedBottom),
                    rule: DecisionRule::CatchBottom,
                }
            }
            _ => hold,
        }
    } else {
        hold
    }
}

/// Whether moving from `current` to `next` requires touching the element's
/// style.
#[inline]
#[must_use]
pub fn needs_write(current: StickyState, next: StickyState) -> bool {
    next.mode != current.mode || (next.mode == StickyMode::Absolute && next.offset != current.offset)
}
