#![forbid(unsafe_code)]

//! Geometry primitives and the layout capability a host must provide.
//!
//! Everything here works in CSS pixels with the origin at the top of the
//! document. Hosts expose their tree through [`LayoutHost`]; the helpers in
//! this module never cache, because scroll position changes continuously.

use core::fmt;

/// Opaque identifier of a node in the host's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Computed value of `overflow-y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowY {
    #[default]
    Visible,
    Hidden,
    Clip,
    Auto,
    Scroll,
}

impl OverflowY {
    /// Whether a box with this overflow acts as a scroll pane.
    #[inline]
    pub const fn is_scrollable(self) -> bool {
        matches!(self, Self::Auto | Self::Scroll)
    }
}

/// Computed value of `box-sizing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxSizing {
    #[default]
    ContentBox,
    BorderBox,
}

/// Viewport-relative border box, as returned by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    #[inline]
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Computed padding of a box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    #[inline]
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Same padding on every side.
    #[inline]
    pub const fn all(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Only vertical padding.
    #[inline]
    pub const fn vertical(top: f64, bottom: f64) -> Self {
        Self::new(top, 0.0, bottom, 0.0)
    }

    #[inline]
    pub fn horizontal_sum(&self) -> f64 {
        self.left + self.right
    }

    #[inline]
    pub fn vertical_sum(&self) -> f64 {
        self.top + self.bottom
    }
}

/// The scrolling context an instance follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollPane {
    /// The window itself.
    Viewport,
    /// An ancestor whose `overflow-y` is `auto` or `scroll`.
    Element(NodeId),
}

impl ScrollPane {
    #[inline]
    pub const fn node(self) -> Option<NodeId> {
        match self {
            Self::Viewport => None,
            Self::Element(node) => Some(node),
        }
    }
}

/// Read-only view of the host's layout tree.
pub trait LayoutHost {
    /// Direct parent in the tree.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Nearest positioned ancestor (`offsetParent`), `None` at the root.
    fn offset_parent(&self, node: NodeId) -> Option<NodeId>;

    fn overflow_y(&self, node: NodeId) -> OverflowY;

    fn bounding_box(&self, node: NodeId) -> BoundingBox;

    /// Layout height including borders (`offsetHeight`).
    fn offset_height(&self, node: NodeId) -> f64;

    fn padding(&self, node: NodeId) -> Padding;

    fn box_sizing(&self, node: NodeId) -> BoxSizing;

    /// Current vertical scroll of the window (`pageYOffset`).
    fn scroll_offset(&self) -> f64;

    /// Window inner height.
    fn viewport_height(&self) -> f64;

    /// Top border width of the root element (`clientTop`).
    fn root_client_top(&self) -> f64 {
        0.0
    }
}

/// Walk the offset-parent chain of `node` and return the first ancestor that
/// scrolls vertically, or the viewport.
pub fn find_scroll_ancestor<H: LayoutHost + ?Sized>(host: &H, node: NodeId) -> ScrollPane {
    let mut current = host.offset_parent(node);
    while let Some(ancestor) = current {
        if host.overflow_y(ancestor).is_scrollable() {
            return ScrollPane::Element(ancestor);
        }
        current = host.offset_parent(ancestor);
    }
    ScrollPane::Viewport
}

/// Top edge of `pane` in document coordinates.
pub fn document_offset_top<H: LayoutHost + ?Sized>(host: &H, pane: ScrollPane) -> f64 {
    match pane {
        ScrollPane::Viewport => 0.0,
        ScrollPane::Element(node) => node_document_top(host, node),
    }
}

/// Top edge of `node` in document coordinates.
pub fn node_document_top<H: LayoutHost + ?Sized>(host: &H, node: NodeId) -> f64 {
    host.bounding_box(node).top + host.scroll_offset() - host.root_client_top()
}

/// Height of the visible region of `pane`.
pub fn pane_viewport_height<H: LayoutHost + ?Sized>(host: &H, pane: ScrollPane) -> f64 {
    match pane {
        ScrollPane::Viewport => host.viewport_height(),
        ScrollPane::Element(node) => host.offset_height(node),
    }
}

/// The ancestor two levels above `node`, whose padding and height bound the
/// sticky behavior.
pub fn container_of<H: LayoutHost + ?Sized>(host: &H, node: NodeId) -> Option<NodeId> {
    host.parent(node).and_then(|wrapper| host.parent(wrapper))
}
