#![forbid(unsafe_code)]

//! Deterministic synthetic document.
//!
//! [`SyntheticDocument`] is a small box tree with explicit document-space
//! geometry. It implements every capability `stickybox-core` needs and turns
//! host-side changes (window scroll, pane scroll, wheel, resize, attribute
//! and style edits) into queued `(InstanceId, Signal)` deliveries, the way a
//! browser dispatches listeners and mutation observer callbacks.
//!
//! Nothing is laid out automatically: each node carries its document top and
//! height, and tests move them explicitly.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use stickybox_core::{
    BoundingBox, BoxSizing, InstanceId, LayoutHost, ListenKind, ListenTarget, ListenerHost,
    MutationFilter, NodeId, ObserverHandle, OverflowY, Padding, Reservation, ScrollPane, Signal,
    StickyStyle, StyleHost, TransformProperty,
};
use tracing::trace;

/// Geometry and computed style of a new node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    /// Document-space top in static layout.
    pub top: f64,
    pub height: f64,
    pub width: f64,
    pub padding: Padding,
    pub overflow_y: OverflowY,
    pub box_sizing: BoxSizing,
    /// Whether the node establishes an offset parent (non-static position).
    pub positioned: bool,
}

impl Default for NodeSpec {
    fn default() -> Self {
        Self {
            top: 0.0,
            height: 0.0,
            width: 0.0,
            padding: Padding::default(),
            overflow_y: OverflowY::Visible,
            box_sizing: BoxSizing::ContentBox,
            positioned: false,
        }
    }
}

impl NodeSpec {
    #[must_use]
    pub fn block(top: f64, height: f64) -> Self {
        Self {
            top,
            height,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    #[must_use]
    pub fn with_overflow(mut self, overflow_y: OverflowY) -> Self {
        self.overflow_y = overflow_y;
        self
    }

    #[must_use]
    pub fn border_box(mut self) -> Self {
        self.box_sizing = BoxSizing::BorderBox;
        self
    }

    #[must_use]
    pub fn positioned(mut self) -> Self {
        self.positioned = true;
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    spec: NodeSpec,
    scroll_top: f64,
    attributes: FxHashMap<String, String>,
    style: FxHashMap<String, String>,
    style_writes: usize,
}

#[derive(Debug, Clone)]
struct Observer {
    handle: ObserverHandle,
    node: NodeId,
    filter: MutationFilter,
    instance: InstanceId,
}

/// What changed in a mutation record.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MutationKind {
    Attribute(String),
    ChildList,
}

/// Host-side document with queued listener and observer deliveries.
///
/// Node ids must come from [`Self::root`] or [`Self::append`] on the same
/// document; any other id panics.
#[derive(Debug, Clone)]
pub struct SyntheticDocument {
    nodes: Vec<Node>,
    window_scroll_y: f64,
    inner_height: f64,
    root_client_top: f64,
    transform_support: Option<TransformProperty>,
    mutation_observer_support: bool,
    listeners: Vec<(ListenTarget, ListenKind, InstanceId)>,
    observers: Vec<Observer>,
    next_observer: u64,
    inbox: VecDeque<(InstanceId, Signal)>,
}

impl SyntheticDocument {
    /// A document whose root spans `document_height` and a window of
    /// `inner_height`.
    #[must_use]
    pub fn new(inner_height: f64, document_height: f64) -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            spec: NodeSpec::block(0.0, document_height),
            scroll_top: 0.0,
            attributes: FxHashMap::default(),
            style: FxHashMap::default(),
            style_writes: 0,
        };
        Self {
            nodes: vec![root],
            window_scroll_y: 0.0,
            inner_height,
            root_client_top: 0.0,
            transform_support: Some(TransformProperty::standard()),
            mutation_observer_support: true,
            listeners: Vec::new(),
            observers: Vec::new(),
            next_observer: 1,
            inbox: VecDeque::new(),
        }
    }

    /// The document element.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a child under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not exist.
    pub fn append(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            spec,
            scroll_top: 0.0,
            attributes: FxHashMap::default(),
            style: FxHashMap::default(),
            style_writes: 0,
        });
        self.node_mut(parent).children.push(id);
        self.record_mutation(parent, MutationKind::ChildList);
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        (id.0 as usize) < self.nodes.len()
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    #[must_use]
    pub fn spec(&self, id: NodeId) -> &NodeSpec {
        &self.node(id).spec
    }

    // ---------------------------------------------------------------
    // Capabilities
    // ---------------------------------------------------------------

    /// Name of the supported transform property, `None` for none.
    pub fn set_transform_support(&mut self, property: Option<&str>) {
        self.transform_support = property.map(TransformProperty::new);
    }

    pub fn set_mutation_observer_support(&mut self, supported: bool) {
        self.mutation_observer_support = supported;
    }

    pub fn set_root_client_top(&mut self, value: f64) {
        self.root_client_top = value;
    }

    // ---------------------------------------------------------------
    // Host-driven changes
    // ---------------------------------------------------------------

    #[must_use]
    pub fn window_scroll_y(&self) -> f64 {
        self.window_scroll_y
    }

    #[must_use]
    pub fn inner_height(&self) -> f64 {
        self.inner_height
    }

    /// Scroll the window and fire `scroll` on viewport listeners.
    pub fn scroll_window_to(&mut self, y: f64) {
        self.window_scroll_y = y;
        self.fire(ListenTarget::Pane(ScrollPane::Viewport), ListenKind::Scroll);
    }

    /// Scroll an element and fire `scroll` on its listeners.
    pub fn scroll_element_to(&mut self, node: NodeId, y: f64) {
        self.node_mut(node).scroll_top = y;
        self.fire(
            ListenTarget::Pane(ScrollPane::Element(node)),
            ListenKind::Scroll,
        );
    }

    /// Fire `mousewheel` on `pane` without moving it.
    pub fn wheel(&mut self, pane: ScrollPane) {
        self.fire(ListenTarget::Pane(pane), ListenKind::Wheel);
    }

    /// Resize the window and fire `resize`.
    pub fn resize_window(&mut self, inner_height: f64) {
        self.inner_height = inner_height;
        self.fire(ListenTarget::Window, ListenKind::Resize);
    }

    /// Change a node's height through its style attribute.
    pub fn set_height(&mut self, node: NodeId, height: f64) {
        self.node_mut(node).spec.height = height;
        self.write_style(node, "height", format!("{height}px"));
    }

    /// Move a node in document space through its style attribute.
    pub fn set_top(&mut self, node: NodeId, top: f64) {
        self.node_mut(node).spec.top = top;
        self.write_style(node, "margin-top", format!("{top}px"));
    }

    pub fn set_padding(&mut self, node: NodeId, padding: Padding) {
        self.node_mut(node).spec.padding = padding;
        let value = format!(
            "{}px {}px {}px {}px",
            padding.top, padding.right, padding.bottom, padding.left
        );
        self.write_style(node, "padding", value);
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.node_mut(node)
            .attributes
            .insert(name.to_owned(), value.to_owned());
        self.record_mutation(node, MutationKind::Attribute(name.to_owned()));
    }

    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node).attributes.get(name).map(String::as_str)
    }

    // ---------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------

    /// Inline style value written to `node`.
    #[must_use]
    pub fn inline_style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.node(node).style.get(property).map(String::as_str)
    }

    /// Number of sticky style writes applied to `node`.
    #[must_use]
    pub fn style_writes(&self, node: NodeId) -> usize {
        self.node(node).style_writes
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn listeners_for(&self, instance: InstanceId) -> Vec<(ListenTarget, ListenKind)> {
        self.listeners
            .iter()
            .filter(|(_, _, id)| *id == instance)
            .map(|(target, kind, _)| (*target, *kind))
            .collect()
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Deliveries waiting to be dispatched.
    #[must_use]
    pub fn pending_signals(&self) -> usize {
        self.inbox.len()
    }

    /// Take the next queued delivery.
    pub fn next_signal(&mut self) -> Option<(InstanceId, Signal)> {
        self.inbox.pop_front()
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn fire(&mut self, target: ListenTarget, kind: ListenKind) {
        for (t, k, instance) in &self.listeners {
            if *t == target && *k == kind {
                self.inbox.push_back((*instance, kind.signal()));
            }
        }
    }

    fn write_style(&mut self, node: NodeId, property: &str, value: String) {
        self.node_mut(node).style.insert(property.to_owned(), value);
        self.record_mutation(node, MutationKind::Attribute("style".to_owned()));
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.node(node).parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Queue one `Mutation` per matching observer. A callback already waiting
    /// in the inbox absorbs further records, like a browser batching them into
    /// one observer callback.
    fn record_mutation(&mut self, target: NodeId, kind: MutationKind) {
        let mut deliveries = Vec::new();
        for observer in &self.observers {
            let in_scope = observer.node == target
                || (observer.filter.subtree && self.is_inclusive_ancestor(observer.node, target));
            if !in_scope {
                continue;
            }
            let wanted = match &kind {
                MutationKind::Attribute(name) => observer.filter.matches_attribute(name),
                MutationKind::ChildList => observer.filter.child_list,
            };
            if wanted {
                deliveries.push(observer.instance);
            }
        }
        for instance in deliveries {
            let queued = self
                .inbox
                .iter()
                .any(|entry| *entry == (instance, Signal::Mutation));
            if !queued {
                trace!(%instance, %target, ?kind, "mutation observed");
                self.inbox.push_back((instance, Signal::Mutation));
            }
        }
    }

    /// Sum of `scrollTop` of scrollable ancestors of `node`.
    fn ancestor_scroll(&self, node: NodeId) -> f64 {
        let mut total = 0.0;
        let mut current = self.node(node).parent;
        while let Some(id) = current {
            let ancestor = self.node(id);
            if ancestor.spec.overflow_y.is_scrollable() {
                total += ancestor.scroll_top;
            }
            current = ancestor.parent;
        }
        total
    }
}

impl LayoutHost for SyntheticDocument {
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn offset_parent(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.node(node).parent;
        while let Some(id) = current {
            let ancestor = self.node(id);
            if ancestor.spec.positioned || ancestor.parent.is_none() {
                return Some(id);
            }
            current = ancestor.parent;
        }
        None
    }

    fn overflow_y(&self, node: NodeId) -> OverflowY {
        self.node(node).spec.overflow_y
    }

    fn bounding_box(&self, node: NodeId) -> BoundingBox {
        let spec = &self.node(node).spec;
        BoundingBox::new(
            spec.top - self.window_scroll_y - self.ancestor_scroll(node) + self.root_client_top,
            0.0,
            spec.width,
            spec.height,
        )
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        self.node(node).spec.height
    }

    fn padding(&self, node: NodeId) -> Padding {
        self.node(node).spec.padding
    }

    fn box_sizing(&self, node: NodeId) -> BoxSizing {
        self.node(node).spec.box_sizing
    }

    fn scroll_offset(&self) -> f64 {
        self.window_scroll_y
    }

    fn viewport_height(&self) -> f64 {
        self.inner_height
    }

    fn root_client_top(&self) -> f64 {
        self.root_client_top
    }
}

impl StyleHost for SyntheticDocument {
    fn supports_style_property(&self, _node: NodeId, property: &str) -> bool {
        self.transform_support
            .as_ref()
            .is_some_and(|supported| supported.as_str() == property)
    }

    fn apply_sticky_style(
        &mut self,
        node: NodeId,
        transform: &TransformProperty,
        style: &StickyStyle,
    ) {
        let entry = self.node_mut(node);
        for declaration in style.declarations(transform) {
            entry.style.insert(declaration.property, declaration.value);
        }
        entry.style_writes += 1;
        self.record_mutation(node, MutationKind::Attribute("style".to_owned()));
    }

    fn set_width(&mut self, node: NodeId, width: f64) {
        self.node_mut(node).spec.width = width;
        self.write_style(node, "width", format!("{width}px"));
    }

    fn reserve_space(&mut self, wrapper: NodeId, reservation: Reservation) {
        let entry = self.node_mut(wrapper);
        entry.spec.width = reservation.width;
        entry.spec.height = reservation.height;
        entry
            .style
            .insert("width".to_owned(), format!("{}px", reservation.width));
        entry
            .style
            .insert("height".to_owned(), format!("{}px", reservation.height));
        self.record_mutation(wrapper, MutationKind::Attribute("style".to_owned()));
    }
}

impl ListenerHost for SyntheticDocument {
    fn add_listener(&mut self, target: ListenTarget, kind: ListenKind, instance: InstanceId) {
        self.listeners.push((target, kind, instance));
    }

    fn remove_listener(&mut self, target: ListenTarget, kind: ListenKind, instance: InstanceId) {
        self.listeners
            .retain(|entry| *entry != (target, kind, instance));
    }

    fn observe_mutations(
        &mut self,
        node: NodeId,
        filter: &MutationFilter,
        instance: InstanceId,
    ) -> Option<ObserverHandle> {
        if !self.mutation_observer_support {
            return None;
        }
        let handle = ObserverHandle(self.next_observer);
        self.next_observer += 1;
        self.observers.push(Observer {
            handle,
            node,
            filter: filter.clone(),
            instance,
        });
        Some(handle)
    }

    fn disconnect_observer(&mut self, handle: ObserverHandle) {
        self.observers.retain(|observer| observer.handle != handle);
    }
}
