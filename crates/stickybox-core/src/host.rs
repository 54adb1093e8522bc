#![forbid(unsafe_code)]

//! Capabilities the embedding host provides beyond layout queries.
//!
//! The core never observes the platform directly. Hosts register listeners on
//! its behalf and push [`Signal`]s back through
//! [`StickyContext::dispatch`](crate::context::StickyContext::dispatch).

use core::fmt;

use crate::config::MutationFilter;
use crate::geometry::{LayoutHost, NodeId, ScrollPane};
use crate::style::StickyStyle;
use crate::transform::{TransformProperty, probe_transform};

/// Identifier assigned to a registered instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sticky#{}", self.0)
    }
}

/// Why an evaluation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Initial evaluation during mount.
    Mount,
    Scroll,
    Wheel,
    Resize,
    /// The container subtree changed.
    Mutation,
    /// Bulk recompute requested by the host.
    Recompute,
}

impl Signal {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mount => "mount",
            Self::Scroll => "scroll",
            Self::Wheel => "wheel",
            Self::Resize => "resize",
            Self::Mutation => "mutation",
            Self::Recompute => "recompute",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event kinds an instance listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenKind {
    Scroll,
    Wheel,
    Resize,
}

impl ListenKind {
    /// Signal delivered when this event fires.
    #[must_use]
    pub const fn signal(self) -> Signal {
        match self {
            Self::Scroll => Signal::Scroll,
            Self::Wheel => Signal::Wheel,
            Self::Resize => Signal::Resize,
        }
    }
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenTarget {
    /// The instance's scroll pane (the window when it is the viewport).
    Pane(ScrollPane),
    /// The window.
    Window,
}

/// A listener attached on behalf of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerRegistration {
    pub target: ListenTarget,
    pub kind: ListenKind,
}

/// Handle to a host mutation observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(pub u64);

/// Space reserved by the wrapper so surrounding layout does not collapse
/// when the element leaves normal flow.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reservation {
    pub width: f64,
    pub height: f64,
}

/// Style writes and capability probes.
pub trait StyleHost {
    /// Whether `node`'s style object accepts `property`.
    fn supports_style_property(&self, node: NodeId, property: &str) -> bool;

    /// Host-specific transform property, or `None` when transforms are
    /// unavailable.
    fn transform_property(&self, node: NodeId) -> Option<TransformProperty> {
        probe_transform(|name| self.supports_style_property(node, name))
    }

    fn apply_sticky_style(
        &mut self,
        node: NodeId,
        transform: &TransformProperty,
        style: &StickyStyle,
    );

    fn set_width(&mut self, node: NodeId, width: f64);

    fn reserve_space(&mut self, wrapper: NodeId, reservation: Reservation);
}

/// Event listener and mutation observer registration.
pub trait ListenerHost {
    fn add_listener(&mut self, target: ListenTarget, kind: ListenKind, instance: InstanceId);

    fn remove_listener(&mut self, target: ListenTarget, kind: ListenKind, instance: InstanceId);

    /// Start observing `node`. `None` when the host has no observer support.
    fn observe_mutations(
        &mut self,
        node: NodeId,
        filter: &MutationFilter,
        instance: InstanceId,
    ) -> Option<ObserverHandle>;

    fn disconnect_observer(&mut self, handle: ObserverHandle);
}

/// Everything a host must provide to mount sticky instances.
pub trait StickyHost: LayoutHost + StyleHost + ListenerHost {}

impl<T: LayoutHost + StyleHost + ListenerHost + ?Sized> StickyHost for T {}
