#![forbid(unsafe_code)]

//! Mount handles returned to the rendering host.

use core::fmt;

use tracing::trace;

use crate::geometry::{BoxSizing, LayoutHost, NodeId};
use crate::host::{InstanceId, Reservation, StyleHost};
use crate::instance::whole_px;

/// What the host renders: the element to position and its requested width.
///
/// The element's direct parent is the wrapper that reserves layout space; the
/// wrapper's parent is the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountRequest {
    pub element: NodeId,
    pub width: f64,
}

impl MountRequest {
    #[must_use]
    pub const fn new(element: NodeId, width: f64) -> Self {
        Self { element, width }
    }
}

/// Why a mount never engaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InertReason {
    /// The host has no usable transform style property.
    NoTransform,
    /// The element has fewer than two ancestors.
    MissingContainer,
}

impl fmt::Display for InertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTransform => f.write_str("transform unsupported"),
            Self::MissingContainer => f.write_str("no container two levels up"),
        }
    }
}

/// Registration status of a mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStatus {
    Active(InstanceId),
    Inert(InertReason),
}

/// Handle the host keeps for one rendered sticky element.
///
/// Owns the layout reservation, which is tracked even for inert mounts.
#[derive(Debug)]
pub struct StickyMount {
    element: NodeId,
    wrapper: Option<NodeId>,
    reservation: Reservation,
    status: MountStatus,
}

impl StickyMount {
    pub(crate) fn new(
        element: NodeId,
        wrapper: Option<NodeId>,
        reservation: Reservation,
        status: MountStatus,
    ) -> Self {
        Self {
            element,
            wrapper,
            reservation,
            status,
        }
    }

    #[must_use]
    pub fn element(&self) -> NodeId {
        self.element
    }

    #[must_use]
    pub fn wrapper(&self) -> Option<NodeId> {
        self.wrapper
    }

    #[must_use]
    pub fn status(&self) -> MountStatus {
        self.status
    }

    /// Registered id, `None` when inert.
    #[must_use]
    pub fn id(&self) -> Option<InstanceId> {
        match self.status {
            MountStatus::Active(id) => Some(id),
            MountStatus::Inert(_) => None,
        }
    }

    #[must_use]
    pub fn is_inert(&self) -> bool {
        matches!(self.status, MountStatus::Inert(_))
    }

    #[must_use]
    pub fn reservation(&self) -> Reservation {
        self.reservation
    }

    /// Record a new natural-height measurement of the element and push the
    /// reservation to the wrapper. Returns `false` when the height is
    /// unchanged.
    pub fn on_measure<H: StyleHost + ?Sized>(&mut self, host: &mut H, height: f64) -> bool {
        if height == self.reservation.height {
            return false;
        }
        self.reservation.height = height;
        if let Some(wrapper) = self.wrapper {
            host.reserve_space(wrapper, self.reservation);
        }
        trace!(element = %self.element, height, "reservation updated");
        true
    }

    /// Change the requested width and push the reservation to the wrapper.
    pub fn set_width<H: StyleHost + ?Sized>(&mut self, host: &mut H, width: f64) {
        self.reservation.width = width;
        if let Some(wrapper) = self.wrapper {
            host.reserve_space(wrapper, self.reservation);
        }
    }
}

/// Width to write on the element so its rendered width matches `requested`.
///
/// Under `content-box` the horizontal padding is subtracted.
pub fn content_width<H: LayoutHost + ?Sized>(host: &H, element: NodeId, requested: f64) -> f64 {
    match host.box_sizing(element) {
        BoxSizing::ContentBox => {
            let padding = host.padding(element);
            requested - (whole_px(padding.left) + whole_px(padding.right))
        }
        BoxSizing::BorderBox => requested,
    }
}
