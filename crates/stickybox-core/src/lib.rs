#![forbid(unsafe_code)]

//! Core: sticky sidebar positioning, tick coalescing, and instance lifecycle.
//!
//! # Role in stickybox
//! `stickybox-core` decides how a sidebar panel follows the viewport while
//! staying inside its container. It pins the panel to the top of the
//! viewport, pins it to the bottom, or lets it flow absolutely inside the
//! container, depending on relative sizes and scroll direction.
//!
//! # Primary responsibilities
//! - **Position state machine** ([`machine`]): a pure decision from geometry,
//!   previous mode and scroll direction to the next mode and offset.
//! - **Tick coalescing** ([`coalescer`]): at most one evaluation per
//!   macrotask, with an injectable scheduler.
//! - **Geometry** ([`geometry`]): document offsets and scroll-pane discovery
//!   over the host's [`LayoutHost`] view.
//! - **Lifecycle and registry** ([`context`], [`lifecycle`]): mount, unmount,
//!   signal routing and bulk recompute.
//!
//! # How it fits in the system
//! The core has no platform dependency. A host (`stickybox-web` ships a
//! deterministic one) implements [`StickyHost`], forwards scroll, wheel,
//! resize and mutation events to [`StickyContext::dispatch`], and runs the
//! deferred tasks of its [`TickScheduler`] once per macrotask.

pub mod coalescer;
pub mod config;
pub mod context;
pub mod geometry;
pub mod host;
pub mod instance;
pub mod lifecycle;
pub mod machine;
pub mod style;
pub mod transform;

pub use coalescer::{DeferredTask, ManualScheduler, TickCoalescer, TickScheduler};
pub use config::{ConfigError, MutationFilter, StickyConfig};
pub use context::StickyContext;
pub use geometry::{
    BoundingBox, BoxSizing, LayoutHost, NodeId, OverflowY, Padding, ScrollPane,
    document_offset_top, find_scroll_ancestor,
};
pub use host::{
    InstanceId, ListenKind, ListenTarget, ListenerHost, ListenerRegistration, ObserverHandle,
    Reservation, Signal, StickyHost, StyleHost,
};
pub use instance::{Evaluation, PaddingSnapshot, StickyInstance};
pub use lifecycle::{InertReason, MountRequest, MountStatus, StickyMount};
pub use machine::{Decision, DecisionRule, StickyGeometry, StickyMode, StickyState, decide, needs_write};
pub use style::{Positioning, StickyStyle, StyleDeclaration};
pub use transform::{TransformProperty, probe_transform};
