#![forbid(unsafe_code)]

//! One mounted sticky element.
//!
//! A [`StickyInstance`] owns the mode, the last absolute offset, the cached
//! container padding and the tick coalescer. Each accepted signal samples live
//! geometry, runs [`decide`], and writes style only when the state really
//! changed.

use tracing::{debug, debug_span, trace};

use crate::coalescer::{TickCoalescer, TickScheduler};
use crate::geometry::{
    LayoutHost, NodeId, ScrollPane, document_offset_top, node_document_top, pane_viewport_height,
};
use crate::host::{
    InstanceId, ListenKind, ListenTarget, ListenerRegistration, ObserverHandle, Signal, StyleHost,
};
use crate::machine::{DecisionRule, StickyGeometry, StickyMode, StickyState, decide, needs_write};
use crate::style::StickyStyle;
use crate::transform::TransformProperty;

/// Container padding read once at mount.
///
/// Values are whole CSS pixels. Later padding changes are not picked up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PaddingSnapshot {
    pub top: f64,
    pub bottom: f64,
}

impl PaddingSnapshot {
    #[must_use]
    pub fn new(top: f64, bottom: f64) -> Self {
        Self {
            top: whole_px(top),
            bottom: whole_px(bottom),
        }
    }
}

/// Truncate a computed length to whole pixels.
#[inline]
pub(crate) fn whole_px(value: f64) -> f64 {
    if value.is_finite() { value.trunc() } else { 0.0 }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub instance: InstanceId,
    pub signal: Signal,
    pub previous: StickyState,
    pub next: StickyState,
    pub rule: DecisionRule,
    pub scroll_delta: f64,
    /// Whether style was written to the element.
    pub wrote: bool,
}

impl Evaluation {
    #[must_use]
    pub fn mode_changed(&self) -> bool {
        self.previous.mode != self.next.mode
    }
}

/// A registered, transform-capable sticky element.
#[derive(Debug)]
pub struct StickyInstance {
    id: InstanceId,
    element: NodeId,
    container: NodeId,
    scroll_pane: ScrollPane,
    transform: TransformProperty,
    padding: PaddingSnapshot,
    state: StickyState,
    latest_scroll_y: f64,
    coalescer: TickCoalescer,
    listeners: Vec<ListenerRegistration>,
    observer: Option<ObserverHandle>,
}

impl StickyInstance {
    pub(crate) fn new(
        id: InstanceId,
        element: NodeId,
        container: NodeId,
        scroll_pane: ScrollPane,
        transform: TransformProperty,
        padding: PaddingSnapshot,
        initial_scroll_y: f64,
    ) -> Self {
        Self {
            id,
            element,
            container,
            scroll_pane,
            transform,
            padding,
            state: StickyState::default(),
            latest_scroll_y: initial_scroll_y,
            coalescer: TickCoalescer::new(),
            listeners: Vec::new(),
            observer: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    #[must_use]
    pub fn element(&self) -> NodeId {
        self.element
    }

    #[must_use]
    pub fn container(&self) -> NodeId {
        self.container
    }

    #[must_use]
    pub fn scroll_pane(&self) -> ScrollPane {
        self.scroll_pane
    }

    #[must_use]
    pub fn transform(&self) -> &TransformProperty {
        &self.transform
    }

    #[must_use]
    pub fn padding(&self) -> PaddingSnapshot {
        self.padding
    }

    #[must_use]
    pub fn state(&self) -> StickyState {
        self.state
    }

    #[must_use]
    pub fn mode(&self) -> StickyMode {
        self.state.mode
    }

    #[must_use]
    pub fn latest_scroll_y(&self) -> f64 {
        self.latest_scroll_y
    }

    #[must_use]
    pub fn tick_pending(&self) -> bool {
        self.coalescer.is_pending()
    }

    #[must_use]
    pub fn listeners(&self) -> &[ListenerRegistration] {
        &self.listeners
    }

    #[must_use]
    pub fn observer(&self) -> Option<ObserverHandle> {
        self.observer
    }

    pub(crate) fn record_listener(&mut self, target: ListenTarget, kind: ListenKind) {
        self.listeners.push(ListenerRegistration { target, kind });
    }

    pub(crate) fn set_observer(&mut self, observer: Option<ObserverHandle>) {
        self.observer = observer;
    }

    pub(crate) fn take_listeners(&mut self) -> Vec<ListenerRegistration> {
        std::mem::take(&mut self.listeners)
    }

    pub(crate) fn take_observer(&mut self) -> Option<ObserverHandle> {
        self.observer.take()
    }

    /// Sample the geometry the state machine needs.
    ///
    /// `scroll_pane_offset_top` adds the window scroll to the pane's document
    /// top for element panes too. Scroll direction in [`Self::evaluate`] is
    /// derived from the same window scroll.
    pub fn measure<H: LayoutHost + ?Sized>(&self, host: &H) -> StickyGeometry {
        StickyGeometry {
            container_height: host.offset_height(self.container),
            padding_top: self.padding.top,
            padding_bottom: self.padding.bottom,
            element_height: host.bounding_box(self.element).height,
            parent_top: node_document_top(host, self.container),
            viewport_height: pane_viewport_height(host, self.scroll_pane),
            scroll_pane_offset_top: document_offset_top(host, self.scroll_pane)
                + host.scroll_offset(),
        }
    }

    /// Evaluate unless a tick is already pending.
    pub fn handle_signal<H, S>(
        &mut self,
        host: &mut H,
        scheduler: &S,
        signal: Signal,
    ) -> Option<Evaluation>
    where
        H: LayoutHost + StyleHost + ?Sized,
        S: TickScheduler + ?Sized,
    {
        if !self.coalescer.try_begin(scheduler) {
            trace!(instance = %self.id, %signal, "signal coalesced");
            return None;
        }
        Some(self.evaluate(host, signal))
    }

    /// Run one evaluation now, bypassing the coalescer.
    pub fn evaluate<H: LayoutHost + StyleHost + ?Sized>(
        &mut self,
        host: &mut H,
        signal: Signal,
    ) -> Evaluation {
        let _span = debug_span!("sticky.evaluate", instance = %self.id, %signal).entered();

        let geo = self.measure(&*host);
        let scroll_y = host.scroll_offset();
        let scroll_delta = scroll_y - self.latest_scroll_y;
        self.latest_scroll_y = scroll_y;

        let previous = self.state;
        let decision = decide(previous, &geo, scroll_delta);
        let next = decision.next;
        let wrote = needs_write(previous, next);

        if wrote {
            if let Some(style) = StickyStyle::for_state(next, &geo) {
                host.apply_sticky_style(self.element, &self.transform, &style);
            }
            if next.mode == StickyMode::Absolute {
                self.state.offset = next.offset;
            }
            self.state.mode = next.mode;
            debug!(
                from = %previous.mode,
                to = %next.mode,
                offset = next.offset,
                rule = ?decision.rule,
                "sticky mode applied"
            );
        } else {
            trace!(mode = %previous.mode, rule = ?decision.rule, "style write suppressed");
        }

        Evaluation {
            instance: self.id,
            signal,
            previous,
            next: self.state,
            rule: decision.rule,
            scroll_delta,
            wrote,
        }
    }
}
