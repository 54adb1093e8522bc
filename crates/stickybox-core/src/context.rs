#![forbid(unsafe_code)]

//! The instance registry.
//!
//! [`StickyContext`] is owned by the hosting layout system. It mounts and
//! unmounts instances, routes host signals to them, and offers
//! [`StickyContext::recompute_all`] for layout changes no listener sees
//! (collapsing a sibling panel, for example).
//!
//! Everything runs on one thread. An instance is visible to `recompute_all`
//! as soon as [`StickyContext::mount`] returns.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::coalescer::TickScheduler;
use crate::config::StickyConfig;
use crate::geometry::{LayoutHost, container_of, find_scroll_ancestor};
use crate::host::{
    InstanceId, ListenKind, ListenTarget, Reservation, Signal, StickyHost, StyleHost,
};
use crate::instance::{Evaluation, PaddingSnapshot, StickyInstance};
use crate::lifecycle::{InertReason, MountRequest, MountStatus, StickyMount, content_width};

/// Registry of live sticky instances plus the scheduler they share.
pub struct StickyContext {
    config: StickyConfig,
    scheduler: Rc<dyn TickScheduler>,
    instances: FxHashMap<InstanceId, StickyInstance>,
    next_id: u64,
}

impl std::fmt::Debug for StickyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StickyContext")
            .field("config", &self.config)
            .field("instances", &self.instances.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl StickyContext {
    /// Create a context with the default config.
    pub fn new(scheduler: impl TickScheduler + 'static) -> Self {
        Self::with_config(StickyConfig::default(), scheduler)
    }

    pub fn with_config(config: StickyConfig, scheduler: impl TickScheduler + 'static) -> Self {
        Self {
            config,
            scheduler: Rc::new(scheduler),
            instances: FxHashMap::default(),
            next_id: 1,
        }
    }

    #[must_use]
    pub fn config(&self) -> &StickyConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<&StickyInstance> {
        self.instances.get(&id)
    }

    /// Registered ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self.instances.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Mount a rendered element.
    ///
    /// Reserves wrapper space, then either registers an active instance or
    /// returns an inert handle when the host cannot position the element.
    pub fn mount<H: StickyHost + ?Sized>(
        &mut self,
        host: &mut H,
        request: MountRequest,
    ) -> StickyMount {
        let element = request.element;
        let wrapper = host.parent(element);
        let reservation = Reservation {
            width: request.width,
            height: self.config.initial_reserved_height,
        };
        if let Some(wrapper) = wrapper {
            host.reserve_space(wrapper, reservation);
        }

        let Some(transform) = host.transform_property(element) else {
            debug!(%element, reason = %InertReason::NoTransform, "sticky mount inert");
            return StickyMount::new(
                element,
                wrapper,
                reservation,
                MountStatus::Inert(InertReason::NoTransform),
            );
        };
        let Some(container) = container_of(&*host, element) else {
            debug!(%element, reason = %InertReason::MissingContainer, "sticky mount inert");
            return StickyMount::new(
                element,
                wrapper,
                reservation,
                MountStatus::Inert(InertReason::MissingContainer),
            );
        };

        let id = InstanceId(self.next_id);
        self.next_id += 1;

        let container_padding = host.padding(container);
        let padding = PaddingSnapshot::new(container_padding.top, container_padding.bottom);
        let scroll_pane = find_scroll_ancestor(&*host, element);

        let mut instance = StickyInstance::new(
            id,
            element,
            container,
            scroll_pane,
            transform,
            padding,
            self.config.initial_scroll_sentinel,
        );

        let mut listeners = vec![(ListenTarget::Pane(scroll_pane), ListenKind::Scroll)];
        if self.config.listen_wheel {
            listeners.push((ListenTarget::Pane(scroll_pane), ListenKind::Wheel));
        }
        if self.config.listen_resize {
            listeners.push((ListenTarget::Window, ListenKind::Resize));
        }
        for (target, kind) in listeners {
            host.add_listener(target, kind, id);
            instance.record_listener(target, kind);
        }

        instance.handle_signal(host, &*self.scheduler, Signal::Mount);
        self.instances.insert(id, instance);

        let width = content_width(&*host, element, request.width);
        host.set_width(element, width);

        if self.config.observe_mutations {
            let filter = self.config.mutation_filter();
            let observer = host.observe_mutations(container, &filter, id);
            if let Some(instance) = self.instances.get_mut(&id) {
                instance.set_observer(observer);
            }
        }

        debug!(
            instance = %id,
            %element,
            %container,
            scroll_pane = ?scroll_pane,
            "sticky mounted"
        );
        StickyMount::new(element, wrapper, reservation, MountStatus::Active(id))
    }

    /// Tear down a mount: detach listeners, disconnect the observer, and
    /// unregister. Returns `true` when an instance was removed.
    ///
    /// Safe while a tick is pending; the deferred clear becomes a no-op.
    pub fn unmount<H: StickyHost + ?Sized>(&mut self, host: &mut H, mount: StickyMount) -> bool {
        let Some(id) = mount.id() else {
            return false;
        };
        let Some(mut instance) = self.instances.remove(&id) else {
            return false;
        };
        for registration in instance.take_listeners() {
            host.remove_listener(registration.target, registration.kind, id);
        }
        if let Some(observer) = instance.take_observer() {
            host.disconnect_observer(observer);
        }
        debug!(instance = %id, pending = instance.tick_pending(), "sticky unmounted");
        true
    }

    /// Deliver a host signal to one instance.
    ///
    /// Returns `None` when the id is unknown or the signal was coalesced.
    pub fn dispatch<H>(
        &mut self,
        host: &mut H,
        id: InstanceId,
        signal: Signal,
    ) -> Option<Evaluation>
    where
        H: LayoutHost + StyleHost + ?Sized,
    {
        let Some(instance) = self.instances.get_mut(&id) else {
            trace!(instance = %id, %signal, "signal for unknown instance ignored");
            return None;
        };
        instance.handle_signal(host, &*self.scheduler, signal)
    }

    /// The container subtree of `id` changed.
    pub fn on_layout_changed<H>(&mut self, host: &mut H, id: InstanceId) -> Option<Evaluation>
    where
        H: LayoutHost + StyleHost + ?Sized,
    {
        self.dispatch(host, id, Signal::Mutation)
    }

    /// Re-evaluate every registered instance. Instances with a pending tick
    /// are skipped by their coalescer.
    pub fn recompute_all<H>(&mut self, host: &mut H) -> Vec<Evaluation>
    where
        H: LayoutHost + StyleHost + ?Sized,
    {
        let ids = self.ids();
        debug!(instances = ids.len(), "recompute all");
        ids.into_iter()
            .filter_map(|id| self.dispatch(host, id, Signal::Recompute))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;
    use tracing_subscriber::layer::SubscriberExt;

    use crate::coalescer::ManualScheduler;
    use crate::config::MutationFilter;
    use crate::geometry::{BoundingBox, BoxSizing, NodeId, OverflowY, Padding, ScrollPane};
    use crate::host::{ListenerHost, ObserverHandle};
    use crate::machine::StickyMode;
    use crate::style::StickyStyle;
    use crate::transform::TransformProperty;

    const CONTAINER: NodeId = NodeId(1);
    const WRAPPER: NodeId = NodeId(2);
    const ELEMENT: NodeId = NodeId(3);

    /// Container at document top `parent_top`, wrapper inside it, element
    /// inside the wrapper. Everything scrolls with the window.
    struct FakeHost {
        parent_top: f64,
        container_height: f64,
        element_height: f64,
        viewport: f64,
        scroll: f64,
        transform: bool,
        observer_support: bool,
        container_padding: Padding,
        element_padding: Padding,
        sizing: BoxSizing,
        writes: Vec<StickyStyle>,
        widths: Vec<f64>,
        reserved: Vec<(NodeId, Reservation)>,
        listeners: Vec<(ListenTarget, ListenKind, InstanceId)>,
        observers: Vec<ObserverHandle>,
    }

    impl FakeHost {
        fn new() -> Self {
            Self {
                parent_top: 0.0,
                container_height: 2000.0,
                element_height: 600.0,
                viewport: 800.0,
                scroll: 0.0,
                transform: true,
                observer_support: true,
                container_padding: Padding::default(),
                element_padding: Padding::default(),
                sizing: BoxSizing::BorderBox,
                writes: Vec::new(),
                widths: Vec::new(),
                reserved: Vec::new(),
                listeners: Vec::new(),
                observers: Vec::new(),
            }
        }
    }

    impl LayoutHost for FakeHost {
        fn parent(&self, node: NodeId) -> Option<NodeId> {
            match node {
                ELEMENT => Some(WRAPPER),
                WRAPPER => Some(CONTAINER),
                _ => None,
            }
        }
        fn offset_parent(&self, node: NodeId) -> Option<NodeId> {
            self.parent(node)
        }
        fn overflow_y(&self, _node: NodeId) -> OverflowY {
            OverflowY::Visible
        }
        fn bounding_box(&self, node: NodeId) -> BoundingBox {
            match node {
                CONTAINER => BoundingBox::new(
                    self.parent_top - self.scroll,
                    0.0,
                    300.0,
                    self.container_height,
                ),
                _ => BoundingBox::new(0.0, 0.0, 300.0, self.element_height),
            }
        }
        fn offset_height(&self, node: NodeId) -> f64 {
            self.bounding_box(node).height
        }
        fn padding(&self, node: NodeId) -> Padding {
            match node {
                CONTAINER => self.container_padding,
                ELEMENT => self.element_padding,
                _ => Padding::default(),
            }
        }
        fn box_sizing(&self, _node: NodeId) -> BoxSizing {
            self.sizing
        }
        fn scroll_offset(&self) -> f64 {
            self.scroll
        }
        fn viewport_height(&self) -> f64 {
            self.viewport
        }
    }

    impl StyleHost for FakeHost {
        fn supports_style_property(&self, _node: NodeId, property: &str) -> bool {
            self.transform && property == "WebkitTransform"
        }
        fn apply_sticky_style(
            &mut self,
            node: NodeId,
            transform: &TransformProperty,
            style: &StickyStyle,
        ) {
            assert_eq!(node, ELEMENT);
            assert_eq!(transform.as_str(), "WebkitTransform");
            self.writes.push(*style);
        }
        fn set_width(&mut self, _node: NodeId, width: f64) {
            self.widths.push(width);
        }
        fn reserve_space(&mut self, wrapper: NodeId, reservation: Reservation) {
            self.reserved.push((wrapper, reservation));
        }
    }

    impl ListenerHost for FakeHost {
        fn add_listener(&mut self, target: ListenTarget, kind: ListenKind, instance: InstanceId) {
            self.listeners.push((target, kind, instance));
        }
        fn remove_listener(&mut self, target: ListenTarget, kind: ListenKind, instance: InstanceId) {
            self.listeners.retain(|entry| *entry != (target, kind, instance));
        }
        fn observe_mutations(
            &mut self,
            node: NodeId,
            filter: &MutationFilter,
            _instance: InstanceId,
        ) -> Option<ObserverHandle> {
            assert_eq!(node, CONTAINER);
            assert!(filter.matches_attribute("class"));
            if !self.observer_support {
                return None;
            }
            let handle = ObserverHandle(self.observers.len() as u64 + 1);
            self.observers.push(handle);
            Some(handle)
        }
        fn disconnect_observer(&mut self, handle: ObserverHandle) {
            self.observers.retain(|h| *h != handle);
        }
    }

    fn setup() -> (StickyContext, ManualScheduler, FakeHost) {
        let scheduler = ManualScheduler::new();
        let ctx = StickyContext::new(scheduler.clone());
        (ctx, scheduler, FakeHost::new())
    }

    #[test]
    fn mount_registers_and_anchors() {
        let (mut ctx, scheduler, mut host) = setup();
        let mount = ctx.mount(&mut host, MountRequest::new(ELEMENT, 300.0));
        let id = mount.id().expect("active mount");

        assert!(ctx.contains(id));
        let instance = ctx.get(id).unwrap();
        assert_eq!(instance.state().mode, StickyMode::Absolute);
        assert_eq!(instance.state().offset, 0.0);
        assert_eq!(instance.scroll_pane(), ScrollPane::Viewport);
        assert!(instance.tick_pending());
        assert_eq!(host.writes.len(), 1);
        assert_eq!(host.listeners.len(), 3);
        assert_eq!(host.observers.len(), 1);
        assert_eq!(
            host.reserved,
            vec![(WRAPPER, Reservation { width: 300.0, height: 1.0 })]
        );
        assert_eq!(host.widths, vec![300.0]);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn second_tick_fixes_fitting_element() {
        let (mut ctx, scheduler, mut host) = setup();
        let id = ctx.mount(&mut host, MountRequest::new(ELEMENT, 300.0)).id().unwrap();

        assert!(ctx.dispatch(&mut host, id, Signal::Scroll).is_none());
        scheduler.run_pending();

        let eval = ctx.dispatch(&mut host, id, Signal::Scroll).unwrap();
        assert_eq!(eval.next.mode, StickyMode::FixedTop);
        assert!(eval.wrote);

        scheduler.run_pending();
        let eval = ctx.dispatch(&mut host, id, Signal::Scroll).unwrap();
        assert_eq!(eval.next.mode, StickyMode::FixedTop);
        assert!(!eval.wrote);
        assert_eq!(host.writes.len(), 2);
    }

    #[test]
    fn missing_transform_is_inert() {
        let (mut ctx, scheduler, mut host) = setup();
        host.transform = false;
        let mut mount = ctx.mount(&mut host, MountRequest::new(ELEMENT, 240.0));

        assert_eq!(mount.status(), MountStatus::Inert(InertReason::NoTransform));
        assert!(ctx.is_empty());
        assert!(host.listeners.is_empty());
        assert!(host.writes.is_empty());
        assert!(host.widths.is_empty());
        assert_eq!(scheduler.pending(), 0);

        assert!(mount.on_measure(&mut host, 480.0));
        assert_eq!(host.reserved.last().unwrap().1.height, 480.0);
        assert!(!ctx.unmount(&mut host, mount));
    }

    #[test]
    fn element_without_container_is_inert() {
        let (mut ctx, _scheduler, mut host) = setup();
        let mount = ctx.mount(&mut host, MountRequest::new(WRAPPER, 100.0));
        assert_eq!(
            mount.status(),
            MountStatus::Inert(InertReason::MissingContainer)
        );
        assert!(ctx.is_empty());
    }

    #[test]
    fn content_box_subtracts_whole_pixel_padding() {
        let (mut ctx, _scheduler, mut host) = setup();
        host.sizing = BoxSizing::ContentBox;
        host.element_padding = Padding::new(0.0, 12.7, 0.0, 8.2);
        ctx.mount(&mut host, MountRequest::new(ELEMENT, 300.0));
        assert_eq!(host.widths, vec![280.0]);
    }

    #[test]
    fn unmount_with_pending_tick_is_clean() {
        let (mut ctx, scheduler, mut host) = setup();
        let mount = ctx.mount(&mut host, MountRequest::new(ELEMENT, 300.0));
        let id = mount.id().unwrap();
        assert!(ctx.get(id).unwrap().tick_pending());

        assert!(ctx.unmount(&mut host, mount));
        assert!(!ctx.contains(id));
        assert!(host.listeners.is_empty());
        assert!(host.observers.is_empty());

        assert_eq!(scheduler.run_pending(), 1);
        assert!(ctx.dispatch(&mut host, id, Signal::Scroll).is_none());
    }

    #[test]
    fn host_without_observer_support_still_mounts() {
        let (mut ctx, _scheduler, mut host) = setup();
        host.observer_support = false;
        let id = ctx.mount(&mut host, MountRequest::new(ELEMENT, 300.0)).id().unwrap();
        assert_eq!(ctx.get(id).unwrap().observer(), None);
    }

    #[test]
    fn config_can_drop_optional_listeners() {
        let scheduler = ManualScheduler::new();
        let config = StickyConfig {
            listen_wheel: false,
            listen_resize: false,
            observe_mutations: false,
            ..StickyConfig::default()
        };
        let mut ctx = StickyContext::with_config(config, scheduler);
        let mut host = FakeHost::new();
        let id = ctx.mount(&mut host, MountRequest::new(ELEMENT, 300.0)).id().unwrap();
        assert_eq!(
            host.listeners,
            vec![(ListenTarget::Pane(ScrollPane::Viewport), ListenKind::Scroll, id)]
        );
        assert!(host.observers.is_empty());
    }

    #[test]
    fn recompute_all_visits_every_instance() {
        let (mut ctx, scheduler, mut host) = setup();
        let a = ctx.mount(&mut host, MountRequest::new(ELEMENT, 300.0)).id().unwrap();
        let b = ctx.mount(&mut host, MountRequest::new(ELEMENT, 300.0)).id().unwrap();
        assert_ne!(a, b);

        assert!(ctx.recompute_all(&mut host).is_empty());
        scheduler.run_pending();

        let evals = ctx.recompute_all(&mut host);
        let ids: Vec<InstanceId> = evals.iter().map(|e| e.instance).collect();
        assert_eq!(ids, vec![a, b]);
        assert!(evals.iter().all(|e| e.signal == Signal::Recompute));
    }

    #[test]
    fn layout_change_uses_live_geometry() {
        let (mut ctx, scheduler, mut host) = setup();
        host.element_height = 1000.0;
        host.viewport = 600.0;
        host.container_height = 5000.0;
        let id = ctx.mount(&mut host, MountRequest::new(ELEMENT, 300.0)).id().unwrap();
        scheduler.run_pending();

        host.scroll = 400.0;
        host.container_height = 900.0;
        let eval = ctx.on_layout_changed(&mut host, id).unwrap();
        assert_eq!(eval.signal, Signal::Mutation);
        // 400 >= 900 - min(600, 1000): clamp to the bottom.
        assert_eq!(eval.rule, crate::machine::DecisionRule::BottomClamp);
        assert_eq!(eval.next.offset, -100.0);
    }

    /// Records the level and message of every event.
    #[derive(Clone, Default)]
    struct MessageCapture(Arc<Mutex<Vec<(tracing::Level, String)>>>);

    struct MessageVisitor(Option<String>);

    impl tracing::field::Visit for MessageVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = Some(format!("{value:?}"));
            }
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for MessageCapture {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut visitor = MessageVisitor(None);
            event.record(&mut visitor);
            if let Some(message) = visitor.0 {
                self.0
                    .lock()
                    .unwrap()
                    .push((*event.metadata().level(), message));
            }
        }
    }

    #[test]
    fn lifecycle_events_are_logged() {
        let (mut ctx, _scheduler, mut host) = setup();
        let capture = MessageCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        tracing::subscriber::with_default(subscriber, || {
            let mount = ctx.mount(&mut host, MountRequest::new(ELEMENT, 300.0));
            let id = mount.id().unwrap();
            assert!(ctx.unmount(&mut host, mount));
            assert!(ctx.dispatch(&mut host, id, Signal::Scroll).is_none());
        });

        let events = capture.0.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                (tracing::Level::DEBUG, "sticky mode applied".to_owned()),
                (tracing::Level::DEBUG, "sticky mounted".to_owned()),
                (tracing::Level::DEBUG, "sticky unmounted".to_owned()),
                (tracing::Level::TRACE, "signal for unknown instance ignored".to_owned()),
            ]
        );
    }
}
