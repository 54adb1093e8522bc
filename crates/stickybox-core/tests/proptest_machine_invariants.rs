//! Property-based invariant tests for the position state machine.
//!
//! ## Invariants
//!
//! 1. Fitting elements end up `FixedTop` on any unclamped, non-first tick
//! 2. Re-evaluating with unchanged inputs is a no-op (no second write)
//! 3. Top clamp always yields `Absolute` at offset 0
//! 4. Bottom clamp always rests the element on the container bottom
//! 5. Direction reversal: `FixedTop` → `Absolute` → `FixedTop`
//! 6. A decision never produces `NotSet`

use proptest::prelude::*;
use stickybox_core::{
    DecisionRule, StickyGeometry, StickyMode, StickyState, decide, needs_write,
};

// ── Strategies ────────────────────────────────────────────────────────────

fn arb_geometry() -> impl Strategy<Value = StickyGeometry> {
    (
        100u32..5000,
        0u32..50,
        0u32..50,
        10u32..3000,
        0u32..2000,
        100u32..2000,
        0u32..8000,
    )
        .prop_map(
            |(container, pad_top, pad_bottom, element, parent_top, viewport, scroll)| {
                StickyGeometry {
                    container_height: f64::from(container),
                    padding_top: f64::from(pad_top),
                    padding_bottom: f64::from(pad_bottom),
                    element_height: f64::from(element),
                    parent_top: f64::from(parent_top),
                    viewport_height: f64::from(viewport),
                    scroll_pane_offset_top: f64::from(scroll),
                }
            },
        )
}

fn arb_settled_mode() -> impl Strategy<Value = StickyMode> {
    prop_oneof![
        Just(StickyMode::FixedTop),
        Just(StickyMode::FixedBottom),
        Just(StickyMode::Absolute),
    ]
}

fn arb_any_mode() -> impl Strategy<Value = StickyMode> {
    prop_oneof![Just(StickyMode::NotSet), arb_settled_mode()]
}

fn arb_state(mode: impl Strategy<Value = StickyMode>) -> impl Strategy<Value = StickyState> {
    (mode, -500i32..3000).prop_map(|(mode, offset)| StickyState::new(mode, f64::from(offset)))
}

fn arb_delta() -> impl Strategy<Value = f64> {
    (-400i32..400).prop_map(f64::from)
}

fn with_scroll(geo: StickyGeometry, scroll: f64) -> StickyGeometry {
    StickyGeometry {
        scroll_pane_offset_top: scroll,
        ..geo
    }
}

/// Paddings and container position shared by the constructive strategies.
fn arb_frame() -> impl Strategy<Value = (f64, f64, f64)> {
    (0u32..50, 0u32..50, 0u32..2000)
        .prop_map(|(top, bottom, parent)| (f64::from(top), f64::from(bottom), f64::from(parent)))
}

/// Element shorter than the viewport, scrolled strictly between the clamps.
fn arb_fitting_unclamped() -> impl Strategy<Value = StickyGeometry> {
    (arb_frame(), 10u32..1000, 0u32..1000, 1u32..4000)
        .prop_flat_map(|((pad_top, pad_bottom, parent_top), element, extra, slack)| {
            let element = f64::from(element);
            let node = element + pad_top + pad_bottom;
            let geo = StickyGeometry {
                container_height: node + f64::from(slack),
                padding_top: pad_top,
                padding_bottom: pad_bottom,
                element_height: element,
                parent_top,
                viewport_height: node + f64::from(extra),
                scroll_pane_offset_top: 0.0,
            };
            let low = geo.top_clamp_threshold() as i64;
            let high = geo.bottom_clamp_threshold() as i64;
            (Just(geo), low..high)
        })
        .prop_map(|(geo, scroll)| with_scroll(geo, scroll as f64))
}

/// Element taller than the viewport, scrolled strictly between the clamps.
fn arb_tall_unclamped() -> impl Strategy<Value = StickyGeometry> {
    (arb_frame(), 100u32..1500, 1u32..1500, 1u32..4000)
        .prop_flat_map(|((pad_top, pad_bottom, parent_top), viewport, extra, slack)| {
            let viewport = f64::from(viewport);
            let element = viewport + f64::from(extra);
            let node = element + pad_top + pad_bottom;
            let geo = StickyGeometry {
                container_height: node + f64::from(slack),
                padding_top: pad_top,
                padding_bottom: pad_bottom,
                element_height: element,
                parent_top,
                viewport_height: viewport,
                scroll_pane_offset_top: 0.0,
            };
            let low = geo.top_clamp_threshold() as i64;
            let high = geo.bottom_clamp_threshold() as i64;
            (Just(geo), low..high)
        })
        .prop_map(|(geo, scroll)| with_scroll(geo, scroll as f64))
}

// ── 1. Fitting elements pin to the top ────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn fitting_element_is_fixed_top(
        geo in arb_fitting_unclamped(),
        state in arb_state(arb_settled_mode()),
        delta in arb_delta(),
    ) {
        prop_assert!(geo.fits_viewport());
        let d = decide(state, &geo, delta);
        prop_assert_eq!(d.next.mode, StickyMode::FixedTop);
    }
}

// ── 2. Idempotence ─────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn second_evaluation_without_scroll_is_noop(
        geo in arb_geometry(),
        state in arb_state(arb_settled_mode()),
    ) {
        let first = decide(state, &geo, 0.0);
        let second = decide(first.next, &geo, 0.0);
        prop_assert_eq!(second.next, first.next);
        prop_assert!(!needs_write(first.next, second.next));
    }
}

// ── 3. Top clamp ──────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn above_container_is_absolute_zero(
        geo in arb_geometry(),
        state in arb_state(arb_any_mode()),
        delta in arb_delta(),
        above in 1u32..500,
    ) {
        let geo = with_scroll(geo, geo.top_clamp_threshold() - f64::from(above));
        let d = decide(state, &geo, delta);
        prop_assert_eq!(d.next, StickyState::absolute(0.0));
        prop_assert_eq!(d.rule, DecisionRule::TopClamp);
    }

    #[test]
    fn scroll_origin_clamps_to_top(
        geo in arb_geometry(),
        state in arb_state(arb_any_mode()),
        delta in arb_delta(),
        padding_top in 1u32..50,
    ) {
        let geo = StickyGeometry {
            scroll_pane_offset_top: 0.0,
            padding_top: f64::from(padding_top),
            ..geo
        };
        let d = decide(state, &geo, delta);
        prop_assert_eq!(d.next, StickyState::absolute(0.0));
    }
}

// ── 4. Bottom clamp ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn past_container_rests_on_bottom(
        geo in arb_geometry(),
        state in arb_state(arb_any_mode()),
        delta in arb_delta(),
        beyond in 0u32..1000,
    ) {
        let edge = geo.top_clamp_threshold().max(geo.bottom_clamp_threshold());
        let geo = with_scroll(geo, edge + f64::from(beyond));
        let d = decide(state, &geo, delta);
        prop_assert_eq!(d.rule, DecisionRule::BottomClamp);
        prop_assert_eq!(d.next.mode, StickyMode::Absolute);
        prop_assert_eq!(d.next.offset, geo.container_height - geo.node_height());
    }
}

// ── 5. Direction reversal ─────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn down_then_up_returns_to_fixed_top(
        geo in arb_tall_unclamped(),
        down in 1i32..400,
        back in 0u32..4000,
    ) {
        prop_assert!(!geo.fits_viewport());

        let released = decide(StickyState::new(StickyMode::FixedTop, 0.0), &geo, f64::from(down));
        prop_assert_eq!(released.rule, DecisionRule::ReleaseFromTop);
        let expected = geo.scroll_pane_offset_top - geo.parent_top - geo.padding_top;
        prop_assert_eq!(released.next, StickyState::absolute(expected));

        let headroom = geo.scroll_pane_offset_top - geo.top_clamp_threshold();
        let back = f64::from(back).min(headroom);
        let up = StickyGeometry {
            scroll_pane_offset_top: geo.scroll_pane_offset_top - back,
            ..geo
        };
        let caught = decide(released.next, &up, -1.0);
        prop_assert_eq!(caught.next.mode, StickyMode::FixedTop);
        prop_assert_eq!(caught.next.offset, expected);
    }
}

// ── 6. Never NotSet ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn decisions_never_unset(
        geo in arb_geometry(),
        state in arb_state(arb_any_mode()),
        delta in arb_delta(),
    ) {
        let d = decide(state, &geo, delta);
        prop_assert_ne!(d.next.mode, StickyMode::NotSet);
    }
}
