//! Property-based tests for the tooltip state machine
//!
//! Tests invariants:
//! - Entering and leaving a reference before the show delay never shows a
//!   tooltip, whatever the timer ticks in between
//! - Staying past the show delay always shows it

use proptest::prelude::*;

use crate::config::TooltipConfig;
use crate::core::tooltip::{Point, Surface, TooltipEvent, TooltipState};
use crate::tests::common::TooltipFixture;

const SHOW_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, Copy)]
enum Step {
    Enter,
    Leave,
    Tick,
}

/// Enter at `enter`, leave `dwell` ms later, with ticks sprinkled anywhere.
fn schedule(enter: u64, dwell: u64, ticks: Vec<u64>) -> Vec<(u64, Step)> {
    let mut steps = vec![(enter, Step::Enter), (enter + dwell, Step::Leave)];
    steps.extend(ticks.into_iter().map(|t| (t, Step::Tick)));
    // Stable: at equal times the pointer moves before the timer fires.
    steps.sort_by_key(|(t, _)| *t);
    steps
}

fn run(fx: &mut TooltipFixture, steps: &[(u64, Step)]) -> Vec<TooltipState> {
    let target = fx.target;
    let mut seen = Vec::with_capacity(steps.len());
    for &(ms, step) in steps {
        let now = fx.at(ms);
        let mut surface = Surface::new(&mut fx.doc, &fx.layout);
        match step {
            Step::Enter => fx.controller.handle(
                &mut surface,
                TooltipEvent::PointerEnter {
                    target,
                    at: Point::new(120.0, 205.0),
                },
                now,
            ),
            Step::Leave => fx.controller.handle(
                &mut surface,
                TooltipEvent::PointerLeave {
                    target,
                    related: None,
                },
                now,
            ),
            Step::Tick => fx.controller.tick(&mut surface, now),
        }
        seen.push(fx.controller.state());
    }
    seen
}

proptest! {
    #[test]
    fn leaving_before_show_delay_never_shows(
        enter in 0u64..1_000,
        dwell in 0u64..SHOW_DELAY_MS,
        ticks in prop::collection::vec(0u64..4_000, 0..24),
    ) {
        let mut fx = TooltipFixture::new(TooltipConfig::default());
        let states = run(&mut fx, &schedule(enter, dwell, ticks));

        prop_assert!(states.iter().all(|s| !s.is_shown()));
        prop_assert_eq!(fx.controller.state(), TooltipState::Hidden);

        let overlay = fx.controller.overlay().unwrap();
        prop_assert!(!fx.doc.has_class(overlay, "visible"));
    }

    #[test]
    fn dwelling_past_show_delay_shows(
        enter in 0u64..1_000,
        extra in 0u64..1_000,
    ) {
        let mut fx = TooltipFixture::new(TooltipConfig::default());
        let steps = [
            (enter, Step::Enter),
            (enter + SHOW_DELAY_MS + extra, Step::Tick),
        ];
        run(&mut fx, &steps);

        prop_assert!(fx.controller.state().is_shown());
        let overlay = fx.controller.overlay().unwrap();
        prop_assert!(fx.doc.has_class(overlay, "visible"));
    }
}
