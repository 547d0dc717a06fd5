//! Property-based tests for tooltip placement
//!
//! Tests invariants:
//! - A tooltip that fits the viewport is placed entirely inside it
//! - The arrow side agrees with the vertical placement

use proptest::prelude::*;

use crate::core::tooltip::{place, Point, Rect, Size, VerticalSide};

const EPSILON: f64 = 1e-9;

fn arb_viewport() -> impl Strategy<Value = Size> {
    (320.0..2560.0f64, 240.0..1600.0f64).prop_map(|(w, h)| Size::new(w, h))
}

proptest! {
    #[test]
    fn fitting_tooltip_stays_in_viewport(
        viewport in arb_viewport(),
        scale in (0.05..1.0f64, 0.05..1.0f64),
        pointer in (0.0..1.0f64, 0.0..1.0f64),
        use_pointer in any::<bool>(),
        offset in 0.0..40.0f64,
    ) {
        let tooltip = Size::new(viewport.width * scale.0, viewport.height * scale.1);
        let at = Point::new(viewport.width * pointer.0, viewport.height * pointer.1);
        let anchor = Rect::new(at.x, at.y, 40.0, 16.0);

        let placed = place(anchor, tooltip, viewport, use_pointer.then_some(at), offset);

        prop_assert!(placed.left >= -EPSILON);
        prop_assert!(placed.top >= -EPSILON);
        prop_assert!(placed.left + tooltip.width <= viewport.width + EPSILON);
        prop_assert!(placed.top + tooltip.height <= viewport.height + EPSILON);
    }

    #[test]
    fn arrow_class_matches_side(
        viewport in arb_viewport(),
        y in 0.0..1.0f64,
    ) {
        let at = Point::new(viewport.width / 2.0, viewport.height * y);
        let placed = place(Rect::default(), Size::new(200.0, 80.0), viewport, Some(at), 10.0);
        let expected = match placed.vertical {
            VerticalSide::Below => "top",
            VerticalSide::Above => "bottom",
        };
        prop_assert_eq!(placed.vertical.arrow_class(), expected);
        prop_assert_eq!(placed.vertical == VerticalSide::Below, placed.top >= at.y);
    }
}
