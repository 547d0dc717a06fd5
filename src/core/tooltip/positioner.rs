//! Viewport-aware tooltip placement.

/// Axis-aligned rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Which side of the origin the tooltip ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalSide {
    Below,
    Above,
}

impl VerticalSide {
    /// Arrow class: a tooltip below its origin points up from its top edge.
    pub fn arrow_class(self) -> &'static str {
        match self {
            VerticalSide::Below => "top",
            VerticalSide::Above => "bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    pub vertical: VerticalSide,
}

/// Place a tooltip below-right of the pointer (or below the anchor when
/// there is no pointer), flipping and clamping to stay on screen.
pub fn place(anchor: Rect, tooltip: Size, viewport: Size, pointer: Option<Point>, offset: f64) -> Placement {
    let (origin_x, below_y, above_y) = match pointer {
        Some(p) => (p.x, p.y, p.y),
        None => (anchor.center_x(), anchor.bottom(), anchor.top),
    };

    let mut left = origin_x + offset;
    if left + tooltip.width > viewport.width {
        left = origin_x - tooltip.width - offset;
    }

    let mut top = below_y + offset;
    if top + tooltip.height > viewport.height {
        top = above_y - tooltip.height - offset;
    }

    let left = clamp_axis(left, tooltip.width, viewport.width, offset);
    let top = clamp_axis(top, tooltip.height, viewport.height, offset);

    let vertical = if top >= above_y {
        VerticalSide::Below
    } else {
        VerticalSide::Above
    };

    Placement { left, top, vertical }
}

/// Clamp into `[offset, extent - size - offset]`, centring when that range
/// is empty.
fn clamp_axis(value: f64, size: f64, extent: f64, offset: f64) -> f64 {
    let lo = offset;
    let hi = extent - size - offset;
    if hi < lo {
        ((extent - size) / 2.0).max(0.0)
    } else {
        value.clamp(lo, hi)
    }
}
