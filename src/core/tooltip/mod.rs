//! Entity Tooltips
//!
//! - [`controller`]: the single-overlay state machine driven by host events
//! - [`content`]: what the overlay says about a target
//! - [`positioner`]: where the overlay goes

pub mod content;
pub mod controller;
pub mod positioner;

pub use content::TooltipContent;
pub use controller::{
    Key, Layout, Surface, TooltipController, TooltipError, TooltipEvent, TooltipState, Trigger,
    TOOLTIP_ID,
};
pub use positioner::{place, Placement, Point, Rect, Size, VerticalSide};
