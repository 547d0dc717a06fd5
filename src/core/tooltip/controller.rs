//! Tooltip Controller
//!
//! One overlay element, one state machine. The host forwards pointer, focus,
//! touch and window events to [`TooltipController::handle`] and calls
//! [`TooltipController::tick`] at (or after) [`TooltipController::next_deadline`].
//! Timers are deadlines stored in the state itself, so a superseded timer
//! simply no longer exists.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use super::content::TooltipContent;
use super::positioner::{place, Point, Rect, Size};
use crate::config::{InputMode, TooltipConfig};
use crate::core::dom::{Document, Element, NodeId};
use crate::core::knowledge_base::{EntityKind, KnowledgeBase};

/// Id of the shared overlay element.
pub const TOOLTIP_ID: &str = "tooltip-container";

/// Generic fallback content attribute.
const GENERIC_ATTRIBUTE: &str = "data-tooltip";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum TooltipError {
    #[error("Tooltip target element not found: {0}")]
    MissingTarget(&'static str),
}

pub type Result<T> = std::result::Result<T, TooltipError>;

// ============================================================================
// Host Seams
// ============================================================================

/// Geometry supplied by the host page.
pub trait Layout {
    fn bounding_rect(&self, node: NodeId) -> Rect;
    fn viewport(&self) -> Size;
}

/// Everything an event handler may touch.
pub struct Surface<'a> {
    pub doc: &'a mut Document,
    pub layout: &'a dyn Layout,
}

impl<'a> Surface<'a> {
    pub fn new(doc: &'a mut Document, layout: &'a dyn Layout) -> Self {
        Self { doc, layout }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TooltipEvent {
    PointerEnter { target: NodeId, at: Point },
    /// `related` is the node the pointer moved onto, if known.
    PointerLeave { target: NodeId, related: Option<NodeId> },
    PointerMove { at: Point },
    FocusIn { target: NodeId },
    FocusOut { target: NodeId },
    TouchStart { target: NodeId, at: Point },
    TouchEnd,
    Scroll,
    Resize,
    Click { target: NodeId },
    KeyDown(Key),
}

// ============================================================================
// State
// ============================================================================

/// What started the current display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Pointer,
    Focus,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TooltipState {
    Hidden,
    /// Show timer running.
    Pending {
        target: NodeId,
        trigger: Trigger,
        origin: Option<Point>,
        due: Instant,
    },
    Visible {
        target: NodeId,
        trigger: Trigger,
    },
    /// Still visible, hide timer running.
    Hiding {
        target: NodeId,
        trigger: Trigger,
        due: Instant,
    },
}

impl TooltipState {
    pub fn target(&self) -> Option<NodeId> {
        match *self {
            TooltipState::Hidden => None,
            TooltipState::Pending { target, .. }
            | TooltipState::Visible { target, .. }
            | TooltipState::Hiding { target, .. } => Some(target),
        }
    }

    /// Whether the overlay is on screen.
    pub fn is_shown(&self) -> bool {
        matches!(self, TooltipState::Visible { .. } | TooltipState::Hiding { .. })
    }
}

// ============================================================================
// Controller
// ============================================================================

pub struct TooltipController {
    config: TooltipConfig,
    kb: Option<Arc<KnowledgeBase>>,
    overlay: Option<NodeId>,
    scope: Option<NodeId>,
    state: TooltipState,
}

impl TooltipController {
    pub fn new(config: TooltipConfig) -> Self {
        Self {
            config,
            kb: None,
            overlay: None,
            scope: None,
            state: TooltipState::Hidden,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.kb.is_some()
    }

    pub fn state(&self) -> TooltipState {
        self.state
    }

    pub fn overlay(&self) -> Option<NodeId> {
        self.overlay
    }

    /// When the host should next call [`tick`](Self::tick).
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            TooltipState::Pending { due, .. } | TooltipState::Hiding { due, .. } => Some(due),
            _ => None,
        }
    }

    /// Attach to a rendered letter. Calling again after success is a no-op.
    pub fn initialize(&mut self, doc: &mut Document, kb: Arc<KnowledgeBase>) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        let scope = doc
            .find_by_class(doc.root(), "letter-body")
            .ok_or(TooltipError::MissingTarget(".letter-body"))?;

        let overlay = match doc.get_element_by_id(TOOLTIP_ID) {
            Some(existing) => existing,
            None => {
                let body = doc.body();
                doc.append(body, overlay_element().into())
            }
        };

        self.scope = Some(scope);
        self.overlay = Some(overlay);
        self.kb = Some(kb);
        self.state = TooltipState::Hidden;

        tracing::info!(mode = ?self.config.input_mode, "Tooltip system initialized");
        Ok(())
    }

    /// Cancel timers, hide, and detach. The overlay element stays in the page.
    pub fn destroy(&mut self, doc: &mut Document) {
        self.dismiss(doc);
        if let Some(overlay) = self.overlay {
            for slot in SLOTS {
                if let Some(node) = doc.find_by_class(overlay, slot) {
                    doc.set_text(node, "");
                }
            }
        }
        self.kb = None;
        self.scope = None;
        self.overlay = None;
        tracing::debug!("Tooltip system destroyed");
    }

    // ------------------------------------------------------------------------
    // Event Dispatch
    // ------------------------------------------------------------------------

    pub fn handle(&mut self, surface: &mut Surface<'_>, event: TooltipEvent, now: Instant) {
        if !self.is_initialized() {
            return;
        }

        match event {
            TooltipEvent::PointerEnter { target, at } => self.on_pointer_enter(surface, target, at, now),
            TooltipEvent::PointerLeave { target, related } => {
                self.on_pointer_leave(surface.doc, target, related, now)
            }
            TooltipEvent::PointerMove { at } => self.on_pointer_move(surface, at),
            TooltipEvent::FocusIn { target } => self.on_focus_in(surface, target),
            TooltipEvent::FocusOut { target } => self.on_focus_out(surface.doc, target, now),
            TooltipEvent::TouchStart { target, at } => self.on_touch_start(surface.doc, target, at, now),
            TooltipEvent::TouchEnd => self.on_touch_end(now),
            TooltipEvent::Scroll | TooltipEvent::Resize | TooltipEvent::KeyDown(Key::Escape) => {
                self.dismiss(surface.doc)
            }
            TooltipEvent::KeyDown(Key::Other) => {}
            TooltipEvent::Click { target } => {
                if self.state.is_shown() && !self.in_overlay(surface.doc, target) {
                    self.dismiss(surface.doc);
                }
            }
        }
    }

    /// Fire whichever timer is due.
    pub fn tick(&mut self, surface: &mut Surface<'_>, now: Instant) {
        match self.state {
            TooltipState::Pending {
                target,
                trigger,
                origin,
                due,
            } if due <= now => self.show(surface, target, trigger, origin),
            TooltipState::Hiding { due, .. } if due <= now => self.hide(surface.doc),
            _ => {}
        }
    }

    fn on_pointer_enter(&mut self, surface: &mut Surface<'_>, node: NodeId, at: Point, now: Instant) {
        if self.config.input_mode != InputMode::Pointer {
            return;
        }

        // Crossing from the trigger onto the overlay keeps it open.
        if self.in_overlay(surface.doc, node) {
            if let TooltipState::Hiding { target, trigger, .. } = self.state {
                self.state = TooltipState::Visible { target, trigger };
            }
            return;
        }

        let Some(found) = self.find_target(surface.doc, node) else {
            return;
        };

        match self.state {
            TooltipState::Pending { target, .. } | TooltipState::Visible { target, .. } if target == found => {
                return
            }
            TooltipState::Hiding { target, trigger, .. } if target == found => {
                self.state = TooltipState::Visible { target, trigger };
                return;
            }
            TooltipState::Visible { .. } | TooltipState::Hiding { .. } => self.hide(surface.doc),
            _ => {}
        }

        self.state = TooltipState::Pending {
            target: found,
            trigger: Trigger::Pointer,
            origin: Some(at),
            due: now + self.config.show_delay(),
        };
    }

    fn on_pointer_leave(&mut self, doc: &mut Document, node: NodeId, related: Option<NodeId>, now: Instant) {
        if self.config.input_mode != InputMode::Pointer {
            return;
        }
        let Some(current) = self.state.target() else {
            return;
        };

        let left_current = self.in_overlay(doc, node) || self.find_target(doc, node) == Some(current);
        if !left_current {
            return;
        }
        // Moving between children of the same span.
        if related.is_some_and(|r| doc.contains(current, r)) {
            return;
        }

        match self.state {
            TooltipState::Pending { .. } => self.state = TooltipState::Hidden,
            TooltipState::Visible { target, trigger } => {
                self.state = TooltipState::Hiding {
                    target,
                    trigger,
                    due: now + self.config.hide_delay(),
                }
            }
            _ => {}
        }
    }

    fn on_pointer_move(&mut self, surface: &mut Surface<'_>, at: Point) {
        match self.state {
            TooltipState::Pending {
                trigger: Trigger::Pointer,
                ref mut origin,
                ..
            } => *origin = Some(at),
            TooltipState::Visible {
                target,
                trigger: Trigger::Pointer,
            } => self.position(surface, target, Some(at)),
            _ => {}
        }
    }

    fn on_focus_in(&mut self, surface: &mut Surface<'_>, node: NodeId) {
        let Some(found) = self.find_target(surface.doc, node) else {
            return;
        };

        match self.state {
            TooltipState::Visible { target, .. } if target == found => return,
            TooltipState::Hiding { target, trigger, .. } if target == found => {
                self.state = TooltipState::Visible { target, trigger };
                return;
            }
            TooltipState::Visible { .. } | TooltipState::Hiding { .. } => self.hide(surface.doc),
            _ => {}
        }

        self.show(surface, found, Trigger::Focus, None);
    }

    fn on_focus_out(&mut self, doc: &mut Document, node: NodeId, now: Instant) {
        let Some(current) = self.state.target() else {
            return;
        };
        if self.find_target(doc, node) != Some(current) {
            return;
        }

        match self.state {
            TooltipState::Pending { .. } => self.state = TooltipState::Hidden,
            TooltipState::Visible { target, trigger } => {
                self.state = TooltipState::Hiding {
                    target,
                    trigger,
                    due: now + self.config.hide_delay(),
                }
            }
            _ => {}
        }
    }

    fn on_touch_start(&mut self, doc: &mut Document, node: NodeId, at: Point, now: Instant) {
        if self.config.input_mode != InputMode::Touch {
            return;
        }
        let Some(found) = self.find_target(doc, node) else {
            return;
        };

        if self.state.is_shown() {
            self.hide(doc);
        }
        self.state = TooltipState::Pending {
            target: found,
            trigger: Trigger::Touch,
            origin: Some(at),
            due: now + self.config.touch_hold(),
        };
    }

    fn on_touch_end(&mut self, now: Instant) {
        if self.config.input_mode != InputMode::Touch {
            return;
        }

        match self.state {
            TooltipState::Pending { .. } => self.state = TooltipState::Hidden,
            // No natural leave event on touch screens.
            TooltipState::Visible { target, trigger } => {
                self.state = TooltipState::Hiding {
                    target,
                    trigger,
                    due: now + self.config.touch_auto_hide(),
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------------
    // Overlay
    // ------------------------------------------------------------------------

    fn show(&mut self, surface: &mut Surface<'_>, target: NodeId, trigger: Trigger, origin: Option<Point>) {
        let (Some(overlay), Some(content)) = (self.overlay, self.content_for(surface.doc, target)) else {
            self.state = TooltipState::Hidden;
            return;
        };

        let doc = &mut *surface.doc;
        for (slot, text) in [
            ("tooltip-title", &content.title),
            ("tooltip-type", &content.type_label),
            ("tooltip-description", &content.description),
            ("tooltip-details", &content.details),
        ] {
            if let Some(node) = doc.find_by_class(overlay, slot) {
                doc.set_text(node, text);
            }
        }
        doc.set_attr(
            overlay,
            "class",
            &format!("tooltip-container {} visible", content.category),
        );
        doc.set_style(overlay, "max-width", &format!("{}px", self.config.max_width));
        doc.set_attr(overlay, "aria-hidden", "false");
        doc.set_attr(target, "aria-describedby", TOOLTIP_ID);

        let pointer = match trigger {
            Trigger::Focus => None,
            Trigger::Pointer | Trigger::Touch => origin,
        };
        self.position(surface, target, pointer);

        tracing::debug!(category = %content.category, title = %content.title, "Tooltip shown");
        self.state = TooltipState::Visible { target, trigger };
    }

    fn position(&self, surface: &mut Surface<'_>, target: NodeId, pointer: Option<Point>) {
        let Some(overlay) = self.overlay else {
            return;
        };

        let anchor = surface.layout.bounding_rect(target);
        let measured = surface.layout.bounding_rect(overlay);
        let tooltip = Size::new(
            if measured.width > 0.0 { measured.width } else { self.config.max_width },
            measured.height,
        );
        let placement = place(anchor, tooltip, surface.layout.viewport(), pointer, self.config.position_offset);

        let doc = &mut *surface.doc;
        doc.set_style(overlay, "left", &format!("{}px", placement.left));
        doc.set_style(overlay, "top", &format!("{}px", placement.top));
        doc.remove_class(overlay, "top");
        doc.remove_class(overlay, "bottom");
        doc.add_class(overlay, placement.vertical.arrow_class());
    }

    /// Hide at once and drop the ARIA link.
    fn hide(&mut self, doc: &mut Document) {
        let root = doc.root();
        for described in doc.find_all_with_attr(root, "aria-describedby") {
            if doc.attr(described, "aria-describedby") == Some(TOOLTIP_ID) {
                doc.remove_attr(described, "aria-describedby");
            }
        }
        if let Some(overlay) = self.overlay {
            doc.remove_class(overlay, "visible");
            doc.set_attr(overlay, "aria-hidden", "true");
        }
        self.state = TooltipState::Hidden;
    }

    /// Hide immediately and cancel any timer.
    fn dismiss(&mut self, doc: &mut Document) {
        if self.state.is_shown() {
            self.hide(doc);
        }
        self.state = TooltipState::Hidden;
    }

    // ------------------------------------------------------------------------
    // Targets
    // ------------------------------------------------------------------------

    fn in_overlay(&self, doc: &Document, node: NodeId) -> bool {
        self.overlay.is_some_and(|overlay| doc.contains(overlay, node))
    }

    /// Nearest element at or above `node`, inside the letter body, that
    /// carries tooltip data.
    fn find_target(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        let scope = self.scope?;
        if !doc.contains(scope, node) {
            return None;
        }
        doc.ancestors_or_self(node)
            .take_while(|&n| n != scope)
            .find(|&n| has_tooltip_data(doc, n))
    }

    fn content_for(&self, doc: &Document, target: NodeId) -> Option<TooltipContent> {
        let kb = self.kb.as_ref()?;
        for kind in EntityKind::ALL {
            if let Some(id) = doc.attr(target, kind.data_attribute()) {
                return Some(TooltipContent::for_entity(&kb.get(kind, id)));
            }
        }
        doc.attr(target, GENERIC_ATTRIBUTE)
            .map(|text| TooltipContent::general(&doc.text_content(target), text))
    }
}

const SLOTS: [&str; 4] = [
    "tooltip-title",
    "tooltip-type",
    "tooltip-description",
    "tooltip-details",
];

fn has_tooltip_data(doc: &Document, node: NodeId) -> bool {
    EntityKind::ALL
        .iter()
        .any(|kind| doc.has_attr(node, kind.data_attribute()))
        || doc.has_attr(node, GENERIC_ATTRIBUTE)
}

fn overlay_element() -> Element {
    Element::new("div")
        .id(TOOLTIP_ID)
        .class("tooltip-container")
        .attr("role", "tooltip")
        .attr("aria-hidden", "true")
        .child(
            Element::new("div")
                .class("tooltip-content")
                .child(
                    Element::new("div")
                        .class("tooltip-header")
                        .child(Element::new("span").class("tooltip-title"))
                        .child(Element::new("span").class("tooltip-type")),
                )
                .child(
                    Element::new("div")
                        .class("tooltip-body")
                        .child(Element::new("p").class("tooltip-description"))
                        .child(Element::new("div").class("tooltip-details")),
                )
                .child(Element::new("div").class("tooltip-arrow")),
        )
}
