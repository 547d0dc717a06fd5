//! Test Fixtures
//!
//! Rendered pages, letters with chosen prose, and fixed layout geometry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::TooltipConfig;
use crate::core::content::{fallback_letter, LetterData};
use crate::core::dom::{Document, Element, NodeId};
use crate::core::knowledge_base::KnowledgeBase;
use crate::core::renderer::{LetterRenderer, RenderOptions};
use crate::core::tooltip::{Layout, Rect, Size, TooltipController};

pub const CONTAINER_ID: &str = "app-container";

// =============================================================================
// Letter Fixtures
// =============================================================================

/// The fallback letter with its first paragraph replaced.
pub fn letter_with(first_paragraph: &str) -> LetterData {
    let mut letter = fallback_letter();
    letter.content.paragraphs[0].text = first_paragraph.to_string();
    letter
}

/// An empty page holding only `<main id="app-container">`.
pub fn empty_page() -> Document {
    let mut doc = Document::new("Letter");
    let body = doc.body();
    doc.append(body, Element::new("main").id(CONTAINER_ID).into());
    doc
}

/// Render `letter` into a fresh page.
pub fn rendered_page(kb: &KnowledgeBase, letter: &LetterData) -> Document {
    let mut doc = empty_page();
    LetterRenderer::new(kb, RenderOptions::default())
        .render(&mut doc, CONTAINER_ID, letter)
        .expect("Failed to render test letter");
    doc
}

// =============================================================================
// Layout Fixtures
// =============================================================================

/// Host geometry with hand-placed rectangles.
pub struct FixedLayout {
    rects: HashMap<NodeId, Rect>,
    viewport: Size,
}

impl FixedLayout {
    pub fn new(viewport: Size) -> Self {
        Self {
            rects: HashMap::new(),
            viewport,
        }
    }

    pub fn with_rect(mut self, node: NodeId, rect: Rect) -> Self {
        self.rects.insert(node, rect);
        self
    }
}

impl Layout for FixedLayout {
    fn bounding_rect(&self, node: NodeId) -> Rect {
        self.rects.get(&node).copied().unwrap_or_default()
    }

    fn viewport(&self) -> Size {
        self.viewport
    }
}

// =============================================================================
// Tooltip Fixtures
// =============================================================================

/// A rendered page with one character reference and an attached controller.
pub struct TooltipFixture {
    pub doc: Document,
    pub layout: FixedLayout,
    pub controller: TooltipController,
    pub target: NodeId,
    pub t0: Instant,
}

impl TooltipFixture {
    pub fn new(config: TooltipConfig) -> Self {
        let kb = Arc::new(KnowledgeBase::embedded());
        let mut doc = rendered_page(&kb, &letter_with("Greetings, {character:rothbart}."));

        let root = doc.root();
        let target = doc.find_all_with_attr(root, "data-character")[0];

        let mut controller = TooltipController::new(config);
        controller
            .initialize(&mut doc, kb)
            .expect("Failed to initialize tooltips");
        let overlay = controller.overlay().expect("overlay exists after initialize");

        let layout = FixedLayout::new(Size::new(1024.0, 768.0))
            .with_rect(target, Rect::new(100.0, 200.0, 60.0, 18.0))
            .with_rect(overlay, Rect::new(0.0, 0.0, 280.0, 90.0));

        Self {
            doc,
            layout,
            controller,
            target,
            t0: Instant::now(),
        }
    }

    pub fn at(&self, ms: u64) -> Instant {
        self.t0 + Duration::from_millis(ms)
    }
}
