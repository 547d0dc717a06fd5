//! Scroll-triggered reveal animations.
//!
//! The host reports how much of each letter block is on screen; blocks fade
//! in (via a `visible` class) the first time they cross the threshold, with a
//! per-paragraph stagger. Blocks holding an important reference then
//! highlight those references one after another.

use std::time::{Duration, Instant};

use crate::config::RevealConfig;
use crate::core::dom::{Document, NodeId};
use crate::core::knowledge_base::EntityKind;

/// Blocks that take part in reveal animations.
const ANIMATED_CLASSES: [&str; 3] = ["letter-paragraph", "letter-signature", "letter-postscript"];

/// References that receive the highlight inside an important block.
const HIGHLIGHTED_KINDS: [EntityKind; 2] = [EntityKind::Item, EntityKind::Character];

/// Upper bound on a staggered reveal; larger paragraph numbers clamp to it.
const MAX_REVEAL_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct RevealItem {
    node: NodeId,
    visible: bool,
    animated: bool,
    reveal_at: Option<Instant>,
}

pub struct RevealTracker {
    config: RevealConfig,
    important: Vec<(EntityKind, String)>,
    items: Vec<RevealItem>,
    highlights: Vec<(NodeId, Instant)>,
}

impl RevealTracker {
    pub fn new(config: RevealConfig) -> Self {
        let important = config
            .highlight
            .iter()
            .filter_map(|reference| {
                let parsed = reference
                    .split_once(':')
                    .and_then(|(kind, id)| Some((EntityKind::from_tag(kind)?, id.to_string())));
                if parsed.is_none() {
                    tracing::warn!(reference = %reference, "Ignoring malformed highlight reference");
                }
                parsed
            })
            .collect();

        Self {
            config,
            important,
            items: Vec::new(),
            highlights: Vec::new(),
        }
    }

    /// Register every animated block in the document. Returns how many.
    pub fn observe(&mut self, doc: &mut Document) -> usize {
        let root = doc.root();
        self.items = doc
            .descendants(root)
            .into_iter()
            .filter(|&n| ANIMATED_CLASSES.iter().any(|c| doc.has_class(n, c)))
            .map(|node| RevealItem {
                node,
                visible: false,
                animated: false,
                reveal_at: None,
            })
            .collect();

        if self.config.reduced_motion {
            let body = doc.body();
            doc.add_class(body, "reduced-motion");
            self.show_all(doc);
        }
        tracing::debug!(count = self.items.len(), "Reveal animations observing");
        self.items.len()
    }

    /// Host callback: `ratio` of `node` is now inside the viewport.
    pub fn on_intersection(&mut self, doc: &Document, node: NodeId, ratio: f64, now: Instant) {
        if self.config.reduced_motion {
            return;
        }
        let threshold = self.config.threshold;
        let delay = self.delay_for(doc, node);
        let Some(item) = self.items.iter_mut().find(|i| i.node == node) else {
            return;
        };

        let visible = ratio >= threshold;
        if visible && !item.animated {
            item.animated = true;
            item.reveal_at = Some(now + delay);
        }
        item.visible = visible;
    }

    /// Apply due reveals and highlights.
    pub fn tick(&mut self, doc: &mut Document, now: Instant) {
        let due: Vec<NodeId> = self
            .items
            .iter_mut()
            .filter(|i| i.reveal_at.is_some_and(|at| at <= now))
            .map(|i| {
                i.reveal_at = None;
                i.node
            })
            .collect();

        for node in due {
            doc.add_class(node, "visible");
            if self.is_important(doc, node) {
                self.schedule_highlights(doc, node, now);
            }
        }

        let (ready, waiting): (Vec<_>, Vec<_>) =
            self.highlights.drain(..).partition(|(_, at)| *at <= now);
        self.highlights = waiting;
        for (node, _) in ready {
            doc.add_class(node, "magical-highlight");
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.items
            .iter()
            .filter_map(|i| i.reveal_at)
            .chain(self.highlights.iter().map(|(_, at)| *at))
            .min()
    }

    pub fn set_reduced_motion(&mut self, doc: &mut Document, reduced: bool) {
        self.config.reduced_motion = reduced;
        let body = doc.body();
        if reduced {
            doc.add_class(body, "reduced-motion");
            self.show_all(doc);
        } else {
            doc.remove_class(body, "reduced-motion");
        }
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.items.iter().any(|i| i.node == node && i.visible)
    }

    /// Cancel pending reveals and forget observed blocks.
    pub fn reset(&mut self) {
        self.items.clear();
        self.highlights.clear();
    }

    fn show_all(&mut self, doc: &mut Document) {
        for item in &mut self.items {
            item.animated = true;
            item.reveal_at = None;
            doc.add_class(item.node, "visible");
        }
        self.highlights.clear();
    }

    /// `data-paragraph` number times the stagger; other blocks start at once.
    fn delay_for(&self, doc: &Document, node: NodeId) -> Duration {
        let number = doc
            .attr(node, "data-paragraph")
            .and_then(|p| p.trim().parse::<u64>().ok())
            .unwrap_or(0);
        Duration::from_millis(number.saturating_mul(self.config.stagger_ms)).min(MAX_REVEAL_DELAY)
    }

    fn is_important(&self, doc: &Document, node: NodeId) -> bool {
        doc.descendants(node).into_iter().any(|n| {
            self.important
                .iter()
                .any(|(kind, id)| doc.attr(n, kind.data_attribute()) == Some(id.as_str()))
        })
    }

    fn schedule_highlights(&mut self, doc: &Document, node: NodeId, now: Instant) {
        let stagger = Duration::from_millis(self.config.highlight_stagger_ms);
        let refs = doc.descendants(node).into_iter().filter(|&n| {
            HIGHLIGHTED_KINDS
                .iter()
                .any(|kind| doc.has_attr(n, kind.data_attribute()))
        });
        for (index, reference) in refs.enumerate() {
            self.highlights.push((reference, now + stagger * index as u32));
        }
    }
}
