//! Application bootstrap.
//!
//! [`AppContext`] is built once (configuration plus the shared knowledge
//! base) and handed to everything that needs it. [`LetterApp`] wires the
//! page: load the letter, render it, attach tooltips and reveal animations,
//! then hide the loading indicator. Wiring failures surface as one
//! user-facing message in the page.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::config::AppConfig;
use crate::core::content::ContentManager;
use crate::core::dom::{Document, Element};
use crate::core::knowledge_base::{KnowledgeBase, KnowledgeBaseError};
use crate::core::renderer::{show_error, LetterRenderer, RenderError};
use crate::core::reveal::RevealTracker;
use crate::core::tooltip::{Layout, Surface, TooltipController, TooltipError, TooltipEvent};

/// Shown in place of the letter when the page cannot be wired up.
pub const LOAD_FAILURE_MESSAGE: &str = "Failed to load letter. Please refresh and try again.";

/// Id of the `<script type="application/json">` block carrying campaign data.
pub const CAMPAIGN_DATA_ID: &str = "campaign-data";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(#[from] KnowledgeBaseError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Tooltip error: {0}")]
    Tooltip(#[from] TooltipError),
}

pub type Result<T> = std::result::Result<T, AppError>;

// ============================================================================
// Context
// ============================================================================

/// Shared, read-only application state.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub knowledge: Arc<KnowledgeBase>,
}

impl AppContext {
    pub fn new(config: AppConfig, knowledge: KnowledgeBase) -> Self {
        Self {
            config,
            knowledge: Arc::new(knowledge),
        }
    }

    /// Load the knowledge base from the configured source.
    pub async fn try_load(config: AppConfig) -> Result<Self> {
        let source = config.content.knowledge_source();
        let knowledge = KnowledgeBase::load(&source)
            .await?
            .with_case_insensitive(config.content.case_insensitive_ids);
        tracing::info!(source = %source, entities = knowledge.len(), "Knowledge base ready");
        Ok(Self::new(config, knowledge))
    }

    /// Like [`try_load`](Self::try_load), but falls back to the embedded
    /// campaign data when the configured source cannot be read.
    pub async fn load(config: AppConfig) -> Self {
        let case_insensitive = config.content.case_insensitive_ids;
        match Self::try_load(config.clone()).await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to embedded campaign data");
                let knowledge = KnowledgeBase::embedded().with_case_insensitive(case_insensitive);
                Self::new(config, knowledge)
            }
        }
    }
}

// ============================================================================
// Page Skeleton
// ============================================================================

/// The empty page the letter is rendered into.
pub fn letter_page(config: &AppConfig, knowledge: &KnowledgeBase) -> Document {
    let mut doc = Document::new(&config.page.title);

    if let Some(stylesheet) = &config.page.stylesheet {
        let head = doc.head();
        doc.append(
            head,
            Element::new("link")
                .attr("rel", "stylesheet")
                .attr("href", stylesheet.as_str())
                .into(),
        );
    }

    let body = doc.body();
    doc.append(
        body,
        Element::new("div")
            .id(config.page.loading_id.as_str())
            .class("loading-indicator")
            .child(Element::new("p").text("Unfurling the letter..."))
            .into(),
    );
    doc.append(body, Element::new("main").id(config.page.container_id.as_str()).into());
    doc.append(
        body,
        Element::new("script")
            .attr("type", "application/json")
            .id(CAMPAIGN_DATA_ID)
            .text(knowledge.to_json().to_string())
            .into(),
    );
    doc
}

// ============================================================================
// Application
// ============================================================================

pub struct LetterApp {
    context: AppContext,
    content: ContentManager,
    tooltips: TooltipController,
    reveal: RevealTracker,
    initialized: bool,
}

impl LetterApp {
    pub fn new(context: AppContext) -> Self {
        let content = ContentManager::new(context.config.content.cache);
        let tooltips = TooltipController::new(context.config.tooltip.clone());
        let reveal = RevealTracker::new(context.config.reveal.clone());
        Self {
            context,
            content,
            tooltips,
            reveal,
            initialized: false,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn tooltips(&mut self) -> &mut TooltipController {
        &mut self.tooltips
    }

    pub fn reveal(&mut self) -> &mut RevealTracker {
        &mut self.reveal
    }

    /// Build a fresh page and wire it. The page is returned even when wiring
    /// fails; it then carries the error message instead of the letter.
    /// Any previously wired page is abandoned; cached letters are kept.
    pub async fn render_page(&mut self) -> (Document, Result<()>) {
        if self.initialized {
            self.tooltips = TooltipController::new(self.context.config.tooltip.clone());
            self.reveal.reset();
            self.initialized = false;
        }
        let mut doc = letter_page(&self.context.config, &self.context.knowledge);
        let outcome = self.initialize(&mut doc).await;
        (doc, outcome)
    }

    /// Wire an existing page. Calling again after success is a no-op.
    pub async fn initialize(&mut self, doc: &mut Document) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        match self.wire(doc).await {
            Ok(()) => {
                self.initialized = true;
                tracing::info!("Letter application initialized");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize letter application");
                show_error(doc, &self.context.config.page.container_id, LOAD_FAILURE_MESSAGE);
                Err(e)
            }
        }
    }

    async fn wire(&mut self, doc: &mut Document) -> Result<()> {
        let config = &self.context.config;
        let letter = self
            .content
            .load_letter(&config.content.letter_id, &config.content.letter_source())
            .await;

        LetterRenderer::new(&self.context.knowledge, config.page.render_options()).render(
            doc,
            &config.page.container_id,
            &letter,
        )?;

        if config.features.tooltips {
            self.tooltips.initialize(doc, Arc::clone(&self.context.knowledge))?;
        }
        if config.features.animations {
            self.reveal.observe(doc);
        }

        if let Some(loading) = doc.get_element_by_id(&config.page.loading_id) {
            doc.set_style(loading, "display", "none");
        }
        Ok(())
    }

    /// Forward a host event to the tooltip controller.
    pub fn handle(&mut self, doc: &mut Document, layout: &dyn Layout, event: TooltipEvent, now: Instant) {
        let mut surface = Surface::new(doc, layout);
        self.tooltips.handle(&mut surface, event, now);
    }

    /// Fire every due timer.
    pub fn tick(&mut self, doc: &mut Document, layout: &dyn Layout, now: Instant) {
        {
            let mut surface = Surface::new(doc, layout);
            self.tooltips.tick(&mut surface, now);
        }
        self.reveal.tick(doc, now);
    }

    /// Earliest pending deadline across the tooltip and reveal timers.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.tooltips.next_deadline(), self.reveal.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Detach interactive behaviour and forget cached letters.
    pub fn destroy(&mut self, doc: &mut Document) {
        self.tooltips.destroy(doc);
        self.reveal.reset();
        self.content.clear();
        self.initialized = false;
    }
}
