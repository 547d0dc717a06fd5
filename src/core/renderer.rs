//! Letter Renderer
//!
//! Composes a letter record into `<article>` markup: a header with sender
//! and date, a body whose prose runs through the reference scanner, and a
//! footer with the archive attribution. The finished tree replaces the
//! container's contents in one step.

use std::collections::HashSet;

use thiserror::Error;

use super::content::{LetterContent, LetterData, LetterMetadata, Paragraph};
use super::dom::{Document, Element, Node, NodeId};
use super::knowledge_base::KnowledgeBase;
use super::scanner;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Container element not found: #{0}")]
    MissingContainer(String),

    #[error("Invalid letter content: {0}")]
    InvalidContent(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

// ============================================================================
// Options
// ============================================================================

/// Footer wording and other per-campaign presentation choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub archive_name: String,
    pub session_label: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            archive_name: "From the Icewind Dale Campaign Archives".to_string(),
            session_label: "Session 2 Correspondence".to_string(),
        }
    }
}

// ============================================================================
// Renderer
// ============================================================================

pub struct LetterRenderer<'a> {
    kb: &'a KnowledgeBase,
    options: RenderOptions,
}

impl<'a> LetterRenderer<'a> {
    pub fn new(kb: &'a KnowledgeBase, options: RenderOptions) -> Self {
        Self { kb, options }
    }

    /// Build the letter and swap it into `#container_id`.
    ///
    /// The tree is fully built before the document is touched; on error the
    /// container keeps its previous contents.
    pub fn render(&self, doc: &mut Document, container_id: &str, letter: &LetterData) -> Result<NodeId> {
        let container = doc
            .get_element_by_id(container_id)
            .ok_or_else(|| RenderError::MissingContainer(container_id.to_string()))?;

        let article = self.build(letter)?;
        let created = doc.replace_children(container, vec![article.into()]);

        tracing::info!(
            paragraphs = letter.content.paragraphs.len(),
            "Letter rendered into #{container_id}"
        );
        Ok(created[0])
    }

    /// The complete `<article>` for a letter.
    pub fn build(&self, letter: &LetterData) -> Result<Element> {
        validate_paragraphs(&letter.content.paragraphs)?;

        Ok(Element::new("article")
            .class("campaign-letter")
            .attr("itemscope", "")
            .attr("itemtype", "http://schema.org/Letter")
            .child(self.header(&letter.metadata))
            .child(self.body(&letter.content))
            .child(self.footer(&letter.metadata)))
    }

    fn header(&self, metadata: &LetterMetadata) -> Element {
        let mut sender = Element::new("div").class("sender-info").child(
            Element::new("h1")
                .class("sender-title")
                .attr("itemprop", "sender")
                .text(metadata.sender.title.as_str()),
        );
        if !metadata.sender.subtitle.is_empty() {
            sender = sender.child(
                Element::new("h2")
                    .class("sender-subtitle")
                    .text(metadata.sender.subtitle.as_str()),
            );
        }

        let details = Element::new("div")
            .class("letter-metadata")
            .child(
                Element::new("time")
                    .class("letter-date")
                    .attr("datetime", metadata.date.datetime.as_str())
                    .attr("itemprop", "dateCreated")
                    .text(metadata.date.display.as_str()),
            )
            .child(
                Element::new("div")
                    .class("recipient-info")
                    .child(Element::new("span").class("recipient-label").text("To:"))
                    .text(" ")
                    .child(
                        Element::new("span")
                            .class("recipient-name")
                            .attr("itemprop", "recipient")
                            .text(metadata.recipient.as_str()),
                    ),
            )
            .child(
                Element::new("div")
                    .class("delivery-method")
                    .attr("itemprop", "deliveryMethod")
                    .child(Element::new("em").text(metadata.delivery_method.as_str())),
            );

        Element::new("header")
            .class("letter-header")
            .child(sender)
            .child(details)
    }

    fn body(&self, content: &LetterContent) -> Element {
        let mut section = Element::new("section")
            .class("letter-body")
            .attr("itemprop", "text");

        if let Some(greeting) = &content.greeting {
            section = section.child(
                Element::new("div")
                    .class("letter-greeting")
                    .child(self.prose("p", greeting)),
            );
        }

        for paragraph in &content.paragraphs {
            section = section.child(
                Element::new("div")
                    .class("letter-paragraph")
                    .class(&format!("letter-{}", paragraph.kind))
                    .attr("data-paragraph", paragraph.id.as_str())
                    .child(self.prose("p", &paragraph.text)),
            );
        }

        if let Some(closing) = &content.closing {
            section = section.child(
                Element::new("div")
                    .class("letter-closing")
                    .child(self.prose("p", closing)),
            );
        }

        if let Some(signature) = &content.signature {
            let mut block = Element::new("div").class("letter-signature").child(
                Element::new("p")
                    .class("signature-name")
                    .text(signature.name.as_str()),
            );
            if !signature.title.is_empty() {
                block = block.child(
                    Element::new("p")
                        .class("signature-title")
                        .text(signature.title.as_str()),
                );
            }
            section = section.child(block);
        }

        if let Some(postscript) = &content.postscript {
            let p = Element::new("p")
                .child(Element::new("strong").text("P.S."))
                .text(" ")
                .children(scanner::resolve(postscript, self.kb).to_nodes());
            section = section.child(Element::new("div").class("letter-postscript").child(p));
        }

        section
    }

    fn footer(&self, metadata: &LetterMetadata) -> Element {
        Element::new("footer").class("letter-footer").child(
            Element::new("div")
                .class("campaign-attribution")
                .child(
                    Element::new("p").child(Element::new("em").text(self.options.archive_name.as_str())),
                )
                .child(Element::new("p").child(Element::new("small").text(format!(
                    "{} | {}",
                    self.options.session_label, metadata.date.display
                )))),
        )
    }

    fn prose(&self, tag: &str, text: &str) -> Element {
        Element::new(tag).children(scanner::resolve(text, self.kb).to_nodes())
    }
}

fn validate_paragraphs(paragraphs: &[Paragraph]) -> Result<()> {
    let mut seen = HashSet::new();
    for paragraph in paragraphs {
        if paragraph.id.trim().is_empty() {
            return Err(RenderError::InvalidContent("paragraph with empty id".to_string()));
        }
        if !seen.insert(paragraph.id.as_str()) {
            return Err(RenderError::InvalidContent(format!(
                "duplicate paragraph id {:?}",
                paragraph.id
            )));
        }
    }
    Ok(())
}

/// Replace the container with a single user-facing error message. Falls back
/// to `<body>` when the container itself is missing.
pub fn show_error(doc: &mut Document, container_id: &str, message: &str) -> NodeId {
    let notice: Node = Element::new("div")
        .class("error-message")
        .attr("role", "alert")
        .text(message)
        .into();

    match doc.get_element_by_id(container_id) {
        Some(container) => doc.replace_children(container, vec![notice])[0],
        None => {
            tracing::warn!("Container #{container_id} missing; reporting error in <body>");
            let body = doc.body();
            doc.append(body, notice)
        }
    }
}
