//! Reference Scanner
//!
//! Finds `{kind:identifier}` tags in letter prose and turns them into
//! annotated spans. Scanning and resolution are separate passes:
//! [`tokenize`] only splits text, [`resolve`] consults the knowledge base.

use once_cell::sync::Lazy;
use regex::Regex;

use super::dom::{Element, Node};
use super::knowledge_base::{EntityKind, KnowledgeBase};

/// Any `{word:identifier}` shape; the kind is checked after matching so
/// unknown kinds can fall through as literal text.
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(?P<kind>[A-Za-z]+):(?P<id>\w+)\}").expect("Failed to compile reference tag regex")
});

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Tag { kind: EntityKind, id: &'a str },
}

/// Split text into literal runs and recognized tags.
///
/// Tags with an unrecognized kind stay inside the surrounding literal run.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;

    for caps in TAG_PATTERN.captures_iter(text) {
        let (Some(whole), Some(kind), Some(id)) = (caps.get(0), caps.name("kind"), caps.name("id"))
        else {
            continue;
        };
        let Some(kind) = EntityKind::from_tag(kind.as_str()) else {
            continue;
        };

        if whole.start() > literal_start {
            tokens.push(Token::Text(&text[literal_start..whole.start()]));
        }
        tokens.push(Token::Tag {
            kind,
            id: id.as_str(),
        });
        literal_start = whole.end();
    }

    if literal_start < text.len() {
        tokens.push(Token::Text(&text[literal_start..]));
    }
    tokens
}

// ============================================================================
// Resolution
// ============================================================================

/// A resolved tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: EntityKind,
    pub id: String,
    pub display: String,
}

impl Reference {
    /// `<span class="item-ref" data-item="id" tabindex="0">Name</span>`
    pub fn to_element(&self) -> Element {
        Element::new("span")
            .class(self.kind.css_class())
            .attr(self.kind.data_attribute(), self.id.as_str())
            .attr("tabindex", "0")
            .text(self.display.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Reference(Reference),
}

/// Prose with every recognized tag resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedText {
    pub segments: Vec<Segment>,
}

impl AnnotatedText {
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Reference(r) => Some(r),
            Segment::Text(_) => None,
        })
    }

    /// Visible text, as a reader would see it.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Text(t) => t.as_str(),
                Segment::Reference(r) => r.display.as_str(),
            })
            .collect()
    }

    /// Inline nodes: text runs and annotated spans.
    pub fn to_nodes(&self) -> Vec<Node> {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Text(t) => Node::text(t.as_str()),
                Segment::Reference(r) => r.to_element().into(),
            })
            .collect()
    }

    pub fn to_html(&self) -> String {
        self.to_nodes().iter().map(Node::to_html).collect()
    }
}

/// Resolve every tag in `text` against `kb`.
pub fn resolve(text: &str, kb: &KnowledgeBase) -> AnnotatedText {
    let segments = tokenize(text)
        .into_iter()
        .map(|token| match token {
            Token::Text(t) => Segment::Text(t.to_string()),
            Token::Tag { kind, id } => {
                let record = kb.get(kind, id);
                Segment::Reference(Reference {
                    kind,
                    id: id.to_string(),
                    display: record.display_name().to_string(),
                })
            }
        })
        .collect();
    AnnotatedText { segments }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_tokenize_mixed_text() {
        let tokens = tokenize("Dear {character:rothbart}, the {item:netherese_stones} await.");
        assert_eq!(
            tokens,
            vec![
                Token::Text("Dear "),
                Token::Tag { kind: EntityKind::Character, id: "rothbart" },
                Token::Text(", the "),
                Token::Tag { kind: EntityKind::Item, id: "netherese_stones" },
                Token::Text(" await."),
            ]
        );
    }

    #[rstest]
    #[case("Cast {spell:fireball} now", "Cast {spell:fireball} now")]
    #[case("{Character:rothbart}", "{Character:rothbart}")]
    #[case("{character:}", "{character:}")]
    #[case("{character:two words}", "{character:two words}")]
    #[case("{character rothbart}", "{character rothbart}")]
    fn test_unrecognized_shapes_stay_literal(#[case] input: &str, #[case] literal: &str) {
        assert_eq!(tokenize(input), vec![Token::Text(literal)]);
    }

    #[test]
    fn test_unknown_kind_merges_into_literal_run() {
        let tokens = tokenize("a {spell:x} b {event:siege} c");
        assert_eq!(
            tokens,
            vec![
                Token::Text("a {spell:x} b "),
                Token::Tag { kind: EntityKind::Event, id: "siege" },
                Token::Text(" c"),
            ]
        );
    }

    #[test]
    fn test_adjacent_tags() {
        let tokens = tokenize("{item:a}{item:b}");
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(|t| matches!(t, Token::Tag { .. })));
    }

    #[test]
    fn test_empty_text_has_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(resolve("", &KnowledgeBase::new()).segments.is_empty());
    }

    #[test]
    fn test_resolve_uses_display_names() {
        let kb = KnowledgeBase::embedded();
        let annotated = resolve("Meet {character:duvessa} in {location:bryn_shander}.", &kb);
        assert_eq!(annotated.plain_text(), "Meet Duvessa Shane in Bryn Shander.");
        assert_eq!(annotated.references().count(), 2);
    }

    #[test]
    fn test_unknown_id_renders_identifier() {
        let annotated = resolve("{character:ghost_of_nobody}", &KnowledgeBase::embedded());
        assert_eq!(
            annotated.to_html(),
            r#"<span class="character-ref" data-character="ghost_of_nobody" tabindex="0">ghost_of_nobody</span>"#
        );
    }

    #[test]
    fn test_literal_text_is_escaped_in_html() {
        let annotated = resolve("<b>{item:dragon_heart}</b>", &KnowledgeBase::embedded());
        let html = annotated.to_html();
        assert!(html.starts_with("&lt;b&gt;<span"));
        assert!(html.ends_with("</span>&lt;/b&gt;"));
    }

    #[test]
    fn test_resolved_html_has_no_tags_left() {
        let kb = KnowledgeBase::embedded();
        let html = resolve("{{character:rothbart}} and {item:dragon_heart}", &kb).to_html();
        assert!(tokenize(&html)
            .iter()
            .all(|t| matches!(t, Token::Text(_))));
    }
}
