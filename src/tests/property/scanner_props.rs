//! Property-based tests for the reference scanner
//!
//! Tests invariants:
//! - Tag-free text is unchanged
//! - Tokens reassemble into the input
//! - One well-formed tag yields exactly one annotated span
//! - No double substitution

use proptest::prelude::*;

use crate::core::knowledge_base::{EntityKind, EntityRecord, KnowledgeBase};
use crate::core::scanner::{resolve, tokenize, Token};

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

/// Prose that cannot contain a tag.
fn arb_tag_free_text() -> impl Strategy<Value = String> {
    "[^{}]{0,200}"
}

/// Prose that may contain braces, colons and tag-like fragments.
fn arb_noisy_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 {}:_.,]{0,200}"
}

fn arb_kind() -> impl Strategy<Value = EntityKind> {
    prop::sample::select(EntityKind::ALL.to_vec())
}

fn arb_identifier() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("rothbart".to_string()),
        Just("netherese_stones".to_string()),
        Just("bryn_shander".to_string()),
        Just("dragon_siege".to_string()),
        "[a-z][a-z0-9_]{0,24}",
    ]
}

fn token_source(token: &Token<'_>) -> String {
    match token {
        Token::Text(t) => t.to_string(),
        Token::Tag { kind, id } => format!("{{{kind}:{id}}}"),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn tag_free_text_is_unchanged(text in arb_tag_free_text()) {
        let kb = KnowledgeBase::embedded();
        let annotated = resolve(&text, &kb);
        prop_assert_eq!(annotated.references().count(), 0);
        prop_assert_eq!(annotated.plain_text(), text);
    }

    #[test]
    fn tokens_reassemble_into_input(text in arb_noisy_text()) {
        let rebuilt: String = tokenize(&text).iter().map(token_source).collect();
        prop_assert_eq!(rebuilt, text);
    }

    #[test]
    fn tokens_never_have_adjacent_text_runs(text in arb_noisy_text()) {
        let tokens = tokenize(&text);
        for pair in tokens.windows(2) {
            let both_text = matches!(pair, [Token::Text(_), Token::Text(_)]);
            prop_assert!(!both_text);
        }
    }

    #[test]
    fn one_tag_yields_one_span(
        prefix in arb_tag_free_text(),
        suffix in arb_tag_free_text(),
        kind in arb_kind(),
        id in arb_identifier(),
    ) {
        let kb = KnowledgeBase::embedded();
        let text = format!("{prefix}{{{kind}:{id}}}{suffix}");
        let annotated = resolve(&text, &kb);

        let refs: Vec<_> = annotated.references().collect();
        prop_assert_eq!(refs.len(), 1);
        prop_assert_eq!(refs[0].kind, kind);
        prop_assert_eq!(&refs[0].id, &id);

        let expected = kb.get(kind, &id).display_name().to_string();
        prop_assert_eq!(&refs[0].display, &expected);
        prop_assert_eq!(annotated.plain_text(), format!("{prefix}{expected}{suffix}"));
    }

    #[test]
    fn substituted_names_are_not_rescanned(kind in arb_kind(), inner in arb_kind()) {
        let mut kb = KnowledgeBase::new();
        let mut record = EntityRecord::placeholder(kind, "trickster");
        record.name = format!("{{{inner}:rothbart}}");
        kb.insert(record);

        let annotated = resolve(&format!("Beware {{{kind}:trickster}}!"), &kb);
        prop_assert_eq!(annotated.references().count(), 1);
        prop_assert_eq!(annotated.plain_text(), format!("Beware {{{inner}:rothbart}}!"));
    }

    #[test]
    fn substituted_names_are_not_rescanned_from_html(kind in arb_kind(), inner in arb_kind()) {
        let mut kb = KnowledgeBase::embedded();
        let mut record = EntityRecord::placeholder(kind, "trickster");
        record.name = format!("{{{inner}:rothbart}}");
        kb.insert(record);

        let once = resolve(&format!("Beware {{{kind}:trickster}}!"), &kb);
        let html = once.to_html();
        prop_assert!(!html.contains('{'), "html contains an opening brace");
        let twice = resolve(&html, &kb);
        prop_assert_eq!(twice.references().count(), 0);
    }

    #[test]
    fn rendered_markup_is_not_rescanned(
        prefix in arb_tag_free_text(),
        kind in arb_kind(),
        id in arb_identifier(),
    ) {
        let kb = KnowledgeBase::embedded();
        let once = resolve(&format!("{prefix}{{{kind}:{id}}}"), &kb);
        let twice = resolve(&once.to_html(), &kb);
        prop_assert_eq!(twice.references().count(), 0);
    }
}
