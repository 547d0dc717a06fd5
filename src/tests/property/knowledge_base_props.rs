//! Property-based tests for the knowledge base
//!
//! Tests invariants:
//! - Unknown identifiers yield placeholders with name = id and type "Unknown"
//! - Case-folded lookups resolve to the same record when enabled
//! - Search results always contain the term

use proptest::prelude::*;

use crate::core::knowledge_base::{EntityKind, KnowledgeBase, UNKNOWN_TYPE};

fn arb_kind() -> impl Strategy<Value = EntityKind> {
    prop::sample::select(EntityKind::ALL.to_vec())
}

/// Identifiers the embedded campaign never uses.
fn arb_unknown_identifier() -> impl Strategy<Value = String> {
    "zz_[a-z0-9_]{0,30}"
}

proptest! {
    #[test]
    fn unknown_identifiers_yield_placeholders(kind in arb_kind(), id in arb_unknown_identifier()) {
        let kb = KnowledgeBase::embedded();
        prop_assert!(kb.lookup(kind, &id).is_none());

        let record = kb.get(kind, &id);
        prop_assert!(record.is_placeholder());
        prop_assert_eq!(&record.name, &id);
        prop_assert_eq!(record.entity_type.as_str(), UNKNOWN_TYPE);
        prop_assert_eq!(record.description.clone(), format!("{} data not available", kind.label()));
    }

    #[test]
    fn case_folded_lookup_finds_same_record(kind in arb_kind(), upper in any::<bool>(), index in any::<prop::sample::Index>()) {
        let kb = KnowledgeBase::embedded().with_case_insensitive(true);
        let ids: Vec<String> = kb.records(kind).map(|r| r.id.clone()).collect();
        prop_assume!(!ids.is_empty());

        let id = index.get(&ids);
        let folded = if upper { id.to_uppercase() } else { id.to_lowercase() };
        let found = kb.lookup(kind, &folded).map(|r| r.id.clone());
        prop_assert_eq!(found.as_ref(), Some(id));
    }

    #[test]
    fn search_results_contain_term(term in "[a-zA-Z]{1,6}") {
        let kb = KnowledgeBase::embedded();
        let needle = term.to_lowercase();
        for record in kb.search(&term) {
            let haystack = format!("{} {} {}", record.name, record.entity_type, record.description)
                .to_lowercase();
            prop_assert!(haystack.contains(&needle));
        }
    }
}
