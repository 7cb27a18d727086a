//! Structural matching of tagged values against type signatures.

use crate::data::{TaggedValue, TypeSignature};

/// Does `value` conform to `pattern`?
///
/// Matching is structural and exact: an `i` never matches `w` or `v`.
pub fn matches(value: &TaggedValue, pattern: &TypeSignature) -> bool {
    match (pattern, value) {
        (TypeSignature::Any, _) => true,
        (TypeSignature::Empty, TaggedValue::Empty)
        | (TypeSignature::Bool, TaggedValue::Bool(_))
        | (TypeSignature::Int, TaggedValue::Int(_))
        | (TypeSignature::Word, TaggedValue::Word(_))
        | (TypeSignature::Value, TaggedValue::Value(_))
        | (TypeSignature::Str, TaggedValue::Str(_))
        | (TypeSignature::Bytes, TaggedValue::Bytes(_)) => true,
        (TypeSignature::Cluster(patterns), TaggedValue::Cluster(elements)) => {
            patterns.len() == elements.len()
                && patterns
                    .iter()
                    .zip(elements)
                    .all(|(pattern, element)| matches(element, pattern))
        }
        (TypeSignature::List(pattern), TaggedValue::List(elements)) => {
            elements.iter().all(|element| matches(element, pattern))
        }
        _ => false,
    }
}

impl TypeSignature {
    /// See [`matches`].
    pub fn matches(&self, value: &TaggedValue) -> bool {
        matches(value, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_pair() -> TypeSignature {
        TypeSignature::cluster([TypeSignature::Int, TypeSignature::Int])
    }

    #[test]
    fn test_primitive_kinds_match_exactly() {
        assert!(matches(&TaggedValue::Int(1), &TypeSignature::Int));
        assert!(!matches(&TaggedValue::Int(1), &TypeSignature::Word));
        assert!(!matches(&TaggedValue::Int(1), &TypeSignature::Value));
        assert!(!matches(&TaggedValue::Word(1), &TypeSignature::Int));
        assert!(matches(&TaggedValue::EMPTY, &TypeSignature::Empty));
        assert!(!matches(&TaggedValue::Str(String::new()), &TypeSignature::Empty));
    }

    #[test]
    fn test_cluster_requires_same_arity() {
        let pair = TaggedValue::cluster([TaggedValue::Int(1), TaggedValue::Int(2)]);
        let triple = TaggedValue::cluster([
            TaggedValue::Int(1),
            TaggedValue::Int(2),
            TaggedValue::Int(3),
        ]);
        assert!(matches(&pair, &int_pair()));
        assert!(!matches(&triple, &int_pair()));
    }

    #[test]
    fn test_cluster_checks_each_position() {
        let mixed = TaggedValue::cluster([TaggedValue::Int(1), TaggedValue::Value(2.0)]);
        assert!(!matches(&mixed, &int_pair()));
    }

    #[test]
    fn test_list_matches_empty_and_homogeneous() {
        let pattern = TypeSignature::list(TypeSignature::Int);
        assert!(matches(&TaggedValue::list([]), &pattern));
        assert!(matches(
            &TaggedValue::list([TaggedValue::Int(1), TaggedValue::Int(2)]),
            &pattern
        ));
        assert!(!matches(
            &TaggedValue::list([TaggedValue::Int(1), TaggedValue::Str("x".into())]),
            &pattern
        ));
        assert!(!matches(&TaggedValue::Int(1), &pattern));
    }

    #[test]
    fn test_wildcard_matches_anything() {
        for value in [
            TaggedValue::EMPTY,
            TaggedValue::Str("x".into()),
            TaggedValue::cluster([TaggedValue::Bool(true)]),
        ] {
            assert!(matches(&value, &TypeSignature::Any));
        }
        assert!(matches(
            &TaggedValue::cluster([TaggedValue::Int(1), TaggedValue::Str("x".into())]),
            &TypeSignature::cluster([TypeSignature::Int, TypeSignature::Any])
        ));
    }

    #[test]
    fn test_matching_is_repeatable() {
        let value = TaggedValue::cluster([TaggedValue::Int(1), TaggedValue::Int(2)]);
        let first = matches(&value, &int_pair());
        for _ in 0..10 {
            assert_eq!(matches(&value, &int_pair()), first);
        }
    }
}
