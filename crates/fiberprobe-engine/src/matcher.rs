//! Recursive predicate evaluation of criteria against graph objects.

use fiberprobe_core::{Criterion, CriterionRule, ObjectRef};

/// True when every rule of the criterion is satisfied by the object.
///
/// A rule's property must exist, be readable and be non-null before the
/// rule itself is consulted; denied properties count as absent.
pub fn matches_criterion(object: &ObjectRef, criterion: &Criterion) -> bool {
    criterion.rules().iter().all(|(key, rule)| {
        let Some(value) = object.probe(key) else {
            return false;
        };
        if value.is_null() {
            return false;
        }
        match rule {
            CriterionRule::Present => true,
            CriterionRule::Equals(literal) => literal.matches(&value),
            CriterionRule::Nested(nested) => match value.as_object() {
                Some(inner) => matches_criterion(inner, nested),
                None => false,
            },
        }
    })
}

/// Index of the first criterion the object satisfies. Criteria are tried
/// in order and evaluation short-circuits at the first success.
pub fn matches_any(object: &ObjectRef, criteria: &[Criterion]) -> Option<usize> {
    criteria
        .iter()
        .position(|criterion| matches_criterion(object, criterion))
}
