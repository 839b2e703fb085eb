//! Structural validation of admin-submitted reorderings.
//!
//! Runs before any repository call so a malformed list fails fast and no
//! partial reorder is ever applied. Whether the ids actually exist is the
//! repository's check, not this one.

use std::collections::HashSet;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReorderError {
    #[error("reorder list is empty")]
    EmptyList,

    #[error("duplicate id in reorder list: {id}")]
    DuplicateId { id: String },

    #[error("malformed id in reorder list: {raw}")]
    InvalidId { raw: String },
}

/// Validates a raw id list as submitted by the authoring surface and parses
/// it into typed ids.
///
/// Checks run in order, first failure wins: non-empty list, no duplicates,
/// every element parses as an id. The returned list preserves submission
/// order.
///
/// # Errors
///
/// Returns the first violated `ReorderError`.
pub fn validate_reorder<T: FromStr>(raw: &[String]) -> Result<Vec<T>, ReorderError> {
    if raw.is_empty() {
        return Err(ReorderError::EmptyList);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(raw.len());
    for id in raw {
        if !seen.insert(id.as_str()) {
            return Err(ReorderError::DuplicateId { id: id.clone() });
        }
    }

    raw.iter()
        .map(|id| {
            id.parse::<T>()
                .map_err(|_| ReorderError::InvalidId { raw: id.clone() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleId, QuestionId};

    fn raw(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn empty_list_is_rejected() {
        let err = validate_reorder::<ModuleId>(&[]).unwrap_err();
        assert_eq!(err, ReorderError::EmptyList);
    }

    #[test]
    fn duplicates_are_rejected_before_parsing() {
        // "a" is not a valid id either, but the duplicate check wins
        let err = validate_reorder::<ModuleId>(&raw(&["a", "a", "b"])).unwrap_err();
        assert_eq!(err, ReorderError::DuplicateId { id: "a".into() });
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let err = validate_reorder::<ModuleId>(&raw(&["1", "two", "3"])).unwrap_err();
        assert_eq!(err, ReorderError::InvalidId { raw: "two".into() });

        assert_eq!(
            validate_reorder::<ModuleId>(&raw(&["1", "", "3"])).unwrap_err(),
            ReorderError::InvalidId { raw: String::new() }
        );
    }

    #[test]
    fn valid_list_parses_in_submission_order() {
        let ids = validate_reorder::<QuestionId>(&raw(&["3", "1", "2"])).unwrap();
        assert_eq!(
            ids,
            vec![QuestionId::new(3), QuestionId::new(1), QuestionId::new(2)]
        );
    }

    #[test]
    fn single_element_list_is_valid() {
        let ids = validate_reorder::<ModuleId>(&raw(&["42"])).unwrap();
        assert_eq!(ids, vec![ModuleId::new(42)]);
    }
}
