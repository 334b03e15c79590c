//! Lightweight input validation helpers. Keep logic minimal and deterministic.

use crate::CoreError;
use crate::EntityName;

/// Validate the `name` field of a create request.
///
/// A missing field is rejected here, before anything reaches storage.
pub fn validate_entity_name(raw: Option<&str>) -> Result<EntityName, CoreError> {
    match raw {
        Some(s) => EntityName::new(s),
        None => Err(CoreError::InvalidName("name is required".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation_basic() {
        assert_eq!(validate_entity_name(Some("Nike")).unwrap().as_str(), "Nike");
        assert!(validate_entity_name(Some("")).is_err());
        assert!(validate_entity_name(Some("  ")).is_err());
    }

    #[test]
    fn missing_name_is_required_error() {
        match validate_entity_name(None) {
            Err(CoreError::InvalidName(msg)) => assert_eq!(msg, "name is required"),
            other => panic!("expected InvalidName, got {other:?}"),
        }
    }
}
