//! Per-validator results and their aggregation into one composite result.

use crate::stage_error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sentinel name used when a validator is constructed with an empty name.
pub const OTHER_VALIDATOR: &str = "other";

/// Identity of a validator within a [`crate::engine::ValidatorMap`]; replacing
/// the map entry for a name replaces that validator's participation in the
/// dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidatorName(String);

impl ValidatorName {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.is_empty() {
            ValidatorName(OTHER_VALIDATOR.to_string())
        } else {
            ValidatorName(name)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ValidatorName {
    fn from(s: &str) -> Self {
        ValidatorName::new(s)
    }
}

/// Result of running a single validator.
///
/// `is_valid == errors.is_empty()` holds whenever the value came from
/// [`ValidationResult::new`]; decorators (C11, C12) are the only code
/// allowed to set the fields independently, and C12 explicitly recomputes
/// `is_valid` after reclassifying errors as warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    is_valid: bool,
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
    name: ValidatorName,
}

impl ValidationResult {
    /// Canonical constructor: `is_valid` is derived from `errors`, never
    /// taken from the caller.
    pub fn new(
        errors: Vec<ValidationError>,
        warnings: Vec<ValidationError>,
        name: ValidatorName,
    ) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            name,
        }
    }

    pub fn valid(name: ValidatorName) -> Self {
        Self::new(Vec::new(), Vec::new(), name)
    }

    pub fn invalid(error: ValidationError, name: ValidatorName) -> Self {
        Self::new(vec![error], Vec::new(), name)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn name(&self) -> &ValidatorName {
        &self.name
    }

    /// Used only by decorators: replaces errors and recomputes `is_valid`
    /// from the new residue.
    pub fn set_errors(&mut self, errors: Vec<ValidationError>) {
        self.is_valid = errors.is_empty();
        self.errors = errors;
    }

    pub fn set_warnings(&mut self, warnings: Vec<ValidationError>) {
        self.warnings = warnings;
    }
}

/// Aggregation of every validator's result for one input, produced by the
/// dependency engine (C10).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeResult {
    is_valid: bool,
    per_validator: HashMap<ValidatorName, ValidationResult>,
}

impl CompositeResult {
    pub fn new(per_validator: HashMap<ValidatorName, ValidationResult>) -> Self {
        let is_valid = per_validator.values().all(|r| r.is_valid());
        Self {
            is_valid,
            per_validator,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn get(&self, name: &ValidatorName) -> Option<&ValidationResult> {
        self.per_validator.get(name)
    }

    pub fn per_validator(&self) -> &HashMap<ValidatorName, ValidationResult> {
        &self.per_validator
    }

    /// Concatenates errors across every member. Order is stable within one
    /// run but otherwise unspecified.
    pub fn errors(&self) -> Vec<ValidationError> {
        self.per_validator
            .values()
            .flat_map(|r| r.errors().to_vec())
            .collect()
    }

    pub fn warnings(&self) -> Vec<ValidationError> {
        self.per_validator
            .values()
            .flat_map(|r| r.warnings().to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_normalized_to_other() {
        let name = ValidatorName::new("");
        assert_eq!(name.as_str(), OTHER_VALIDATOR);
    }

    #[test]
    fn canonical_constructor_derives_is_valid() {
        let valid = ValidationResult::valid(ValidatorName::new("syntax"));
        assert!(valid.is_valid());

        let invalid = ValidationResult::invalid(
            ValidationError::Syntax,
            ValidatorName::new("syntax"),
        );
        assert!(!invalid.is_valid());
        assert_eq!(invalid.errors().len(), 1);
    }

    #[test]
    fn composite_is_valid_is_and_of_members() {
        let mut map = HashMap::new();
        map.insert(
            ValidatorName::new("a"),
            ValidationResult::valid(ValidatorName::new("a")),
        );
        map.insert(
            ValidatorName::new("b"),
            ValidationResult::invalid(ValidationError::Syntax, ValidatorName::new("b")),
        );
        let composite = CompositeResult::new(map);
        assert!(!composite.is_valid());
        assert_eq!(composite.errors().len(), 1);
    }

    #[test]
    fn warnings_decorator_can_recompute_validity() {
        let mut result = ValidationResult::invalid(
            ValidationError::Syntax,
            ValidatorName::new("smtp"),
        );
        let errors = result.errors().to_vec();
        result.set_errors(Vec::new());
        result.set_warnings(errors);
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 1);
    }
}
