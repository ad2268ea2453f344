//! Syntax validator: RFC 5322-ish regex over the address string. Out of
//! scope for the protocol core, but needed to satisfy the validator
//! contract and to gate Gravatar's `DepsErr` short-circuit.

use async_trait::async_trait;
use evcheck_core::{Input, ValidationError, ValidationResult, ValidatorName, Validator};
use once_cell::sync::Lazy;
use regex::Regex;

pub const SYNTAX_VALIDATOR_NAME: &str = "syntaxValidator";

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^(?:[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*)@(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)$"#,
    )
    .expect("static email regex is valid")
});

pub struct SyntaxValidator;

#[async_trait]
impl Validator for SyntaxValidator {
    fn deps(&self) -> Vec<ValidatorName> {
        Vec::new()
    }

    async fn validate(&self, input: &Input, _predecessors: &[ValidationResult]) -> ValidationResult {
        let name = ValidatorName::new(SYNTAX_VALIDATOR_NAME);
        if EMAIL_REGEX.is_match(&input.address().to_string()) {
            ValidationResult::valid(name)
        } else {
            ValidationResult::invalid(ValidationError::Syntax, name)
        }
    }
}
