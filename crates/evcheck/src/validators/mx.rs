//! MX validator: a domain has at least one resolvable mail exchanger.
//! Independent of the SMTP leaf, which resolves its own MX list rather
//! than consuming this validator's result (the dependency graph only
//! carries pass/fail signals, not data, per the validator contract).

use async_trait::async_trait;
use evcheck_core::{Input, ValidationError, ValidationResult, ValidatorName, Validator};

use crate::dns::MxResolver;

pub const MX_VALIDATOR_NAME: &str = "mxValidator";

pub struct MxValidator {
    resolver: MxResolver,
}

impl MxValidator {
    pub fn new() -> Self {
        Self {
            resolver: MxResolver::new(),
        }
    }
}

impl Default for MxValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for MxValidator {
    fn deps(&self) -> Vec<ValidatorName> {
        Vec::new()
    }

    async fn validate(&self, input: &Input, _predecessors: &[ValidationResult]) -> ValidationResult {
        let name = ValidatorName::new(MX_VALIDATOR_NAME);
        match self.resolver.lookup_mx(input.address().domain()).await {
            Ok(records) if !records.is_empty() => ValidationResult::valid(name),
            _ => ValidationResult::invalid(ValidationError::Other("MXErr".to_string()), name),
        }
    }
}
