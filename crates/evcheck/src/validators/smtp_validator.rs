//! Adapts the SMTP [`Checker`] (C7) to the [`Validator`] port: resolves the
//! recipient domain's MX list itself, then hands it to the checker.

use async_trait::async_trait;
use evcheck_core::{Input, ValidationResult, ValidatorName, Validator};
use std::sync::Arc;

use crate::config::Options;
use crate::dns::MxResolver;
use crate::smtp::checker::Checker;

pub const SMTP_VALIDATOR_NAME: &str = "smtpValidator";

pub struct SmtpValidator {
    checker: Checker,
    options: Options,
    resolver: MxResolver,
}

impl SmtpValidator {
    pub fn new(checker: Checker, options: Options) -> Self {
        Self {
            checker,
            options,
            resolver: MxResolver::new(),
        }
    }
}

#[async_trait]
impl Validator for SmtpValidator {
    fn deps(&self) -> Vec<ValidatorName> {
        Vec::new()
    }

    async fn validate(&self, input: &Input, _predecessors: &[ValidationResult]) -> ValidationResult {
        let name = ValidatorName::new(SMTP_VALIDATOR_NAME);
        let domain = input.address().domain();

        let mxs = match self.resolver.lookup_mx(domain).await {
            Ok(mxs) => mxs,
            Err(_) => {
                return ValidationResult::invalid(
                    evcheck_core::ValidationError::Stage(
                        evcheck_core::StageError::connection(),
                    ),
                    name,
                )
            }
        };

        let call_opts = input
            .option::<Options>(&name)
            .cloned()
            .unwrap_or_default();
        let resolved = call_opts.merge(&self.options);

        let errors = self.checker.validate(&mxs, input.address(), &resolved).await;
        ValidationResult::new(errors, Vec::new(), name)
    }
}

/// Convenience used by the builder to assemble a default SMTP validator
/// wrapped with the catch-all-as-warning decorator, mirroring
/// `GetDefaultSMTPValidator`.
pub fn default_smtp_validator() -> Arc<dyn Validator> {
    use crate::decorators::warnings::WarningsDecorator;
    use crate::smtp::random_rcpt::DefaultRandomRcpt;
    use evcheck_core::Stage;

    let checker = Checker::new(Arc::new(DefaultRandomRcpt::new()), None, None);
    let validator: Arc<dyn Validator> =
        Arc::new(SmtpValidator::new(checker, Options::with_defaults()));

    Arc::new(WarningsDecorator::new(validator, |err| {
        err.is_from_stage(Stage::RandomRCPT)
    }))
}
