//! Warnings decorator (C12): reclassifies selected errors as warnings after
//! the inner validator runs. The default predicate for SMTP treats a
//! catch-all signal (a `RandomRCPT`-stage error) as a warning rather than a
//! failure.

use async_trait::async_trait;
use evcheck_core::{Input, ValidationError, ValidationResult, ValidatorName, Validator};
use std::sync::Arc;

pub struct WarningsDecorator<F>
where
    F: Fn(&ValidationError) -> bool + Send + Sync,
{
    inner: Arc<dyn Validator>,
    is_warning: F,
}

impl<F> WarningsDecorator<F>
where
    F: Fn(&ValidationError) -> bool + Send + Sync,
{
    pub fn new(inner: Arc<dyn Validator>, is_warning: F) -> Self {
        Self { inner, is_warning }
    }
}

#[async_trait]
impl<F> Validator for WarningsDecorator<F>
where
    F: Fn(&ValidationError) -> bool + Send + Sync,
{
    fn deps(&self) -> Vec<ValidatorName> {
        self.inner.deps()
    }

    async fn validate(&self, input: &Input, predecessors: &[ValidationResult]) -> ValidationResult {
        let mut result = self.inner.validate(input, predecessors).await;

        let (warnings, errors): (Vec<_>, Vec<_>) = result
            .errors()
            .iter()
            .cloned()
            .partition(|err| (self.is_warning)(err));

        let mut merged_warnings = result.warnings().to_vec();
        merged_warnings.extend(warnings);

        result.set_errors(errors);
        result.set_warnings(merged_warnings);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evcheck_core::{Address, Stage, StageError};

    struct Fixed(Vec<ValidationError>);

    #[async_trait]
    impl Validator for Fixed {
        fn deps(&self) -> Vec<ValidatorName> {
            Vec::new()
        }

        async fn validate(&self, _input: &Input, _predecessors: &[ValidationResult]) -> ValidationResult {
            ValidationResult::new(self.0.clone(), Vec::new(), ValidatorName::new("smtp"))
        }
    }

    #[tokio::test]
    async fn random_rcpt_errors_become_warnings_and_validity_flips() {
        let inner = Arc::new(Fixed(vec![ValidationError::Stage(StageError::deadline(
            Stage::RandomRCPT,
        ))]));
        let decorator = WarningsDecorator::new(inner, |err| err.is_from_stage(Stage::RandomRCPT));
        let input = Input::new(Address::from_string("a@example.com"));
        let result = decorator.validate(&input, &[]).await;
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 1);
        assert!(result.errors().is_empty());
    }

    #[tokio::test]
    async fn non_matching_errors_stay_errors() {
        let inner = Arc::new(Fixed(vec![ValidationError::Stage(StageError::deadline(
            Stage::Mail,
        ))]));
        let decorator = WarningsDecorator::new(inner, |err| err.is_from_stage(Stage::RandomRCPT));
        let input = Input::new(Address::from_string("a@example.com"));
        let result = decorator.validate(&input, &[]).await;
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert!(result.warnings().is_empty());
    }
}
