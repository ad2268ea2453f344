//! Result cache decorator (C11): memoizes any validator by a caller-supplied
//! key function over the call's `Input`. Storage errors are logged, never
//! surfaced; a cache miss always falls through to the inner validator.

use async_trait::async_trait;
use evcheck_core::{Cache, Input, ValidationResult, ValidatorName, Validator};
use std::sync::Arc;
use tracing::error;

pub struct CacheDecorator<F>
where
    F: Fn(&Input) -> String + Send + Sync,
{
    inner: Arc<dyn Validator>,
    cache: Arc<dyn Cache<ValidationResult>>,
    key_fn: F,
}

impl<F> CacheDecorator<F>
where
    F: Fn(&Input) -> String + Send + Sync,
{
    pub fn new(inner: Arc<dyn Validator>, cache: Arc<dyn Cache<ValidationResult>>, key_fn: F) -> Self {
        Self {
            inner,
            cache,
            key_fn,
        }
    }
}

/// `key_fn` for the common case of keying by the address alone.
pub fn email_key(input: &Input) -> String {
    input.address().to_string()
}

/// `key_fn` for keying by domain, used by per-domain checks.
pub fn domain_key(input: &Input) -> String {
    input.address().domain().to_string()
}

#[async_trait]
impl<F> Validator for CacheDecorator<F>
where
    F: Fn(&Input) -> String + Send + Sync,
{
    fn deps(&self) -> Vec<ValidatorName> {
        self.inner.deps()
    }

    async fn validate(&self, input: &Input, predecessors: &[ValidationResult]) -> ValidationResult {
        let key = (self.key_fn)(input);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => return cached,
            Ok(None) => {}
            Err(err) => error!(%err, key, "result cache get"),
        }

        let result = self.inner.validate(input, predecessors).await;
        if let Err(err) = self.cache.set(&key, &result).await {
            error!(%err, key, "result cache set");
        }
        result
    }
}
