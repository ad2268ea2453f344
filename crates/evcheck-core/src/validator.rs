//! Validator port (C9): the interface every per-aspect check implements.

use crate::input::Input;
use crate::result::{ValidationResult, ValidatorName};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// `deps()` is static and pure and must return the same set across calls;
/// `validate` receives its declared predecessors' results, in the order
/// `deps()` named them, and must not consult anything outside that list.
/// Errors are always returned inside the result, never raised out-of-band.
#[async_trait]
pub trait Validator: Send + Sync {
    fn deps(&self) -> Vec<ValidatorName>;

    async fn validate(&self, input: &Input, predecessors: &[ValidationResult]) -> ValidationResult;
}

/// A named set of validators. Identity is the name: replacing an entry
/// replaces that validator's participation in the dependency graph.
pub type ValidatorMap = HashMap<ValidatorName, Arc<dyn Validator>>;
