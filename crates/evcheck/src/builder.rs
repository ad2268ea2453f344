//! Builder (C13): fluent assembly of a [`ValidatorMap`] into one composite
//! validation call. Grounded on `validator_dep_builder.go`'s `DepBuilder`;
//! `build()` returns a `CompositeValidator` rather than something
//! satisfying the `Validator` port itself, since its output is a
//! `CompositeResult`, a different shape than a single `ValidationResult`.

use evcheck_core::{DependencyEngine, EngineError, CompositeResult, Input, ValidatorMap, ValidatorName, Validator};
use std::sync::Arc;

use crate::contains::InStrings;
use crate::validators::domain_sets::{DisposableValidator, RoleValidator, DISPOSABLE_VALIDATOR_NAME, ROLE_VALIDATOR_NAME};
use crate::validators::mx::{MxValidator, MX_VALIDATOR_NAME};
use crate::validators::smtp_validator::{default_smtp_validator, SMTP_VALIDATOR_NAME};
use crate::validators::syntax::{SyntaxValidator, SYNTAX_VALIDATOR_NAME};

/// A default set of validators: syntax, MX, disposable (with an empty word
/// list, since the actual list is external data out of scope here), role,
/// and the SMTP validator wrapped with the catch-all-as-warning decorator.
pub fn default_factories() -> ValidatorMap {
    let mut map = ValidatorMap::new();
    map.insert(ValidatorName::new(SYNTAX_VALIDATOR_NAME), Arc::new(SyntaxValidator) as Arc<dyn Validator>);
    map.insert(ValidatorName::new(MX_VALIDATOR_NAME), Arc::new(MxValidator::new()) as Arc<dyn Validator>);
    map.insert(
        ValidatorName::new(DISPOSABLE_VALIDATOR_NAME),
        Arc::new(DisposableValidator::new(InStrings::new(Vec::<String>::new()))) as Arc<dyn Validator>,
    );
    map.insert(
        ValidatorName::new(ROLE_VALIDATOR_NAME),
        Arc::new(RoleValidator::new(InStrings::new(Vec::<String>::new()))) as Arc<dyn Validator>,
    );
    map.insert(ValidatorName::new(SMTP_VALIDATOR_NAME), default_smtp_validator());
    map
}

pub struct Builder {
    validators: ValidatorMap,
}

impl Builder {
    /// An empty builder: every validator must be added with [`Builder::set`].
    pub fn empty() -> Self {
        Self {
            validators: ValidatorMap::new(),
        }
    }

    /// Seeds the default factory set described in [`default_factories`].
    pub fn new() -> Self {
        Self {
            validators: default_factories(),
        }
    }

    pub fn with_validators(validators: ValidatorMap) -> Self {
        Self { validators }
    }

    pub fn set(mut self, name: ValidatorName, validator: Arc<dyn Validator>) -> Self {
        self.validators.insert(name, validator);
        self
    }

    pub fn get(&self, name: &ValidatorName) -> Option<Arc<dyn Validator>> {
        self.validators.get(name).cloned()
    }

    pub fn has(&self, names: &[ValidatorName]) -> bool {
        names.iter().all(|name| self.validators.contains_key(name))
    }

    pub fn delete(mut self, names: &[ValidatorName]) -> Self {
        for name in names {
            self.validators.remove(name);
        }
        self
    }

    pub fn build(self) -> CompositeValidator {
        CompositeValidator {
            validators: self.validators,
            engine: DependencyEngine::new(),
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// The assembled validator: one `validate` call schedules the whole
/// dependency graph and folds the outcomes into a `CompositeResult`.
pub struct CompositeValidator {
    validators: ValidatorMap,
    engine: DependencyEngine,
}

impl CompositeValidator {
    pub async fn validate(&self, input: &Input) -> Result<CompositeResult, EngineError> {
        self.engine.validate(&self.validators, input).await
    }
}
