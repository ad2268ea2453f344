//! Staged SMTP probe and validator dependency engine for email address
//! checking, built on top of `evcheck-core`'s address/result/engine model.

pub mod builder;
pub mod config;
pub mod contains;
pub mod decorators;
pub mod dns;
pub mod smtp;
pub mod validators;

pub use builder::{Builder, CompositeValidator};
pub use config::{Options, ResolvedOptions};

pub use evcheck_core::{
    Address, CompositeResult, DependencyEngine, EngineError, Input, ValidationError,
    ValidationResult, Validator, ValidatorMap, ValidatorName,
};
