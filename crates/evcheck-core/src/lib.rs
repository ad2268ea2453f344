//! Core address, result, error and dependency-engine model shared by every
//! evcheck validator.

pub mod address;
pub mod cache;
pub mod codec;
pub mod engine;
pub mod input;
pub mod result;
pub mod stage_error;
pub mod validator;

pub use address::Address;
pub use cache::{Cache, CacheError};
pub use codec::{decode, decode_result, encode, encode_result, register_extensions, CodecError};
pub use engine::{DependencyEngine, EngineError};
pub use input::Input;
pub use result::{CompositeResult, ValidationResult, ValidatorName, OTHER_VALIDATOR};
pub use stage_error::{Cause, Stage, StageError, ValidationError};
pub use validator::{Validator, ValidatorMap};

// Re-export external dependencies the way temps-core does, so downstream
// crates pin against the workspace version rather than their own.
pub use anyhow;
pub use async_trait;
pub use thiserror;
pub use tokio;
pub use tracing;
