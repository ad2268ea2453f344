//! Per-call input to a validator: the address plus opaque, per-validator
//! options.

use crate::address::Address;
use crate::result::ValidatorName;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable for the lifetime of one validation call. Options are stored as
/// `Any` so that each validator can define its own typed option struct
/// without `Input` depending on every validator crate; `option::<T>` is the
/// typed accessor a validator uses to read its own entry.
#[derive(Clone)]
pub struct Input {
    address: Address,
    options: HashMap<ValidatorName, Arc<dyn Any + Send + Sync>>,
}

impl Input {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            options: HashMap::new(),
        }
    }

    pub fn with_option<T: Any + Send + Sync>(mut self, name: ValidatorName, option: T) -> Self {
        self.options.insert(name, Arc::new(option));
        self
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn option<T: Any + Send + Sync>(&self, name: &ValidatorName) -> Option<&T> {
        self.options.get(name).and_then(|o| o.downcast_ref::<T>())
    }
}
