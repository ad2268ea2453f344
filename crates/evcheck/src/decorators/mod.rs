//! Cross-cutting validator decorators (C11, C12).

pub mod cache;
pub mod warnings;
