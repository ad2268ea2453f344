//! Stage-tagged errors emitted by the SMTP engine, and the overall error
//! taxonomy carried inside a [`crate::result::ValidationResult`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named step of the envelope-only SMTP exchange. Used to tag both errors
/// and the deadline that governs the Hello→Quit sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Client,
    Hello,
    Auth,
    Mail,
    RCPTs,
    Quit,
    Close,
    RandomRCPT,
    Connection,
}

/// The underlying cause wrapped by a [`StageError`].
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cause {
    /// A numeric SMTP reply code with its text, e.g. `550 No such user`.
    #[error("{code} {text}")]
    Reply { code: u16, text: String },
    /// A generic I/O or dial failure.
    #[error("{0}")]
    Io(String),
    /// The response deadline for the run expired before this stage finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("{0}")]
    Other(String),
}

/// An error tagged with the SMTP stage it originated from.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("evsmtp: {stage:?}: {cause}")]
pub struct StageError {
    pub stage: Stage,
    pub cause: Cause,
}

impl StageError {
    pub fn new(stage: Stage, cause: Cause) -> Self {
        Self { stage, cause }
    }

    pub fn connection() -> Self {
        StageError::new(
            Stage::Connection,
            Cause::Other("connection was not created".to_string()),
        )
    }

    pub fn deadline(stage: Stage) -> Self {
        StageError::new(stage, Cause::DeadlineExceeded)
    }
}

/// The complete error taxonomy a validator may place in its result.
///
/// `DepsError` is the sentinel a validator emits when a predecessor's
/// failure makes its own work meaningless (Gravatar and SMTP both
/// short-circuit this way). The domain variants are fixed-string markers,
/// one per predicate validator.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error("DepsErr")]
    Deps,
    #[error("SyntaxErr")]
    Syntax,
    #[error("DisposableErr")]
    Disposable,
    #[error("RoleErr")]
    Role,
    #[error("BlackListDomainsErr")]
    BlackListDomain,
    #[error("FreeErr")]
    Free,
    #[error("WhiteListErr")]
    WhiteList,
    #[error("BanWordsUsernameErr")]
    BanWordsUsername,
    #[error("{0}")]
    Other(String),
}

impl ValidationError {
    /// True when this error originates from the given SMTP stage; used by
    /// the warnings decorator (C12) to reclassify catch-all signals.
    pub fn is_from_stage(&self, stage: Stage) -> bool {
        matches!(self, ValidationError::Stage(e) if e.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_has_fixed_text() {
        let e = StageError::connection();
        assert_eq!(e.stage, Stage::Connection);
        assert_eq!(e.to_string(), "evsmtp: Connection: connection was not created");
    }

    #[test]
    fn is_from_stage_matches_only_tagged_stage() {
        let random_rcpt = ValidationError::Stage(StageError::deadline(Stage::RandomRCPT));
        assert!(random_rcpt.is_from_stage(Stage::RandomRCPT));
        assert!(!random_rcpt.is_from_stage(Stage::RCPTs));
        assert!(!ValidationError::Deps.is_from_stage(Stage::RandomRCPT));
    }
}
