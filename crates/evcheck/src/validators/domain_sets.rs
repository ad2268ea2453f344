//! Set-membership validators: disposable-domain, role-username,
//! blacklist/whitelist domain, free-mail domain, and banned-username-word
//! checks. Each wraps an injected [`InStrings`] set; the actual word lists
//! are static data out of scope here (the source loads them from
//! generated tables).

use async_trait::async_trait;
use evcheck_core::{Input, ValidationError, ValidationResult, ValidatorName, Validator};

use crate::contains::InStrings;

pub const DISPOSABLE_VALIDATOR_NAME: &str = "disposableValidator";
pub const ROLE_VALIDATOR_NAME: &str = "roleValidator";
pub const BLACKLIST_VALIDATOR_NAME: &str = "blackListValidator";
pub const WHITELIST_VALIDATOR_NAME: &str = "whiteListValidator";
pub const FREE_VALIDATOR_NAME: &str = "freeValidator";
pub const BAN_WORDS_USERNAME_VALIDATOR_NAME: &str = "banWordsUsernameValidator";

/// Fails when the address's domain is present in the set.
pub struct DisposableValidator {
    domains: InStrings,
}

impl DisposableValidator {
    pub fn new(domains: InStrings) -> Self {
        Self { domains }
    }
}

#[async_trait]
impl Validator for DisposableValidator {
    fn deps(&self) -> Vec<ValidatorName> {
        Vec::new()
    }

    async fn validate(&self, input: &Input, _predecessors: &[ValidationResult]) -> ValidationResult {
        let name = ValidatorName::new(DISPOSABLE_VALIDATOR_NAME);
        if self.domains.contains(input.address().domain()) {
            ValidationResult::invalid(ValidationError::Disposable, name)
        } else {
            ValidationResult::valid(name)
        }
    }
}

/// Fails when the username (e.g. `admin`, `postmaster`) is present in the set.
pub struct RoleValidator {
    usernames: InStrings,
}

impl RoleValidator {
    pub fn new(usernames: InStrings) -> Self {
        Self { usernames }
    }
}

#[async_trait]
impl Validator for RoleValidator {
    fn deps(&self) -> Vec<ValidatorName> {
        Vec::new()
    }

    async fn validate(&self, input: &Input, _predecessors: &[ValidationResult]) -> ValidationResult {
        let name = ValidatorName::new(ROLE_VALIDATOR_NAME);
        if self.usernames.contains(input.address().username()) {
            ValidationResult::invalid(ValidationError::Role, name)
        } else {
            ValidationResult::valid(name)
        }
    }
}

/// Fails when the domain is present in the blacklist.
pub struct BlackListValidator {
    domains: InStrings,
}

impl BlackListValidator {
    pub fn new(domains: InStrings) -> Self {
        Self { domains }
    }
}

#[async_trait]
impl Validator for BlackListValidator {
    fn deps(&self) -> Vec<ValidatorName> {
        Vec::new()
    }

    async fn validate(&self, input: &Input, _predecessors: &[ValidationResult]) -> ValidationResult {
        let name = ValidatorName::new(BLACKLIST_VALIDATOR_NAME);
        if self.domains.contains(input.address().domain()) {
            ValidationResult::invalid(ValidationError::BlackListDomain, name)
        } else {
            ValidationResult::valid(name)
        }
    }
}

/// Fails when the domain is absent from the whitelist (an empty whitelist
/// allows everything, matching "no restriction configured").
pub struct WhiteListValidator {
    domains: InStrings,
}

impl WhiteListValidator {
    pub fn new(domains: InStrings) -> Self {
        Self { domains }
    }
}

#[async_trait]
impl Validator for WhiteListValidator {
    fn deps(&self) -> Vec<ValidatorName> {
        Vec::new()
    }

    async fn validate(&self, input: &Input, _predecessors: &[ValidationResult]) -> ValidationResult {
        let name = ValidatorName::new(WHITELIST_VALIDATOR_NAME);
        if self.domains.is_empty() || self.domains.contains(input.address().domain()) {
            ValidationResult::valid(name)
        } else {
            ValidationResult::invalid(ValidationError::WhiteList, name)
        }
    }
}

/// Fails when the domain is a known free-mail provider.
pub struct FreeValidator {
    domains: InStrings,
}

impl FreeValidator {
    pub fn new(domains: InStrings) -> Self {
        Self { domains }
    }
}

#[async_trait]
impl Validator for FreeValidator {
    fn deps(&self) -> Vec<ValidatorName> {
        Vec::new()
    }

    async fn validate(&self, input: &Input, _predecessors: &[ValidationResult]) -> ValidationResult {
        let name = ValidatorName::new(FREE_VALIDATOR_NAME);
        if self.domains.contains(input.address().domain()) {
            ValidationResult::invalid(ValidationError::Free, name)
        } else {
            ValidationResult::valid(name)
        }
    }
}

/// Fails when the username contains a banned substring (slurs, spam tokens).
pub struct BanWordsUsernameValidator {
    words: InStrings,
}

impl BanWordsUsernameValidator {
    pub fn new(words: InStrings) -> Self {
        Self { words }
    }
}

#[async_trait]
impl Validator for BanWordsUsernameValidator {
    fn deps(&self) -> Vec<ValidatorName> {
        Vec::new()
    }

    async fn validate(&self, input: &Input, _predecessors: &[ValidationResult]) -> ValidationResult {
        let name = ValidatorName::new(BAN_WORDS_USERNAME_VALIDATOR_NAME);
        if self.words.contains(input.address().username()) {
            ValidationResult::invalid(ValidationError::BanWordsUsername, name)
        } else {
            ValidationResult::valid(name)
        }
    }
}
