//! Email address model: parsing, case-folding and equality.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed `user@domain` address. Both sides are lowercased at construction
/// time; there is no way to mutate an `Address` once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    username: String,
    domain: String,
}

impl Address {
    /// Builds an address directly from a username and domain, lowercasing both.
    pub fn new(username: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            username: username.into().to_lowercase(),
            domain: domain.into().to_lowercase(),
        }
    }

    /// Parses `s` at the last `@`. Anything before is the username, anything
    /// after is the domain; a string without `@` becomes an address with an
    /// empty domain rather than failing, matching the permissive source
    /// parser this is modeled on.
    pub fn from_string(s: &str) -> Self {
        match s.rfind('@') {
            Some(idx) => Address::new(&s[..idx], &s[idx + 1..]),
            None => Address::new(s, ""),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.domain.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.domain)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address::from_string(s)
    }
}
