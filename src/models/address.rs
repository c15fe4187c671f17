use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ServiceError;

/// Number of hex characters after the `0x` prefix
pub const ADDRESS_HEX_LEN: usize = 40;

/// An EVM account address.
///
/// Stored lowercased so that checksummed input and node output compare equal.
/// Construction does not validate; call [`Address::validate`] or use [`Address::parse`]
/// at the boundary where user input enters the system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Address(String);

impl Address {
    /// Validate an address taken from user input, then normalize it.
    ///
    /// The raw text must already be `0x` plus exactly 40 hex digits; surrounding
    /// whitespace or an upper-case `0X` prefix is rejected.
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        if !is_valid_address(raw) {
            return Err(ServiceError::Validation(raw.to_string()));
        }
        Ok(Address::from(raw))
    }

    /// Check the stored, lowercased form
    pub fn validate(&self) -> Result<(), ServiceError> {
        if is_valid_address(&self.0) {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.0.clone()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_valid_address(raw: &str) -> bool {
    match raw.strip_prefix("0x") {
        Some(digits) => {
            digits.len() == ADDRESS_HEX_LEN && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Address(raw.to_ascii_lowercase())
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Address::from(raw.as_str())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
