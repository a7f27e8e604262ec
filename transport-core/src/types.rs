//! Core types for the transport layer
//!
//! Amounts are integer smallest units (u128) so fee arithmetic is exact;
//! addresses and token identifiers are opaque strings supplied by the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monetary amount in the asset's smallest indivisible unit
pub type Amount = u128;

/// Account identifier (wallet address, account number, etc.)
///
/// The empty string is the reserved null address; settlement rejects it as
/// a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Create new address
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null address
    pub fn zero() -> Self {
        Self(String::new())
    }

    /// Whether this is the null address
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(String);

impl TokenId {
    /// Create new token identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settleable asset: the native currency or a specific token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// Native currency
    Native,
    /// Token balance identified by its token id
    Token(TokenId),
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Token(id) => write!(f, "token:{}", id),
        }
    }
}
