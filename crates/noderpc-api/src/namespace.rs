//! Node API namespaces.

use std::str::FromStr;

use crate::error::ApiError;

/// A group of node methods sharing an RPC prefix (`chain_`, `tx_`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Account,
    Chain,
    Mine,
    Net,
    Tx,
}

impl Namespace {
    pub const ALL: [Namespace; 5] = [Self::Account, Self::Chain, Self::Mine, Self::Net, Self::Tx];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Chain => "chain",
            Self::Mine => "mine",
            Self::Net => "net",
            Self::Tx => "tx",
        }
    }

    /// RPC method name for `name` in this namespace, e.g. `chain_chainID`.
    pub fn rpc_method(&self, name: &str) -> String {
        format!("{}_{}", self.as_str(), name)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ns| ns.as_str() == s)
            .ok_or_else(|| ApiError::UnknownNamespace(s.to_string()))
    }
}
