//! Signer identity for deployment transactions.

use alloy_core::primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};

/// The account a deployment run submits transactions from.
///
/// Transactions go out as `eth_sendTransaction` with this address in `from`
/// and are signed by the node holding the key. The pipelines only ever need
/// the address; key material never crosses this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploySigner {
    address: Address,
}

impl DeploySigner {
    /// Use an account the node already manages.
    pub fn from_address(address: Address) -> Self {
        Self { address }
    }

    /// Derive the signer address from a raw hex private key.
    pub fn from_private_key(key: &str) -> Result<Self> {
        let signer: PrivateKeySigner = key.parse().context("Failed to parse private key")?;
        Ok(Self {
            address: signer.address(),
        })
    }

    /// Generate a throwaway dev-chain signer.
    pub fn random() -> Self {
        Self {
            address: PrivateKeySigner::random().address(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}
