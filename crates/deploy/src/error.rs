//! Typed errors surfaced by the deployment pipelines.

use alloy_core::primitives::B256;

use crate::events::ContractRole;

/// Failure of a deployment pipeline stage.
///
/// Every variant names the contract role it belongs to, so a caller draining
/// the merged event stream knows exactly which stage failed and which
/// on-chain side effects already happened. Variants are cloneable because
/// results travel through shared stage futures; underlying causes are
/// rendered into the message at the conversion point.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeployError {
    /// The RPC rejected the deployment transaction (insufficient funds,
    /// nonce conflict, network failure).
    #[error("{role} deployment submission failed: {reason}")]
    DeploymentSubmissionFailed { role: ContractRole, reason: String },

    /// The deployment transaction was mined but execution reverted.
    #[error("{role} deployment reverted in transaction {tx_hash}")]
    DeploymentReverted { role: ContractRole, tx_hash: B256 },

    /// Chain confirmation did not arrive within the configured bound.
    #[error("timed out waiting for {role} receipt of transaction {tx_hash}")]
    ReceiptTimeout { role: ContractRole, tx_hash: B256 },

    /// The follow-up initialize call was rejected or reverted.
    #[error("{role} initialization failed: {reason}")]
    InitializationFailed { role: ContractRole, reason: String },

    /// The receipt did not contain an extractable contract address under
    /// the active extraction strategy.
    #[error("could not resolve the {role} contract address from its receipt")]
    AddressResolutionFailed { role: ContractRole },
}

impl DeployError {
    /// The contract role the failing stage belonged to.
    pub fn role(&self) -> ContractRole {
        match self {
            Self::DeploymentSubmissionFailed { role, .. }
            | Self::DeploymentReverted { role, .. }
            | Self::ReceiptTimeout { role, .. }
            | Self::InitializationFailed { role, .. }
            | Self::AddressResolutionFailed { role } => *role,
        }
    }

    pub(crate) fn submission(role: ContractRole, cause: impl std::fmt::Display) -> Self {
        Self::DeploymentSubmissionFailed {
            role,
            reason: cause.to_string(),
        }
    }

    pub(crate) fn initialization(role: ContractRole, cause: impl std::fmt::Display) -> Self {
        Self::InitializationFailed {
            role,
            reason: cause.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reports_role() {
        let err = DeployError::submission(ContractRole::Account, "insufficient funds");
        assert_eq!(err.role(), ContractRole::Account);
        assert_eq!(
            err.to_string(),
            "account deployment submission failed: insufficient funds"
        );
    }

    #[test]
    fn test_address_resolution_message_names_role() {
        let err = DeployError::AddressResolutionFailed {
            role: ContractRole::KeyManager,
        };
        assert!(err.to_string().contains("key-manager"));
    }
}
