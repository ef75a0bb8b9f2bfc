//! Deployment path selection.

use alloy_core::primitives::{Address, Bytes};

use crate::error::DeployError;
use crate::events::{ContractRole, PendingDeployment};
use crate::factory::ContractFactory;

/// The three ways a contract can reach the chain, in priority order: a
/// pre-deployed base contract wins, then caller-supplied bytecode, then the
/// role's default compiled bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentPath {
    /// Deploy a minimal proxy pointing at a pre-deployed base contract.
    Proxy { base: Address },
    /// Deploy caller-supplied creation bytecode.
    Bytecode(Bytes),
    /// Deploy the role's default compiled bytecode.
    Default,
}

impl DeploymentPath {
    /// Pick exactly one deployment path for the given overrides.
    pub fn select(base: Option<Address>, bytecode: Option<Bytes>) -> Self {
        if let Some(base) = base {
            return Self::Proxy { base };
        }
        if let Some(bytecode) = bytecode {
            return Self::Bytecode(bytecode);
        }
        Self::Default
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy { .. })
    }
}

/// Submit exactly one deployment transaction for `role` along `path`.
///
/// Failures are not caught here; a rejected submission propagates to the
/// pipeline as [`DeployError::DeploymentSubmissionFailed`].
pub(crate) async fn submit_deployment<F: ContractFactory>(
    factory: &F,
    role: ContractRole,
    path: DeploymentPath,
    constructor_args: Vec<Address>,
) -> Result<PendingDeployment, DeployError> {
    match path {
        DeploymentPath::Proxy { base } => {
            tracing::debug!(role = %role, base = %base, "Deploying proxy against base contract");
            factory.deploy_proxy(role, base).await
        }
        DeploymentPath::Bytecode(bytecode) => {
            factory
                .deploy_standalone(role, Some(bytecode), constructor_args)
                .await
        }
        DeploymentPath::Default => factory.deploy_standalone(role, None, constructor_args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_address_selects_proxy_path() {
        let base = Address::repeat_byte(0x11);
        let path = DeploymentPath::select(Some(base), None);
        assert_eq!(path, DeploymentPath::Proxy { base });
        assert!(path.is_proxy());
    }

    #[test]
    fn test_base_address_wins_over_bytecode() {
        let base = Address::repeat_byte(0x11);
        let path = DeploymentPath::select(Some(base), Some(Bytes::from(vec![0x60])));
        assert_eq!(path, DeploymentPath::Proxy { base });
    }

    #[test]
    fn test_bytecode_selects_custom_standalone_path() {
        let bytecode = Bytes::from(vec![0x60, 0x80]);
        let path = DeploymentPath::select(None, Some(bytecode.clone()));
        assert_eq!(path, DeploymentPath::Bytecode(bytecode));
        assert!(!path.is_proxy());
    }

    #[test]
    fn test_no_overrides_selects_default_path() {
        assert_eq!(DeploymentPath::select(None, None), DeploymentPath::Default);
    }
}
