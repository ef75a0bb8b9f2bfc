//! Contract factory capability and its JSON-RPC reference implementation.
//!
//! ABI knowledge lives here: creation bytecode per role, EIP-1167 proxy
//! initcode, and argument encoding. The pipelines only sequence calls.

use std::future::Future;
use std::sync::Arc;

use alloy_core::primitives::{Address, B256, Bytes, keccak256};

use crate::chain::{ChainProvider, TransactionRequest};
use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::events::{ContractRole, DeploymentKind, PendingDeployment};
use crate::signer::DeploySigner;

/// EIP-1167 minimal proxy creation code up to the base contract address.
const PROXY_CREATION_PREFIX: [u8; 20] = [
    0x3d, 0x60, 0x2d, 0x80, 0x60, 0x0a, 0x3d, 0x39, 0x81, 0xf3, 0x36, 0x3d, 0x3d, 0x37, 0x3d,
    0x3d, 0x3d, 0x36, 0x3d, 0x73,
];

/// EIP-1167 minimal proxy runtime tail after the base contract address.
const PROXY_RUNTIME_SUFFIX: [u8; 15] = [
    0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3,
];

/// Contract deployment capability consumed by the strategy selector.
pub trait ContractFactory: Send + Sync + 'static {
    /// Deploy a standalone contract from `bytecode`, or from the role's
    /// default creation bytecode when none is supplied.
    fn deploy_standalone(
        &self,
        role: ContractRole,
        bytecode: Option<Bytes>,
        constructor_args: Vec<Address>,
    ) -> impl Future<Output = Result<PendingDeployment, DeployError>> + Send;

    /// Deploy a minimal proxy pointing at an already-deployed base contract.
    fn deploy_proxy(
        &self,
        role: ContractRole,
        base: Address,
    ) -> impl Future<Output = Result<PendingDeployment, DeployError>> + Send;

    /// Attach to an already-deployed contract; nothing goes on the wire.
    fn attach(&self, role: ContractRole, address: Address) -> PendingDeployment {
        PendingDeployment::Attached { role, address }
    }

    /// Submit an initialize call against a deployed proxy.
    fn send_initialize(
        &self,
        role: ContractRole,
        target: Address,
        calldata: Bytes,
    ) -> impl Future<Output = Result<B256, DeployError>> + Send;
}

/// Default creation bytecode per contract role.
#[derive(Debug, Clone, Default)]
pub struct ContractArtifacts {
    pub account: Bytes,
    pub key_manager: Bytes,
    pub universal_receiver_delegate: Bytes,
}

impl ContractArtifacts {
    pub fn creation_code(&self, role: ContractRole) -> &Bytes {
        match role {
            ContractRole::Account => &self.account,
            ContractRole::KeyManager => &self.key_manager,
            ContractRole::UniversalReceiverDelegate => &self.universal_receiver_delegate,
        }
    }
}

/// Factory submitting deployments through a JSON-RPC chain provider.
pub struct RpcContractFactory<P> {
    provider: Arc<P>,
    signer: DeploySigner,
    artifacts: ContractArtifacts,
    config: Arc<DeployConfig>,
}

impl<P: ChainProvider> RpcContractFactory<P> {
    pub fn new(
        provider: Arc<P>,
        signer: DeploySigner,
        artifacts: ContractArtifacts,
        config: Arc<DeployConfig>,
    ) -> Self {
        Self {
            provider,
            signer,
            artifacts,
            config,
        }
    }
}

impl<P: ChainProvider> ContractFactory for RpcContractFactory<P> {
    async fn deploy_standalone(
        &self,
        role: ContractRole,
        bytecode: Option<Bytes>,
        constructor_args: Vec<Address>,
    ) -> Result<PendingDeployment, DeployError> {
        let creation = bytecode.unwrap_or_else(|| self.artifacts.creation_code(role).clone());
        let tx = TransactionRequest {
            from: self.signer.address(),
            to: None,
            data: Some(append_constructor_args(creation, &constructor_args)),
            gas: Some(self.config.gas_ceiling),
        };

        let tx_hash = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| DeployError::submission(role, e))?;
        tracing::info!(role = %role, tx_hash = %tx_hash, "Standalone deployment submitted");

        Ok(PendingDeployment::Submitted {
            role,
            kind: DeploymentKind::Standalone,
            tx_hash,
        })
    }

    async fn deploy_proxy(
        &self,
        role: ContractRole,
        base: Address,
    ) -> Result<PendingDeployment, DeployError> {
        let tx = TransactionRequest {
            from: self.signer.address(),
            to: None,
            data: Some(minimal_proxy_initcode(base)),
            gas: None,
        };

        let tx_hash = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| DeployError::submission(role, e))?;
        tracing::info!(role = %role, base = %base, tx_hash = %tx_hash, "Proxy deployment submitted");

        Ok(PendingDeployment::Submitted {
            role,
            kind: DeploymentKind::Proxy { base },
            tx_hash,
        })
    }

    async fn send_initialize(
        &self,
        role: ContractRole,
        target: Address,
        calldata: Bytes,
    ) -> Result<B256, DeployError> {
        let tx = TransactionRequest {
            from: self.signer.address(),
            to: Some(target),
            data: Some(calldata),
            gas: None,
        };

        let tx_hash = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| DeployError::initialization(role, e))?;
        tracing::info!(role = %role, target = %target, tx_hash = %tx_hash, "Initialize call submitted");

        Ok(tx_hash)
    }
}

/// EIP-1167 minimal proxy creation code forwarding every call to `base`.
pub fn minimal_proxy_initcode(base: Address) -> Bytes {
    let mut code = Vec::with_capacity(55);
    code.extend_from_slice(&PROXY_CREATION_PREFIX);
    code.extend_from_slice(base.as_slice());
    code.extend_from_slice(&PROXY_RUNTIME_SUFFIX);
    code.into()
}

/// First four bytes of the keccak-256 hash of `signature`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode a call as `selector ++ left-padded address words`.
pub fn encode_call(signature: &str, args: &[Address]) -> Bytes {
    let mut data = Vec::with_capacity(4 + 32 * args.len());
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(arg.into_word().as_slice());
    }
    data.into()
}

/// Append ABI-encoded constructor arguments to creation bytecode.
fn append_constructor_args(creation: Bytes, args: &[Address]) -> Bytes {
    if args.is_empty() {
        return creation;
    }

    let mut data = creation.to_vec();
    for arg in args {
        data.extend_from_slice(arg.into_word().as_slice());
    }
    data.into()
}
