//! upfactory-deploy - Deployment library for universal profiles.
//!
//! This crate orchestrates the contract constellation behind a universal
//! profile: the account contract, its key manager and its universal
//! receiver delegate. Given a signer and optional base-contract or bytecode
//! overrides it produces a correctly ordered sequence of deployment and
//! initialization transactions, streams per-transaction events to the
//! caller and exposes the final contract addresses.

use std::sync::Arc;

mod config;
pub use config::{DEPLOYMENT_GAS_CEILING, DeployConfig, NULL_ADDRESS, UPCONF_FILENAME};

mod error;
pub use error::DeployError;

mod events;
pub use events::{
    AddressExtraction, ContractDeployment, ContractRole, DeploymentEvent, DeploymentKind,
    DeploymentStatus, PendingDeployment, ProxyContractDeployment, ProxyStep,
};

pub mod chain;
pub use chain::{
    ChainProvider, DeploymentReceipt, HttpChainProvider, LogEntry, ProviderError,
    TransactionRequest,
};

mod signer;
pub use signer::DeploySigner;

pub mod factory;
pub use factory::{ContractArtifacts, ContractFactory, RpcContractFactory};

mod strategy;
pub use strategy::DeploymentPath;

mod pipeline;
pub use pipeline::{
    AddressFuture, ContractPipeline, ExtractionSignal, InitializeSpec, StageFuture,
    SubmissionGate, extraction_signal,
};

pub mod services;
pub use services::{
    AccountDeployment, KeyManagerDeployment, UniversalReceiverDeployment, account_deployment,
    key_manager_deployment, universal_receiver_delegate_deployment,
};

mod orchestrator;
pub use orchestrator::{
    BaseContractAddresses, DeployedProfile, DeploymentBytecode, ProfileDeploymentOptions,
    UniversalProfileDeployment, deploy_universal_profile,
};

/// Capabilities one deployment run executes against.
///
/// Everything sits behind `Arc` so the pipelines' shared stage futures can
/// outlive the call that assembled them.
pub struct DeployContext<F, P> {
    /// Contract factory the strategy selector submits through.
    pub factory: Arc<F>,
    /// Chain provider used for receipts and read-only queries.
    pub provider: Arc<P>,
    /// Process-wide deployment constants.
    pub config: Arc<DeployConfig>,
    /// The signer transactions are submitted from.
    pub signer: DeploySigner,
}

impl<F, P> DeployContext<F, P> {
    pub fn new(
        factory: Arc<F>,
        provider: Arc<P>,
        config: DeployConfig,
        signer: DeploySigner,
    ) -> Self {
        Self {
            factory,
            provider,
            config: Arc::new(config),
            signer,
        }
    }
}

impl<F, P> Clone for DeployContext<F, P> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            provider: self.provider.clone(),
            config: self.config.clone(),
            signer: self.signer,
        }
    }
}
