//! Full universal-profile deployment orchestration.

use alloy_core::primitives::{Address, Bytes};
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use serde::{Deserialize, Serialize};

use crate::DeployContext;
use crate::chain::ChainProvider;
use crate::error::DeployError;
use crate::events::DeploymentEvent;
use crate::factory::ContractFactory;
use crate::pipeline;
use crate::services::{
    AccountDeployment, KeyManagerDeployment, UniversalReceiverDeployment, account_deployment,
    key_manager_deployment, universal_receiver_delegate_deployment,
};

/// Optional pre-deployed base ("library") contract addresses, per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseContractAddresses {
    pub account: Option<Address>,
    pub key_manager: Option<Address>,
    pub universal_receiver_delegate: Option<Address>,
}

/// Optional raw creation bytecode overrides, per role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentBytecode {
    pub account: Option<Bytes>,
    pub key_manager: Option<Bytes>,
    pub universal_receiver_delegate: Option<Bytes>,
}

/// Caller inputs for a full profile deployment.
#[derive(Debug, Clone, Default)]
pub struct ProfileDeploymentOptions {
    pub base_contracts: BaseContractAddresses,
    pub bytecode: DeploymentBytecode,
    /// Externally deployed receiver to reuse instead of deploying one.
    pub provided_universal_receiver: Option<Address>,
    /// Well-known receiver whose on-chain bytecode is probed before the
    /// deploy-or-reuse decision.
    pub default_universal_receiver: Option<Address>,
}

/// Final addresses of a completed profile deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedProfile {
    pub account: Address,
    pub key_manager: Address,
    pub universal_receiver_delegate: Address,
}

/// Handle over the three running pipelines of one profile deployment.
pub struct UniversalProfileDeployment {
    pub account: AccountDeployment,
    pub key_manager: KeyManagerDeployment,
    pub universal_receiver_delegate: UniversalReceiverDeployment,
}

impl UniversalProfileDeployment {
    /// Merged deployment event stream.
    ///
    /// Per-contract ordering is preserved; events of different contracts
    /// interleave by readiness. The stream ends after the first error.
    /// Subscribing more than once replays the same shared stages and never
    /// duplicates a transaction.
    pub fn events(&self) -> BoxStream<'static, Result<DeploymentEvent, DeployError>> {
        let merged = stream::select_all([
            self.account.events(),
            self.key_manager.events(),
            self.universal_receiver_delegate.events(),
        ]);
        pipeline::terminate_on_error(merged).boxed()
    }

    /// Drain the merged stream and return the deployed addresses.
    pub async fn wait_for_completion(&self) -> Result<DeployedProfile, DeployError> {
        let mut events = self.events();
        while let Some(event) = events.next().await {
            let event = event?;
            tracing::info!(
                role = %event.role(),
                stage = event.stage(),
                status = %event.status(),
                "Deployment event"
            );
        }

        let profile = DeployedProfile {
            account: self.account.address().await?,
            key_manager: self.key_manager.address().await?,
            universal_receiver_delegate: self.universal_receiver_delegate.address().await?,
        };

        tracing::info!("✓ Universal profile deployed!");
        tracing::info!("Account:                     {}", profile.account);
        tracing::info!("Key manager:                 {}", profile.key_manager);
        tracing::info!(
            "Universal receiver delegate: {}",
            profile.universal_receiver_delegate
        );

        Ok(profile)
    }
}

/// Deploy a full universal profile: account, key manager and universal
/// receiver delegate.
///
/// The account pipeline is the root. The key manager joins on the account's
/// resolved address and the receiver branch on the account's submission
/// gate, so a failed account submission stops both siblings before they
/// touch the chain. Confirmed deployments are never rolled back; a failure
/// only stops pipeline continuation.
pub fn deploy_universal_profile<F, P>(
    ctx: &DeployContext<F, P>,
    options: ProfileDeploymentOptions,
) -> UniversalProfileDeployment
where
    F: ContractFactory,
    P: ChainProvider,
{
    let extraction = pipeline::extraction_signal(
        ctx.provider.clone(),
        ctx.signer.address(),
        ctx.config.clone(),
    );

    let account = account_deployment(
        ctx,
        extraction.clone(),
        options.base_contracts.account,
        options.bytecode.account,
    );

    let key_manager = key_manager_deployment(
        ctx,
        extraction.clone(),
        &account,
        options.base_contracts.key_manager,
        options.bytecode.key_manager,
    );

    let universal_receiver_delegate = universal_receiver_delegate_deployment(
        ctx,
        extraction,
        options.base_contracts.universal_receiver_delegate,
        options.bytecode.universal_receiver_delegate,
        options.provided_universal_receiver,
        options.default_universal_receiver,
        Some(account.submission_gate()),
    );

    UniversalProfileDeployment {
        account,
        key_manager,
        universal_receiver_delegate,
    }
}
