//! Key manager deployment pipeline.

use alloy_core::primitives::{Address, Bytes};
use futures::FutureExt;

use crate::DeployContext;
use crate::chain::ChainProvider;
use crate::events::ContractRole;
use crate::factory::ContractFactory;
use crate::pipeline::{self, ContractPipeline, ExtractionSignal, InitializeSpec};
use crate::strategy::{self, DeploymentPath};

pub type KeyManagerDeploymentEvent = crate::events::DeploymentEvent;

/// Deployment pipeline handle for the key manager contract.
pub type KeyManagerDeployment = ContractPipeline;

/// Start the key manager pipeline against a (possibly still deploying)
/// account.
///
/// Nothing is submitted before the account address has resolved: standalone
/// and bytecode paths take it as the constructor argument, the proxy path
/// passes it to `initialize(address)`.
pub fn key_manager_deployment<F, P>(
    ctx: &DeployContext<F, P>,
    extraction: ExtractionSignal,
    account: &ContractPipeline,
    base_contract_address: Option<Address>,
    bytecode: Option<Bytes>,
) -> KeyManagerDeployment
where
    F: ContractFactory,
    P: ChainProvider,
{
    let role = ContractRole::KeyManager;
    let path = DeploymentPath::select(base_contract_address, bytecode);
    let account_address = account.address();

    let initialize = path.is_proxy().then(|| InitializeSpec {
        signature: ctx.config.initialize_signature(role).to_string(),
        args: {
            let account_address = account_address.clone();
            async move { Ok(vec![account_address.await?]) }.boxed()
        },
    });

    let deploy = {
        let factory = ctx.factory.clone();
        let path = path.clone();
        async move {
            // Join on the account receipt before going anywhere near the
            // wire; a failed account pipeline stops this one here.
            let account_address = account_address.await?;
            let constructor_args = if path.is_proxy() {
                Vec::new()
            } else {
                vec![account_address]
            };
            strategy::submit_deployment(&*factory, role, path, constructor_args).await
        }
        .boxed()
    };

    pipeline::contract_pipeline(
        ctx.factory.clone(),
        ctx.provider.clone(),
        role,
        deploy,
        initialize,
        extraction,
    )
}
