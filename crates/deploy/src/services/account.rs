//! Account contract deployment — the root of the dependency graph.

use alloy_core::primitives::{Address, Bytes};
use futures::FutureExt;

use crate::DeployContext;
use crate::chain::ChainProvider;
use crate::events::ContractRole;
use crate::factory::ContractFactory;
use crate::pipeline::{self, ContractPipeline, ExtractionSignal, InitializeSpec};
use crate::strategy::{self, DeploymentPath};

pub type AccountDeploymentEvent = crate::events::DeploymentEvent;

/// Deployment pipeline handle for the account contract.
pub type AccountDeployment = ContractPipeline;

/// Start the account deployment pipeline.
///
/// The account depends on nothing else; its resolved address feeds the key
/// manager pipeline and the profile configuration. Proxy deployments hand
/// ownership to the signer at initialize time.
pub fn account_deployment<F, P>(
    ctx: &DeployContext<F, P>,
    extraction: ExtractionSignal,
    base_contract_address: Option<Address>,
    bytecode: Option<Bytes>,
) -> AccountDeployment
where
    F: ContractFactory,
    P: ChainProvider,
{
    let role = ContractRole::Account;
    let path = DeploymentPath::select(base_contract_address, bytecode);

    let initialize = path.is_proxy().then(|| InitializeSpec {
        signature: ctx.config.initialize_signature(role).to_string(),
        args: futures::future::ready(Ok(vec![ctx.signer.address()])).boxed(),
    });

    let deploy = {
        let factory = ctx.factory.clone();
        async move { strategy::submit_deployment(&*factory, role, path, Vec::new()).await }.boxed()
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
