//! Universal receiver delegate deployment pipeline.

use alloy_core::primitives::{Address, Bytes};
use futures::FutureExt;

use crate::DeployContext;
use crate::chain::ChainProvider;
use crate::error::DeployError;
use crate::events::ContractRole;
use crate::factory::ContractFactory;
use crate::pipeline::{self, ContractPipeline, ExtractionSignal, InitializeSpec, SubmissionGate};
use crate::strategy::{self, DeploymentPath};

pub type UniversalReceiverDeploymentEvent = crate::events::DeploymentEvent;

/// Deployment pipeline handle for the universal receiver delegate.
pub type UniversalReceiverDeployment = ContractPipeline;

/// Start the universal receiver delegate pipeline.
///
/// Decision order is fixed; reordering changes which deployments are
/// skipped. The bytecode probe of the default receiver address always
/// completes before the branch:
///
/// 1. A base address or explicit bytecode deploys through the strategy
///    selector.
/// 2. A provided external receiver, or non-empty bytecode at the default
///    address, short-circuits the pipeline: the existing contract is
///    attached and nothing is emitted.
/// 3. Otherwise the default standalone contract is deployed.
///
/// Proxy deployments follow up with an argument-less `initialize()` call.
pub fn universal_receiver_delegate_deployment<F, P>(
    ctx: &DeployContext<F, P>,
    extraction: ExtractionSignal,
    base_contract_address: Option<Address>,
    bytecode: Option<Bytes>,
    provided_address: Option<Address>,
    default_address: Option<Address>,
    start_gate: Option<SubmissionGate>,
) -> UniversalReceiverDeployment
where
    F: ContractFactory,
    P: ChainProvider,
{
    let role = ContractRole::UniversalReceiverDelegate;
    let probe_address = default_address.unwrap_or(ctx.config.null_address);

    // Only branch 1 with a base address ends up on the proxy path, and that
    // is known before anything runs.
    let initialize = base_contract_address.is_some().then(|| InitializeSpec {
        signature: ctx.config.initialize_signature(role).to_string(),
        args: futures::future::ready(Ok(Vec::new())).boxed(),
    });

    let deploy = {
        let factory = ctx.factory.clone();
        let provider = ctx.provider.clone();
        async move {
            if let Some(gate) = start_gate {
                gate.await?;
            }

            let default_code =
                provider
                    .get_bytecode(probe_address)
                    .await
                    .map_err(|e| DeployError::DeploymentSubmissionFailed {
                        role,
                        reason: format!("default receiver bytecode probe failed: {e}"),
                    })?;

            if base_contract_address.is_some() || bytecode.is_some() {
                let path = DeploymentPath::select(base_contract_address, bytecode);
                return strategy::submit_deployment(&*factory, role, path, Vec::new()).await;
            }

            if provided_address.is_some() || !default_code.is_empty() {
                let address = provided_address.unwrap_or(probe_address);
                tracing::info!(role = %role, address = %address, "Reusing existing universal receiver delegate");
                return Ok(factory.attach(role, address));
            }

            strategy::submit_deployment(&*factory, role, DeploymentPath::Default, Vec::new())
                .await
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
