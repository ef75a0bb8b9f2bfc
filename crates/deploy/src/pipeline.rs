//! Shared-stage pipeline assembly.
//!
//! Each pipeline stage is a memoized [`Shared`] future: any number of
//! subscribers observe the same submission and confirmation exactly once,
//! the underlying work runs at most once, and dropping a stream abandons
//! only the stages nothing else awaits. Transactions already submitted stay
//! on chain either way.

use std::sync::Arc;

use alloy_core::primitives::{Address, B256};
use futures::future::{BoxFuture, Shared};
use futures::stream::{self, BoxStream, Stream};
use futures::{FutureExt, StreamExt};

use crate::chain::{ChainProvider, ProviderError};
use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::events::{
    AddressExtraction, ContractRole, DeploymentEvent, DeploymentKind, DeploymentStatus,
    PendingDeployment,
};
use crate::factory::{self, ContractFactory};

/// One pipeline stage: resolves to an event, or to nothing when the stage
/// does not apply to the chosen deployment path.
pub type StageFuture =
    Shared<BoxFuture<'static, Result<Option<DeploymentEvent>, DeployError>>>;

/// Memoized resolved contract address of a pipeline.
pub type AddressFuture = Shared<BoxFuture<'static, Result<Address, DeployError>>>;

/// Memoized address-extraction strategy derived from probing the signer.
pub type ExtractionSignal =
    Shared<BoxFuture<'static, Result<AddressExtraction, ProviderError>>>;

/// Start condition another pipeline can wait on before touching the chain.
pub type SubmissionGate = Shared<BoxFuture<'static, Result<(), DeployError>>>;

/// Proxy initialization: the call signature plus an async argument producer.
///
/// Arguments are a future because some of them only exist once another
/// pipeline's receipt has resolved (the key manager initializes with the
/// account address).
pub struct InitializeSpec {
    pub signature: String,
    pub args: BoxFuture<'static, Result<Vec<Address>, DeployError>>,
}

/// An assembled per-contract deployment pipeline.
///
/// `events()` yields this contract's events in strict stage order:
/// deployment submitted, deployment confirmed, then (proxy path only)
/// initialize submitted and initialize confirmed.
pub struct ContractPipeline {
    role: ContractRole,
    stages: Vec<StageFuture>,
    address: AddressFuture,
}

impl ContractPipeline {
    pub fn role(&self) -> ContractRole {
        self.role
    }

    /// The resolved contract address, available once the relevant receipt
    /// is. Attach-only pipelines resolve immediately.
    pub fn address(&self) -> AddressFuture {
        self.address.clone()
    }

    /// Start condition for dependent pipelines: resolves once this
    /// contract's deployment submission went through, errors if it failed.
    pub fn submission_gate(&self) -> SubmissionGate {
        match self.stages.first() {
            Some(stage) => {
                let stage = stage.clone();
                async move { stage.await.map(|_| ()) }.boxed().shared()
            }
            None => futures::future::ready(Ok(())).boxed().shared(),
        }
    }

    /// This contract's deployment events, in stage order, ending after the
    /// first error. Each call replays the same shared stages.
    pub fn events(&self) -> BoxStream<'static, Result<DeploymentEvent, DeployError>> {
        event_stream(self.stages.clone())
    }
}

/// Probe the signer's bytecode once and derive the address-extraction
/// strategy all pipelines of a run share: a contract signer deploys through
/// its own profile, which moves created addresses into the receipt logs.
pub fn extraction_signal<P: ChainProvider>(
    provider: Arc<P>,
    signer: Address,
    config: Arc<DeployConfig>,
) -> ExtractionSignal {
    async move {
        let code = provider.get_bytecode(signer).await?;
        let is_profile = !code.is_empty();
        tracing::debug!(signer = %signer, is_profile, "Resolved address-extraction strategy");
        Ok(AddressExtraction::for_signer(is_profile, &config))
    }
    .boxed()
    .shared()
}

/// Wire strategy + receipt waiter + initializer into a pipeline for `role`.
///
/// `deploy` is the fully-joined submission future: dependencies on other
/// pipelines are awaited inside it, so nothing goes on the wire before they
/// resolve. `initialize` applies to proxy deployments only.
pub(crate) fn contract_pipeline<F, P>(
    factory: Arc<F>,
    provider: Arc<P>,
    role: ContractRole,
    deploy: BoxFuture<'static, Result<PendingDeployment, DeployError>>,
    initialize: Option<InitializeSpec>,
    extraction: ExtractionSignal,
) -> ContractPipeline
where
    F: ContractFactory,
    P: ChainProvider,
{
    let pending = deploy.shared();

    // Stage 1: deployment submitted. Attach-only inputs emit nothing.
    let submitted: StageFuture = {
        let pending = pending.clone();
        async move { Ok(pending.await?.submitted_event()) }
            .boxed()
            .shared()
    };

    // Receipt of the creation transaction; the attach case has none and
    // passes through without waiting.
    let receipt = {
        let pending = pending.clone();
        let provider = provider.clone();
        async move {
            match pending.await? {
                PendingDeployment::Attached { .. } => Ok(None),
                PendingDeployment::Submitted { role, tx_hash, .. } => {
                    let receipt = provider
                        .wait_for_receipt(tx_hash)
                        .await
                        .map_err(|e| receipt_error(role, tx_hash, e))?;
                    if !receipt.succeeded() {
                        return Err(DeployError::DeploymentReverted { role, tx_hash });
                    }
                    tracing::info!(
                        role = %role,
                        tx_hash = %tx_hash,
                        block = receipt.block_number,
                        "Deployment confirmed"
                    );
                    Ok(Some(receipt))
                }
            }
        }
        .boxed()
        .shared()
    };

    // Stage 2: deployment confirmed.
    let confirmed: StageFuture = {
        let pending = pending.clone();
        let receipt = receipt.clone();
        async move {
            let Some(receipt) = receipt.await? else {
                return Ok(None);
            };
            Ok(pending.await?.confirmed_event(receipt))
        }
        .boxed()
        .shared()
    };

    // Resolved contract address: the attach target, or extracted from the
    // confirmed receipt with the signer-dependent strategy.
    let address: AddressFuture = {
        let pending = pending.clone();
        let receipt = receipt.clone();
        let extraction = extraction.clone();
        async move {
            match pending.await? {
                PendingDeployment::Attached { address, .. } => Ok(address),
                PendingDeployment::Submitted { role, .. } => {
                    let receipt = receipt
                        .await?
                        .ok_or(DeployError::AddressResolutionFailed { role })?;
                    let extraction = extraction.await.map_err(|e| {
                        tracing::warn!(role = %role, error = %e, "Signer probe failed");
                        DeployError::AddressResolutionFailed { role }
                    })?;
                    extraction.extract(role, &receipt)
                }
            }
        }
        .boxed()
        .shared()
    };

    // Proxy-only follow-up: initialize the proxy once its receipt landed.
    let init_stages = initialize.map(|spec| {
        let InitializeSpec { signature, args } = spec;
        let args = args.shared();

        let init_pending = {
            let pending = pending.clone();
            let receipt = receipt.clone();
            let address = address.clone();
            let factory = factory.clone();
            async move {
                // Only proxy deployments initialize.
                if !matches!(
                    pending.await?,
                    PendingDeployment::Submitted {
                        kind: DeploymentKind::Proxy { .. },
                        ..
                    }
                ) {
                    return Ok(None);
                }
                let Some(_) = receipt.await? else {
                    return Ok(None);
                };
                let target = address.await?;
                let args = args.await?;
                let calldata = factory::encode_call(&signature, &args);
                let tx_hash = factory.send_initialize(role, target, calldata).await?;
                Ok(Some(tx_hash))
            }
            .boxed()
            .shared()
        };

        // Stage 3: initialize submitted.
        let init_submitted: StageFuture = {
            let pending = pending.clone();
            let init_pending = init_pending.clone();
            async move {
                let Some(tx_hash) = init_pending.await? else {
                    return Ok(None);
                };
                Ok(pending
                    .await?
                    .initialize_event(tx_hash, DeploymentStatus::Submitted, None))
            }
            .boxed()
            .shared()
        };

        // Receipt of the initialize call.
        let init_receipt = {
            let init_pending = init_pending.clone();
            let provider = provider.clone();
            async move {
                let Some(tx_hash) = init_pending.await? else {
                    return Ok(None);
                };
                let receipt = provider
                    .wait_for_receipt(tx_hash)
                    .await
                    .map_err(|e| DeployError::initialization(role, e))?;
                if !receipt.succeeded() {
                    return Err(DeployError::InitializationFailed {
                        role,
                        reason: format!("initialize transaction {tx_hash} reverted"),
                    });
                }
                tracing::info!(role = %role, tx_hash = %tx_hash, "Initialization confirmed");
                Ok(Some((tx_hash, receipt)))
            }
            .boxed()
            .shared()
        };

        // Stage 4: initialize confirmed.
        let init_confirmed: StageFuture = {
            let pending = pending.clone();
            let init_receipt = init_receipt.clone();
            async move {
                let Some((tx_hash, receipt)) = init_receipt.await? else {
                    return Ok(None);
                };
                Ok(pending.await?.initialize_event(
                    tx_hash,
                    DeploymentStatus::Confirmed,
                    Some(receipt),
                ))
            }
            .boxed()
            .shared()
        };

        (init_submitted, init_confirmed)
    });

    let mut stages = vec![submitted, confirmed];
    if let Some((init_submitted, init_confirmed)) = init_stages {
        stages.push(init_submitted);
        stages.push(init_confirmed);
    }

    ContractPipeline {
        role,
        stages,
        address,
    }
}

fn receipt_error(role: ContractRole, tx_hash: B256, err: ProviderError) -> DeployError {
    if !matches!(err, ProviderError::ReceiptTimeout(..)) {
        tracing::warn!(role = %role, tx_hash = %tx_hash, error = %err, "Receipt wait failed");
    }
    DeployError::ReceiptTimeout { role, tx_hash }
}

/// Yield stage events in order, dropping non-applicable stages and ending
/// after the first error.
pub(crate) fn event_stream(
    stages: Vec<StageFuture>,
) -> BoxStream<'static, Result<DeploymentEvent, DeployError>> {
    let events = stream::iter(stages)
        .then(|stage| stage)
        .filter_map(|outcome| futures::future::ready(outcome.transpose()));
    terminate_on_error(events).boxed()
}

/// Pass items through until the first error, then end the stream: a failure
/// terminates a deployment stream instead of letting every later stage
/// repeat the same root cause.
pub(crate) fn terminate_on_error<S>(
    stream: S,
) -> impl Stream<Item = Result<DeploymentEvent, DeployError>> + Send
where
    S: Stream<Item = Result<DeploymentEvent, DeployError>> + Send,
{
    stream.scan(false, |errored, item| {
        let stop = *errored;
        *errored |= item.is_err();
        futures::future::ready(if stop { None } else { Some(item) })
    })
}
