//! Deployment event model.
//!
//! Every pipeline emits a strictly ordered sequence of [`DeploymentEvent`]s:
//! deployment submitted, deployment confirmed, then (proxy path only)
//! initialize submitted and initialize confirmed. Events are never mutated
//! after emission.

use alloy_core::primitives::{Address, B256};

use crate::chain::DeploymentReceipt;
use crate::config::DeployConfig;
use crate::error::DeployError;

/// The three contract roles that compose a universal profile.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
)]
pub enum ContractRole {
    /// The account contract at the center of the profile.
    #[strum(serialize = "account")]
    Account,
    /// The key manager owning the account.
    #[strum(serialize = "key-manager")]
    KeyManager,
    /// The universal receiver delegate wired into the account.
    #[strum(serialize = "universal-receiver-delegate")]
    UniversalReceiverDelegate,
}

/// Whether an event announces a submission or a chain confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum DeploymentStatus {
    #[strum(serialize = "submitted")]
    Submitted,
    #[strum(serialize = "confirmed")]
    Confirmed,
}

/// How a contract reached the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentKind {
    /// Full contract deployed from creation bytecode.
    Standalone,
    /// Minimal proxy forwarding to a pre-deployed base contract.
    Proxy { base: Address },
}

/// An in-flight deployment as returned by the contract factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingDeployment {
    /// A creation transaction was submitted and awaits confirmation.
    Submitted {
        role: ContractRole,
        kind: DeploymentKind,
        tx_hash: B256,
    },
    /// Attached to an already-deployed contract; nothing went on the wire,
    /// so there is no receipt to wait for.
    Attached { role: ContractRole, address: Address },
}

impl PendingDeployment {
    pub fn role(&self) -> ContractRole {
        match self {
            Self::Submitted { role, .. } | Self::Attached { role, .. } => *role,
        }
    }

    /// Event announcing the submission. Attach-only deployments announce
    /// nothing.
    pub fn submitted_event(&self) -> Option<DeploymentEvent> {
        self.deployment_event(DeploymentStatus::Submitted, None)
    }

    /// Event carrying the confirmed receipt of the creation transaction.
    pub fn confirmed_event(&self, receipt: DeploymentReceipt) -> Option<DeploymentEvent> {
        self.deployment_event(DeploymentStatus::Confirmed, Some(receipt))
    }

    fn deployment_event(
        &self,
        status: DeploymentStatus,
        receipt: Option<DeploymentReceipt>,
    ) -> Option<DeploymentEvent> {
        match *self {
            Self::Attached { .. } => None,
            Self::Submitted {
                role,
                kind: DeploymentKind::Standalone,
                tx_hash,
            } => Some(DeploymentEvent::Contract(ContractDeployment {
                role,
                status,
                tx_hash,
                receipt,
            })),
            Self::Submitted {
                role,
                kind: DeploymentKind::Proxy { base },
                tx_hash,
            } => Some(DeploymentEvent::ProxyContract(ProxyContractDeployment {
                role,
                step: ProxyStep::Deployment,
                status,
                base_contract: base,
                tx_hash,
                receipt,
            })),
        }
    }

    /// Event for the follow-up initialize call. Only proxy deployments
    /// initialize; everything else yields nothing.
    pub fn initialize_event(
        &self,
        tx_hash: B256,
        status: DeploymentStatus,
        receipt: Option<DeploymentReceipt>,
    ) -> Option<DeploymentEvent> {
        match *self {
            Self::Submitted {
                role,
                kind: DeploymentKind::Proxy { base },
                ..
            } => Some(DeploymentEvent::ProxyContract(ProxyContractDeployment {
                role,
                step: ProxyStep::Initialization,
                status,
                base_contract: base,
                tx_hash,
                receipt,
            })),
            _ => None,
        }
    }
}

/// One entry of a pipeline's event sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum DeploymentEvent {
    Contract(ContractDeployment),
    ProxyContract(ProxyContractDeployment),
}

/// Standalone contract deployment progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractDeployment {
    pub role: ContractRole,
    pub status: DeploymentStatus,
    pub tx_hash: B256,
    pub receipt: Option<DeploymentReceipt>,
}

/// Proxy deployment or proxy initialization progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyContractDeployment {
    pub role: ContractRole,
    pub step: ProxyStep,
    pub status: DeploymentStatus,
    pub base_contract: Address,
    pub tx_hash: B256,
    pub receipt: Option<DeploymentReceipt>,
}

/// Which proxy-path transaction an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyStep {
    Deployment,
    Initialization,
}

impl DeploymentEvent {
    pub fn role(&self) -> ContractRole {
        match self {
            Self::Contract(event) => event.role,
            Self::ProxyContract(event) => event.role,
        }
    }

    pub fn status(&self) -> DeploymentStatus {
        match self {
            Self::Contract(event) => event.status,
            Self::ProxyContract(event) => event.status,
        }
    }

    pub fn receipt(&self) -> Option<&DeploymentReceipt> {
        match self {
            Self::Contract(event) => event.receipt.as_ref(),
            Self::ProxyContract(event) => event.receipt.as_ref(),
        }
    }

    /// Short label of the pipeline step that produced this event.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Contract(_) => "deployment",
            Self::ProxyContract(event) => match event.step {
                ProxyStep::Deployment => "proxy-deployment",
                ProxyStep::Initialization => "initialize",
            },
        }
    }
}

/// How the created contract address is pulled out of a receipt.
///
/// Resolved once per run from the signer probe and applied at every address
/// resolution, instead of re-branching on the flag at each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressExtraction {
    /// Plain externally-owned signer: the receipt's standard
    /// contract-creation field holds the address.
    Standard,
    /// The signer is itself a profile contract and deploys through its own
    /// execution: the created address only shows up in the `ContractCreated`
    /// log that execution emits.
    FromProfileLogs { topic: B256 },
}

impl AddressExtraction {
    /// Pick the strategy for a signer, given whether its address carries
    /// deployed bytecode.
    pub fn for_signer(signer_is_profile: bool, config: &DeployConfig) -> Self {
        if signer_is_profile {
            Self::FromProfileLogs {
                topic: config.contract_created_topic,
            }
        } else {
            Self::Standard
        }
    }

    /// Extract the created contract address from `receipt`.
    pub fn extract(
        &self,
        role: ContractRole,
        receipt: &DeploymentReceipt,
    ) -> Result<Address, DeployError> {
        match self {
            Self::Standard => receipt
                .contract_address
                .ok_or(DeployError::AddressResolutionFailed { role }),
            Self::FromProfileLogs { topic } => receipt
                .logs
                .iter()
                .find(|log| log.topics.first() == Some(topic))
                .and_then(|log| log.topics.get(2))
                .map(|word| Address::from_word(*word))
                .ok_or(DeployError::AddressResolutionFailed { role }),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_core::primitives::Bytes;

    use super::*;
    use crate::chain::LogEntry;

    fn receipt(contract_address: Option<Address>, logs: Vec<LogEntry>) -> DeploymentReceipt {
        DeploymentReceipt {
            transaction_hash: B256::repeat_byte(0xaa),
            contract_address,
            block_number: 7,
            status: true,
            logs,
        }
    }

    #[test]
    fn test_standard_extraction_reads_creation_field() {
        let deployed = Address::repeat_byte(0x42);
        let extraction = AddressExtraction::Standard;
        let address = extraction
            .extract(ContractRole::Account, &receipt(Some(deployed), vec![]))
            .unwrap();
        assert_eq!(address, deployed);
    }

    #[test]
    fn test_standard_extraction_fails_without_creation_field() {
        let extraction = AddressExtraction::Standard;
        let err = extraction
            .extract(ContractRole::Account, &receipt(None, vec![]))
            .unwrap_err();
        assert_eq!(
            err,
            DeployError::AddressResolutionFailed {
                role: ContractRole::Account
            }
        );
    }

    #[test]
    fn test_profile_log_extraction_reads_indexed_address() {
        let topic = B256::repeat_byte(0x01);
        let deployed = Address::repeat_byte(0x42);
        let log = LogEntry {
            address: Address::repeat_byte(0x99),
            topics: vec![topic, B256::ZERO, deployed.into_word()],
            data: Bytes::new(),
        };
        let extraction = AddressExtraction::FromProfileLogs { topic };
        // The creation field points at the profile, not the new contract.
        let address = extraction
            .extract(
                ContractRole::KeyManager,
                &receipt(Some(Address::repeat_byte(0x99)), vec![log]),
            )
            .unwrap();
        assert_eq!(address, deployed);
    }

    #[test]
    fn test_profile_log_extraction_ignores_other_topics() {
        let extraction = AddressExtraction::FromProfileLogs {
            topic: B256::repeat_byte(0x01),
        };
        let log = LogEntry {
            address: Address::repeat_byte(0x99),
            topics: vec![B256::repeat_byte(0x02)],
            data: Bytes::new(),
        };
        let err = extraction
            .extract(ContractRole::KeyManager, &receipt(None, vec![log]))
            .unwrap_err();
        assert_eq!(err.role(), ContractRole::KeyManager);
    }

    #[test]
    fn test_attached_deployment_emits_nothing() {
        let pending = PendingDeployment::Attached {
            role: ContractRole::UniversalReceiverDelegate,
            address: Address::repeat_byte(0x33),
        };
        assert!(pending.submitted_event().is_none());
        assert!(
            pending
                .initialize_event(B256::ZERO, DeploymentStatus::Submitted, None)
                .is_none()
        );
    }

    #[test]
    fn test_standalone_deployment_never_produces_initialize_events() {
        let pending = PendingDeployment::Submitted {
            role: ContractRole::Account,
            kind: DeploymentKind::Standalone,
            tx_hash: B256::repeat_byte(0x11),
        };
        assert!(matches!(
            pending.submitted_event(),
            Some(DeploymentEvent::Contract(_))
        ));
        assert!(
            pending
                .initialize_event(B256::ZERO, DeploymentStatus::Submitted, None)
                .is_none()
        );
    }

    #[test]
    fn test_proxy_deployment_events_carry_base_contract() {
        let base = Address::repeat_byte(0x55);
        let pending = PendingDeployment::Submitted {
            role: ContractRole::KeyManager,
            kind: DeploymentKind::Proxy { base },
            tx_hash: B256::repeat_byte(0x11),
        };

        let Some(DeploymentEvent::ProxyContract(event)) = pending.submitted_event() else {
            panic!("expected a proxy event");
        };
        assert_eq!(event.base_contract, base);
        assert_eq!(event.step, ProxyStep::Deployment);

        let init = pending
            .initialize_event(B256::repeat_byte(0x22), DeploymentStatus::Confirmed, None)
            .unwrap();
        assert_eq!(init.stage(), "initialize");
        assert_eq!(init.status(), DeploymentStatus::Confirmed);
    }
}
