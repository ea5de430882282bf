//! Simulated ledger and deployables.
//!
//! Deterministic stand-ins for a real chain: every submission gets the
//! next nonce, addresses and operation ids are derived from chain id and
//! nonce, and confirmations can be held back to model a slow or crashed
//! run.

use crate::error::DeployError;
use crate::options::ProxyOptions;
use crate::traits::{Confirm, Deployable, Ledger, ProxyDeployer};
use crate::types::{Address, NetworkIdentity, OperationId, PendingUnit, Receipt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// One accepted submission, as the ledger saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub operation_id: OperationId,
    pub contract: String,
    pub args: Vec<Value>,
    pub proxy: Option<ProxyOptions>,
    /// Proxy whose implementation this submission replaces.
    pub upgrades: Option<Address>,
}

#[derive(Debug, Clone)]
struct SimulatedOperation {
    address: Address,
    reverted: bool,
    block_number: u64,
}

#[derive(Debug)]
struct LedgerState {
    network: NetworkIdentity,
    nonce: u64,
    operations: HashMap<OperationId, SimulatedOperation>,
    submissions: Vec<Submission>,
    identity_lookups: usize,
    confirmation_waits: usize,
    fail_next_submission: Option<String>,
    revert_next_submission: bool,
}

/// In-process ledger. Clones share state.
#[derive(Debug, Clone)]
pub struct SimulatedLedger {
    state: Arc<Mutex<LedgerState>>,
    held: Arc<watch::Sender<bool>>,
}

impl SimulatedLedger {
    pub fn new(network: NetworkIdentity) -> Self {
        let (held, _) = watch::channel(false);
        Self {
            state: Arc::new(Mutex::new(LedgerState {
                network,
                nonce: 0,
                operations: HashMap::new(),
                submissions: Vec::new(),
                identity_lookups: 0,
                confirmation_waits: 0,
                fail_next_submission: None,
                revert_next_submission: false,
            })),
            held: Arc::new(held),
        }
    }

    /// Local development chain (chain id 31337).
    pub fn hardhat() -> Self {
        Self::new(NetworkIdentity::new(31337, "hardhat"))
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept an operation and return its id. Used by the simulated
    /// factory and proxy deployer.
    pub fn submit(
        &self,
        contract: &str,
        args: &[Value],
        proxy: Option<ProxyOptions>,
    ) -> Result<PendingUnit, DeployError> {
        self.accept(contract, args, proxy, None)
    }

    /// Accept an upgrade of the proxy at `target`.
    pub fn submit_upgrade(
        &self,
        contract: &str,
        target: &Address,
        options: ProxyOptions,
    ) -> Result<PendingUnit, DeployError> {
        self.accept(contract, &[], Some(options), Some(target.clone()))
    }

    fn accept(
        &self,
        contract: &str,
        args: &[Value],
        proxy: Option<ProxyOptions>,
        upgrades: Option<Address>,
    ) -> Result<PendingUnit, DeployError> {
        let mut state = self.lock();
        if let Some(reason) = state.fail_next_submission.take() {
            return Err(DeployError::SubmissionFailed(reason));
        }

        state.nonce += 1;
        let chain_id = state.network.chain_id;
        let nonce = state.nonce;
        let operation_id = OperationId::new(format!("0x{chain_id:016x}{nonce:048x}"));
        let address = Address::new(format!("0x{chain_id:08x}{nonce:032x}"));
        let reverted = std::mem::take(&mut state.revert_next_submission);

        state.operations.insert(
            operation_id.clone(),
            SimulatedOperation {
                address,
                reverted,
                block_number: nonce,
            },
        );
        state.submissions.push(Submission {
            operation_id: operation_id.clone(),
            contract: contract.to_string(),
            args: args.to_vec(),
            proxy,
            upgrades,
        });
        Ok(PendingUnit::new(operation_id))
    }

    /// Make the next submission fail before an id is issued.
    pub fn fail_next_submission(&self, reason: impl Into<String>) {
        self.lock().fail_next_submission = Some(reason.into());
    }

    /// Make the next submission be accepted and then revert.
    pub fn revert_next_submission(&self) {
        self.lock().revert_next_submission = true;
    }

    /// Stop confirming operations until [`Self::release_confirmations`].
    pub fn hold_confirmations(&self) {
        self.held.send_replace(true);
    }

    pub fn release_confirmations(&self) {
        self.held.send_replace(false);
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().submissions.clone()
    }

    pub fn submission_count(&self) -> usize {
        self.lock().submissions.len()
    }

    pub fn identity_lookups(&self) -> usize {
        self.lock().identity_lookups
    }

    /// How many times `await_operation` was entered.
    pub fn confirmation_waits(&self) -> usize {
        self.lock().confirmation_waits
    }

    /// The address an operation will resolve to.
    pub fn address_of(&self, operation_id: &OperationId) -> Option<Address> {
        self.lock()
            .operations
            .get(operation_id)
            .map(|op| op.address.clone())
    }
}

impl Ledger for SimulatedLedger {
    async fn network_identity(&self) -> Result<NetworkIdentity, DeployError> {
        let mut state = self.lock();
        state.identity_lookups += 1;
        Ok(state.network.clone())
    }

    async fn await_operation(&self, operation_id: &OperationId) -> Result<Receipt, DeployError> {
        self.lock().confirmation_waits += 1;

        let mut held = self.held.subscribe();
        held.wait_for(|held| !*held).await.map_err(|e| {
            DeployError::ConfirmationFailed {
                operation_id: operation_id.clone(),
                reason: format!("ledger went away: {e}"),
            }
        })?;

        let state = self.lock();
        let op = state.operations.get(operation_id).ok_or_else(|| {
            DeployError::ConfirmationFailed {
                operation_id: operation_id.clone(),
                reason: "unknown operation".into(),
            }
        })?;
        Ok(Receipt {
            operation_id: operation_id.clone(),
            contract_address: Some(op.address.clone()),
            success: !op.reverted,
            block_number: op.block_number,
        })
    }
}

/// Handle returned for simulated deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedContract {
    pub contract: String,
    pub address: Address,
}

/// Factory that submits to a [`SimulatedLedger`].
#[derive(Debug, Clone)]
pub struct SimulatedDeployable {
    ledger: SimulatedLedger,
    contract: String,
}

impl SimulatedDeployable {
    pub fn new(ledger: &SimulatedLedger, contract: impl Into<String>) -> Self {
        Self {
            ledger: ledger.clone(),
            contract: contract.into(),
        }
    }
}

impl Deployable for SimulatedDeployable {
    type Handle = SimulatedContract;

    fn contract_name(&self) -> &str {
        &self.contract
    }

    async fn submit(&self, args: &[Value]) -> Result<PendingUnit, DeployError> {
        self.ledger.submit(&self.contract, args, None)
    }

    fn attach(&self, address: Address) -> SimulatedContract {
        SimulatedContract {
            contract: self.contract.clone(),
            address,
        }
    }
}

/// Proxy deployer that records the proxy options on the submission.
#[derive(Debug, Clone)]
pub struct SimulatedProxyDeployer {
    ledger: SimulatedLedger,
}

impl SimulatedProxyDeployer {
    pub fn new(ledger: &SimulatedLedger) -> Self {
        Self {
            ledger: ledger.clone(),
        }
    }
}

impl ProxyDeployer for SimulatedProxyDeployer {
    async fn deploy_proxy<D: Deployable>(
        &self,
        factory: &D,
        args: &[Value],
        options: &ProxyOptions,
    ) -> Result<PendingUnit, DeployError> {
        self.ledger
            .submit(factory.contract_name(), args, Some(options.clone()))
    }

    async fn upgrade_proxy<D: Deployable>(
        &self,
        proxy: &Address,
        factory: &D,
        options: &ProxyOptions,
    ) -> Result<PendingUnit, DeployError> {
        self.ledger
            .submit_upgrade(factory.contract_name(), proxy, options.clone())
    }
}

/// Confirmation gate that gives a fixed answer and remembers every question.
#[derive(Debug, Clone)]
pub struct RecordingConfirm {
    answer: bool,
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingConfirm {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Confirm for RecordingConfirm {
    async fn confirm(&self, message: &str) -> Result<bool, DeployError> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
        Ok(self.answer)
    }
}
