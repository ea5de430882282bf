//! Collaborator traits.
//!
//! The orchestrator is pure logic. It doesn't know about RPC transports,
//! ABIs, signing keys, or terminals. You bring those in by implementing
//! these traits.

use crate::error::DeployError;
use crate::options::ProxyOptions;
use crate::store::KeyValueStore;
use crate::types::{Address, NetworkIdentity, OperationId, PendingUnit, Receipt};
use serde_json::Value;
use std::future::Future;

/// Connection to the ledger.
pub trait Ledger: Send + Sync {
    /// Identify the network this connection talks to.
    fn network_identity(
        &self,
    ) -> impl Future<Output = Result<NetworkIdentity, DeployError>> + Send;

    /// Look up an operation and wait until the ledger confirms it.
    ///
    /// Must return promptly if the operation was confirmed earlier.
    /// No timeout is imposed by the orchestrator.
    fn await_operation(
        &self,
        operation_id: &OperationId,
    ) -> impl Future<Output = Result<Receipt, DeployError>> + Send;
}

/// A factory for one kind of installable unit.
pub trait Deployable: Send + Sync {
    /// What the caller gets back: a client bound to a deployed address.
    type Handle: Send;

    /// Contract name, for prompts and logs.
    fn contract_name(&self) -> &str;

    /// Submit a direct instantiation. Returns once the ledger has accepted it.
    fn submit(
        &self,
        args: &[Value],
    ) -> impl Future<Output = Result<PendingUnit, DeployError>> + Send;

    /// Bind to an already-deployed address with this factory's interface.
    fn attach(&self, address: Address) -> Self::Handle;
}

/// Routine that installs a deployable behind an upgradeable proxy.
pub trait ProxyDeployer: Send + Sync {
    fn deploy_proxy<D: Deployable>(
        &self,
        factory: &D,
        args: &[Value],
        options: &ProxyOptions,
    ) -> impl Future<Output = Result<PendingUnit, DeployError>> + Send;

    /// Point the proxy at `proxy` to a new implementation built by `factory`.
    /// The proxy address does not change.
    fn upgrade_proxy<D: Deployable>(
        &self,
        proxy: &Address,
        factory: &D,
        options: &ProxyOptions,
    ) -> impl Future<Output = Result<PendingUnit, DeployError>> + Send;
}

/// Proxy deployer for setups that never install proxies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProxy;

impl ProxyDeployer for NoProxy {
    async fn deploy_proxy<D: Deployable>(
        &self,
        factory: &D,
        _args: &[Value],
        options: &ProxyOptions,
    ) -> Result<PendingUnit, DeployError> {
        Err(DeployError::SubmissionFailed(format!(
            "proxy deployment not configured ({} proxy for {})",
            options.kind,
            factory.contract_name()
        )))
    }

    async fn upgrade_proxy<D: Deployable>(
        &self,
        proxy: &Address,
        factory: &D,
        _options: &ProxyOptions,
    ) -> Result<PendingUnit, DeployError> {
        Err(DeployError::SubmissionFailed(format!(
            "proxy upgrade not configured ({} at {})",
            factory.contract_name(),
            proxy
        )))
    }
}

/// Human-in-the-loop gate.
pub trait Confirm: Send + Sync {
    /// `Ok(false)` means the human said no. `Err` means asking failed.
    fn confirm(&self, message: &str) -> impl Future<Output = Result<bool, DeployError>> + Send;
}

/// Where the cache for a given network lives.
///
/// Different networks must map to different stores.
pub trait CacheLocation: Send + Sync {
    type Store: KeyValueStore;

    fn open(
        &self,
        network: &NetworkIdentity,
    ) -> impl Future<Output = Result<Self::Store, DeployError>> + Send;
}
