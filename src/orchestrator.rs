//! Deployment orchestrator.
//!
//! Reconciles "deploy `name`" against what the per-network cache says has
//! already happened. Each name moves through three states:
//!
//! ```text
//! Absent ──submit──▶ Pending ──confirm──▶ Done
//!    ▲                  │                   │
//!    └──── no_cache / forget ◀──────────────┘
//! ```
//!
//! The operation id is written *before* waiting for confirmation, so a run
//! that dies mid-wait resumes the same operation instead of submitting a
//! second one.

use crate::config::OrchestratorConfig;
use crate::error::DeployError;
use crate::options::{DeployOptions, ProxyOptions};
use crate::prompt::deploy_message;
use crate::record::{address_key, pending_key, validate_name, DeploymentRecord, RecordState};
use crate::store::KeyValueStore;
use crate::traits::{CacheLocation, Confirm, Deployable, Ledger, NoProxy, ProxyDeployer};
use crate::types::{Address, NetworkIdentity, OperationId, PendingUnit};
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};

/// Result of a `deploy` call that didn't error.
#[derive(Debug)]
pub enum DeployOutcome<H> {
    /// Deployed now or earlier; `handle` is bound to `address`.
    Deployed { handle: H, address: Address },
    /// The confirmation gate said no. Nothing was submitted or cached.
    Declined,
}

impl<H> DeployOutcome<H> {
    pub fn is_declined(&self) -> bool {
        matches!(self, DeployOutcome::Declined)
    }

    pub fn address(&self) -> Option<&Address> {
        match self {
            DeployOutcome::Deployed { address, .. } => Some(address),
            DeployOutcome::Declined => None,
        }
    }

    pub fn into_handle(self) -> Option<H> {
        match self {
            DeployOutcome::Deployed { handle, .. } => Some(handle),
            DeployOutcome::Declined => None,
        }
    }
}

/// Network identity and its cache, resolved together on first use.
struct Scope<S> {
    network: NetworkIdentity,
    store: Mutex<S>,
}

/// The deployment orchestrator.
///
/// Parameterized by its collaborators. Safe to share between concurrent
/// deploys of *different* names; deploys of the same name must be
/// serialized by the caller.
pub struct Orchestrator<L, C, P, X = NoProxy>
where
    C: CacheLocation,
{
    ledger: L,
    location: C,
    confirm: P,
    proxy: X,
    config: OrchestratorConfig,
    scope: OnceCell<Scope<C::Store>>,
}

impl<L, C, P> Orchestrator<L, C, P, NoProxy>
where
    L: Ledger,
    C: CacheLocation,
    P: Confirm,
{
    /// Create an orchestrator without proxy support.
    pub fn new(ledger: L, location: C, confirm: P, config: OrchestratorConfig) -> Self {
        Self {
            ledger,
            location,
            confirm,
            proxy: NoProxy,
            config,
            scope: OnceCell::new(),
        }
    }
}

impl<L, C, P, X> Orchestrator<L, C, P, X>
where
    L: Ledger,
    C: CacheLocation,
    P: Confirm,
    X: ProxyDeployer,
{
    /// Swap in a proxy deployer, enabling [`DeployOptions::proxy`].
    pub fn with_proxy_deployer<Y: ProxyDeployer>(self, proxy: Y) -> Orchestrator<L, C, P, Y> {
        Orchestrator {
            ledger: self.ledger,
            location: self.location,
            confirm: self.confirm,
            proxy,
            config: self.config,
            scope: self.scope,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// The network this orchestrator deploys to. Looked up once.
    pub async fn network(&self) -> Result<NetworkIdentity, DeployError> {
        Ok(self.scope().await?.network.clone())
    }

    /// Resolve network and cache exactly once. Concurrent first callers
    /// wait on the same initialization, so they can't end up with
    /// different caches.
    async fn scope(&self) -> Result<&Scope<C::Store>, DeployError> {
        self.scope
            .get_or_try_init(|| async {
                let network = self.ledger.network_identity().await?;
                let store = self.location.open(&network).await?;
                tracing::info!(
                    chain_id = network.chain_id,
                    network = %network.name,
                    "deployment cache ready"
                );
                Ok::<_, DeployError>(Scope {
                    network,
                    store: Mutex::new(store),
                })
            })
            .await
    }

    // ═══════════════════════════════════════════════════════════════
    // DEPLOY
    // ═══════════════════════════════════════════════════════════════

    /// Deploy `name` unless the cache says it's already deployed.
    ///
    /// `args` are the constructor (or initializer, for proxies) arguments.
    /// Returns [`DeployOutcome::Declined`] if the confirmation gate says no.
    #[tracing::instrument(skip_all, fields(name = %name, contract = factory.contract_name()))]
    pub async fn deploy<D: Deployable>(
        &self,
        name: &str,
        factory: &D,
        args: &[Value],
        options: &DeployOptions,
    ) -> Result<DeployOutcome<D::Handle>, DeployError> {
        validate_name(name)?;
        let scope = self.scope().await?;

        if options.no_cache {
            self.clear(scope, name).await?;
        }

        if !(options.no_confirm || self.config.assume_yes) {
            let cached = {
                let store = scope.store.lock().await;
                DeploymentRecord::load(&*store, name).await?.address
            };
            if cached.is_none() {
                let message = deploy_message(name, factory.contract_name(), args);
                if !self.confirm.confirm(&message).await? {
                    tracing::warn!("deployment declined");
                    return Ok(DeployOutcome::Declined);
                }
            }
        }

        let address = self
            .resume_or_deploy(scope, name, factory, args, options)
            .await?;

        Ok(DeployOutcome::Deployed {
            handle: factory.attach(address.clone()),
            address,
        })
    }

    async fn resume_or_deploy<D: Deployable>(
        &self,
        scope: &Scope<C::Store>,
        name: &str,
        factory: &D,
        args: &[Value],
        options: &DeployOptions,
    ) -> Result<Address, DeployError> {
        let record = {
            let store = scope.store.lock().await;
            DeploymentRecord::load(&*store, name).await?
        };

        match record.state() {
            RecordState::Done(address) => {
                tracing::debug!(%address, "already deployed");
                Ok(address)
            }
            RecordState::Pending(operation_id) => {
                tracing::info!(%operation_id, "resuming pending deployment");
                self.await_and_record(scope, name, &operation_id).await
            }
            RecordState::Absent => {
                let pending = self.submit(factory, args, options).await?;
                let operation_id = pending.operation_id;
                tracing::info!(%operation_id, "deployment submitted");

                if let Err(e) = self
                    .write(scope, &pending_key(name), operation_id.as_str())
                    .await
                {
                    // On the ledger but unrecorded: a rerun would submit again.
                    tracing::error!(%operation_id, error = %e, "failed to record submitted operation");
                    return Err(e);
                }

                self.await_and_record(scope, name, &operation_id).await
            }
        }
    }

    async fn submit<D: Deployable>(
        &self,
        factory: &D,
        args: &[Value],
        options: &DeployOptions,
    ) -> Result<PendingUnit, DeployError> {
        match options.proxy {
            Some(kind) => {
                let proxy_options = ProxyOptions {
                    kind,
                    extra: options.extra.clone(),
                };
                self.proxy
                    .deploy_proxy(factory, args, &proxy_options)
                    .await
            }
            None => factory.submit(args).await,
        }
    }

    /// Wait for `operation_id` and store the address it resolves to.
    /// On failure the pending record is left as is.
    async fn await_and_record(
        &self,
        scope: &Scope<C::Store>,
        name: &str,
        operation_id: &OperationId,
    ) -> Result<Address, DeployError> {
        let receipt = self.ledger.await_operation(operation_id).await?;
        let address = receipt.resolved_address()?;
        self.write(scope, &address_key(name), address.as_str())
            .await?;
        tracing::info!(%address, block = receipt.block_number, "deployment confirmed");
        Ok(address)
    }

    async fn write(
        &self,
        scope: &Scope<C::Store>,
        key: &str,
        value: &str,
    ) -> Result<(), DeployError> {
        scope
            .store
            .lock()
            .await
            .set(key, Value::String(value.to_string()))
            .await
    }

    async fn clear(&self, scope: &Scope<C::Store>, name: &str) -> Result<bool, DeployError> {
        let mut store = scope.store.lock().await;
        let address = store.delete(&address_key(name)).await?;
        let pending = store.delete(&pending_key(name)).await?;
        if address || pending {
            tracing::info!(name, "cleared cached deployment");
        }
        Ok(address || pending)
    }

    // ═══════════════════════════════════════════════════════════════
    // UPGRADE
    // ═══════════════════════════════════════════════════════════════

    /// Swap the implementation behind the proxy recorded under `name`.
    ///
    /// The cached address is the proxy's and stays as it is. Nothing is
    /// written to the cache, so a failed upgrade can simply be retried.
    #[tracing::instrument(skip_all, fields(name = %name, contract = factory.contract_name()))]
    pub async fn upgrade<D: Deployable>(
        &self,
        name: &str,
        factory: &D,
        options: &ProxyOptions,
    ) -> Result<D::Handle, DeployError> {
        let proxy = match self.record(name).await?.state() {
            RecordState::Done(address) => address,
            RecordState::Pending(_) | RecordState::Absent => {
                return Err(DeployError::NotDeployed(name.to_string()))
            }
        };

        let pending = self.proxy.upgrade_proxy(&proxy, factory, options).await?;
        let operation_id = pending.operation_id;
        tracing::info!(%operation_id, %proxy, "upgrade submitted");

        let receipt = self.ledger.await_operation(&operation_id).await?;
        receipt.ensure_success()?;
        tracing::info!(%proxy, block = receipt.block_number, "upgrade confirmed");

        Ok(factory.attach(proxy))
    }

    // ═══════════════════════════════════════════════════════════════
    // INSPECTION
    // ═══════════════════════════════════════════════════════════════

    /// What the cache knows about `name`. No ledger calls.
    pub async fn record(&self, name: &str) -> Result<DeploymentRecord, DeployError> {
        validate_name(name)?;
        let scope = self.scope().await?;
        let store = scope.store.lock().await;
        DeploymentRecord::load(&*store, name).await
    }

    /// Every record in this network's cache, sorted by name.
    pub async fn records(&self) -> Result<Vec<DeploymentRecord>, DeployError> {
        let scope = self.scope().await?;
        let store = scope.store.lock().await;

        let mut names = store.keys().await?;
        names.sort();

        let mut records = Vec::with_capacity(names.len());
        for name in names {
            records.push(DeploymentRecord::load(&*store, &name).await?);
        }
        Ok(records)
    }

    /// Bind `factory` to the cached address of `name`, if it is deployed.
    pub async fn attach<D: Deployable>(
        &self,
        name: &str,
        factory: &D,
    ) -> Result<Option<D::Handle>, DeployError> {
        match self.record(name).await?.state() {
            RecordState::Done(address) => Ok(Some(factory.attach(address))),
            RecordState::Pending(_) | RecordState::Absent => Ok(None),
        }
    }

    /// Drop both cached fields for `name`. The next deploy submits afresh.
    /// Returns `true` if anything was cached.
    pub async fn forget(&self, name: &str) -> Result<bool, DeployError> {
        validate_name(name)?;
        let scope = self.scope().await?;
        self.clear(scope, name).await
    }
}
