//! Minimal domain types for the deployment orchestrator.
//!
//! Addresses and operation ids are opaque strings as far as the
//! orchestrator is concerned. The ledger client decides their format.

use crate::error::DeployError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolved on-ledger location of an installed unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a submitted operation (a transaction hash on EVM chains).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The network a ledger connection points at. Only `chain_id` scopes the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIdentity {
    pub chain_id: u64,
    pub name: String,
}

impl NetworkIdentity {
    pub fn new(chain_id: u64, name: impl Into<String>) -> Self {
        Self {
            chain_id,
            name: name.into(),
        }
    }
}

/// An operation that was accepted by the ledger but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUnit {
    pub operation_id: OperationId,
}

impl PendingUnit {
    pub fn new(operation_id: OperationId) -> Self {
        Self { operation_id }
    }
}

/// Confirmation receipt for an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub operation_id: OperationId,
    /// Address created by the operation, if it created one.
    pub contract_address: Option<Address>,
    /// False when the operation executed and reverted.
    pub success: bool,
    pub block_number: u64,
}

impl Receipt {
    /// The address this receipt resolves to.
    ///
    /// A reverted operation, or one that created nothing, is a
    /// confirmation failure for the purposes of deployment.
    pub fn resolved_address(&self) -> Result<Address, DeployError> {
        self.ensure_success()?;
        self.contract_address
            .clone()
            .ok_or_else(|| DeployError::ConfirmationFailed {
                operation_id: self.operation_id.clone(),
                reason: "receipt carries no contract address".into(),
            })
    }

    /// `ConfirmationFailed` if the operation reverted.
    pub fn ensure_success(&self) -> Result<(), DeployError> {
        if self.success {
            return Ok(());
        }
        Err(DeployError::ConfirmationFailed {
            operation_id: self.operation_id.clone(),
            reason: format!("reverted in block {}", self.block_number),
        })
    }
}

/// Upgradeable-proxy patterns understood by proxy deployers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    Transparent,
    Uups,
    Beacon,
}

impl ProxyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyKind::Transparent => "transparent",
            ProxyKind::Uups => "uups",
            ProxyKind::Beacon => "beacon",
        }
    }
}

impl fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
