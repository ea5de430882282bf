//! Error types for the deployment orchestrator.
//!
//! No `anyhow` leakage. Explicit, typed errors. A declined confirmation is
//! not in here on purpose: see [`crate::DeployOutcome::Declined`].

use crate::types::OperationId;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The ledger refused the submission before returning an operation id.
    /// Nothing was persisted.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    /// The operation was accepted but reverted or never resolved an address.
    /// The pending record stays in the cache.
    #[error("operation {operation_id} failed to confirm: {reason}")]
    ConfirmationFailed {
        operation_id: OperationId,
        reason: String,
    },

    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("network identity lookup failed: {0}")]
    NetworkIdentity(String),

    #[error("confirmation prompt failed: {0}")]
    Prompt(String),

    #[error("invalid deployment name {0:?}: must be non-empty and contain no '.'")]
    InvalidName(String),

    /// Upgrades need a confirmed proxy address in the cache.
    #[error("{0:?} has no confirmed deployment to upgrade")]
    NotDeployed(String),

    #[error("corrupt cache entry {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DeployError {
    /// Whether re-invoking `deploy` with the same arguments might succeed.
    ///
    /// A failed confirmation is not recoverable this way: the same operation
    /// id is resolved again until the record is cleared with `no_cache`.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DeployError::SubmissionFailed(_) | DeployError::NetworkIdentity(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeployError::SubmissionFailed("nonce too low".to_string());
        assert_eq!(err.to_string(), "submission failed: nonce too low");

        let err = DeployError::ConfirmationFailed {
            operation_id: OperationId::new("0xabc"),
            reason: "reverted".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operation 0xabc failed to confirm: reverted"
        );

        let err = DeployError::CacheUnavailable("disk full".to_string());
        assert_eq!(err.to_string(), "cache unavailable: disk full");

        let err = DeployError::InvalidName("a.b".to_string());
        assert!(err.to_string().contains("\"a.b\""));

        let err = DeployError::NotDeployed("vault".to_string());
        assert_eq!(
            err.to_string(),
            "\"vault\" has no confirmed deployment to upgrade"
        );

        let err = DeployError::CorruptRecord {
            key: "token.address".to_string(),
            reason: "expected string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "corrupt cache entry token.address: expected string"
        );
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(DeployError::SubmissionFailed("x".into()).is_recoverable());
        assert!(DeployError::NetworkIdentity("x".into()).is_recoverable());

        assert!(!DeployError::ConfirmationFailed {
            operation_id: OperationId::new("0x1"),
            reason: "reverted".into(),
        }
        .is_recoverable());
        assert!(!DeployError::CacheUnavailable("x".into()).is_recoverable());
        assert!(!DeployError::Prompt("x".into()).is_recoverable());
        assert!(!DeployError::InvalidName("".into()).is_recoverable());
        assert!(!DeployError::Config("x".into()).is_recoverable());
        assert!(!DeployError::NotDeployed("x".into()).is_recoverable());
    }
}
