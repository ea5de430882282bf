//! Deployment records and the cache key schema.
//!
//! Each logical name owns two keys in its network's cache:
//!
//! ```text
//! <name>.txHash   operation id of the submission, written before confirmation
//! <name>.address  resolved address, written after confirmation
//! ```
//!
//! Address presence is authoritative. A leftover `txHash` next to an
//! address means nothing.

use crate::error::DeployError;
use crate::store::KeyValueStore;
use crate::types::{Address, OperationId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ADDRESS_FIELD: &str = "address";
pub const PENDING_FIELD: &str = "txHash";

pub fn address_key(name: &str) -> String {
    format!("{name}.{ADDRESS_FIELD}")
}

pub fn pending_key(name: &str) -> String {
    format!("{name}.{PENDING_FIELD}")
}

/// Names become the first segment of a dot-path, so they can't contain dots.
pub fn validate_name(name: &str) -> Result<(), DeployError> {
    if name.is_empty() || name.contains('.') {
        return Err(DeployError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Where a name stands, derived from its record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordState {
    /// Never submitted, or explicitly forgotten.
    Absent,
    /// Submitted by some run; outcome not yet recorded.
    Pending(OperationId),
    /// Confirmed. No further network calls for this name.
    Done(Address),
}

impl RecordState {
    pub fn name(&self) -> &'static str {
        match self {
            RecordState::Absent => "absent",
            RecordState::Pending(_) => "pending",
            RecordState::Done(_) => "done",
        }
    }
}

/// Both cached fields for one name on one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub name: String,
    pub address: Option<Address>,
    pub pending_operation_id: Option<OperationId>,
}

impl DeploymentRecord {
    /// Read the record for `name` from `store`.
    ///
    /// The entry under `name` must be an object. Anything else (a bare
    /// address string, say) is reported as corrupt rather than read as absent.
    pub async fn load<S>(store: &S, name: &str) -> Result<Self, DeployError>
    where
        S: KeyValueStore + ?Sized,
    {
        match store.get(name).await? {
            None | Some(Value::Object(_)) => {}
            Some(other) => {
                return Err(DeployError::CorruptRecord {
                    key: name.to_string(),
                    reason: format!("expected an object, found {other}"),
                })
            }
        }

        let address_key = address_key(name);
        let pending_key = pending_key(name);

        let address = read_string(store, &address_key).await?.map(Address::new);
        let pending_operation_id = read_string(store, &pending_key)
            .await?
            .map(OperationId::new);

        Ok(Self {
            name: name.to_string(),
            address,
            pending_operation_id,
        })
    }

    pub fn state(&self) -> RecordState {
        match (&self.address, &self.pending_operation_id) {
            (Some(address), _) => RecordState::Done(address.clone()),
            (None, Some(op)) => RecordState::Pending(op.clone()),
            (None, None) => RecordState::Absent,
        }
    }
}

async fn read_string<S>(store: &S, key: &str) -> Result<Option<String>, DeployError>
where
    S: KeyValueStore + ?Sized,
{
    match store.get(key).await? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(DeployError::CorruptRecord {
            key: key.to_string(),
            reason: format!("expected a string, found {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_keys() {
        assert_eq!(address_key("token"), "token.address");
        assert_eq!(pending_key("token"), "token.txHash");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("token").is_ok());
        assert!(validate_name("governor-v2").is_ok());
        assert!(matches!(validate_name(""), Err(DeployError::InvalidName(_))));
        assert!(matches!(
            validate_name("token.address"),
            Err(DeployError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_load_states() {
        let mut store = MemoryStore::new();

        let record = DeploymentRecord::load(&store, "token").await.unwrap();
        assert_eq!(record.state(), RecordState::Absent);

        store.set("token.txHash", json!("0xaa")).await.unwrap();
        let record = DeploymentRecord::load(&store, "token").await.unwrap();
        assert_eq!(
            record.state(),
            RecordState::Pending(OperationId::new("0xaa"))
        );

        store.set("token.address", json!("0xbb")).await.unwrap();
        let record = DeploymentRecord::load(&store, "token").await.unwrap();
        assert_eq!(record.state(), RecordState::Done(Address::new("0xbb")));
        assert_eq!(record.pending_operation_id, Some(OperationId::new("0xaa")));
    }

    #[tokio::test]
    async fn test_load_rejects_non_string() {
        let mut store = MemoryStore::new();
        store.set("token.address", json!(42)).await.unwrap();

        let err = DeploymentRecord::load(&store, "token").await.unwrap_err();
        match err {
            DeployError::CorruptRecord { key, .. } => assert_eq!(key, "token.address"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_load_rejects_non_object_entry() {
        let mut store = MemoryStore::new();
        store.set("token", json!("0xlegacyaddress")).await.unwrap();
        store.set("token-pending", json!("0xlegacytx")).await.unwrap();

        let err = DeploymentRecord::load(&store, "token").await.unwrap_err();
        assert!(matches!(err, DeployError::CorruptRecord { ref key, .. } if key == "token"));
        let err = DeploymentRecord::load(&store, "token-pending")
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::CorruptRecord { .. }));
    }

    #[tokio::test]
    async fn test_load_treats_null_and_empty_as_missing() {
        let mut store = MemoryStore::new();
        store.set("token.address", Value::Null).await.unwrap();
        store.set("token.txHash", json!("")).await.unwrap();

        let record = DeploymentRecord::load(&store, "token").await.unwrap();
        assert_eq!(record.state(), RecordState::Absent);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(RecordState::Absent.name(), "absent");
        assert_eq!(RecordState::Pending(OperationId::new("x")).name(), "pending");
        assert_eq!(RecordState::Done(Address::new("y")).name(), "done");
    }
}
