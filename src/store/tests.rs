use super::*;
use serde_json::{json, Value};

/// Behaviour every store must share, run against each implementation.
async fn exercise_contract<S: KeyValueStore>(store: &mut S) {
    assert_eq!(store.get("token.address").await.unwrap(), None);
    assert!(!store.delete("token.address").await.unwrap());

    // Last write wins, no merge.
    store.set("token.address", json!("0x1")).await.unwrap();
    store.set("token.address", json!("0x2")).await.unwrap();
    assert_eq!(store.get("token.address").await.unwrap(), Some(json!("0x2")));

    // Arbitrary JSON values are allowed.
    store
        .set("token.meta", json!({ "args": ["Name", "SYM"] }))
        .await
        .unwrap();
    assert_eq!(
        store.get("token.meta.args").await.unwrap(),
        Some(json!(["Name", "SYM"]))
    );

    store.set("vault.txHash", json!("0xaa")).await.unwrap();
    let mut keys = store.keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["token".to_string(), "vault".to_string()]);

    assert!(store.delete("vault.txHash").await.unwrap());
    assert_eq!(store.keys().await.unwrap(), vec!["token".to_string()]);
    assert_eq!(store.get("vault").await.unwrap(), None::<Value>);
}

#[tokio::test]
async fn test_memory_store_contract() {
    let mut store = MemoryStore::new();
    exercise_contract(&mut store).await;
}

#[cfg(feature = "file-storage")]
#[tokio::test]
async fn test_file_store_contract() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path().join(".cache-1.json"))
        .await
        .unwrap();
    exercise_contract(&mut store).await;
}
