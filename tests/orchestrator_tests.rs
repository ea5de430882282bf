//! End-to-end tests against the file-backed cache.
//!
//! A "restart" is a fresh orchestrator pointed at the same cache directory,
//! which is all a new process would share with the old one.

#![cfg(all(feature = "test-utils", feature = "file-storage"))]

use ledger_migrate::testing::{RecordingConfirm, SimulatedDeployable, SimulatedLedger};
use ledger_migrate::{
    AutoConfirm, CacheDir, Confirm, DeployError, DeployOptions, NetworkIdentity, Orchestrator,
    OrchestratorConfig, RecordState,
};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;

fn orchestrator<P: Confirm>(
    ledger: &SimulatedLedger,
    dir: &Path,
    confirm: P,
) -> Orchestrator<SimulatedLedger, CacheDir, P> {
    let config = OrchestratorConfig::default().with_cache_dir(dir);
    Orchestrator::new(ledger.clone(), CacheDir::from_config(&config), confirm, config)
}

fn read_cache(dir: &Path, chain_id: u64) -> Value {
    let path = dir.join(format!(".cache-{chain_id}.json"));
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn token_args() -> Vec<Value> {
    vec![json!("Name"), json!("SYM")]
}

// ═══════════════════════════════════════════════════════════════════
// IDEMPOTENCE
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_token_scenario_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = SimulatedLedger::hardhat();
    let token = SimulatedDeployable::new(&ledger, "ERC20Mock");

    let first = orchestrator(&ledger, dir.path(), AutoConfirm::no())
        .deploy(
            "token",
            &token,
            &token_args(),
            &DeployOptions::new().no_cache().no_confirm(),
        )
        .await
        .unwrap();
    let address = first.address().cloned().unwrap();

    let cache = read_cache(dir.path(), 31337);
    assert_eq!(cache["token"]["address"], json!(address.as_str()));
    assert_eq!(
        cache["token"]["txHash"],
        json!(ledger.submissions()[0].operation_id.as_str())
    );

    // Second run, new process: same address, nothing submitted.
    let second = orchestrator(&ledger, dir.path(), AutoConfirm::no())
        .deploy("token", &token, &token_args(), &DeployOptions::new().no_confirm())
        .await
        .unwrap();
    assert_eq!(second.address(), Some(&address));
    assert_eq!(ledger.submission_count(), 1);
    assert_eq!(ledger.confirmation_waits(), 1);
}

#[tokio::test]
async fn test_cached_address_never_prompts_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = SimulatedLedger::hardhat();
    let token = SimulatedDeployable::new(&ledger, "ERC20Mock");

    orchestrator(&ledger, dir.path(), AutoConfirm::yes())
        .deploy("token", &token, &token_args(), &DeployOptions::new())
        .await
        .unwrap();

    // A gate that would refuse is never asked.
    let confirm = RecordingConfirm::new(false);
    let outcome = orchestrator(&ledger, dir.path(), confirm.clone())
        .deploy("token", &token, &token_args(), &DeployOptions::new())
        .await
        .unwrap();
    assert!(!outcome.is_declined());
    assert!(confirm.messages().is_empty());
}

// ═══════════════════════════════════════════════════════════════════
// RESUME AFTER INTERRUPTION
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_resume_after_crash_during_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = SimulatedLedger::hardhat();
    let token = SimulatedDeployable::new(&ledger, "ERC20Mock");
    let opts = DeployOptions::new().no_confirm();

    // First run: submission goes out, confirmation never arrives, and the
    // run is killed mid-wait.
    ledger.hold_confirmations();
    {
        let crashed = orchestrator(&ledger, dir.path(), AutoConfirm::yes());
        let result = tokio::time::timeout(
            Duration::from_millis(50),
            crashed.deploy("token", &token, &token_args(), &opts),
        )
        .await;
        assert!(result.is_err(), "deploy should still be waiting");
    }
    assert_eq!(ledger.submission_count(), 1);
    let submitted = ledger.submissions()[0].operation_id.clone();

    let cache = read_cache(dir.path(), 31337);
    assert_eq!(cache["token"]["txHash"], json!(submitted.as_str()));
    assert!(cache["token"].get("address").is_none());

    // Second run: the chain has caught up.
    ledger.release_confirmations();
    let resumed = orchestrator(&ledger, dir.path(), AutoConfirm::yes());
    assert_eq!(
        resumed.record("token").await.unwrap().state(),
        RecordState::Pending(submitted.clone())
    );

    let outcome = resumed
        .deploy("token", &token, &token_args(), &opts)
        .await
        .unwrap();

    assert_eq!(ledger.submission_count(), 1, "must not resubmit");
    assert_eq!(outcome.address().cloned(), ledger.address_of(&submitted));
    assert_eq!(
        read_cache(dir.path(), 31337)["token"]["address"],
        json!(outcome.address().unwrap().as_str())
    );
}

#[tokio::test]
async fn test_confirmation_failure_persists_until_reset() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = SimulatedLedger::hardhat();
    let token = SimulatedDeployable::new(&ledger, "ERC20Mock");
    let opts = DeployOptions::new().no_confirm();

    ledger.revert_next_submission();
    let err = orchestrator(&ledger, dir.path(), AutoConfirm::yes())
        .deploy("token", &token, &token_args(), &opts)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::ConfirmationFailed { .. }));

    // Still failing after a restart: the pending record is intact.
    let err = orchestrator(&ledger, dir.path(), AutoConfirm::yes())
        .deploy("token", &token, &token_args(), &opts)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::ConfirmationFailed { .. }));
    assert_eq!(ledger.submission_count(), 1);

    let outcome = orchestrator(&ledger, dir.path(), AutoConfirm::yes())
        .deploy("token", &token, &token_args(), &opts.clone().no_cache())
        .await
        .unwrap();
    assert!(outcome.address().is_some());
    assert_eq!(ledger.submission_count(), 2);
}

// ═══════════════════════════════════════════════════════════════════
// NETWORK ISOLATION
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_networks_do_not_share_records() {
    let dir = tempfile::tempdir().unwrap();
    let mainnet = SimulatedLedger::new(NetworkIdentity::new(1, "mainnet"));
    let sepolia = SimulatedLedger::new(NetworkIdentity::new(11155111, "sepolia"));
    let opts = DeployOptions::new().no_confirm();

    let on_mainnet = orchestrator(&mainnet, dir.path(), AutoConfirm::yes())
        .deploy(
            "token",
            &SimulatedDeployable::new(&mainnet, "ERC20Mock"),
            &token_args(),
            &opts,
        )
        .await
        .unwrap();
    let on_sepolia = orchestrator(&sepolia, dir.path(), AutoConfirm::yes())
        .deploy(
            "token",
            &SimulatedDeployable::new(&sepolia, "ERC20Mock"),
            &token_args(),
            &opts,
        )
        .await
        .unwrap();

    assert_eq!(mainnet.submission_count(), 1);
    assert_eq!(sepolia.submission_count(), 1);
    assert_ne!(on_mainnet.address(), on_sepolia.address());

    assert_eq!(
        read_cache(dir.path(), 1)["token"]["address"],
        json!(on_mainnet.address().unwrap().as_str())
    );
    assert_eq!(
        read_cache(dir.path(), 11155111)["token"]["address"],
        json!(on_sepolia.address().unwrap().as_str())
    );
}

// ═══════════════════════════════════════════════════════════════════
// CACHE FAILURES
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_corrupt_cache_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".cache-31337.json"), "{ truncated").unwrap();

    let ledger = SimulatedLedger::hardhat();
    let token = SimulatedDeployable::new(&ledger, "ERC20Mock");
    let err = orchestrator(&ledger, dir.path(), AutoConfirm::yes())
        .deploy("token", &token, &token_args(), &DeployOptions::new().no_confirm())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::CacheUnavailable(_)));
    assert_eq!(ledger.submission_count(), 0);
}

#[tokio::test]
async fn test_other_layout_is_refused_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".cache-31337.json");
    let seeded = r#"{"token":"0xlegacyaddress","token-pending":"0xlegacytx"}"#;
    std::fs::write(&path, seeded).unwrap();

    let ledger = SimulatedLedger::hardhat();
    let token = SimulatedDeployable::new(&ledger, "ERC20Mock");
    let err = orchestrator(&ledger, dir.path(), AutoConfirm::yes())
        .deploy("token", &token, &token_args(), &DeployOptions::new().no_confirm())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::CorruptRecord { ref key, .. } if key == "token"));
    assert_eq!(ledger.submission_count(), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), seeded);
}

#[tokio::test]
async fn test_declined_leaves_no_cache_file() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = SimulatedLedger::hardhat();
    let token = SimulatedDeployable::new(&ledger, "ERC20Mock");

    let outcome = orchestrator(&ledger, dir.path(), AutoConfirm::no())
        .deploy("token", &token, &token_args(), &DeployOptions::new())
        .await
        .unwrap();

    assert!(outcome.is_declined());
    assert!(!dir.path().join(".cache-31337.json").exists());
}
