//! Interactive migration example.
//!
//! Runs a two-contract migration against a simulated local chain, asking
//! for confirmation on the terminal before each first deployment. Run it
//! twice: the second run finds everything in the cache and asks nothing.
//!
//! Usage:
//!   cargo run --example migrate --features test-utils,interactive
//!
//! Environment:
//!   MIGRATE_CACHE_DIR   - where `.cache-<chain id>.json` lives (default: .)
//!   MIGRATE_ASSUME_YES  - skip all prompts (default: false)
//!   MIGRATE_NO_CACHE    - redeploy everything from scratch (default: false)
//!   RUST_LOG            - log filter (default: info)

use anyhow::Context;
use ledger_migrate::testing::{SimulatedDeployable, SimulatedLedger, SimulatedProxyDeployer};
use ledger_migrate::{
    CacheDir, DeployOptions, DeployOutcome, Orchestrator, OrchestratorConfig, ProxyKind,
    TerminalConfirm,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = OrchestratorConfig::from_env().context("reading configuration")?;
    let no_cache = matches!(
        std::env::var("MIGRATE_NO_CACHE").as_deref(),
        Ok("1") | Ok("true")
    );

    let ledger = SimulatedLedger::hardhat();
    let orchestrator = Orchestrator::new(
        ledger.clone(),
        CacheDir::from_config(&config),
        TerminalConfirm::default(),
        config,
    )
    .with_proxy_deployer(SimulatedProxyDeployer::new(&ledger));

    let network = orchestrator.network().await?;
    println!("network: {} (chain id {})", network.name, network.chain_id);

    let mut base = DeployOptions::new();
    if no_cache {
        base = base.no_cache();
    }

    let token = SimulatedDeployable::new(&ledger, "ERC20Mock");
    let token_address = match orchestrator
        .deploy("token", &token, &[json!("Name"), json!("SYM")], &base)
        .await?
    {
        DeployOutcome::Deployed { address, .. } => address,
        DeployOutcome::Declined => {
            println!("token not deployed, stopping");
            return Ok(());
        }
    };
    println!("token:   {token_address}");

    let governor = SimulatedDeployable::new(&ledger, "Governor");
    let outcome = orchestrator
        .deploy(
            "governor",
            &governor,
            &[json!(token_address.as_str())],
            &base
                .clone()
                .with_proxy(ProxyKind::Uups)
                .with_extra("initializer", "initialize"),
        )
        .await?;
    match outcome.address() {
        Some(address) => println!("governor: {address}"),
        None => println!("governor not deployed"),
    }

    println!();
    for record in orchestrator.records().await? {
        println!("  {:<10} {}", record.name, record.state().name());
    }
    println!("submissions this run: {}", ledger.submission_count());

    Ok(())
}
