//! End-to-end walkthrough: share a record, consume it, then revoke it.
//!
//! Uses the ledger at `SHAREVAULT_LEDGER_URL` when it answers, otherwise a
//! local SQLite registry at `SHAREVAULT_DB` (default `sharevault.db`).
//! Content goes to the node at `SHAREVAULT_IPFS_API` when set, otherwise to
//! an in-memory store.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use sharevault::registry::{
    select_registry, LedgerConfig, LedgerRegistry, MemoryRegistry, Registry, SqliteRegistry,
};
use sharevault::store::{ContentStore, GatewayConfig, GatewayContentStore, MemoryContentStore};
use sharevault::{ErrorKind, ShareConfig, ShareService};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    let caller = std::env::var("SHAREVAULT_CALLER").unwrap_or_else(|_| "0xDemoOwner".to_string());

    let db = std::env::var("SHAREVAULT_DB").unwrap_or_else(|_| "sharevault.db".to_string());
    let fallback: Arc<dyn Registry> = if db == ":memory:" {
        Arc::new(MemoryRegistry::new(caller.as_str()))
    } else {
        Arc::new(SqliteRegistry::open(&db, caller.as_str()).context("open local registry")?)
    };

    let registry = match std::env::var("SHAREVAULT_LEDGER_URL") {
        Ok(url) => {
            let ledger = LedgerRegistry::new(LedgerConfig::new(url, caller.as_str()))
                .context("configure ledger client")?;
            select_registry(Arc::new(ledger), fallback).await.registry
        }
        Err(_) => fallback,
    };

    let store: Arc<dyn ContentStore> = match std::env::var("SHAREVAULT_IPFS_API") {
        Ok(api) => {
            let gateway = std::env::var("SHAREVAULT_IPFS_GATEWAY").unwrap_or_else(|_| api.clone());
            Arc::new(
                GatewayContentStore::new(GatewayConfig::new(api, gateway))
                    .context("configure content store")?,
            )
        }
        Err(_) => Arc::new(MemoryContentStore::new()),
    };

    let service = ShareService::new(registry, store, ShareConfig::from_env());

    let record = json!({
        "resourceType": "Observation",
        "status": "final",
        "code": "glucose",
        "value": 5.4
    });

    let share = service
        .create_share(&record, 3600, Some("correct horse"))
        .await
        .context("create share")?;
    println!("share url:   {}", share.url);
    println!("content id:  {}", share.content_id);
    println!("gateway url: {}", service.store().gateway_url(&share.content_id));

    let info = service.share_info(&share.id).await?;
    println!(
        "expires at {} (password required: {})",
        info.expiry_time, info.has_password
    );

    match service
        .consume_share::<serde_json::Value>(&share.id, Some("wrong"))
        .await
    {
        Err(e) if e.kind() == ErrorKind::InvalidPassword => println!("wrong password rejected"),
        other => anyhow::bail!("expected InvalidPassword, got {:?}", other),
    }

    let content: serde_json::Value = service
        .consume_share(&share.id, Some("correct horse"))
        .await
        .context("consume share")?;
    println!("received:    {}", content);

    service.revoke_share(&share.id).await?;
    let audit = service.audit(&share.id).await?;
    println!(
        "after revoke: active={} accesses={}",
        audit.is_active, audit.access_count
    );

    Ok(())
}
