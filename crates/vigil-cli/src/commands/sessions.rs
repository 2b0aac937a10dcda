//! Sessions command — inspect and edit the persisted session store.
//!
//! Supplements the bootstrap-from-store model with the operator tooling
//! a real deployment needs to actually populate that store.

use std::path::Path;

use anyhow::{Context, Result};
use vigil_store::SessionStore;

async fn open_store(config_path: &Path) -> Result<SessionStore> {
    let effective = vigil_config::load(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    SessionStore::open(
        effective.runtime.session_store_path.clone(),
        effective.session_key,
    )
    .await
    .context("opening session store")
}

pub(crate) async fn list(config_path: &Path) -> Result<()> {
    let store = open_store(config_path).await?;
    let sessions = store.list().await;
    if sessions.is_empty() {
        println!("no sessions");
        return Ok(());
    }
    for session in sessions {
        println!(
            "{}\tuser={}\temail={}",
            session.session_id, session.user_id, session.email
        );
    }
    Ok(())
}

pub(crate) async fn upsert(config_path: &Path, record_path: &Path) -> Result<()> {
    let store = open_store(config_path).await?;
    let raw = std::fs::read_to_string(record_path)
        .with_context(|| format!("reading {}", record_path.display()))?;
    let record = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {} as a session record", record_path.display()))?;
    store.upsert(record).await.context("upserting session")?;
    println!("session upserted");
    Ok(())
}

pub(crate) async fn delete(config_path: &Path, session_id: &str) -> Result<()> {
    let store = open_store(config_path).await?;
    let id: vigil_core::SessionId = session_id.to_string().into();
    store.delete(&id).await.context("deleting session")?;
    println!("session {session_id} deleted");
    Ok(())
}
