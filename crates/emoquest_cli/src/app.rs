//! Dependency wiring and subcommand execution.

use crate::Command;
use anyhow::{Context, Result};
use emoquest_core::{EmoquestConfig, HistoryView, QuestEngine};
use emoquest_gateway::GatewayServer;
use emoquest_memory::SqliteStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Build the engine from config: SQLite store + configured classifier.
pub async fn build_engine(config: &EmoquestConfig) -> Result<Arc<QuestEngine>> {
    info!("Opening progress store at {}...", config.storage.db_path);
    let store = Arc::new(
        SqliteStore::new(&config.storage.db_path)
            .await
            .context("Failed to open progress store")?,
    );
    let classifier = emoquest_classifier::from_config(&config.classifier)?;
    let engine = QuestEngine::new(classifier, store).with_view_builder(config.history.builder());
    Ok(Arc::new(engine))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run(mut config: EmoquestConfig, command: Command) -> Result<()> {
    if let Command::Serve { host, port } = &command {
        if let Some(h) = host {
            config.gateway.host = h.clone();
        }
        if let Some(p) = port {
            config.gateway.port = *p;
        }
    }

    let engine = build_engine(&config).await?;

    match command {
        Command::Serve { .. } => {
            let server = GatewayServer::new(engine, &config.gateway.host, config.gateway.port);
            let handle = server.start().await?;
            tokio::select! {
                res = handle => res.context("Gateway task panicked")?,
                _ = tokio::signal::ctrl_c() => info!("Shutting down"),
            }
        }
        Command::Analyze { user, text } => {
            let text = text.join(" ");
            let response = engine.handle_analyze(&user, &text).await?;
            print_json(&response)?;
        }
        Command::History { user } => match engine.handle_history_view(&user).await? {
            HistoryView::Blocked => {
                println!(
                    "Not enough history for {} yet (need at least {} entries).",
                    user, config.history.min_entries
                );
            }
            view => print_json(&view)?,
        },
        Command::Status { user } => match engine.status(&user).await? {
            Some(record) => print_json(&record)?,
            None => println!("No progress data for {}.", user),
        },
        Command::Quests { user } => {
            print_json(&engine.quest_history(&user).await?)?;
        }
        Command::Init { user } => {
            print_json(&engine.init_user(&user).await?)?;
        }
    }

    Ok(())
}
