//! Hot-reloadable configuration (§4.6).
//!
//! Generalizes the teacher's `GameConfig.json` (a flat `name -> max_players`
//! map for its demo games) into a set of named table templates: a ruleset a
//! `create_game` command can pick by name, carrying the max seat count and
//! whether spectators are welcome. Reloadable without a restart through the
//! `/reload` route, exactly like the teacher's `reload_config`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::registry::AppState;

/// One named ruleset a `create_game` command can reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableTemplate {
    pub name: String,
    pub max_players: i32,
    pub spectators_allowed: bool,
}

type TemplateList = Vec<TableTemplate>;

/// Reloads `TableTemplates.json`, replacing the whole known-templates map —
/// same all-or-nothing replace as the teacher's `reload_config`.
pub async fn reload_config(state: &Arc<AppState>) -> Result<(), String> {
    let json_content = fs::read_to_string("TableTemplates.json")
        .await
        .map_err(|e| format!("Failed to read file: {e}"))?;
    let raw: TemplateList = serde_json::from_str(&json_content).map_err(|e| format!("Failed to parse JSON: {e}"))?;
    let new_templates: HashMap<String, TableTemplate> = raw.into_iter().map(|t| (t.name.clone(), t)).collect();

    let mut templates = state.table_templates.write().await;
    *templates = new_templates;
    Ok(())
}

/// Process-wide settings read from the environment with a hardcoded
/// fallback, the same shape the teacher uses for its `RUST_LOG` default
/// (`EnvFilter::try_from_default_env().unwrap_or_else(...)`).
pub struct EnvConfig {
    pub bind_addr: String,
    pub deck_dir: String,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        EnvConfig {
            bind_addr: std::env::var("CARD_SERVER_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            deck_dir: std::env::var("CARD_SERVER_DECK_DIR").unwrap_or_else(|_| "./decks".to_string()),
        }
    }
}
