//! Server assembly for Siren.
//!
//! Wires the SQLite store, a config-driven permission table, and a static
//! portfolio provider into the [`siren_api`] router. Deployments embedding
//! Siren next to a live project/task store replace [`StaticPortfolio`] with
//! their own [`PortfolioProvider`].

use std::{collections::HashMap, convert::Infallible, path::PathBuf, sync::Arc};

use axum::Router;
use serde::Deserialize;
use siren_api::{ApiContext, ApiSettings};
use siren_core::{
  perms::PermissionLookup,
  summary::{PortfolioCounts, PortfolioProvider},
};
use siren_store_sqlite::SqliteStore;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:        String,
  #[serde(default = "default_port")]
  pub port:        u16,
  #[serde(default = "default_store_path")]
  pub store_path:  PathBuf,
  #[serde(default)]
  pub api:         ApiSettings,
  /// `role -> allowed actions` table; the single entry `"*"` grants a role
  /// every action.
  #[serde(default)]
  pub permissions: HashMap<String, Vec<String>>,
  /// Fixed per-role portfolio counts served to the aggregator. Roles absent
  /// from the table see zero counts.
  #[serde(default)]
  pub portfolio:   HashMap<String, PortfolioCounts>,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("siren.db") }

// ─── Permission table ────────────────────────────────────────────────────────

/// Config-driven [`PermissionLookup`]: a role may perform an action when its
/// entry lists the action or `"*"`. Unknown roles may do nothing.
pub struct ConfigPermissions {
  table: HashMap<String, Vec<String>>,
}

impl ConfigPermissions {
  pub fn new(table: HashMap<String, Vec<String>>) -> Self { Self { table } }
}

impl PermissionLookup for ConfigPermissions {
  async fn has_permission(&self, role: &str, action: &str) -> bool {
    self
      .table
      .get(role)
      .is_some_and(|granted| {
        granted.iter().any(|g| g == action || g == "*")
      })
  }
}

// ─── Portfolio provider ──────────────────────────────────────────────────────

/// Fixed per-role portfolio counts from config.
pub struct StaticPortfolio {
  counts: HashMap<String, PortfolioCounts>,
}

impl StaticPortfolio {
  pub fn new(counts: HashMap<String, PortfolioCounts>) -> Self {
    Self { counts }
  }
}

impl PortfolioProvider for StaticPortfolio {
  type Error = Infallible;

  async fn portfolio_counts(
    &self,
    role_key: &str,
  ) -> Result<PortfolioCounts, Infallible> {
    Ok(self.counts.get(role_key).copied().unwrap_or_default())
  }
}

// ─── Router assembly ─────────────────────────────────────────────────────────

/// Build the full application router for `store` and `config`.
pub fn app(store: SqliteStore, config: &ServerConfig) -> Router {
  let ctx = ApiContext {
    store:     Arc::new(store),
    perms:     Arc::new(ConfigPermissions::new(config.permissions.clone())),
    portfolio: Arc::new(StaticPortfolio::new(config.portfolio.clone())),
    settings:  config.api.clone(),
  };
  Router::new()
    .nest("/api", siren_api::api_router(ctx))
    .layer(TraceLayer::new_for_http())
}
