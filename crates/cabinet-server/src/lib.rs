//! HTTP server assembly for the client cabinet.
//!
//! Mounts the [`cabinet_api`] router under `/api`, wraps it in request
//! tracing, and seeds the demo account.

pub mod seed;

use std::{path::PathBuf, sync::Arc};

use anyhow::ensure;
use axum::Router;
use cabinet_api::{ApiConfig, Backend};
use cabinet_core::{dashboard::SummaryWindow, profile::UserId};
use chrono::Duration;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// One week.
pub const MAX_ACCESS_TTL_MINUTES: i64 = 7 * 24 * 60;
pub const MAX_REFRESH_TTL_DAYS: i64 = 365;

/// Runtime server configuration, deserialised from `config.toml` layered
/// under `CABINET_*` environment variables. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Write the demo account on startup if it is missing.
  pub seed_demo:          bool,
  pub demo_user_id:       String,
  /// Lets the demo account log in when set.
  pub demo_password:      Option<String>,
  /// 1 to [`MAX_ACCESS_TTL_MINUTES`].
  pub access_ttl_minutes: i64,
  /// 1 to [`MAX_REFRESH_TTL_DAYS`].
  pub refresh_ttl_days:   i64,
  pub summary_cases:      usize,
  pub summary_documents:  usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let window = SummaryWindow::default();
    Self {
      host:               "127.0.0.1".to_string(),
      port:               8000,
      store_path:         PathBuf::from("cabinet.db"),
      seed_demo:          true,
      demo_user_id:       "demo-user-id".to_string(),
      demo_password:      None,
      access_ttl_minutes: 60,
      refresh_ttl_days:   14,
      summary_cases:      window.cases,
      summary_documents:  window.documents,
    }
  }
}

impl ServerConfig {
  pub fn demo_user(&self) -> UserId { UserId::from(self.demo_user_id.as_str()) }

  /// Check the token lifetimes and build the API configuration.
  pub fn api_config(&self) -> anyhow::Result<ApiConfig> {
    ensure!(
      (1..=MAX_ACCESS_TTL_MINUTES).contains(&self.access_ttl_minutes),
      "access_ttl_minutes must be between 1 and {MAX_ACCESS_TTL_MINUTES}, got {}",
      self.access_ttl_minutes
    );
    ensure!(
      (1..=MAX_REFRESH_TTL_DAYS).contains(&self.refresh_ttl_days),
      "refresh_ttl_days must be between 1 and {MAX_REFRESH_TTL_DAYS}, got {}",
      self.refresh_ttl_days
    );

    Ok(ApiConfig {
      demo_user_id:   self.demo_user(),
      access_ttl:     Duration::minutes(self.access_ttl_minutes),
      refresh_ttl:    Duration::days(self.refresh_ttl_days),
      summary_window: SummaryWindow {
        cases:     self.summary_cases,
        documents: self.summary_documents,
      },
    })
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The complete application: API under `/api`, with per-request tracing.
pub fn app<S: Backend>(store: Arc<S>, config: ApiConfig) -> Router {
  Router::new()
    .nest("/api", cabinet_api::api_router(store, config))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ───────────────────────────────────────────────────────
