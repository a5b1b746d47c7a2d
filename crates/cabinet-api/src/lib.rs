//! JSON REST API for the client cabinet.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! [`cabinet_core::store`] capability traits. TLS and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cabinet_api::api_router(store.clone(), ApiConfig::default()))
//! ```

pub mod auth;
pub mod billing;
pub mod dashboard;
pub mod error;
pub mod plans;
pub mod requests;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use cabinet_core::{
  dashboard::{Dashboard, SummaryWindow},
  directory::Profiles,
  profile::UserId,
  store::{CredentialStore, DashboardStore, ProfileStore},
};
use chrono::Duration;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime knobs for the API layer.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Profile served by `GET /users/me` to anonymous callers.
  pub demo_user_id:   UserId,
  pub access_ttl:     Duration,
  pub refresh_ttl:    Duration,
  pub summary_window: SummaryWindow,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      demo_user_id:   UserId::from("demo-user-id"),
      access_ttl:     Duration::minutes(60),
      refresh_ttl:    Duration::days(14),
      summary_window: SummaryWindow::default(),
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Everything a store must provide to back the API.
pub trait Backend:
  ProfileStore + DashboardStore + CredentialStore + Send + Sync + 'static
{
}

impl<S> Backend for S where
  S: ProfileStore + DashboardStore + CredentialStore + Send + Sync + 'static
{
}

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:     Arc<S>,
  pub profiles:  Profiles<S>,
  pub dashboard: Dashboard<S>,
  pub config:    Arc<ApiConfig>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      profiles:  self.profiles.clone(),
      dashboard: self.dashboard.clone(),
      config:    Arc::clone(&self.config),
    }
  }
}

impl<S: Backend> ApiState<S> {
  pub fn new(store: Arc<S>, config: ApiConfig) -> Self {
    Self {
      profiles: Profiles::new(Arc::clone(&store)),
      dashboard: Dashboard::new(Arc::clone(&store), config.summary_window),
      store,
      config: Arc::new(config),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: Backend>(store: Arc<S>, config: ApiConfig) -> Router<()> {
  Router::new()
    // Dashboard
    .route("/dashboard/summary", get(dashboard::summary::<S>))
    .route("/dashboard/stats", get(dashboard::stats::<S>))
    .route("/dashboard/cases", get(dashboard::cases::<S>))
    .route("/dashboard/documents", get(dashboard::documents::<S>))
    // Billing
    .route("/billing/invoices", get(billing::invoices::<S>))
    // Service requests
    .route("/cabinet/requests", get(requests::list::<S>))
    // Users
    .route("/users/me", get(users::me::<S>))
    .route("/users/{id}", get(users::get_one::<S>).patch(users::update::<S>))
    // Plans
    .route("/plans", get(plans::list))
    .route("/plans/{id}", get(plans::get_one))
    // Auth
    .route("/auth/jwt/create", post(auth::create::<S>))
    .route("/auth/jwt/refresh", post(auth::refresh::<S>))
    .route("/auth/jwt/verify", post(auth::verify::<S>))
    .route("/auth/users", post(auth::register::<S>))
    .with_state(ApiState::new(store, config))
}
