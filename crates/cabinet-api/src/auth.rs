//! Accounts and bearer tokens.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/jwt/create` | Body: `{"email","password"}`; returns a token pair |
//! | `POST` | `/auth/jwt/refresh` | Body: `{"refresh"}`; the presented token is spent |
//! | `POST` | `/auth/jwt/verify` | Body: `{"token"}`; `{}` if the access token is live |
//! | `POST` | `/auth/users` | Body: [`RegisterBody`]; returns 201 + profile |
//!
//! Tokens are 32 random bytes, URL-safe base64 without padding. The store only
//! ever sees the SHA-256 digest of a token, never the token itself.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, State, rejection::JsonRejection},
  http::{StatusCode, header, request::Parts},
  response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use cabinet_core::{
  auth::{Credentials, StoredToken, TokenKind, TokenPair},
  profile::{NewProfile, UserId},
  store::CredentialStore,
};
use chrono::Utc;
use rand_core::{OsRng, RngCore};
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::{ApiState, Backend, error::ApiError, users::ProfileBody};

pub const MIN_PASSWORD_CHARS: usize = 8;

const BAD_CREDENTIALS: &str = "no active account found with the given credentials";

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, ApiError> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
  })
  .await
  .map_err(|e| ApiError::Internal(e.to_string()))?
}

/// `false` for a wrong password or an unparseable hash.
pub async fn verify_password(password: String, phc: String) -> Result<bool, ApiError> {
  tokio::task::spawn_blocking(move || {
    PasswordHash::new(&phc)
      .and_then(|hash| Argon2::default().verify_password(password.as_bytes(), &hash))
      .is_ok()
  })
  .await
  .map_err(|e| ApiError::Internal(e.to_string()))
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

pub fn mint_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

pub fn token_digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

async fn issue_pair<S: Backend>(
  state: &ApiState<S>,
  user_id: &UserId,
) -> Result<TokenPair, ApiError> {
  let now = Utc::now();
  let access = mint_token();
  let refresh = mint_token();

  for (token, kind, ttl) in [
    (&access, TokenKind::Access, state.config.access_ttl),
    (&refresh, TokenKind::Refresh, state.config.refresh_ttl),
  ] {
    state
      .store
      .store_token(StoredToken {
        digest: token_digest(token),
        user_id: user_id.clone(),
        kind,
        issued_at: now,
        expires_at: now
          .checked_add_signed(ttl)
          .ok_or_else(|| ApiError::Internal(format!("{kind} lifetime is out of range")))?,
      })
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
  }

  Ok(TokenPair { access, refresh })
}

async fn resolve<S: Backend>(
  state: &ApiState<S>,
  token: &str,
  kind: TokenKind,
) -> Result<Option<UserId>, ApiError> {
  state
    .store
    .resolve_token(token_digest(token), kind, Utc::now())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated caller, if the request carried a bearer token.
///
/// A missing `Authorization` header yields `Caller(None)`; a header that is
/// malformed or names an unknown, expired or revoked token is rejected with
/// 401.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<UserId>);

fn bearer_token(value: &str) -> Option<&str> {
  let (scheme, token) = value.trim().split_once(' ')?;
  let token = token.trim();
  let known = scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("jwt");
  (known && !token.is_empty()).then_some(token)
}

impl<S: Backend> FromRequestParts<ApiState<S>> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
      return Ok(Caller(None));
    };

    let token = value
      .to_str()
      .ok()
      .and_then(bearer_token)
      .map(str::to_owned)
      .ok_or(ApiError::Unauthorized("malformed authorization header"))?;

    let user = resolve(state, &token, TokenKind::Access)
      .await?
      .ok_or(ApiError::Unauthorized("invalid or expired token"))?;
    Ok(Caller(Some(user)))
  }
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /auth/jwt/create`
pub async fn create<S: Backend>(
  State(state): State<ApiState<S>>,
  payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
  let Json(creds) = payload?;

  let record = state
    .store
    .credentials_for(creds.email.trim().to_owned())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::Unauthorized(BAD_CREDENTIALS))?;

  if !verify_password(creds.password, record.password_hash).await? {
    tracing::info!(user_id = %record.user_id, "rejected login");
    return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
  }

  let pair = issue_pair(&state, &record.user_id).await?;
  tracing::info!(user_id = %record.user_id, "issued token pair");
  Ok(Json(pair))
}

// ─── Refresh ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RefreshBody {
  pub refresh: String,
}

/// `POST /auth/jwt/refresh` — a refresh token is good for exactly one use.
pub async fn refresh<S: Backend>(
  State(state): State<ApiState<S>>,
  payload: Result<Json<RefreshBody>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
  let Json(body) = payload?;

  let user = resolve(&state, &body.refresh, TokenKind::Refresh)
    .await?
    .ok_or(ApiError::Unauthorized("invalid or expired refresh token"))?;

  // Only the request that revokes the token may rotate it.
  let spent = state
    .store
    .revoke_token(token_digest(&body.refresh))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !spent {
    return Err(ApiError::Unauthorized("invalid or expired refresh token"));
  }

  Ok(Json(issue_pair(&state, &user).await?))
}

// ─── Verify ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  pub token: String,
}

/// `POST /auth/jwt/verify`
pub async fn verify<S: Backend>(
  State(state): State<ApiState<S>>,
  payload: Result<Json<VerifyBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
  let Json(body) = payload?;
  resolve(&state, &body.token, TokenKind::Access)
    .await?
    .ok_or(ApiError::Unauthorized("invalid or expired token"))?;
  Ok(Json(json!({})))
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterBody {
  pub email:        String,
  pub password:     String,
  pub first_name:   String,
  pub last_name:    String,
  pub phone:        Option<String>,
  pub company_name: Option<String>,
  pub inn:          Option<String>,
}

/// `POST /auth/users`
pub async fn register<S: Backend>(
  State(state): State<ApiState<S>>,
  payload: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = payload?;

  if body.password.chars().count() < MIN_PASSWORD_CHARS {
    return Err(
      cabinet_core::Error::validation(
        "password",
        format!("must be at least {MIN_PASSWORD_CHARS} characters"),
      )
      .into(),
    );
  }

  let mut input = NewProfile::new(body.email, body.first_name, body.last_name);
  input.phone = body.phone;
  input.company_name = body.company_name;
  input.inn = body.inn;

  // Validate before paying for the hash; the profile and its password are
  // then written together.
  let input = input.validated()?;
  let hash = hash_password(body.password).await?;
  let profile = state.profiles.register(input, hash).await?;

  tracing::info!(user_id = %profile.user_id, "registered account");
  Ok((StatusCode::CREATED, Json(ProfileBody::from(profile))))
}
