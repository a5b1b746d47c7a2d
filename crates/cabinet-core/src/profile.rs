//! User profiles — the identity records owned by the Profile Provider.
//!
//! A profile is created on registration and only ever mutated through a
//! [`ProfilePatch`]. Deactivation is a subscription status transition; profiles
//! are never deleted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Opaque, unique user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  /// A fresh random identifier for a newly registered profile.
  pub fn random() -> Self { Self(Uuid::new_v4().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for UserId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for UserId {
  fn from(s: String) -> Self { Self(s) }
}

// ─── Subscription ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum SubscriptionStatus {
  Active,
  Expired,
  #[default]
  Trial,
  Canceled,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  #[serde(rename = "id")]
  pub user_id:                 UserId,
  pub email:                   String,
  pub first_name:              String,
  pub last_name:               String,
  pub phone:                   Option<String>,
  pub company_name:            Option<String>,
  /// Russian taxpayer number of the client's company.
  pub inn:                     Option<String>,
  pub subscription_status:     SubscriptionStatus,
  pub subscription_expires_at: Option<DateTime<Utc>>,
  pub created_at:              DateTime<Utc>,
}

impl UserProfile {
  pub fn display_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
      .trim()
      .to_owned()
  }
}

/// Input to [`crate::store::ProfileStore::create_profile`].
/// `created_at` is always set by the store.
#[derive(Debug, Clone)]
pub struct NewProfile {
  /// Caller-chosen identifier; the store generates one when `None`.
  pub user_id:                 Option<UserId>,
  pub email:                   String,
  pub first_name:              String,
  pub last_name:               String,
  pub phone:                   Option<String>,
  pub company_name:            Option<String>,
  pub inn:                     Option<String>,
  pub subscription_status:     SubscriptionStatus,
  pub subscription_expires_at: Option<DateTime<Utc>>,
}

impl NewProfile {
  /// Convenience constructor with all optional fields unset and a trial
  /// subscription.
  pub fn new(
    email: impl Into<String>,
    first_name: impl Into<String>,
    last_name: impl Into<String>,
  ) -> Self {
    Self {
      user_id: None,
      email: email.into(),
      first_name: first_name.into(),
      last_name: last_name.into(),
      phone: None,
      company_name: None,
      inn: None,
      subscription_status: SubscriptionStatus::default(),
      subscription_expires_at: None,
    }
  }

  /// Check and normalise every field, as registration requires.
  pub fn validated(mut self) -> Result<Self> {
    self.email = validate_email(&self.email)?;
    self.first_name = validate_name("firstName", &self.first_name)?;
    self.last_name = validate_name("lastName", &self.last_name)?;
    self.phone = self.phone.as_deref().map(validate_phone).transpose()?.flatten();
    self.company_name = self
      .company_name
      .as_deref()
      .map(validate_company)
      .transpose()?
      .flatten();
    self.inn = self.inn.as_deref().map(validate_inn).transpose()?.flatten();
    Ok(self)
  }
}

/// Why a store refused to create a profile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileConflict {
  #[error("profile id already exists: {0}")]
  IdTaken(UserId),

  #[error("email is already registered: {0}")]
  EmailTaken(String),
}

// ─── Partial updates ─────────────────────────────────────────────────────────

/// A validated set of profile changes. `None` leaves a field untouched; for
/// optional fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
  pub first_name:              Option<String>,
  pub last_name:               Option<String>,
  pub phone:                   Option<Option<String>>,
  pub company_name:            Option<Option<String>>,
  pub inn:                     Option<Option<String>>,
  pub subscription_status:     Option<SubscriptionStatus>,
  pub subscription_expires_at: Option<Option<DateTime<Utc>>>,
}

impl ProfilePatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Apply the supplied fields to `profile`, leaving the rest untouched.
  pub fn apply(&self, profile: &mut UserProfile) {
    if let Some(v) = &self.first_name {
      profile.first_name = v.clone();
    }
    if let Some(v) = &self.last_name {
      profile.last_name = v.clone();
    }
    if let Some(v) = &self.phone {
      profile.phone = v.clone();
    }
    if let Some(v) = &self.company_name {
      profile.company_name = v.clone();
    }
    if let Some(v) = &self.inn {
      profile.inn = v.clone();
    }
    if let Some(v) = self.subscription_status {
      profile.subscription_status = v;
    }
    if let Some(v) = self.subscription_expires_at {
      profile.subscription_expires_at = v;
    }
  }
}

/// Unvalidated profile changes as they arrive from a client.
///
/// An empty string for `phone`, `companyName`, `inn` or
/// `subscriptionExpiresAt` clears the field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileChanges {
  pub first_name:              Option<String>,
  pub last_name:               Option<String>,
  pub phone:                   Option<String>,
  pub company_name:            Option<String>,
  pub inn:                     Option<String>,
  pub subscription_status:     Option<String>,
  pub subscription_expires_at: Option<String>,
}

impl ProfileChanges {
  pub fn validate(self) -> Result<ProfilePatch> {
    let subscription_status = self
      .subscription_status
      .map(|s| {
        s.trim().parse::<SubscriptionStatus>().map_err(|_| {
          Error::validation(
            "subscriptionStatus",
            format!("{s:?} is not one of ACTIVE, EXPIRED, TRIAL, CANCELED"),
          )
        })
      })
      .transpose()?;

    let subscription_expires_at = self
      .subscription_expires_at
      .map(|s| validate_expiry(&s))
      .transpose()?;

    Ok(ProfilePatch {
      first_name: self
        .first_name
        .map(|v| validate_name("firstName", &v))
        .transpose()?,
      last_name: self
        .last_name
        .map(|v| validate_name("lastName", &v))
        .transpose()?,
      phone: self.phone.map(|v| validate_phone(&v)).transpose()?,
      company_name: self
        .company_name
        .map(|v| validate_company(&v))
        .transpose()?,
      inn: self.inn.map(|v| validate_inn(&v)).transpose()?,
      subscription_status,
      subscription_expires_at,
    })
  }
}

// ─── Field validation ────────────────────────────────────────────────────────

const MAX_NAME_CHARS: usize = 100;
const MAX_COMPANY_CHARS: usize = 255;
const MAX_EMAIL_CHARS: usize = 254;

fn validate_name(field: &'static str, raw: &str) -> Result<String> {
  let name = raw.trim();
  if name.is_empty() {
    return Err(Error::validation(field, "must not be empty"));
  }
  if name.chars().count() > MAX_NAME_CHARS {
    return Err(Error::validation(
      field,
      format!("must be at most {MAX_NAME_CHARS} characters"),
    ));
  }
  Ok(name.to_owned())
}

/// Returns the trimmed address; comparisons elsewhere are case-insensitive.
pub fn validate_email(raw: &str) -> Result<String> {
  let email = raw.trim();
  let invalid = || Error::validation("email", format!("{email:?} is not an email address"));

  if email.len() > MAX_EMAIL_CHARS || email.chars().any(char::is_whitespace) {
    return Err(invalid());
  }
  let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
  if local.is_empty()
    || domain.contains('@')
    || !domain.contains('.')
    || domain.starts_with('.')
    || domain.ends_with('.')
  {
    return Err(invalid());
  }
  Ok(email.to_owned())
}

/// Normalises to an optional leading `+` followed by digits only.
fn validate_phone(raw: &str) -> Result<Option<String>> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Ok(None);
  }
  let (plus, rest) = match trimmed.strip_prefix('+') {
    Some(rest) => ("+", rest),
    None => ("", trimmed),
  };
  let digits: String = rest
    .chars()
    .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
    .collect();
  if !digits.chars().all(|c| c.is_ascii_digit()) || !(10..=15).contains(&digits.len()) {
    return Err(Error::validation(
      "phone",
      "must contain 10 to 15 digits, optionally prefixed with '+'",
    ));
  }
  Ok(Some(format!("{plus}{digits}")))
}

fn validate_company(raw: &str) -> Result<Option<String>> {
  let name = raw.trim();
  if name.is_empty() {
    return Ok(None);
  }
  if name.chars().count() > MAX_COMPANY_CHARS {
    return Err(Error::validation(
      "companyName",
      format!("must be at most {MAX_COMPANY_CHARS} characters"),
    ));
  }
  Ok(Some(name.to_owned()))
}

fn validate_expiry(raw: &str) -> Result<Option<DateTime<Utc>>> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Ok(None);
  }
  DateTime::parse_from_rfc3339(raw)
    .map(|dt| Some(dt.with_timezone(&Utc)))
    .map_err(|e| Error::validation("subscriptionExpiresAt", e.to_string()))
}

fn validate_inn(raw: &str) -> Result<Option<String>> {
  let inn = raw.trim();
  if inn.is_empty() {
    return Ok(None);
  }
  if !inn.chars().all(|c| c.is_ascii_digit()) || !matches!(inn.len(), 10 | 12) {
    return Err(Error::validation("inn", "must be 10 or 12 digits"));
  }
  Ok(Some(inn.to_owned()))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn profile() -> UserProfile {
    UserProfile {
      user_id:                 UserId::from("u-1"),
      email:                   "client@example.ru".into(),
      first_name:              "Александр".into(),
      last_name:               "Иванов".into(),
      phone:                   Some("+79998887766".into()),
      company_name:            Some("ООО «ТехноГрупп»".into()),
      inn:                     Some("7700112233".into()),
      subscription_status:     SubscriptionStatus::Active,
      subscription_expires_at: None,
      created_at:              Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    }
  }

  #[test]
  fn apply_touches_only_supplied_fields() {
    let mut p = profile();
    let before = p.clone();
    let patch = ProfileChanges {
      first_name: Some("X".into()),
      ..Default::default()
    }
    .validate()
    .unwrap();

    patch.apply(&mut p);
    assert_eq!(p.first_name, "X");
    assert_eq!(p.last_name, before.last_name);
    assert_eq!(p.phone, before.phone);
    assert_eq!(p.inn, before.inn);
  }

  #[test]
  fn empty_string_clears_optional_fields() {
    let mut p = profile();
    let patch = ProfileChanges {
      phone: Some(String::new()),
      inn: Some("  ".into()),
      ..Default::default()
    }
    .validate()
    .unwrap();

    patch.apply(&mut p);
    assert_eq!(p.phone, None);
    assert_eq!(p.inn, None);
    assert!(p.company_name.is_some());
  }

  #[test]
  fn expiry_can_be_set_and_cleared() {
    let mut p = profile();
    let set = ProfileChanges {
      subscription_expires_at: Some("2025-03-01T00:00:00+03:00".into()),
      ..Default::default()
    }
    .validate()
    .unwrap();
    set.apply(&mut p);
    assert_eq!(
      p.subscription_expires_at,
      Some(Utc.with_ymd_and_hms(2025, 2, 28, 21, 0, 0).unwrap())
    );

    let clear = ProfileChanges {
      subscription_expires_at: Some(String::new()),
      ..Default::default()
    }
    .validate()
    .unwrap();
    assert_eq!(clear.subscription_expires_at, Some(None));
    clear.apply(&mut p);
    assert_eq!(p.subscription_expires_at, None);
  }

  #[test]
  fn phone_is_normalised() {
    let patch = ProfileChanges {
      phone: Some("+7 (999) 888-77-66".into()),
      ..Default::default()
    }
    .validate()
    .unwrap();
    assert_eq!(patch.phone, Some(Some("+79998887766".into())));
  }

  #[test]
  fn rejects_bad_fields() {
    let cases = [
      ProfileChanges { first_name: Some("   ".into()), ..Default::default() },
      ProfileChanges { phone: Some("12345".into()), ..Default::default() },
      ProfileChanges { inn: Some("77001122".into()), ..Default::default() },
      ProfileChanges { subscription_status: Some("PAUSED".into()), ..Default::default() },
      ProfileChanges {
        subscription_expires_at: Some("next tuesday".into()),
        ..Default::default()
      },
    ];
    for changes in cases {
      let err = changes.clone().validate().unwrap_err();
      assert!(matches!(err, Error::Validation { .. }), "{changes:?} -> {err}");
    }
  }

  #[test]
  fn subscription_status_is_case_insensitive() {
    let patch = ProfileChanges {
      subscription_status: Some("canceled".into()),
      ..Default::default()
    }
    .validate()
    .unwrap();
    assert_eq!(patch.subscription_status, Some(SubscriptionStatus::Canceled));
  }

  #[test]
  fn unknown_fields_are_rejected_by_serde() {
    let res: std::result::Result<ProfileChanges, _> =
      serde_json::from_str(r#"{"firstName":"A","role":"admin"}"#);
    assert!(res.is_err());
  }

  #[test]
  fn email_validation() {
    assert_eq!(validate_email(" a@b.ru ").unwrap(), "a@b.ru");
    for bad in ["", "a", "a@b", "@b.ru", "a b@c.ru", "a@@b.ru", "a@.ru"] {
      assert!(validate_email(bad).is_err(), "{bad:?} accepted");
    }
  }

  #[test]
  fn display_name_joins_names() {
    assert_eq!(profile().display_name(), "Александр Иванов");
  }

  #[test]
  fn wire_format_is_camel_case() {
    let json = serde_json::to_value(profile()).unwrap();
    assert_eq!(json["id"], "u-1");
    assert_eq!(json["firstName"], "Александр");
    assert_eq!(json["subscriptionStatus"], "ACTIVE");
  }
}
