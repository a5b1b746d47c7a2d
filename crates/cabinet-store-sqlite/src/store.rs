//! [`SqliteStore`] — the SQLite implementation of the cabinet store traits.

use std::path::Path;

use cabinet_core::{
  auth::{LoginRecord, StoredToken, TokenKind},
  billing::{Invoice, InvoiceStatus, NewInvoice},
  case::{CaseStatus, CaseSummary, CaseUpdate, NewCase},
  dashboard::{CaseStats, DashboardSnapshot, SummaryWindow},
  document::{DocumentSummary, NewDocument},
  lawyer::{Lawyer, NewLawyer},
  profile::{NewProfile, ProfileConflict, ProfilePatch, UserId, UserProfile},
  request::{NewServiceRequest, RequestStatus, ServiceRequest},
  store::{
    AccountSeed, CredentialStore, DashboardStore, Page, ProfileStore, RecordStore,
  },
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    CASE_COLUMNS, DOCUMENT_COLUMNS, INVOICE_COLUMNS, PROFILE_COLUMNS, REQUEST_COLUMNS,
    RawCase, RawDocument, RawInvoice, RawLawyer, RawProfile, RawRequest, decode_enum,
    encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A cabinet store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `write` in a transaction, failing with `ProfileNotFound` if `owner`
  /// does not exist.
  async fn insert_owned<F>(&self, owner: &UserId, write: F) -> Result<()>
  where
    F: FnOnce(&Connection) -> rusqlite::Result<()> + Send + 'static,
  {
    let owner_str = owner.to_string();
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !owner_exists(&tx, &owner_str)? {
          return Ok(false);
        }
        write(&*tx)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if inserted { Ok(()) } else { Err(Error::ProfileNotFound(owner.clone())) }
  }
}

fn owner_exists(conn: &Connection, owner: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM profiles WHERE user_id = ?1",
        rusqlite::params![owner],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn select_profile(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<RawProfile>> {
  conn
    .query_row(
      &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1"),
      rusqlite::params![user_id],
      RawProfile::from_row,
    )
    .optional()
}

fn select_case(conn: &Connection, case_id: &str) -> rusqlite::Result<Option<RawCase>> {
  conn
    .query_row(
      &format!("SELECT {CASE_COLUMNS} FROM cases WHERE case_id = ?1"),
      rusqlite::params![case_id],
      RawCase::from_row,
    )
    .optional()
}

/// SQLite binds integers as `i64`.
fn sql_int(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

fn sql_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

/// Whole roubles as an SQLite integer.
fn sql_roubles(field: &'static str, amount: u64) -> Result<i64> {
  i64::try_from(amount).map_err(|_| {
    cabinet_core::Error::validation(field, format!("{amount} is out of range")).into()
  })
}

// ─── Row construction ────────────────────────────────────────────────────────

fn new_profile(input: NewProfile, at: DateTime<Utc>) -> UserProfile {
  UserProfile {
    user_id:                 input.user_id.unwrap_or_else(UserId::random),
    email:                   input.email,
    first_name:              input.first_name,
    last_name:               input.last_name,
    phone:                   input.phone,
    company_name:            input.company_name,
    inn:                     input.inn,
    subscription_status:     input.subscription_status,
    subscription_expires_at: input.subscription_expires_at,
    created_at:              at,
  }
}

fn new_case(input: NewCase, at: DateTime<Utc>) -> CaseSummary {
  CaseSummary {
    id:         Uuid::new_v4(),
    owner_id:   Some(input.owner_id),
    title:      input.title,
    progress:   input.progress,
    category:   input.category,
    status:     input.status,
    updated_at: at,
  }
}

fn new_document(input: NewDocument, at: DateTime<Utc>) -> DocumentSummary {
  DocumentSummary {
    id:         Uuid::new_v4(),
    owner_id:   Some(input.owner_id),
    name:       input.name,
    doc_type:   input.doc_type,
    status:     input.status,
    category:   input.category,
    created_at: at,
  }
}

fn new_invoice(input: NewInvoice, at: DateTime<Utc>) -> Result<Invoice> {
  if input.amount == 0 {
    return Err(
      cabinet_core::Error::validation("amount", "must be a positive number of roubles").into(),
    );
  }
  sql_roubles("amount", input.amount)?;

  Ok(Invoice {
    id:          Uuid::new_v4(),
    owner_id:    Some(input.owner_id),
    number:      input.number,
    description: input.description,
    amount:      input.amount,
    status:      input.status,
    issued_on:   input.issued_on,
    created_at:  at,
  })
}

fn new_request(input: NewServiceRequest, at: DateTime<Utc>) -> Result<ServiceRequest> {
  if let Some(price) = input.price {
    sql_roubles("price", price)?;
  }

  Ok(ServiceRequest {
    id:           Uuid::new_v4(),
    owner_id:     Some(input.owner_id),
    title:        input.title,
    service_type: input.service_type,
    status:       input.status,
    price:        input.price,
    created_at:   at,
    updated_at:   at,
  })
}

fn new_lawyer(input: NewLawyer) -> Lawyer {
  Lawyer {
    lawyer_id: Uuid::new_v4(),
    name:      input.name,
    avatar:    input.avatar,
    is_online: input.is_online,
  }
}

// ─── Row writes ──────────────────────────────────────────────────────────────
//
// Plain functions over a connection so that several of them can share one
// transaction.

/// Insert `profile` unless its id or email is taken.
fn insert_profile(
  conn: &Connection,
  profile: &UserProfile,
) -> rusqlite::Result<Option<ProfileConflict>> {
  let id_str = profile.user_id.to_string();
  if owner_exists(conn, &id_str)? {
    return Ok(Some(ProfileConflict::IdTaken(profile.user_id.clone())));
  }
  // `email` is declared COLLATE NOCASE, so this is case-insensitive.
  let email_taken = conn
    .query_row(
      "SELECT 1 FROM profiles WHERE email = ?1",
      rusqlite::params![profile.email],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if email_taken {
    return Ok(Some(ProfileConflict::EmailTaken(profile.email.clone())));
  }

  conn.execute(
    "INSERT INTO profiles (
       user_id, email, first_name, last_name, phone, company_name, inn,
       subscription_status, subscription_expires_at, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    rusqlite::params![
      id_str,
      profile.email,
      profile.first_name,
      profile.last_name,
      profile.phone,
      profile.company_name,
      profile.inn,
      profile.subscription_status.as_ref(),
      profile.subscription_expires_at.map(encode_dt),
      encode_dt(profile.created_at),
    ],
  )?;
  Ok(None)
}

fn upsert_password(
  conn: &Connection,
  user_id: &str,
  password_hash: &str,
  at: DateTime<Utc>,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO credentials (user_id, password_hash, updated_at)
     VALUES (?1, ?2, ?3)
     ON CONFLICT (user_id) DO UPDATE
       SET password_hash = excluded.password_hash,
           updated_at    = excluded.updated_at",
    rusqlite::params![user_id, password_hash, encode_dt(at)],
  )?;
  Ok(())
}

fn insert_case(conn: &Connection, owner: &str, case: &CaseSummary) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO cases (case_id, owner_id, title, category, status, progress, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(case.id),
      owner,
      case.title,
      case.category,
      case.status.as_ref(),
      case.progress.get(),
      encode_dt(case.updated_at),
    ],
  )?;
  Ok(())
}

fn insert_document(
  conn: &Connection,
  owner: &str,
  document: &DocumentSummary,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO documents (document_id, owner_id, name, doc_type, status, category, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(document.id),
      owner,
      document.name,
      document.doc_type.as_ref(),
      document.status.as_ref(),
      document.category,
      encode_dt(document.created_at),
    ],
  )?;
  Ok(())
}

/// `invoice.amount` has been range-checked by [`new_invoice`].
fn insert_invoice(conn: &Connection, owner: &str, invoice: &Invoice) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO invoices (
       invoice_id, owner_id, number, description, amount, status, issued_on, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      encode_uuid(invoice.id),
      owner,
      invoice.number,
      invoice.description,
      i64::try_from(invoice.amount).unwrap_or(i64::MAX),
      invoice.status.as_ref(),
      encode_date(invoice.issued_on),
      encode_dt(invoice.created_at),
    ],
  )?;
  Ok(())
}

fn insert_request(
  conn: &Connection,
  owner: &str,
  request: &ServiceRequest,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO service_requests (
       request_id, owner_id, title, service_type, status, price, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      encode_uuid(request.id),
      owner,
      request.title,
      request.service_type,
      request.status.as_ref(),
      request.price.map(|p| i64::try_from(p).unwrap_or(i64::MAX)),
      encode_dt(request.created_at),
      encode_dt(request.updated_at),
    ],
  )?;
  Ok(())
}

fn insert_lawyer(conn: &Connection, lawyer: &Lawyer) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO lawyers (lawyer_id, name, avatar, is_online) VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![encode_uuid(lawyer.lawyer_id), lawyer.name, lawyer.avatar, lawyer.is_online],
  )?;
  Ok(())
}

/// Returns the number of profiles updated (0 or 1).
fn set_lawyer(conn: &Connection, user_id: &str, lawyer_id: Uuid) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE profiles SET lawyer_id = ?2 WHERE user_id = ?1",
    rusqlite::params![user_id, encode_uuid(lawyer_id)],
  )
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  async fn create_profile(
    &self,
    input: NewProfile,
  ) -> Result<Result<UserProfile, ProfileConflict>> {
    let profile = new_profile(input, Utc::now());
    let row = profile.clone();

    let conflict = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let conflict = insert_profile(&tx, &row)?;
        if conflict.is_none() {
          tx.commit()?;
        }
        Ok(conflict)
      })
      .await?;

    Ok(conflict.map_or(Ok(profile), Err))
  }

  async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>> {
    let id_str = id.to_string();
    let raw = self
      .conn
      .call(move |conn| Ok(select_profile(conn, &id_str)?))
      .await?;
    raw.map(RawProfile::into_profile).transpose()
  }

  async fn update_profile(
    &self,
    id: UserId,
    patch: ProfilePatch,
  ) -> Result<Option<UserProfile>> {
    let id_str     = id.to_string();
    let status_str = patch.subscription_status.map(|s| s.as_ref().to_owned());
    let expires    = patch.subscription_expires_at.map(|e| e.map(encode_dt));
    let ProfilePatch { first_name, last_name, phone, company_name, inn, .. } = patch;

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Optional columns take a "touched" flag so that NULL can be written.
        let changed = tx.execute(
          "UPDATE profiles SET
             first_name              = COALESCE(?2, first_name),
             last_name               = COALESCE(?3, last_name),
             phone                   = CASE WHEN ?4 THEN ?5 ELSE phone END,
             company_name            = CASE WHEN ?6 THEN ?7 ELSE company_name END,
             inn                     = CASE WHEN ?8 THEN ?9 ELSE inn END,
             subscription_status     = COALESCE(?10, subscription_status),
             subscription_expires_at = CASE WHEN ?11 THEN ?12 ELSE subscription_expires_at END
           WHERE user_id = ?1",
          rusqlite::params![
            id_str,
            first_name,
            last_name,
            phone.is_some(),
            phone.flatten(),
            company_name.is_some(),
            company_name.flatten(),
            inn.is_some(),
            inn.flatten(),
            status_str,
            expires.is_some(),
            expires.flatten(),
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = select_profile(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

enum Advance {
  Missing,
  Regressed(i64),
  Updated(RawCase),
}

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn record_case(&self, input: NewCase) -> Result<CaseSummary> {
    let owner = input.owner_id.clone();
    let case = new_case(input, Utc::now());
    let (owner_str, row) = (owner.to_string(), case.clone());
    self
      .insert_owned(&owner, move |conn| insert_case(conn, &owner_str, &row))
      .await?;
    Ok(case)
  }

  async fn advance_case(&self, case_id: Uuid, update: CaseUpdate) -> Result<CaseSummary> {
    let id_str     = encode_uuid(case_id);
    let requested  = update.progress.get();
    let status_str = update.status.map(|s| s.as_ref().to_owned());
    let at_str     = encode_dt(Utc::now());

    // Read-compare-write inside one transaction so progress never regresses.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current: Option<i64> = tx
          .query_row(
            "SELECT progress FROM cases WHERE case_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(current) = current else {
          return Ok(Advance::Missing);
        };
        if current > i64::from(requested) {
          return Ok(Advance::Regressed(current));
        }
        tx.execute(
          "UPDATE cases
           SET progress = ?2, status = COALESCE(?3, status), updated_at = ?4
           WHERE case_id = ?1",
          rusqlite::params![id_str, requested, status_str, at_str],
        )?;
        let raw = select_case(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw.map_or(Advance::Missing, Advance::Updated))
      })
      .await?;

    match outcome {
      Advance::Missing => Err(Error::CaseNotFound(case_id)),
      Advance::Regressed(current) => Err(Error::ProgressRegression {
        case_id,
        current: u8::try_from(current).unwrap_or(u8::MAX),
        requested,
      }),
      Advance::Updated(raw) => raw.into_case(),
    }
  }

  async fn record_document(&self, input: NewDocument) -> Result<DocumentSummary> {
    let owner = input.owner_id.clone();
    let document = new_document(input, Utc::now());
    let (owner_str, row) = (owner.to_string(), document.clone());
    self
      .insert_owned(&owner, move |conn| insert_document(conn, &owner_str, &row))
      .await?;
    Ok(document)
  }

  async fn record_invoice(&self, input: NewInvoice) -> Result<Invoice> {
    let owner = input.owner_id.clone();
    let invoice = new_invoice(input, Utc::now())?;
    let (owner_str, row) = (owner.to_string(), invoice.clone());
    self
      .insert_owned(&owner, move |conn| insert_invoice(conn, &owner_str, &row))
      .await?;
    Ok(invoice)
  }

  async fn add_lawyer(&self, input: NewLawyer) -> Result<Lawyer> {
    let lawyer = new_lawyer(input);
    let row = lawyer.clone();
    self
      .conn
      .call(move |conn| Ok(insert_lawyer(conn, &row)?))
      .await?;
    Ok(lawyer)
  }

  async fn assign_lawyer(&self, user_id: UserId, lawyer_id: Uuid) -> Result<()> {
    let user_str   = user_id.to_string();
    let lawyer_str = encode_uuid(lawyer_id);

    let (lawyer_known, changed) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let lawyer_known = tx
          .query_row(
            "SELECT 1 FROM lawyers WHERE lawyer_id = ?1",
            rusqlite::params![lawyer_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !lawyer_known {
          return Ok((false, 0));
        }
        let changed = set_lawyer(&tx, &user_str, lawyer_id)?;
        tx.commit()?;
        Ok((true, changed))
      })
      .await?;

    if !lawyer_known {
      return Err(Error::LawyerNotFound(lawyer_id));
    }
    if changed == 0 {
      return Err(Error::ProfileNotFound(user_id));
    }
    Ok(())
  }

  async fn record_request(&self, input: NewServiceRequest) -> Result<ServiceRequest> {
    let owner = input.owner_id.clone();
    let request = new_request(input, Utc::now())?;
    let (owner_str, row) = (owner.to_string(), request.clone());
    self
      .insert_owned(&owner, move |conn| insert_request(conn, &owner_str, &row))
      .await?;
    Ok(request)
  }

  async fn import_account(
    &self,
    seed: AccountSeed,
  ) -> Result<Result<UserProfile, ProfileConflict>> {
    let now = Utc::now();
    let AccountSeed { profile, cases, documents, invoices, requests, lawyer } = seed;

    let profile = new_profile(profile, now);
    let cases: Vec<_> = cases
      .into_iter()
      .map(|c| (c.owner_id.to_string(), new_case(c, now)))
      .collect();
    let documents: Vec<_> = documents
      .into_iter()
      .map(|d| (d.owner_id.to_string(), new_document(d, now)))
      .collect();
    let invoices = invoices
      .into_iter()
      .map(|i| Ok((i.owner_id.to_string(), new_invoice(i, now)?)))
      .collect::<Result<Vec<_>>>()?;
    let requests = requests
      .into_iter()
      .map(|r| Ok((r.owner_id.to_string(), new_request(r, now)?)))
      .collect::<Result<Vec<_>>>()?;
    let lawyer = lawyer.map(new_lawyer);
    let row = profile.clone();

    // Dropping the transaction without committing rolls every write back.
    let conflict = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(conflict) = insert_profile(&tx, &row)? {
          return Ok(Some(conflict));
        }
        for (owner, case) in &cases {
          insert_case(&tx, owner, case)?;
        }
        for (owner, document) in &documents {
          insert_document(&tx, owner, document)?;
        }
        for (owner, invoice) in &invoices {
          insert_invoice(&tx, owner, invoice)?;
        }
        for (owner, request) in &requests {
          insert_request(&tx, owner, request)?;
        }
        if let Some(lawyer) = &lawyer {
          insert_lawyer(&tx, lawyer)?;
          set_lawyer(&tx, row.user_id.as_str(), lawyer.lawyer_id)?;
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    Ok(conflict.map_or(Ok(profile), Err))
  }
}

// ─── DashboardStore impl ─────────────────────────────────────────────────────

/// Undecoded result of a snapshot read.
struct RawSnapshot {
  cases:          Vec<RawCase>,
  documents:      Vec<RawDocument>,
  counts:         Vec<(String, i64)>,
  document_count: i64,
  outstanding:    i64,
  lawyer:         Option<RawLawyer>,
}

fn select_case_counts(conn: &Connection, owner: &str) -> rusqlite::Result<Vec<(String, i64)>> {
  let mut stmt =
    conn.prepare("SELECT status, COUNT(*) FROM cases WHERE owner_id = ?1 GROUP BY status")?;
  let rows = stmt
    .query_map(rusqlite::params![owner], |r| Ok((r.get(0)?, r.get(1)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn decode_counts(counts: Vec<(String, i64)>) -> Result<CaseStats> {
  let pairs = counts
    .into_iter()
    .map(|(status, n)| Ok((decode_enum::<CaseStatus>("cases.status", &status)?, sql_count(n))))
    .collect::<Result<Vec<_>>>()?;
  Ok(CaseStats::from_counts(pairs))
}

impl DashboardStore for SqliteStore {
  type Error = Error;

  async fn snapshot(
    &self,
    owner: UserId,
    window: SummaryWindow,
  ) -> Result<Option<DashboardSnapshot>> {
    let owner_str    = owner.to_string();
    let completed    = CaseStatus::Completed.as_ref().to_owned();
    let paid         = InvoiceStatus::Paid.as_ref().to_owned();
    let case_limit   = sql_int(window.cases);
    let doc_limit    = sql_int(window.documents);

    // Every read below runs inside one transaction: a single point-in-time
    // view of this owner's rows.
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !owner_exists(&tx, &owner_str)? {
          return Ok(None);
        }

        let lawyer = tx
          .query_row(
            "SELECT l.name, l.avatar, l.is_online
             FROM profiles p JOIN lawyers l ON l.lawyer_id = p.lawyer_id
             WHERE p.user_id = ?1",
            rusqlite::params![owner_str],
            RawLawyer::from_row,
          )
          .optional()?;

        let cases = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {CASE_COLUMNS} FROM cases
             WHERE owner_id = ?1 AND status != ?2
             ORDER BY updated_at DESC, case_id
             LIMIT ?3"
          ))?;
          stmt
            .query_map(
              rusqlite::params![owner_str, completed, case_limit],
              RawCase::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let documents = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE owner_id = ?1
             ORDER BY created_at DESC, document_id
             LIMIT ?2"
          ))?;
          stmt
            .query_map(rusqlite::params![owner_str, doc_limit], RawDocument::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let counts = select_case_counts(&tx, &owner_str)?;

        let document_count: i64 = tx.query_row(
          "SELECT COUNT(*) FROM documents WHERE owner_id = ?1",
          rusqlite::params![owner_str],
          |r| r.get(0),
        )?;

        let outstanding: i64 = tx.query_row(
          "SELECT COUNT(*) FROM invoices WHERE owner_id = ?1 AND status != ?2",
          rusqlite::params![owner_str, paid],
          |r| r.get(0),
        )?;

        tx.commit()?;
        Ok(Some(RawSnapshot { cases, documents, counts, document_count, outstanding, lawyer }))
      })
      .await?;

    let Some(raw) = raw else {
      return Ok(None);
    };

    Ok(Some(DashboardSnapshot {
      active_cases:         raw
        .cases
        .into_iter()
        .map(RawCase::into_case)
        .collect::<Result<_>>()?,
      recent_documents:     raw
        .documents
        .into_iter()
        .map(RawDocument::into_document)
        .collect::<Result<_>>()?,
      case_counts:          decode_counts(raw.counts)?,
      document_count:       sql_count(raw.document_count),
      outstanding_invoices: sql_count(raw.outstanding),
      lawyer:               raw.lawyer.map(RawLawyer::into_assigned),
    }))
  }

  async fn case_counts(&self, owner: UserId) -> Result<Option<CaseStats>> {
    let owner_str = owner.to_string();
    let counts = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !owner_exists(&tx, &owner_str)? {
          return Ok(None);
        }
        let counts = select_case_counts(&tx, &owner_str)?;
        tx.commit()?;
        Ok(Some(counts))
      })
      .await?;

    counts.map(decode_counts).transpose()
  }

  async fn list_cases(
    &self,
    owner: UserId,
    active_only: bool,
    page: Page,
  ) -> Result<Option<Vec<CaseSummary>>> {
    let owner_str = owner.to_string();
    let completed = CaseStatus::Completed.as_ref().to_owned();
    let limit     = sql_int(page.limit);
    let offset    = sql_int(page.offset);

    let raws = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !owner_exists(&tx, &owner_str)? {
          return Ok(None);
        }
        let rows = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {CASE_COLUMNS} FROM cases
             WHERE owner_id = ?1 AND (?2 = 0 OR status != ?3)
             ORDER BY updated_at DESC, case_id
             LIMIT ?4 OFFSET ?5"
          ))?;
          stmt
            .query_map(
              rusqlite::params![owner_str, active_only, completed, limit, offset],
              RawCase::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok(Some(rows))
      })
      .await?;

    raws
      .map(|rows| rows.into_iter().map(RawCase::into_case).collect())
      .transpose()
  }

  async fn list_documents(
    &self,
    owner: UserId,
    page: Page,
  ) -> Result<Option<Vec<DocumentSummary>>> {
    let owner_str = owner.to_string();
    let limit     = sql_int(page.limit);
    let offset    = sql_int(page.offset);

    let raws = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !owner_exists(&tx, &owner_str)? {
          return Ok(None);
        }
        let rows = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE owner_id = ?1
             ORDER BY created_at DESC, document_id
             LIMIT ?2 OFFSET ?3"
          ))?;
          stmt
            .query_map(rusqlite::params![owner_str, limit, offset], RawDocument::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok(Some(rows))
      })
      .await?;

    raws
      .map(|rows| rows.into_iter().map(RawDocument::into_document).collect())
      .transpose()
  }

  async fn list_invoices(&self, owner: UserId, page: Page) -> Result<Option<Vec<Invoice>>> {
    let owner_str = owner.to_string();
    let limit     = sql_int(page.limit);
    let offset    = sql_int(page.offset);

    let raws = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !owner_exists(&tx, &owner_str)? {
          return Ok(None);
        }
        let rows = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices
             WHERE owner_id = ?1
             ORDER BY issued_on DESC, created_at DESC
             LIMIT ?2 OFFSET ?3"
          ))?;
          stmt
            .query_map(rusqlite::params![owner_str, limit, offset], RawInvoice::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok(Some(rows))
      })
      .await?;

    raws
      .map(|rows| rows.into_iter().map(RawInvoice::into_invoice).collect())
      .transpose()
  }

  async fn list_requests(
    &self,
    owner: UserId,
    status: Option<RequestStatus>,
    page: Page,
  ) -> Result<Option<Vec<ServiceRequest>>> {
    let owner_str  = owner.to_string();
    let status_str = status.map(|s| s.as_ref().to_owned());
    let limit      = sql_int(page.limit);
    let offset     = sql_int(page.offset);

    let raws = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !owner_exists(&tx, &owner_str)? {
          return Ok(None);
        }
        let rows = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {REQUEST_COLUMNS} FROM service_requests
             WHERE owner_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY updated_at DESC, request_id
             LIMIT ?3 OFFSET ?4"
          ))?;
          stmt
            .query_map(
              rusqlite::params![owner_str, status_str, limit, offset],
              RawRequest::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok(Some(rows))
      })
      .await?;

    raws
      .map(|rows| rows.into_iter().map(RawRequest::into_request).collect())
      .transpose()
  }
}

// ─── CredentialStore impl ────────────────────────────────────────────────────

impl CredentialStore for SqliteStore {
  type Error = Error;

  async fn create_account(
    &self,
    input: NewProfile,
    password_hash: String,
  ) -> Result<Result<UserProfile, ProfileConflict>> {
    let profile = new_profile(input, Utc::now());
    let row = profile.clone();

    let conflict = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(conflict) = insert_profile(&tx, &row)? {
          return Ok(Some(conflict));
        }
        upsert_password(&tx, row.user_id.as_str(), &password_hash, row.created_at)?;
        tx.commit()?;
        Ok(None)
      })
      .await?;

    Ok(conflict.map_or(Ok(profile), Err))
  }

  async fn set_password_hash(&self, user_id: UserId, password_hash: String) -> Result<bool> {
    let user_str = user_id.to_string();
    let at       = Utc::now();

    let stored = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !owner_exists(&tx, &user_str)? {
          return Ok(false);
        }
        upsert_password(&tx, &user_str, &password_hash, at)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(stored)
  }

  async fn credentials_for(&self, email: String) -> Result<Option<LoginRecord>> {
    let email = email.trim().to_owned();
    let row: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT p.user_id, c.password_hash
               FROM profiles p JOIN credentials c ON c.user_id = p.user_id
               WHERE p.email = ?1",
              rusqlite::params![email],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(row.map(|(user_id, password_hash)| LoginRecord {
      user_id: UserId::from(user_id),
      password_hash,
    }))
  }

  async fn store_token(&self, token: StoredToken) -> Result<()> {
    let user_str   = token.user_id.to_string();
    let kind_str   = token.kind.as_ref().to_owned();
    let issued_str = encode_dt(token.issued_at);
    let exp_str    = encode_dt(token.expires_at);
    let now_str    = encode_dt(Utc::now());
    let digest     = token.digest;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM tokens WHERE expires_at <= ?1", rusqlite::params![now_str])?;
        tx.execute(
          "INSERT INTO tokens (digest, user_id, kind, issued_at, expires_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![digest, user_str, kind_str, issued_str, exp_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn resolve_token(
    &self,
    digest: String,
    kind: TokenKind,
    now: DateTime<Utc>,
  ) -> Result<Option<UserId>> {
    let kind_str = kind.as_ref().to_owned();
    let now_str  = encode_dt(now);

    let user: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id FROM tokens
               WHERE digest = ?1 AND kind = ?2 AND expires_at > ?3",
              rusqlite::params![digest, kind_str, now_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(user.map(UserId::from))
  }

  async fn revoke_token(&self, digest: String) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM tokens WHERE digest = ?1", rusqlite::params![digest])?)
      })
      .await?;
    Ok(changed > 0)
  }
}

#[cfg(test)]
pub(crate) async fn backdate_case(store: &SqliteStore, case_id: Uuid, at: DateTime<Utc>) {
  let id_str = encode_uuid(case_id);
  let at_str = encode_dt(at);
  store
    .conn
    .call(move |conn| {
      conn.execute(
        "UPDATE cases SET updated_at = ?2 WHERE case_id = ?1",
        rusqlite::params![id_str, at_str],
      )?;
      Ok(())
    })
    .await
    .unwrap();
}

#[cfg(test)]
pub(crate) async fn backdate_document(store: &SqliteStore, id: Uuid, at: DateTime<Utc>) {
  let id_str = encode_uuid(id);
  let at_str = encode_dt(at);
  store
    .conn
    .call(move |conn| {
      conn.execute(
        "UPDATE documents SET created_at = ?2 WHERE document_id = ?1",
        rusqlite::params![id_str, at_str],
      )?;
      Ok(())
    })
    .await
    .unwrap();
}

#[cfg(test)]
pub(crate) async fn backdate_request(store: &SqliteStore, id: Uuid, at: DateTime<Utc>) {
  let id_str = encode_uuid(id);
  let at_str = encode_dt(at);
  store
    .conn
    .call(move |conn| {
      conn.execute(
        "UPDATE service_requests SET updated_at = ?2 WHERE request_id = ?1",
        rusqlite::params![id_str, at_str],
      )?;
      Ok(())
    })
    .await
    .unwrap();
}

/// Rows in `table`, for tests that need to see past the trait surface.
#[cfg(test)]
pub(crate) async fn row_count(store: &SqliteStore, table: &'static str) -> i64 {
  store
    .conn
    .call(move |conn| {
      Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
    })
    .await
    .unwrap()
}
