//! Integration tests for `SqliteStore` against an in-memory database.

use cabinet_core::{
  auth::{StoredToken, TokenKind},
  billing::{InvoiceStatus, NewInvoice},
  case::{CaseStatus, CaseUpdate, NewCase, Progress},
  dashboard::SummaryWindow,
  document::{DocumentStatus, DocumentType, NewDocument},
  lawyer::NewLawyer,
  profile::{NewProfile, ProfileConflict, ProfilePatch, SubscriptionStatus, UserId},
  request::{NewServiceRequest, RequestStatus},
  store::{AccountSeed, CredentialStore, DashboardStore, Page, ProfileStore, RecordStore},
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::{
  Error, SqliteStore,
  store::{backdate_case, backdate_document, backdate_request, row_count},
};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, id: &str, email: &str) -> UserId {
  let mut input = NewProfile::new(email, "Александр", "Иванов");
  input.user_id = Some(UserId::from(id));
  s.create_profile(input).await.unwrap().unwrap().user_id
}

fn progress(p: u8) -> Progress { Progress::new(p).unwrap() }

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_profile() {
  let s = store().await;
  let mut input = NewProfile::new("demo@baa-legal.ru", "Александр", "Иванов");
  input.user_id = Some(UserId::from("demo-user-id"));
  input.phone = Some("+79998887766".into());
  input.subscription_status = SubscriptionStatus::Active;

  let created = s.create_profile(input).await.unwrap().unwrap();
  let fetched = s.get_profile(created.user_id.clone()).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.subscription_status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn get_profile_missing_returns_none() {
  let s = store().await;
  assert!(s.get_profile(UserId::from("ghost")).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_id_and_email_are_rejected() {
  let s = store().await;
  user(&s, "u1", "a@example.ru").await;

  let mut same_id = NewProfile::new("b@example.ru", "Иван", "Петров");
  same_id.user_id = Some(UserId::from("u1"));
  assert_eq!(
    s.create_profile(same_id).await.unwrap(),
    Err(ProfileConflict::IdTaken(UserId::from("u1")))
  );

  let same_email = NewProfile::new("A@EXAMPLE.RU", "Иван", "Петров");
  assert_eq!(
    s.create_profile(same_email).await.unwrap(),
    Err(ProfileConflict::EmailTaken("A@EXAMPLE.RU".into()))
  );
  assert_eq!(row_count(&s, "profiles").await, 1);
}

#[tokio::test]
async fn update_profile_touches_only_supplied_fields() {
  let s = store().await;
  let mut input = NewProfile::new("a@example.ru", "Александр", "Иванов");
  input.phone = Some("+79998887766".into());
  input.company_name = Some("ООО «Инновации»".into());
  let before = s.create_profile(input).await.unwrap().unwrap();

  let patch = ProfilePatch {
    first_name: Some("Пётр".into()),
    company_name: Some(None),
    ..Default::default()
  };
  let after = s
    .update_profile(before.user_id.clone(), patch)
    .await
    .unwrap()
    .unwrap();

  assert_eq!(after.first_name, "Пётр");
  assert_eq!(after.company_name, None);
  assert_eq!(after.phone, before.phone);
  assert_eq!(after.last_name, before.last_name);
  assert_eq!(after.created_at, before.created_at);
}

#[tokio::test]
async fn subscription_expiry_can_be_cleared() {
  let s = store().await;
  let mut input = NewProfile::new("a@example.ru", "Александр", "Иванов");
  input.subscription_status = SubscriptionStatus::Active;
  input.subscription_expires_at = Some(Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap());
  let before = s.create_profile(input).await.unwrap().unwrap();

  // Untouched expiry survives an unrelated edit.
  let patch = ProfilePatch { last_name: Some("Петров".into()), ..Default::default() };
  let kept = s.update_profile(before.user_id.clone(), patch).await.unwrap().unwrap();
  assert_eq!(kept.subscription_expires_at, before.subscription_expires_at);

  let patch = ProfilePatch { subscription_expires_at: Some(None), ..Default::default() };
  let cleared = s.update_profile(before.user_id.clone(), patch).await.unwrap().unwrap();
  assert_eq!(cleared.subscription_expires_at, None);
  assert_eq!(cleared.subscription_status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn update_unknown_profile_returns_none() {
  let s = store().await;
  let patch = ProfilePatch { first_name: Some("X".into()), ..Default::default() };
  assert!(s.update_profile(UserId::from("ghost"), patch).await.unwrap().is_none());
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn records_require_an_existing_owner() {
  let s = store().await;
  let ghost = UserId::from("ghost");

  let err = s
    .record_case(NewCase::new(ghost.clone(), "Дело", "Договоры"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ProfileNotFound(_)));

  let err = s
    .record_document(NewDocument {
      owner_id: ghost,
      name:     "a.pdf".into(),
      doc_type: DocumentType::Pdf,
      status:   DocumentStatus::Draft,
      category: "Договоры".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ProfileNotFound(_)));
}

#[tokio::test]
async fn case_progress_only_moves_forward() {
  let s = store().await;
  let owner = user(&s, "u1", "a@example.ru").await;
  let case = s
    .record_case(NewCase::new(owner, "Регистрация ООО", "Регистрация"))
    .await
    .unwrap();

  let advanced = s
    .advance_case(case.id, CaseUpdate {
      progress: progress(65),
      status:   Some(CaseStatus::InProgress),
    })
    .await
    .unwrap();
  assert_eq!(advanced.progress.get(), 65);
  assert_eq!(advanced.status, CaseStatus::InProgress);
  assert!(advanced.updated_at >= case.updated_at);

  let err = s
    .advance_case(case.id, CaseUpdate { progress: progress(30), status: None })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::ProgressRegression { current: 65, requested: 30, .. }
  ));

  // Same value is not a regression; status stays when omitted.
  let same = s
    .advance_case(case.id, CaseUpdate { progress: progress(65), status: None })
    .await
    .unwrap();
  assert_eq!(same.status, CaseStatus::InProgress);
}

#[tokio::test]
async fn advance_unknown_case_is_not_found() {
  let s = store().await;
  let err = s
    .advance_case(Uuid::new_v4(), CaseUpdate { progress: progress(10), status: None })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CaseNotFound(_)));
}

#[tokio::test]
async fn zero_amount_invoice_is_rejected() {
  let s = store().await;
  let owner = user(&s, "u1", "a@example.ru").await;
  let err = s
    .record_invoice(NewInvoice {
      owner_id:    owner,
      number:      "INV-1".into(),
      description: "Консультация".into(),
      amount:      0,
      status:      InvoiceStatus::Unpaid,
      issued_on:   NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(cabinet_core::Error::Validation { field: "amount", .. })));
}

#[tokio::test]
async fn assign_lawyer_checks_both_sides() {
  let s = store().await;
  let owner = user(&s, "u1", "a@example.ru").await;
  let lawyer = s
    .add_lawyer(NewLawyer { name: "Анна Смирнова".into(), avatar: None, is_online: true })
    .await
    .unwrap();

  assert!(matches!(
    s.assign_lawyer(owner.clone(), Uuid::new_v4()).await,
    Err(Error::LawyerNotFound(_))
  ));
  assert!(matches!(
    s.assign_lawyer(UserId::from("ghost"), lawyer.lawyer_id).await,
    Err(Error::ProfileNotFound(_))
  ));
  s.assign_lawyer(owner, lawyer.lawyer_id).await.unwrap();
}

fn seed_profile(id: &str, email: &str) -> NewProfile {
  let mut input = NewProfile::new(email, "Александр", "Иванов");
  input.user_id = Some(UserId::from(id));
  input
}

fn seed_request(owner: &UserId, title: &str, status: RequestStatus) -> NewServiceRequest {
  NewServiceRequest {
    owner_id: owner.clone(),
    title: title.into(),
    service_type: "Консультация".into(),
    status,
    price: Some(3_000),
  }
}

#[tokio::test]
async fn import_writes_the_whole_account() {
  let s = store().await;
  let owner = UserId::from("demo");
  let mut seed = AccountSeed::new(seed_profile("demo", "demo@example.ru"));
  seed.cases.push(NewCase::new(owner.clone(), "Дело", "Договоры"));
  seed.requests.push(seed_request(&owner, "Проверка договора", RequestStatus::Pending));
  seed.lawyer = Some(NewLawyer { name: "Анна Смирнова".into(), avatar: None, is_online: true });

  let profile = s.import_account(seed.clone()).await.unwrap().unwrap();
  assert_eq!(profile.user_id, owner);
  assert_eq!(s.case_counts(owner.clone()).await.unwrap().unwrap().total(), 1);
  let snap = s.snapshot(owner.clone(), SummaryWindow::default()).await.unwrap().unwrap();
  assert_eq!(snap.lawyer.unwrap().name, "Анна Смирнова");

  // A second import of the same account writes nothing.
  assert_eq!(
    s.import_account(seed).await.unwrap(),
    Err(ProfileConflict::IdTaken(owner.clone()))
  );
  assert_eq!(row_count(&s, "cases").await, 1);
  assert_eq!(row_count(&s, "service_requests").await, 1);
  assert_eq!(row_count(&s, "lawyers").await, 1);
}

#[tokio::test]
async fn failed_import_leaves_nothing_behind() {
  let s = store().await;
  let owner = UserId::from("demo");
  let mut seed = AccountSeed::new(seed_profile("demo", "demo@example.ru"));
  seed.cases.push(NewCase::new(owner.clone(), "Дело", "Договоры"));
  // The foreign key on this row fails after the profile and case are written.
  seed.documents.push(NewDocument {
    owner_id: UserId::from("ghost"),
    name:     "doc.pdf".into(),
    doc_type: DocumentType::Pdf,
    status:   DocumentStatus::Review,
    category: "Договоры".into(),
  });

  assert!(matches!(s.import_account(seed).await, Err(Error::Database(_))));
  assert!(s.get_profile(owner).await.unwrap().is_none());
  assert_eq!(row_count(&s, "cases").await, 0);
}

#[tokio::test]
async fn requests_require_an_existing_owner() {
  let s = store().await;
  let err = s
    .record_request(seed_request(&UserId::from("ghost"), "Дело", RequestStatus::Pending))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ProfileNotFound(_)));
}

// ─── Dashboard reads ─────────────────────────────────────────────────────────

async fn seeded() -> (SqliteStore, UserId, UserId) {
  let s = store().await;
  let alice = user(&s, "alice", "alice@example.ru").await;
  let bob = user(&s, "bob", "bob@example.ru").await;
  let base = Utc.with_ymd_and_hms(2025, 1, 20, 9, 0, 0).unwrap();

  let statuses = [
    CaseStatus::InProgress,
    CaseStatus::Completed,
    CaseStatus::New,
    CaseStatus::OnHold,
    CaseStatus::Completed,
  ];
  for (i, status) in statuses.into_iter().enumerate() {
    let mut input = NewCase::new(alice.clone(), format!("case {i}"), "Договоры");
    input.status = status;
    let case = s.record_case(input).await.unwrap();
    backdate_case(&s, case.id, base + Duration::hours(i as i64)).await;
  }

  for i in 0..3 {
    let doc = s
      .record_document(NewDocument {
        owner_id: alice.clone(),
        name:     format!("doc-{i}.pdf"),
        doc_type: DocumentType::Pdf,
        status:   DocumentStatus::Review,
        category: "Договоры".into(),
      })
      .await
      .unwrap();
    backdate_document(&s, doc.id, base + Duration::minutes(i)).await;
  }

  for (n, status) in [InvoiceStatus::Unpaid, InvoiceStatus::Paid, InvoiceStatus::Pending]
    .into_iter()
    .enumerate()
  {
    s.record_invoice(NewInvoice {
      owner_id:    alice.clone(),
      number:      format!("INV-{n}"),
      description: "Абонентское обслуживание".into(),
      amount:      45_000,
      status,
      issued_on:   NaiveDate::from_ymd_opt(2025, 1, 1 + n as u32).unwrap(),
    })
    .await
    .unwrap();
  }

  let lawyer = s
    .add_lawyer(NewLawyer {
      name:      "Анна Смирнова".into(),
      avatar:    Some("/avatars/lawyer-1.jpg".into()),
      is_online: true,
    })
    .await
    .unwrap();
  s.assign_lawyer(alice.clone(), lawyer.lawyer_id).await.unwrap();

  s.record_case(NewCase::new(bob.clone(), "bob's case", "Судебные"))
    .await
    .unwrap();

  for (i, status) in
    [RequestStatus::Done, RequestStatus::InProgress, RequestStatus::Pending, RequestStatus::InProgress]
      .into_iter()
      .enumerate()
  {
    let request = s
      .record_request(seed_request(&alice, &format!("request {i}"), status))
      .await
      .unwrap();
    backdate_request(&s, request.id, base + Duration::hours(i as i64)).await;
  }

  (s, alice, bob)
}

#[tokio::test]
async fn snapshot_reads_one_owner_consistently() {
  let (s, alice, _) = seeded().await;
  let snap = s
    .snapshot(alice.clone(), SummaryWindow { cases: 2, documents: 2 })
    .await
    .unwrap()
    .unwrap();

  let titles: Vec<_> = snap.active_cases.iter().map(|c| c.title.as_str()).collect();
  assert_eq!(titles, ["case 3", "case 2"]);
  let names: Vec<_> = snap.recent_documents.iter().map(|d| d.name.as_str()).collect();
  assert_eq!(names, ["doc-2.pdf", "doc-1.pdf"]);

  assert_eq!(snap.case_counts.total(), 5);
  assert_eq!(snap.case_counts.get(CaseStatus::Completed), 2);
  assert_eq!(snap.case_counts.get(CaseStatus::New), 1);
  assert_eq!(snap.document_count, 3);
  assert_eq!(snap.outstanding_invoices, 2);
  let lawyer = snap.lawyer.unwrap();
  assert_eq!(lawyer.name, "Анна Смирнова");
  assert!(lawyer.is_online);
  assert!(snap.active_cases.iter().all(|c| c.owner_id.as_ref() == Some(&alice)));
}

#[tokio::test]
async fn snapshot_of_sparse_owner() {
  let (s, _, bob) = seeded().await;
  let snap = s.snapshot(bob, SummaryWindow::default()).await.unwrap().unwrap();
  assert_eq!(snap.active_cases.len(), 1);
  assert!(snap.recent_documents.is_empty());
  assert_eq!(snap.case_counts.total(), 1);
  assert_eq!(snap.case_counts.get(CaseStatus::Completed), 0);
  assert_eq!(snap.outstanding_invoices, 0);
  assert!(snap.lawyer.is_none());
}

#[tokio::test]
async fn unknown_owner_reads_return_none() {
  let (s, ..) = seeded().await;
  let ghost = UserId::from("ghost");
  assert!(s.snapshot(ghost.clone(), SummaryWindow::default()).await.unwrap().is_none());
  assert!(s.case_counts(ghost.clone()).await.unwrap().is_none());
  assert!(s.list_cases(ghost.clone(), false, Page::default()).await.unwrap().is_none());
  assert!(s.list_documents(ghost.clone(), Page::default()).await.unwrap().is_none());
  assert!(s.list_invoices(ghost, Page::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn listings_filter_and_page() {
  let (s, alice, _) = seeded().await;

  let active = s
    .list_cases(alice.clone(), true, Page::default())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(active.len(), 3);
  assert!(active.iter().all(|c| c.status.is_active()));

  let page = s
    .list_cases(alice.clone(), false, Page::new(Some(2), Some(1)))
    .await
    .unwrap()
    .unwrap();
  let titles: Vec<_> = page.iter().map(|c| c.title.as_str()).collect();
  assert_eq!(titles, ["case 3", "case 2"]);

  let invoices = s
    .list_invoices(alice.clone(), Page::default())
    .await
    .unwrap()
    .unwrap();
  let numbers: Vec<_> = invoices.iter().map(|i| i.number.as_str()).collect();
  assert_eq!(numbers, ["INV-2", "INV-1", "INV-0"]);

  let docs = s
    .list_documents(alice, Page::new(Some(1), Some(5)))
    .await
    .unwrap()
    .unwrap();
  assert!(docs.is_empty());
}

#[tokio::test]
async fn request_listing_filters_by_status_newest_first() {
  let (s, alice, bob) = seeded().await;

  let all = s.list_requests(alice.clone(), None, Page::default()).await.unwrap().unwrap();
  let titles: Vec<_> = all.iter().map(|r| r.title.as_str()).collect();
  assert_eq!(titles, ["request 3", "request 2", "request 1", "request 0"]);
  assert_eq!(all[0].price, Some(3_000));

  let working = s
    .list_requests(alice.clone(), Some(RequestStatus::InProgress), Page { limit: 1, offset: 1 })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(working.len(), 1);
  assert_eq!(working[0].title, "request 1");

  assert!(s.list_requests(bob, None, Page::default()).await.unwrap().unwrap().is_empty());
  assert!(s.list_requests(UserId::from("ghost"), None, Page::default()).await.unwrap().is_none());
}

// ─── Credentials ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn password_hash_round_trips_by_email() {
  let s = store().await;
  let id = user(&s, "u1", "a@example.ru").await;

  assert!(s.set_password_hash(id.clone(), "$argon2id$v=19$one".into()).await.unwrap());
  assert!(s.set_password_hash(id.clone(), "$argon2id$v=19$two".into()).await.unwrap());
  assert!(!s.set_password_hash(UserId::from("ghost"), "x".into()).await.unwrap());

  let record = s.credentials_for("A@example.ru".into()).await.unwrap().unwrap();
  assert_eq!(record.user_id, id);
  assert_eq!(record.password_hash, "$argon2id$v=19$two");

  assert!(s.credentials_for("nobody@example.ru".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn create_account_writes_profile_and_password_together() {
  let s = store().await;
  let profile = s
    .create_account(seed_profile("u1", "a@example.ru"), "$argon2id$v=19$one".into())
    .await
    .unwrap()
    .unwrap();
  let record = s.credentials_for("a@example.ru".into()).await.unwrap().unwrap();
  assert_eq!(record.user_id, profile.user_id);

  let conflict = s
    .create_account(seed_profile("u2", "A@example.ru"), "$argon2id$v=19$two".into())
    .await
    .unwrap();
  assert_eq!(conflict, Err(ProfileConflict::EmailTaken("A@example.ru".into())));
  assert_eq!(row_count(&s, "credentials").await, 1);
  assert!(s.get_profile(UserId::from("u2")).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_accounts_for_one_email_conflict_cleanly() {
  let s = store().await;
  let (a, b) = tokio::join!(
    s.create_account(seed_profile("u1", "race@example.ru"), "h1".into()),
    s.create_account(seed_profile("u2", "race@example.ru"), "h2".into()),
  );
  let outcomes = [a.unwrap(), b.unwrap()];
  assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
  assert!(
    outcomes
      .iter()
      .any(|o| matches!(o, Err(ProfileConflict::EmailTaken(_))))
  );
  assert_eq!(row_count(&s, "profiles").await, 1);
}

#[tokio::test]
async fn storing_a_token_purges_expired_ones() {
  let s = store().await;
  let id = user(&s, "u1", "a@example.ru").await;
  let now = Utc::now();
  let token = |digest: &str, expires_at| StoredToken {
    digest: digest.into(),
    user_id: id.clone(),
    kind: TokenKind::Refresh,
    issued_at: now - Duration::days(30),
    expires_at,
  };

  s.store_token(token("stale-1", now - Duration::days(1))).await.unwrap();
  s.store_token(token("stale-2", now - Duration::minutes(1))).await.unwrap();
  assert_eq!(row_count(&s, "tokens").await, 1);

  s.store_token(token("live", now + Duration::days(14))).await.unwrap();
  assert_eq!(row_count(&s, "tokens").await, 1);
  assert!(!s.revoke_token("stale-1".into()).await.unwrap());

  assert!(s.revoke_token("live".into()).await.unwrap());
  assert_eq!(row_count(&s, "tokens").await, 0);
}

#[tokio::test]
async fn tokens_resolve_by_kind_expiry_and_revocation() {
  let s = store().await;
  let id = user(&s, "u1", "a@example.ru").await;
  let now = Utc::now();

  s.store_token(StoredToken {
    digest:     "d-access".into(),
    user_id:    id.clone(),
    kind:       TokenKind::Access,
    issued_at:  now,
    expires_at: now + Duration::minutes(60),
  })
  .await
  .unwrap();

  let resolved = s
    .resolve_token("d-access".into(), TokenKind::Access, now)
    .await
    .unwrap();
  assert_eq!(resolved, Some(id.clone()));

  // Wrong kind, or past expiry, does not resolve.
  assert!(s.resolve_token("d-access".into(), TokenKind::Refresh, now).await.unwrap().is_none());
  let later = now + Duration::minutes(61);
  assert!(s.resolve_token("d-access".into(), TokenKind::Access, later).await.unwrap().is_none());

  assert!(s.revoke_token("d-access".into()).await.unwrap());
  assert!(!s.revoke_token("d-access".into()).await.unwrap());
  assert!(s.resolve_token("d-access".into(), TokenKind::Access, now).await.unwrap().is_none());
}
