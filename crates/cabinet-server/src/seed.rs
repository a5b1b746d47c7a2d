//! Startup seeding of the demo account.
//!
//! The demo profile and its records are imported in one transaction, so a
//! crash mid-seed leaves nothing behind and the next start tries again. Once
//! the profile exists, later starts leave everything alone. The demo password,
//! when configured, is (re)applied on every start so the config file stays
//! authoritative.

use cabinet_core::{
  billing::{InvoiceStatus, NewInvoice},
  case::{CaseStatus, NewCase, Progress},
  document::{DocumentStatus, DocumentType, NewDocument},
  lawyer::NewLawyer,
  profile::{NewProfile, ProfileConflict, SubscriptionStatus, UserId},
  request::{NewServiceRequest, RequestStatus},
  store::{AccountSeed, CredentialStore, RecordStore},
};
use chrono::{Duration, Utc};

/// Seed the demo account. Returns `true` if records were written.
pub async fn seed_demo<S>(
  store: &S,
  demo_user_id: &UserId,
  demo_password: Option<&str>,
) -> anyhow::Result<bool>
where
  S: RecordStore + CredentialStore,
{
  let fresh = match store.import_account(demo_account(demo_user_id)?).await? {
    Ok(_) => {
      tracing::info!(user_id = %demo_user_id, "seeded demo account");
      true
    }
    Err(ProfileConflict::IdTaken(_)) => {
      tracing::debug!(user_id = %demo_user_id, "demo account already present");
      false
    }
    Err(ProfileConflict::EmailTaken(email)) => {
      tracing::warn!(
        user_id = %demo_user_id,
        %email,
        "demo email belongs to another account, skipping seed"
      );
      false
    }
  };

  if let Some(password) = demo_password {
    let hash = cabinet_api::auth::hash_password(password.to_owned()).await?;
    if !store.set_password_hash(demo_user_id.clone(), hash).await? {
      tracing::warn!(user_id = %demo_user_id, "no demo account to set a password on");
    }
  }

  Ok(fresh)
}

fn demo_account(owner: &UserId) -> anyhow::Result<AccountSeed> {
  let now = Utc::now();
  let mut profile = NewProfile::new("demo@baa-legal.ru", "Александр", "Иванов");
  profile.user_id = Some(owner.clone());
  profile.phone = Some("+79998887766".into());
  profile.company_name = Some("ООО «Инновации»".into());
  profile.subscription_status = SubscriptionStatus::Active;
  profile.subscription_expires_at = Some(now + Duration::days(30));
  let mut seed = AccountSeed::new(profile);

  let cases = [
    ("Налоговая проверка", "Налоги", CaseStatus::InProgress, 45),
    ("Регистрация товарного знака", "IP", CaseStatus::InProgress, 80),
    ("Консультация по налогообложению", "Консультации", CaseStatus::Completed, 100),
  ];
  for (title, category, status, percent) in cases {
    let mut case = NewCase::new(owner.clone(), title, category);
    case.status = status;
    case.progress = Progress::new(percent)?;
    seed.cases.push(case);
  }

  let documents = [
    ("Договор поставки.docx", DocumentType::Contract, DocumentStatus::Draft, "Договоры"),
    ("Претензия.pdf", DocumentType::Claim, DocumentStatus::Review, "Споры"),
  ];
  seed.documents = documents
    .into_iter()
    .map(|(name, doc_type, status, category)| NewDocument {
      owner_id: owner.clone(),
      name: name.to_owned(),
      doc_type,
      status,
      category: category.to_owned(),
    })
    .collect();

  seed.invoices.push(NewInvoice {
    owner_id:    owner.clone(),
    number:      "INV-0001".to_owned(),
    description: "Оплата тарифа «Оптимальный»".to_owned(),
    amount:      45_000,
    status:      InvoiceStatus::Unpaid,
    issued_on:   now.date_naive(),
  });

  let requests = [
    ("Регистрация ООО \"Вектор\"", "Регистрация бизнеса", RequestStatus::InProgress, 15_000),
    ("Проверка договора аренды", "Юридическая экспертиза", RequestStatus::Pending, 5_000),
    ("Консультация по налогообложению", "Консультация", RequestStatus::Done, 3_000),
  ];
  seed.requests = requests
    .into_iter()
    .map(|(title, service_type, status, price)| NewServiceRequest {
      owner_id: owner.clone(),
      title: title.to_owned(),
      service_type: service_type.to_owned(),
      status,
      price: Some(price),
    })
    .collect();

  seed.lawyer = Some(NewLawyer {
    name:      "Анна Смирнова".to_owned(),
    avatar:    Some("/avatars/lawyer-1.jpg".to_owned()),
    is_online: true,
  });

  Ok(seed)
}
