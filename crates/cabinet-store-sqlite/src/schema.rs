//! SQL schema for the cabinet SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS lawyers (
    lawyer_id  TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    avatar     TEXT,
    is_online  INTEGER NOT NULL DEFAULT 0
);

-- Profiles are never deleted; deactivation is a subscription status change.
CREATE TABLE IF NOT EXISTS profiles (
    user_id                 TEXT PRIMARY KEY,
    email                   TEXT NOT NULL UNIQUE COLLATE NOCASE,
    first_name              TEXT NOT NULL,
    last_name               TEXT NOT NULL,
    phone                   TEXT,
    company_name            TEXT,
    inn                     TEXT,
    subscription_status     TEXT NOT NULL,  -- 'ACTIVE' | 'EXPIRED' | 'TRIAL' | 'CANCELED'
    subscription_expires_at TEXT,
    created_at              TEXT NOT NULL,
    lawyer_id               TEXT REFERENCES lawyers(lawyer_id)
);

CREATE TABLE IF NOT EXISTS cases (
    case_id    TEXT PRIMARY KEY,
    owner_id   TEXT NOT NULL REFERENCES profiles(user_id),
    title      TEXT NOT NULL,
    category   TEXT NOT NULL,
    status     TEXT NOT NULL,   -- 'NEW' | 'IN_PROGRESS' | 'ON_HOLD' | 'COMPLETED'
    progress   INTEGER NOT NULL CHECK (progress BETWEEN 0 AND 100),
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    document_id TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL REFERENCES profiles(user_id),
    name        TEXT NOT NULL,
    doc_type    TEXT NOT NULL,
    status      TEXT NOT NULL,  -- 'DRAFT' | 'REVIEW' | 'SIGNED'
    category    TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS invoices (
    invoice_id  TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL REFERENCES profiles(user_id),
    number      TEXT NOT NULL,
    description TEXT NOT NULL,
    amount      INTEGER NOT NULL CHECK (amount > 0),
    status      TEXT NOT NULL,  -- 'UNPAID' | 'PENDING' | 'PAID'
    issued_on   TEXT NOT NULL,  -- YYYY-MM-DD
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS service_requests (
    request_id   TEXT PRIMARY KEY,
    owner_id     TEXT NOT NULL REFERENCES profiles(user_id),
    title        TEXT NOT NULL,
    service_type TEXT NOT NULL,
    status       TEXT NOT NULL,  -- 'pending' | 'in_progress' | 'waiting_user' | 'done' | 'canceled'
    price        INTEGER CHECK (price IS NULL OR price >= 0),
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS credentials (
    user_id       TEXT PRIMARY KEY REFERENCES profiles(user_id),
    password_hash TEXT NOT NULL,  -- argon2 PHC string
    updated_at    TEXT NOT NULL
);

-- Only digests of bearer tokens are stored. Revoking a token deletes its
-- row; expired rows are purged whenever a new token is stored.
CREATE TABLE IF NOT EXISTS tokens (
    digest     TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES profiles(user_id),
    kind       TEXT NOT NULL,   -- 'access' | 'refresh'
    issued_at  TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS cases_owner_idx     ON cases(owner_id, updated_at);
CREATE INDEX IF NOT EXISTS documents_owner_idx ON documents(owner_id, created_at);
CREATE INDEX IF NOT EXISTS invoices_owner_idx  ON invoices(owner_id, issued_on);
CREATE INDEX IF NOT EXISTS requests_owner_idx  ON service_requests(owner_id, updated_at);
CREATE INDEX IF NOT EXISTS tokens_user_idx     ON tokens(user_id);
CREATE INDEX IF NOT EXISTS tokens_expiry_idx   ON tokens(expires_at);

PRAGMA user_version = 2;
";
