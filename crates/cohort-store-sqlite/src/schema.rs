//! SQL schema for the Cohort SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Profile ids are assigned inside the insert transaction (max + 1 per
/// table), so the id columns carry a plain PRIMARY KEY with no autoincrement
/// behaviour of their own.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Identity store: credentials and account existence only.
CREATE TABLE IF NOT EXISTS accounts (
    account_id      TEXT PRIMARY KEY,
    email           TEXT NOT NULL UNIQUE,
    created_at      TEXT NOT NULL,
    last_sign_in_at TEXT,
    password_hash   TEXT,            -- argon2 PHC string; NULL until credentials set
    invite_token    TEXT UNIQUE      -- single-use; NULL once consumed
);

CREATE TABLE IF NOT EXISTS students (
    id             INTEGER PRIMARY KEY,
    email          TEXT NOT NULL UNIQUE,
    last_name      TEXT NOT NULL,
    first_name     TEXT NOT NULL,
    is_admin       INTEGER NOT NULL DEFAULT 0,
    account_id     TEXT REFERENCES accounts(account_id),
    created_at     TEXT NOT NULL,
    personal_email TEXT,
    phone          TEXT,
    class_year     TEXT,
    status         TEXT,
    avatar_url     TEXT,
    schools        TEXT NOT NULL DEFAULT '[]',
    professions    TEXT NOT NULL DEFAULT '[]',
    subjects       TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS staff (
    id             INTEGER PRIMARY KEY,
    email          TEXT NOT NULL UNIQUE,
    last_name      TEXT NOT NULL,
    first_name     TEXT NOT NULL,
    is_admin       INTEGER NOT NULL DEFAULT 0,
    account_id     TEXT REFERENCES accounts(account_id),
    created_at     TEXT NOT NULL,
    personal_email TEXT,
    phone          TEXT,
    class_year     TEXT,
    status         TEXT,
    avatar_url     TEXT,
    schools        TEXT NOT NULL DEFAULT '[]',
    professions    TEXT NOT NULL DEFAULT '[]',
    subjects       TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS students_account_idx ON students(account_id);
CREATE INDEX IF NOT EXISTS staff_account_idx    ON staff(account_id);

PRAGMA user_version = 1;
";
