//! SQL schema for the Docket SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = FULL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS decisions (
    decision_id TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    area        TEXT NOT NULL,
    impact      TEXT NOT NULL,   -- 'HIGH' | 'MEDIUM' | 'LOW' | anything else
    decided_at  TEXT,            -- ISO 8601 UTC; review clock
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    archived_at TEXT             -- set once, never cleared
);

-- Position 0 is the oldest snapshot of a decision.
CREATE TABLE IF NOT EXISTS snapshots (
    snapshot_id TEXT PRIMARY KEY,
    decision_id TEXT NOT NULL REFERENCES decisions(decision_id),
    position    INTEGER NOT NULL,
    captured_at TEXT NOT NULL,
    note        TEXT,
    locked_at   TEXT,            -- set once, never cleared
    UNIQUE (decision_id, position)
);

-- Strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS audit_events (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    decision_id TEXT NOT NULL,
    action      TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    metadata    TEXT             -- JSON object or NULL
);

CREATE INDEX IF NOT EXISTS snapshots_decision_idx ON snapshots(decision_id, position);
CREATE INDEX IF NOT EXISTS audit_decision_idx     ON audit_events(decision_id, seq);

PRAGMA user_version = 1;
";
