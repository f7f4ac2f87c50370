//! [`SqliteStore`], the SQLite implementation of [`DecisionStore`] and
//! [`AuditLog`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use docket_core::{
  audit::{AuditEvent, NewAuditEvent},
  decision::{Decision, NewDecision, Snapshot},
  lifecycle::Status,
  store::{AuditLog, Audited, DecisionStore},
};

use crate::{
  Error, Result,
  encode::{
    RawAuditEvent, RawDecision, RawSnapshot, decode_dt, encode_dt,
    encode_metadata, encode_uuid,
  },
  schema::SCHEMA,
};

const DECISION_COLUMNS: &str = "decision_id, title, area, impact, decided_at, \
                                created_at, updated_at, archived_at";

const SNAPSHOT_COLUMNS: &str =
  "snapshot_id, decision_id, captured_at, note, locked_at";

const AUDIT_COLUMNS: &str = "seq, decision_id, action, recorded_at, metadata";

/// What the connection thread found when asked to apply a transition.
/// Mapped onto [`docket_core::Error`] once back on the caller's side.
enum Transition<T> {
  Applied(T),
  Missing,
  Archived,
  Locked,
  AlreadyLocked,
  NoSnapshot,
}

impl<T> Transition<T> {
  fn into_result(self, id: Uuid) -> Result<T> {
    let err = match self {
      Self::Applied(v) => return Ok(v),
      Self::Missing => docket_core::Error::DecisionNotFound(id),
      Self::Archived => docket_core::Error::Archived(id),
      Self::Locked => docket_core::Error::Locked(id),
      Self::AlreadyLocked => docket_core::Error::AlreadyLocked(id),
      Self::NoSnapshot => docket_core::Error::NoSnapshot(id),
    };
    Err(Error::Core(err))
  }
}

/// Lifecycle markers of a decision and its latest snapshot, read inside a
/// transaction.
struct Markers {
  archived:        bool,
  latest_snapshot: Option<(String, i64, bool)>,
}

impl Markers {
  /// Status of a stored decision, in the same branch order as
  /// [`docket_core::lifecycle::derive_status`]. Stored rows always exist, so
  /// `Draft` never comes up.
  fn status(&self) -> Status {
    match (self.archived, &self.latest_snapshot) {
      (true, _) => Status::Archived,
      (false, Some((_, _, true))) => Status::Locked,
      (false, Some(_)) => Status::Snapshotted,
      (false, None) => Status::Recorded,
    }
  }
}

fn read_markers(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<Markers>> {
  let archived: Option<bool> = conn
    .query_row(
      "SELECT archived_at IS NOT NULL FROM decisions WHERE decision_id = ?1",
      rusqlite::params![id],
      |r| r.get(0),
    )
    .optional()?;

  let Some(archived) = archived else {
    return Ok(None);
  };

  let latest_snapshot: Option<(String, i64, bool)> = conn
    .query_row(
      "SELECT snapshot_id, position, locked_at IS NOT NULL
       FROM snapshots WHERE decision_id = ?1
       ORDER BY position DESC LIMIT 1",
      rusqlite::params![id],
      |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )
    .optional()?;

  Ok(Some(Markers { archived, latest_snapshot }))
}

// ─── Audit rows ──────────────────────────────────────────────────────────────

/// An audit event as inserted, before `recorded_at` is decoded back.
struct Written {
  event:       NewAuditEvent,
  seq:         i64,
  recorded_at: String,
}

impl Written {
  fn into_event(self) -> Result<AuditEvent> {
    Ok(AuditEvent {
      seq:         self.seq,
      decision_id: self.event.decision_id,
      action:      self.event.action,
      recorded_at: decode_dt(&self.recorded_at)?,
      metadata:    self.event.metadata,
    })
  }
}

/// Insert `event` as the next row of `audit_events`. Runs inside the
/// caller's transaction; an error aborts it.
fn insert_audit(
  conn: &rusqlite::Connection,
  event: NewAuditEvent,
) -> rusqlite::Result<Written> {
  // Clamp to the previous event so timestamps never run backwards, even if
  // the wall clock does.
  let previous: Option<String> = conn
    .query_row(
      "SELECT recorded_at FROM audit_events ORDER BY seq DESC LIMIT 1",
      [],
      |r| r.get(0),
    )
    .optional()?;
  let now = Utc::now();
  let recorded_at = previous
    .as_deref()
    .and_then(|s| decode_dt(s).ok())
    .map_or(now, |prev| prev.max(now));
  let recorded_at = encode_dt(recorded_at);

  conn.execute(
    "INSERT INTO audit_events (decision_id, action, recorded_at, metadata)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![
      encode_uuid(event.decision_id),
      event.action.as_str(),
      recorded_at,
      encode_metadata(event.metadata.as_ref())?,
    ],
  )?;

  Ok(Written { seq: conn.last_insert_rowid(), event, recorded_at })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Docket store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
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

  /// Open an in-memory store for tests.
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

  /// Insert a decision row verbatim. Used by tests to seed records whose
  /// stored timestamps the public API would never produce.
  #[cfg(test)]
  pub(crate) async fn insert_raw_decision(&self, raw: RawDecision) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO decisions ({DECISION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
          rusqlite::params![
            raw.decision_id,
            raw.title,
            raw.area,
            raw.impact,
            raw.decided_at,
            raw.created_at,
            raw.updated_at,
            raw.archived_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL on the store's own connection.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DecisionStore impl ──────────────────────────────────────────────────────

impl DecisionStore for SqliteStore {
  type Error = Error;

  async fn record_decision(&self, input: NewDecision) -> Result<Audited<Decision>> {
    let now = Utc::now();
    let decision = Decision {
      id:          Uuid::new_v4(),
      title:       input.title,
      area:        input.area,
      impact:      input.impact,
      decided_at:  Some(input.decided_at.unwrap_or(now)),
      created_at:  now,
      updated_at:  now,
      archived_at: None,
      snapshots:   Vec::new(),
    };

    let id_str         = encode_uuid(decision.id);
    let title          = decision.title.clone();
    let area           = decision.area.clone();
    let impact         = decision.impact.as_str().to_owned();
    let decided_at_str = decision.decided_at.map(encode_dt);
    let now_str        = encode_dt(now);
    let event          = NewAuditEvent::created(&decision);

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO decisions (
             decision_id, title, area, impact, decided_at,
             created_at, updated_at, archived_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, NULL)",
          rusqlite::params![id_str, title, area, impact, decided_at_str, now_str],
        )?;
        let written = insert_audit(&tx, event)?;
        tx.commit()?;
        Ok(written)
      })
      .await?;

    let event = written.into_event()?;
    tracing::debug!(decision_id = %decision.id, seq = event.seq, "recorded decision");
    Ok(Audited { value: decision, event })
  }

  async fn get_decision(&self, id: Uuid) -> Result<Option<Decision>> {
    let id_str = encode_uuid(id);

    let raw: Option<(RawDecision, Vec<RawSnapshot>)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let decision = tx
          .query_row(
            &format!("SELECT {DECISION_COLUMNS} FROM decisions WHERE decision_id = ?1"),
            rusqlite::params![id_str],
            RawDecision::from_row,
          )
          .optional()?;

        let Some(decision) = decision else {
          return Ok(None);
        };

        let snapshots = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM snapshots
             WHERE decision_id = ?1 ORDER BY position"
          ))?;
          stmt
            .query_map(rusqlite::params![id_str], RawSnapshot::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;

        Ok(Some((decision, snapshots)))
      })
      .await?;

    raw.map(|(d, s)| d.into_decision(s)).transpose()
  }

  async fn list_decisions(&self) -> Result<Vec<Decision>> {
    let (decisions, snapshots): (Vec<RawDecision>, Vec<RawSnapshot>) = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let decisions = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {DECISION_COLUMNS} FROM decisions ORDER BY created_at, rowid"
          ))?;
          stmt
            .query_map([], RawDecision::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        let snapshots = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM snapshots ORDER BY decision_id, position"
          ))?;
          stmt
            .query_map([], RawSnapshot::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok((decisions, snapshots))
      })
      .await?;

    let mut by_decision: HashMap<String, Vec<RawSnapshot>> = HashMap::new();
    for s in snapshots {
      by_decision.entry(s.decision_id.clone()).or_default().push(s);
    }

    decisions
      .into_iter()
      .map(|d| {
        let snaps = by_decision.remove(&d.decision_id).unwrap_or_default();
        d.into_decision(snaps)
      })
      .collect()
  }

  // ── Lifecycle transitions ─────────────────────────────────────────────────

  async fn append_snapshot(&self, id: Uuid, note: Option<String>) -> Result<Audited<Snapshot>> {
    let snapshot = Snapshot {
      snapshot_id: Uuid::new_v4(),
      captured_at: Utc::now(),
      note,
      locked_at:   None,
    };

    let id_str   = encode_uuid(id);
    let snap_str = encode_uuid(snapshot.snapshot_id);
    let at_str   = encode_dt(snapshot.captured_at);
    let note     = snapshot.note.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(markers) = read_markers(&tx, &id_str)? else {
          return Ok(Transition::Missing);
        };
        if markers.archived {
          return Ok(Transition::Archived);
        }
        let position = match markers.latest_snapshot {
          Some((_, _, true)) => return Ok(Transition::Locked),
          Some((_, pos, false)) => pos + 1,
          None => 0,
        };

        tx.execute(
          "INSERT INTO snapshots (snapshot_id, decision_id, position, captured_at, note, locked_at)
           VALUES (?1, ?2, ?3, ?4, ?5, NULL)",
          rusqlite::params![snap_str, id_str, position, at_str, note],
        )?;
        tx.execute(
          "UPDATE decisions SET updated_at = ?2 WHERE decision_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        let event = NewAuditEvent::status_change(id, markers.status(), Status::Snapshotted)
          .with("snapshot_id", snap_str);
        let written = insert_audit(&tx, event)?;
        tx.commit()?;
        Ok(Transition::Applied(written))
      })
      .await?;

    let event = outcome.into_result(id)?.into_event()?;
    tracing::debug!(decision_id = %id, seq = event.seq, "appended snapshot");
    Ok(Audited { value: snapshot, event })
  }

  async fn lock_latest_snapshot(&self, id: Uuid) -> Result<Audited<Snapshot>> {
    let id_str = encode_uuid(id);
    let now_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(markers) = read_markers(&tx, &id_str)? else {
          return Ok(Transition::Missing);
        };
        if markers.archived {
          return Ok(Transition::Archived);
        }
        let snapshot_id = match &markers.latest_snapshot {
          None => return Ok(Transition::NoSnapshot),
          Some((_, _, true)) => return Ok(Transition::AlreadyLocked),
          Some((snapshot_id, _, false)) => snapshot_id.clone(),
        };

        tx.execute(
          "UPDATE snapshots SET locked_at = ?2 WHERE snapshot_id = ?1 AND locked_at IS NULL",
          rusqlite::params![snapshot_id, now_str],
        )?;
        tx.execute(
          "UPDATE decisions SET updated_at = ?2 WHERE decision_id = ?1",
          rusqlite::params![id_str, now_str],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE snapshot_id = ?1"),
          rusqlite::params![snapshot_id],
          RawSnapshot::from_row,
        )?;
        let event = NewAuditEvent::status_change(id, markers.status(), Status::Locked)
          .with("snapshot_id", snapshot_id);
        let written = insert_audit(&tx, event)?;
        tx.commit()?;
        Ok(Transition::Applied((raw, written)))
      })
      .await?;

    let (raw, written) = outcome.into_result(id)?;
    let event = written.into_event()?;
    tracing::debug!(decision_id = %id, seq = event.seq, "locked latest snapshot");
    Ok(Audited { value: raw.into_snapshot()?, event })
  }

  async fn archive(&self, id: Uuid) -> Result<Audited<Decision>> {
    let id_str = encode_uuid(id);
    let now_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(markers) = read_markers(&tx, &id_str)? else {
          return Ok(Transition::Missing);
        };
        if markers.archived {
          return Ok(Transition::Archived);
        }
        tx.execute(
          "UPDATE decisions SET archived_at = ?2, updated_at = ?2
           WHERE decision_id = ?1 AND archived_at IS NULL",
          rusqlite::params![id_str, now_str],
        )?;
        let event = NewAuditEvent::status_change(id, markers.status(), Status::Archived);
        let written = insert_audit(&tx, event)?;
        tx.commit()?;
        Ok(Transition::Applied(written))
      })
      .await?;

    let event = outcome.into_result(id)?.into_event()?;
    tracing::debug!(decision_id = %id, seq = event.seq, "archived decision");
    let decision = self
      .get_decision(id)
      .await?
      .ok_or(Error::Core(docket_core::Error::DecisionNotFound(id)))?;
    Ok(Audited { value: decision, event })
  }
}

// ─── AuditLog impl ───────────────────────────────────────────────────────────

impl AuditLog for SqliteStore {
  type Error = Error;

  async fn append(&self, event: NewAuditEvent) -> Result<AuditEvent> {
    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let written = insert_audit(&tx, event)?;
        tx.commit()?;
        Ok(written)
      })
      .await?;

    let event = written.into_event()?;
    tracing::debug!(seq = event.seq, decision_id = %event.decision_id, action = %event.action, "audit event appended");
    Ok(event)
  }

  async fn load(&self, decision_id: Uuid) -> Result<Vec<AuditEvent>> {
    let id_str = encode_uuid(decision_id);

    let raws: Vec<RawAuditEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {AUDIT_COLUMNS} FROM audit_events WHERE decision_id = ?1 ORDER BY seq"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawAuditEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditEvent::into_event).collect()
  }

  async fn replay(&self) -> Result<Vec<AuditEvent>> {
    let raws: Vec<RawAuditEvent> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {AUDIT_COLUMNS} FROM audit_events ORDER BY seq"
        ))?;
        let rows = stmt
          .query_map([], RawAuditEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditEvent::into_event).collect()
  }
}
