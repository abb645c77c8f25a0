//! SQLite-backed log repository with a full-text index over messages.
//!
//! A single `logs` table holds every record; an FTS5 content table mirrors
//! the `message` column and is kept in sync by triggers, so deletes can
//! never leave the index stale. One mutex serializes every operation, and
//! insert subscribers run while it is held, so observers see inserts in
//! commit order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Row};

use loghive_core::{diag, now_secs, LogFilter, LogRecord, LogStats, SessionSummary, Severity};

use crate::error::StoreError;
use crate::fts;

type Subscriber = Box<dyn Fn(&LogRecord) + Send + Sync>;

const SELECT_COLUMNS: &str =
    "id, source, category, verbosity, message, timestamp, frame, file, line, \
     received_at, session_id, instance_id";

pub struct LogStore {
    conn: Mutex<Connection>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl LogStore {
    /// Open (or create) the store at `path`, enabling WAL journaling and
    /// creating the schema when absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = Self {
            conn: Mutex::new(conn),
            subscribers: Mutex::new(Vec::new()),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                category TEXT NOT NULL,
                verbosity INTEGER NOT NULL,
                message TEXT NOT NULL,
                timestamp REAL NOT NULL,
                frame INTEGER,
                file TEXT,
                line INTEGER,
                received_at REAL NOT NULL,
                session_id TEXT NOT NULL,
                instance_id TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_logs_source ON logs(source);
            CREATE INDEX IF NOT EXISTS idx_logs_verbosity ON logs(verbosity);
            CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp);
            CREATE INDEX IF NOT EXISTS idx_logs_category ON logs(category);
            CREATE INDEX IF NOT EXISTS idx_logs_received ON logs(received_at);
            CREATE INDEX IF NOT EXISTS idx_logs_session ON logs(session_id);
            CREATE INDEX IF NOT EXISTS idx_logs_instance ON logs(instance_id);
            CREATE INDEX IF NOT EXISTS idx_logs_session_instance
                ON logs(session_id, instance_id);

            CREATE VIRTUAL TABLE IF NOT EXISTS logs_fts USING fts5(
                message,
                content='logs',
                content_rowid='id'
            );

            CREATE TRIGGER IF NOT EXISTS logs_ai AFTER INSERT ON logs BEGIN
                INSERT INTO logs_fts(rowid, message) VALUES (new.id, new.message);
            END;

            CREATE TRIGGER IF NOT EXISTS logs_ad AFTER DELETE ON logs BEGIN
                INSERT INTO logs_fts(logs_fts, rowid, message)
                VALUES('delete', old.id, old.message);
            END;

            CREATE TRIGGER IF NOT EXISTS logs_au AFTER UPDATE ON logs BEGIN
                INSERT INTO logs_fts(logs_fts, rowid, message)
                VALUES('delete', old.id, old.message);
                INSERT INTO logs_fts(rowid, message) VALUES (new.id, new.message);
            END;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("log store mutex poisoned")
    }

    // ── Write path ──────────────────────────────────────────────────

    /// Persist a record, assigning its id and (when unset) receive time,
    /// then notify every subscriber with the stored record. Subscriber
    /// panics are reported to the diagnostic sink and do not abort the
    /// insert.
    pub fn insert(&self, record: &LogRecord) -> Result<i64, StoreError> {
        let conn = self.conn();

        let received_at = if record.received_at == 0.0 {
            now_secs()
        } else {
            record.received_at
        };

        conn.execute(
            "INSERT INTO logs (source, category, verbosity, message, timestamp, \
             frame, file, line, received_at, session_id, instance_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.source,
                record.category,
                record.verbosity.ordinal(),
                record.message,
                record.timestamp,
                record.frame,
                record.file,
                record.line,
                received_at,
                record.session_id,
                record.instance_id,
            ],
        )?;
        let id = conn.last_insert_rowid();

        let mut stored = record.clone();
        stored.id = id;
        stored.received_at = received_at;

        // Still under the store guard, so observers see commit order.
        let subscribers = self.subscribers.lock().expect("subscriber list poisoned");
        for callback in subscribers.iter() {
            if catch_unwind(AssertUnwindSafe(|| callback(&stored))).is_err() {
                diag::error("Store", &format!("subscriber panicked on record {id}"));
            }
        }

        Ok(id)
    }

    /// Register a callback invoked once per successful insert, in
    /// registration order.
    pub fn subscribe(&self, callback: impl Fn(&LogRecord) + Send + Sync + 'static) {
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .push(Box::new(callback));
    }

    // ── Read path ───────────────────────────────────────────────────

    /// Query records matching `filter`, newest emit time first (ties
    /// broken by id, later inserts first).
    pub fn query(&self, filter: &LogFilter) -> Result<Vec<LogRecord>, StoreError> {
        let conn = self.conn();

        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM logs WHERE 1=1");
        let mut bind = Vec::new();
        push_filter_predicates(&mut sql, &mut bind, filter, "");
        sql.push_str(" ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?");
        bind.push(SqlValue::Integer(filter.limit));
        bind.push(SqlValue::Integer(filter.offset));

        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind.iter()), row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Full-text search over messages. `query` uses the dialect described
    /// in [`crate::fts`]; invalid syntax is an input error, never a
    /// storage error.
    pub fn search(
        &self,
        query: &str,
        filter: &LogFilter,
    ) -> Result<Vec<LogRecord>, StoreError> {
        let match_expr = fts::translate(query)?;
        let conn = self.conn();

        let columns = SELECT_COLUMNS
            .split(", ")
            .map(|c| format!("l.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!(
            "SELECT {columns} FROM logs l \
             JOIN logs_fts fts ON l.id = fts.rowid \
             WHERE logs_fts MATCH ?"
        );
        let mut bind = vec![SqlValue::Text(match_expr)];
        push_filter_predicates(&mut sql, &mut bind, filter, "l.");
        sql.push_str(" ORDER BY l.timestamp DESC, l.id DESC LIMIT ? OFFSET ?");
        bind.push(SqlValue::Integer(filter.limit));
        bind.push(SqlValue::Integer(filter.offset));

        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind.iter()), row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Aggregate counts, optionally restricted to one source and/or an
    /// emit-time lower bound.
    pub fn stats(
        &self,
        source: Option<&str>,
        since: Option<f64>,
    ) -> Result<LogStats, StoreError> {
        let conn = self.conn();

        let mut where_sql = String::from("WHERE 1=1");
        let mut bind = Vec::new();
        if let Some(source) = source {
            where_sql.push_str(" AND source = ?");
            bind.push(SqlValue::Text(source.to_string()));
        }
        if let Some(since) = since {
            where_sql.push_str(" AND timestamp >= ?");
            bind.push(SqlValue::Real(since));
        }

        let mut stats = LogStats {
            total: scalar_i64(&conn, &format!("SELECT COUNT(*) FROM logs {where_sql}"), &bind)?,
            errors: scalar_i64(
                &conn,
                &format!("SELECT COUNT(*) FROM logs {where_sql} AND verbosity <= 2"),
                &bind,
            )?,
            warnings: scalar_i64(
                &conn,
                &format!("SELECT COUNT(*) FROM logs {where_sql} AND verbosity = 3"),
                &bind,
            )?,
            session_count: scalar_i64(
                &conn,
                &format!("SELECT COUNT(DISTINCT session_id) FROM logs {where_sql}"),
                &bind,
            )?,
            instance_count: scalar_i64(
                &conn,
                &format!("SELECT COUNT(DISTINCT instance_id) FROM logs {where_sql}"),
                &bind,
            )?,
            ..LogStats::default()
        };

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT source, COUNT(*) FROM logs {where_sql} GROUP BY source"
        ))?;
        let rows = stmt.query_map(params_from_iter(bind.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (source, count) = row?;
            stats.by_source.insert(source, count);
        }

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT category, COUNT(*) FROM logs {where_sql} \
             GROUP BY category ORDER BY COUNT(*) DESC LIMIT 20"
        ))?;
        let rows = stmt.query_map(params_from_iter(bind.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (category, count) = row?;
            stats.by_category.insert(category, count);
        }

        stats.current_session = latest_session_sql(&conn, None)?;
        Ok(stats)
    }

    /// Sorted distinct category names, optionally restricted to a source.
    pub fn categories(&self, source: Option<&str>) -> Result<Vec<String>, StoreError> {
        let conn = self.conn();

        let mut sql = String::from("SELECT DISTINCT category FROM logs");
        let mut bind = Vec::new();
        if let Some(source) = source {
            sql.push_str(" WHERE source = ?");
            bind.push(SqlValue::Text(source.to_string()));
        }
        sql.push_str(" ORDER BY category");

        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind.iter()), |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Session summaries, most recently active first, each carrying its
    /// sorted distinct instance list.
    pub fn sessions(&self, source: Option<&str>) -> Result<Vec<SessionSummary>, StoreError> {
        let conn = self.conn();

        let mut sql = String::from(
            "SELECT session_id, MIN(received_at), MAX(received_at), COUNT(*) FROM logs",
        );
        let mut bind = Vec::new();
        if let Some(source) = source {
            sql.push_str(" WHERE source = ?");
            bind.push(SqlValue::Text(source.to_string()));
        }
        sql.push_str(" GROUP BY session_id ORDER BY MAX(received_at) DESC");

        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind.iter()), |row| {
            Ok(SessionSummary {
                session_id: row.get(0)?,
                first_seen: row.get(1)?,
                last_seen: row.get(2)?,
                log_count: row.get(3)?,
                instances: Vec::new(),
            })
        })?;
        let mut sessions = rows.collect::<Result<Vec<_>, _>>()?;

        let mut inst_sql =
            String::from("SELECT DISTINCT instance_id FROM logs WHERE session_id = ?");
        if source.is_some() {
            inst_sql.push_str(" AND source = ?");
        }
        inst_sql.push_str(" ORDER BY instance_id");
        let mut inst_stmt = conn.prepare_cached(&inst_sql)?;

        for session in &mut sessions {
            let mut bind = vec![SqlValue::Text(session.session_id.clone())];
            if let Some(source) = source {
                bind.push(SqlValue::Text(source.to_string()));
            }
            let rows = inst_stmt.query_map(params_from_iter(bind.iter()), |row| row.get(0))?;
            session.instances = rows.collect::<Result<Vec<_>, _>>()?;
        }

        Ok(sessions)
    }

    /// Session id of the most recently received record, or empty string
    /// for an empty store. Ties on receive time go to the greater id.
    pub fn latest_session(&self, source: Option<&str>) -> Result<String, StoreError> {
        latest_session_sql(&self.conn(), source)
    }

    /// Delete matching records (and their full-text entries, via trigger).
    /// Returns the number deleted.
    pub fn clear(
        &self,
        source: Option<&str>,
        before: Option<f64>,
    ) -> Result<i64, StoreError> {
        let conn = self.conn();

        let mut sql = String::from("DELETE FROM logs WHERE 1=1");
        let mut bind = Vec::new();
        if let Some(source) = source {
            sql.push_str(" AND source = ?");
            bind.push(SqlValue::Text(source.to_string()));
        }
        if let Some(before) = before {
            sql.push_str(" AND timestamp < ?");
            bind.push(SqlValue::Real(before));
        }

        let deleted = conn.execute(&sql, params_from_iter(bind.iter()))?;
        Ok(deleted as i64)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        scalar_i64(&self.conn(), "SELECT COUNT(*) FROM logs", &[])
    }
}

// ── SQL helpers ─────────────────────────────────────────────────────

/// Append the shared filter predicates to `sql`. `prefix` qualifies the
/// column names when the logs table is aliased.
fn push_filter_predicates(
    sql: &mut String,
    bind: &mut Vec<SqlValue>,
    filter: &LogFilter,
    prefix: &str,
) {
    if let Some(session_id) = &filter.session_id {
        sql.push_str(&format!(" AND {prefix}session_id = ?"));
        bind.push(SqlValue::Text(session_id.clone()));
    } else if !filter.all_sessions {
        // Latest session by default; empty store matches nothing.
        sql.push_str(&format!(
            " AND {prefix}session_id = (SELECT session_id FROM logs \
             ORDER BY received_at DESC, id DESC LIMIT 1)"
        ));
    }

    if let Some(instance_id) = &filter.instance_id {
        sql.push_str(&format!(" AND {prefix}instance_id = ?"));
        bind.push(SqlValue::Text(instance_id.clone()));
    }
    if let Some(source) = &filter.source {
        sql.push_str(&format!(" AND {prefix}source = ?"));
        bind.push(SqlValue::Text(source.clone()));
    }
    if let Some(min_verbosity) = filter.min_verbosity {
        sql.push_str(&format!(" AND {prefix}verbosity <= ?"));
        bind.push(SqlValue::Integer(min_verbosity.ordinal()));
    }
    if let Some(category) = &filter.category {
        sql.push_str(&format!(" AND {prefix}category = ?"));
        bind.push(SqlValue::Text(category.clone()));
    }
    if let Some(since) = filter.since {
        sql.push_str(&format!(" AND {prefix}timestamp >= ?"));
        bind.push(SqlValue::Real(since));
    }
    if let Some(until) = filter.until {
        sql.push_str(&format!(" AND {prefix}timestamp <= ?"));
        bind.push(SqlValue::Real(until));
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<LogRecord> {
    Ok(LogRecord {
        id: row.get(0)?,
        source: row.get(1)?,
        category: row.get(2)?,
        verbosity: Severity::from_ordinal(row.get(3)?),
        message: row.get(4)?,
        timestamp: row.get(5)?,
        frame: row.get(6)?,
        file: row.get(7)?,
        line: row.get(8)?,
        received_at: row.get(9)?,
        session_id: row.get(10)?,
        instance_id: row.get(11)?,
    })
}

fn scalar_i64(conn: &Connection, sql: &str, bind: &[SqlValue]) -> Result<i64, StoreError> {
    let mut stmt = conn.prepare_cached(sql)?;
    Ok(stmt.query_row(params_from_iter(bind.iter()), |row| row.get(0))?)
}

fn latest_session_sql(conn: &Connection, source: Option<&str>) -> Result<String, StoreError> {
    let mut sql = String::from("SELECT session_id FROM logs");
    let mut bind = Vec::new();
    if let Some(source) = source {
        sql.push_str(" WHERE source = ?");
        bind.push(SqlValue::Text(source.to_string()));
    }
    sql.push_str(" ORDER BY received_at DESC, id DESC LIMIT 1");

    let mut stmt = conn.prepare_cached(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind.iter()))?;
    match rows.next()? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(String::new()),
    }
}
