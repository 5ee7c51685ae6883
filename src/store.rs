use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::app_dirs::AppDirs;
use crate::config::Config;
use crate::error::StoreError;
use crate::session::{Achievement, SessionReport, SessionSummary};

/// Persistence seam for finished sessions. The session controller never calls
/// this; the binary hands it the report after the results screen is shown.
pub trait ResultStore {
    /// Persist a session report and return its row id.
    fn save_session(&mut self, report: &SessionReport) -> Result<i64, StoreError>;

    /// Record an achievement. Returns `false` when the user already holds it.
    fn grant_achievement(&mut self, achievement: &Achievement) -> Result<bool, StoreError>;
}

/// Row returned by [`SqliteStore::recent_sessions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub id: i64,
    pub test_id: String,
    pub total_points: u64,
    pub timestamp: String,
}

/// SQLite-backed result history.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path.as_ref())?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                test_id TEXT NOT NULL,
                total_points INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_test ON sessions(test_id);

            CREATE TABLE IF NOT EXISTS session_topics (
                session_id INTEGER NOT NULL REFERENCES sessions(id),
                topic TEXT NOT NULL,
                first_attempt_correct INTEGER NOT NULL,
                total_count INTEGER NOT NULL,
                avg_time_ms INTEGER
            );

            CREATE TABLE IF NOT EXISTS session_samples (
                session_id INTEGER NOT NULL REFERENCES sessions(id),
                position INTEGER NOT NULL,
                topic TEXT NOT NULL,
                elapsed_ms INTEGER NOT NULL,
                correct BOOLEAN NOT NULL,
                first_attempt BOOLEAN NOT NULL
            );

            CREATE TABLE IF NOT EXISTS achievements (
                user_id TEXT NOT NULL,
                label TEXT NOT NULL,
                granted_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, label)
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Highest score recorded for a deck.
    pub fn best_points(&self, test_id: &str) -> Result<Option<u64>, StoreError> {
        let best: Option<i64> = self
            .conn
            .query_row(
                "SELECT MAX(total_points) FROM sessions WHERE test_id = ?1",
                [test_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        Ok(best.map(|p| p.max(0) as u64))
    }

    /// Most recent sessions first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<StoredSession>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, test_id, total_points, timestamp
            FROM sessions
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map([limit as i64], |row| {
            Ok(StoredSession {
                id: row.get(0)?,
                test_id: row.get(1)?,
                total_points: row.get::<_, i64>(2)?.max(0) as u64,
                timestamp: row.get(3)?,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    pub fn achievements(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT label FROM achievements WHERE user_id = ?1 ORDER BY label")?;
        let rows = stmt.query_map([user_id], |row| row.get(0))?;
        let mut labels = Vec::new();
        for row in rows {
            labels.push(row?);
        }
        Ok(labels)
    }

    #[cfg(test)]
    fn count(&self, table: &str, session_id: i64) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE session_id = ?1");
        Ok(self.conn.query_row(&sql, [session_id], |row| row.get(0))?)
    }
}

impl ResultStore for SqliteStore {
    fn save_session(&mut self, report: &SessionReport) -> Result<i64, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO sessions (test_id, total_points, timestamp) VALUES (?1, ?2, ?3)",
            params![report.test_id, report.total_points as i64, report.timestamp],
        )?;
        let session_id = tx.last_insert_rowid();

        for (topic, t) in &report.topic_aggregate {
            tx.execute(
                r#"
                INSERT INTO session_topics
                (session_id, topic, first_attempt_correct, total_count, avg_time_ms)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    session_id,
                    topic,
                    t.first_attempt_correct_count as i64,
                    t.total_count as i64,
                    t.average_elapsed_ms.map(|ms| ms as i64),
                ],
            )?;
        }

        for (position, q) in report.sample_questions.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO session_samples
                (session_id, position, topic, elapsed_ms, correct, first_attempt)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    session_id,
                    position as i64,
                    q.topic,
                    q.elapsed_ms as i64,
                    q.correct,
                    q.first_attempt,
                ],
            )?;
        }

        tx.commit()?;
        info!(session_id, test_id = %report.test_id, points = report.total_points, "session saved");
        Ok(session_id)
    }

    fn grant_achievement(&mut self, achievement: &Achievement) -> Result<bool, StoreError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO achievements (user_id, label) VALUES (?1, ?2)",
            params![achievement.user_id, achievement.achievement_label],
        )?;
        if inserted == 0 {
            debug!(label = %achievement.achievement_label, "achievement already held");
        }
        Ok(inserted > 0)
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    timestamp: String,
    test_id: &'a str,
    completed: usize,
    total: usize,
    points: u64,
    ended_early: bool,
    mastered: bool,
}

/// Append-only CSV log of finished sessions, one row per session.
#[derive(Debug, Clone)]
pub struct CsvLog {
    path: PathBuf,
}

impl CsvLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, summary: &SessionSummary) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Header only when the file is new.
        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(CsvRow {
            timestamp: Utc::now().to_rfc3339(),
            test_id: &summary.test_id,
            completed: summary.completed_count,
            total: summary.total_count,
            points: summary.total_points,
            ended_early: summary.ended_early,
            mastered: summary.is_mastered(),
        })?;
        writer.flush()?;
        Ok(())
    }
}

/// Where finished sessions go: the SQLite history and the CSV log, either of
/// which may be unavailable.
#[derive(Debug, Default)]
pub struct History {
    db: Option<SqliteStore>,
    csv: Option<CsvLog>,
}

impl History {
    pub fn new(db: Option<SqliteStore>, csv: Option<CsvLog>) -> Self {
        Self { db, csv }
    }

    /// Open the default locations. Failures are logged and leave that sink off.
    pub fn open_default() -> Self {
        let db = AppDirs::db_path().and_then(|path| match SqliteStore::open(&path) {
            Ok(store) => Some(store),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "results database unavailable");
                None
            }
        });
        let csv = AppDirs::csv_log_path().map(CsvLog::new);
        Self { db, csv }
    }

    pub fn db(&self) -> Option<&SqliteStore> {
        self.db.as_ref()
    }

    pub fn best_points(&self, test_id: &str) -> Option<u64> {
        let db = self.db.as_ref()?;
        match db.best_points(test_id) {
            Ok(best) => best,
            Err(err) => {
                warn!(error = %err, "could not read best score");
                None
            }
        }
    }

    /// Persist a finished session. Returns true when this run earned an
    /// achievement the user did not hold yet.
    pub fn record(&mut self, summary: &SessionSummary, config: &Config) -> Result<bool, StoreError> {
        if let Some(csv) = &self.csv {
            csv.append(summary)?;
        }

        let Some(db) = self.db.as_mut() else {
            return Ok(false);
        };
        db.save_session(&summary.report(config.sample_questions))?;
        match summary.achievement(&config.user_id) {
            Some(achievement) => db.grant_achievement(&achievement),
            None => Ok(false),
        }
    }
}
