use anyhow::{Context, Result};
use async_trait::async_trait;
use emoquest_core::progress::advance;
use emoquest_core::{
    ClassificationEvent, Emotion, HistoryEntry, HistoryLog, ProgressOutcome, ProgressRecord, ProgressStore,
    QuestLedger, QuestLedgerEntry, StoreError,
};
use sqlx::{sqlite::SqlitePoolOptions, Executor, Pool, Row, Sqlite};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// SQLite-backed progression store.
///
/// Writes are serialised through `write_lock` and each read-modify-write runs
/// inside one transaction, so concurrent events for the same user cannot lose
/// experience and a failed event leaves no partial rows behind.
#[derive(Clone)]
pub struct SqliteStore {
    pub(crate) pool: Pool<Sqlite>,
    write_lock: Arc<Mutex<()>>,
}

fn store_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Corrupt(e.to_string())
        }
        _ => StoreError::Unavailable(e.to_string()),
    }
}

fn to_u32(value: i64, field: &str, username: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} for {} out of range: {}", field, username, value)))
}

impl SqliteStore {
    /// Open (or create) the database at `db_path`. `":memory:"` gives a
    /// private in-memory database.
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref().display().to_string();
        let in_memory = path == ":memory:";
        let db_url = if in_memory {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite://{}?mode=rwc", path)
        };

        // Every pooled connection to ":memory:" would open its own empty database.
        let max_connections = if in_memory { 1 } else { 8 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .after_connect(move |conn, _meta| Box::pin(async move {
                conn.execute("PRAGMA busy_timeout = 5000").await?;
                if !in_memory {
                    conn.execute("PRAGMA journal_mode = WAL").await?;
                }
                Ok(())
            }))
            .connect(&db_url)
            .await
            .context("Failed to connect to SQLite database")?;

        let store = Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        };
        store.migrate().await?;
        tracing::info!("Progress store ready at {}", path);
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS progress (
                username TEXT PRIMARY KEY,
                exp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                last_quest TEXT NOT NULL DEFAULT '',
                last_emotion TEXT NOT NULL DEFAULT ''
            );
            "#
        )
        .execute(&self.pool)
        .await
        .context("Failed to create progress table")?;

        // History Log: one row per classification, insertion order = id order.
        // level_after is nullable; readers default a missing level to 1.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS history_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                text TEXT NOT NULL,
                emotion TEXT NOT NULL,
                confidence REAL NOT NULL,
                level_after INTEGER
            );
            "#
        )
        .execute(&self.pool)
        .await
        .context("Failed to create history_log table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_history_log_user ON history_log(username, id)"
        )
        .execute(&self.pool)
        .await
        .context("Failed to create history_log user index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quest_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                emotion TEXT NOT NULL,
                quest TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            "#
        )
        .execute(&self.pool)
        .await
        .context("Failed to create quest_history table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_quest_history_user ON quest_history(username, id)"
        )
        .execute(&self.pool)
        .await
        .context("Failed to create quest_history user index")?;

        tracing::debug!("Schema migration complete");
        Ok(())
    }
}

// =========================================================================
// Row helpers (usable with the pool or inside a transaction)
// =========================================================================

async fn fetch_progress<'e, E>(executor: E, username: &str) -> Result<Option<ProgressRecord>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("SELECT username, exp, level, last_quest, last_emotion FROM progress WHERE username = ?")
        .bind(username)
        .fetch_optional(executor)
        .await
        .map_err(store_err)?;

    let Some(row) = row else {
        return Ok(None);
    };

    let exp: i64 = row.try_get("exp").map_err(store_err)?;
    let level: i64 = row.try_get("level").map_err(store_err)?;
    let last_quest: Option<String> = row.try_get("last_quest").map_err(store_err)?;
    let last_emotion: Option<String> = row.try_get("last_emotion").map_err(store_err)?;

    Ok(Some(ProgressRecord {
        username: row.try_get("username").map_err(store_err)?,
        experience: to_u32(exp, "exp", username)?,
        level: to_u32(level, "level", username)?,
        last_quest: last_quest.unwrap_or_default(),
        last_emotion: last_emotion.unwrap_or_default(),
    }))
}

async fn upsert_progress<'e, E>(executor: E, record: &ProgressRecord) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO progress (username, exp, level, last_quest, last_emotion) VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(username) DO UPDATE SET exp = excluded.exp, level = excluded.level,
             last_quest = excluded.last_quest, last_emotion = excluded.last_emotion"
    )
    .bind(&record.username)
    .bind(i64::from(record.experience))
    .bind(i64::from(record.level))
    .bind(&record.last_quest)
    .bind(&record.last_emotion)
    .execute(executor)
    .await
    .map_err(store_err)?;
    Ok(())
}

async fn insert_history<'e, E>(executor: E, username: &str, entry: &HistoryEntry) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO history_log (username, timestamp, text, emotion, confidence, level_after) VALUES (?, ?, ?, ?, ?, ?)"
    )
    .bind(username)
    .bind(&entry.timestamp)
    .bind(&entry.text)
    .bind(&entry.emotion)
    .bind(entry.confidence)
    .bind(entry.level_after.map(i64::from))
    .execute(executor)
    .await
    .map_err(store_err)?;
    Ok(())
}

async fn insert_quest<'e, E>(executor: E, entry: &QuestLedgerEntry) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO quest_history (username, emotion, quest, timestamp) VALUES (?, ?, ?, ?)")
        .bind(&entry.username)
        .bind(&entry.emotion)
        .bind(&entry.quest)
        .bind(&entry.timestamp)
        .execute(executor)
        .await
        .map_err(store_err)?;
    Ok(())
}

#[async_trait]
impl ProgressStore for SqliteStore {
    async fn load_progress(&self, username: &str) -> Result<Option<ProgressRecord>, StoreError> {
        fetch_progress(&self.pool, username).await
    }

    async fn init_progress(&self, username: &str) -> Result<ProgressRecord, StoreError> {
        let _guard = self.write_lock.lock().await;
        sqlx::query("INSERT OR IGNORE INTO progress (username, exp, level, last_quest, last_emotion) VALUES (?, 0, 1, '', '')")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        fetch_progress(&self.pool, username)
            .await?
            .ok_or_else(|| StoreError::Unavailable(format!("progress for {} vanished after insert", username)))
    }

    async fn apply_emotion(&self, username: &str, emotion: &Emotion) -> Result<ProgressOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let current = fetch_progress(&mut *tx, username).await?;
        let (record, outcome) = advance(current.as_ref(), username, emotion);
        upsert_progress(&mut *tx, &record).await?;

        tx.commit().await.map_err(store_err)?;
        Ok(outcome)
    }

    async fn commit_event(&self, event: &ClassificationEvent) -> Result<ProgressOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let current = fetch_progress(&mut *tx, &event.username).await?;
        let (record, outcome) = advance(current.as_ref(), &event.username, &event.emotion);
        let (history, quest) = event.log_entries(&outcome);

        upsert_progress(&mut *tx, &record).await?;
        insert_history(&mut *tx, &event.username, &history).await?;
        insert_quest(&mut *tx, &quest).await?;

        // Dropping `tx` on any early return above rolls everything back.
        tx.commit().await.map_err(store_err)?;
        tracing::trace!("Committed event for {} (exp {})", event.username, record.experience);
        Ok(outcome)
    }
}

#[async_trait]
impl HistoryLog for SqliteStore {
    async fn append_history(&self, username: &str, entry: &HistoryEntry) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        insert_history(&self.pool, username, entry).await
    }

    async fn read_history(&self, username: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT timestamp, text, emotion, confidence, level_after FROM history_log WHERE username = ? ORDER BY id ASC"
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            // A malformed level reads as missing rather than failing the whole log.
            let level_after = match row.try_get::<Option<i64>, _>("level_after") {
                Ok(level) => level.and_then(|l| u32::try_from(l).ok()),
                Err(e) => {
                    tracing::warn!("Unreadable level in history for {}: {}", username, e);
                    None
                }
            };
            entries.push(HistoryEntry {
                timestamp: row.try_get("timestamp").map_err(store_err)?,
                text: row.try_get("text").map_err(store_err)?,
                emotion: row.try_get("emotion").map_err(store_err)?,
                confidence: row.try_get("confidence").map_err(store_err)?,
                level_after,
            });
        }
        Ok(entries)
    }
}

#[async_trait]
impl QuestLedger for SqliteStore {
    async fn append_quest(&self, entry: &QuestLedgerEntry) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        insert_quest(&self.pool, entry).await
    }

    async fn read_quests(&self, username: &str) -> Result<Vec<QuestLedgerEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT username, emotion, quest, timestamp FROM quest_history WHERE username = ? ORDER BY id ASC"
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(QuestLedgerEntry {
                username: row.try_get("username").map_err(store_err)?,
                emotion: row.try_get("emotion").map_err(store_err)?,
                quest: row.try_get("quest").map_err(store_err)?,
                timestamp: row.try_get("timestamp").map_err(store_err)?,
            });
        }
        Ok(entries)
    }
}
