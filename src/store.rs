//! Profile persistence.
//!
//! Profiles hold the raw survey answers, the generated plan and user
//! preferences, keyed by the identity provider's uid. The SQLite store runs
//! every statement on the blocking pool.

use crate::error::{AccessHubError, Result};
use crate::recommendation::AdaptationPlan;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS profiles (
    uid TEXT PRIMARY KEY,
    email TEXT,
    display_name TEXT,
    preferences TEXT NOT NULL,
    accessibility_needs TEXT NOT NULL DEFAULT '[]',
    survey_responses TEXT,
    survey_completed INTEGER NOT NULL DEFAULT 0,
    recommendations TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uid TEXT NOT NULL,
    item TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_history_uid ON history (uid, id);
CREATE TABLE IF NOT EXISTS saved_content (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uid TEXT NOT NULL,
    item TEXT NOT NULL,
    saved_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_saved_content_uid ON saved_content (uid, id);
";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub preferences: Map<String, Value>,
    pub accessibility_needs: Vec<String>,
    /// Answers exactly as submitted
    pub survey_responses: Value,
    pub survey_completed: bool,
    pub recommendations: Option<AdaptationPlan>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update; `None` fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub preferences: Option<Map<String, Value>>,
    pub accessibility_needs: Option<Vec<String>>,
}

/// A client-supplied JSON object stored with a server row id and timestamp.
///
/// Serializes as one flat object. The server's `id` and timestamp key
/// replace any client fields of the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    pub id: i64,
    pub item: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl StoredItem {
    pub fn to_document(&self, timestamp_key: &str) -> Map<String, Value> {
        let mut doc = self.item.clone();
        doc.insert("id".to_string(), Value::from(self.id));
        doc.insert(
            timestamp_key.to_string(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        doc
    }
}

/// Processing history item, stamped with `timestamp`
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry(pub StoredItem);

/// Saved generated content, stamped with `saved_at`
#[derive(Debug, Clone, PartialEq)]
pub struct SavedContent(pub StoredItem);

impl Serialize for HistoryEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.to_document("timestamp").serialize(serializer)
    }
}

impl Serialize for SavedContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.to_document("saved_at").serialize(serializer)
    }
}

impl std::ops::Deref for HistoryEntry {
    type Target = StoredItem;
    fn deref(&self) -> &StoredItem {
        &self.0
    }
}

impl std::ops::Deref for SavedContent {
    type Target = StoredItem;
    fn deref(&self) -> &StoredItem {
        &self.0
    }
}

/// Preferences a profile starts with
pub fn default_preferences() -> Map<String, Value> {
    match json!({
        "theme": "light",
        "dyslexia_font": false,
        "high_contrast": false,
        "text_size": "medium",
        "tts_voice": "default",
        "tts_speed": 1.0,
    }) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>>;

    /// Store answers and plan, marking the survey completed
    async fn save_survey(&self, uid: &str, responses: Value, plan: &AdaptationPlan) -> Result<()>;

    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> Result<UserProfile>;

    async fn update_preferences(&self, uid: &str, preferences: Map<String, Value>) -> Result<()>;

    async fn update_accessibility_needs(&self, uid: &str, needs: Vec<String>) -> Result<()>;

    async fn add_history(&self, uid: &str, item: Map<String, Value>) -> Result<i64>;

    /// Newest first
    async fn history(&self, uid: &str, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Returns the new content id
    async fn save_content(&self, uid: &str, item: Map<String, Value>) -> Result<i64>;

    /// Newest first
    async fn saved_content(&self, uid: &str, limit: usize) -> Result<Vec<SavedContent>>;
}

#[derive(Clone)]
pub struct SqliteProfileStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProfileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AccessHubError::Database {
                message: format!("Cannot create {}: {}", parent.display(), e),
            })?;
        }
        let conn = Connection::open(path)?;
        tracing::info!("Opened profile store at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| AccessHubError::Internal {
                message: "profile store lock poisoned".to_string(),
            })?;
            f(&mut guard)
        })
        .await?
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AccessHubError::Database {
            message: format!("Bad timestamp '{}': {}", raw, e),
        })
}

fn ensure_profile(conn: &Connection, uid: &str, now: &str) -> Result<()> {
    let prefs = serde_json::to_string(&default_preferences())?;
    conn.execute(
        "INSERT OR IGNORE INTO profiles (uid, preferences, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)",
        params![uid, prefs, now],
    )?;
    Ok(())
}

struct ProfileRow {
    uid: String,
    email: Option<String>,
    display_name: Option<String>,
    preferences: String,
    accessibility_needs: String,
    survey_responses: Option<String>,
    survey_completed: bool,
    recommendations: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ProfileRow {
    fn into_profile(self) -> Result<UserProfile> {
        Ok(UserProfile {
            uid: self.uid,
            email: self.email,
            display_name: self.display_name,
            preferences: serde_json::from_str(&self.preferences)?,
            accessibility_needs: serde_json::from_str(&self.accessibility_needs)?,
            survey_responses: match self.survey_responses {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Value::Object(Map::new()),
            },
            survey_completed: self.survey_completed,
            recommendations: self
                .recommendations
                .map(|raw| serde_json::from_str(&raw))
                .transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn load_profile(conn: &Connection, uid: &str) -> Result<Option<UserProfile>> {
    let row = conn
        .query_row(
            "SELECT uid, email, display_name, preferences, accessibility_needs,
                    survey_responses, survey_completed, recommendations,
                    created_at, updated_at
             FROM profiles WHERE uid = ?1",
            params![uid],
            |row| {
                Ok(ProfileRow {
                    uid: row.get(0)?,
                    email: row.get(1)?,
                    display_name: row.get(2)?,
                    preferences: row.get(3)?,
                    accessibility_needs: row.get(4)?,
                    survey_responses: row.get(5)?,
                    survey_completed: row.get(6)?,
                    recommendations: row.get(7)?,
                    created_at: row.get(8)?,
                    updated_at: row.get(9)?,
                })
            },
        )
        .optional()?;
    row.map(ProfileRow::into_profile).transpose()
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let uid = uid.to_string();
        self.with_conn(move |conn| load_profile(conn, &uid)).await
    }

    async fn save_survey(&self, uid: &str, responses: Value, plan: &AdaptationPlan) -> Result<()> {
        let uid = uid.to_string();
        let responses = serde_json::to_string(&responses)?;
        let plan = serde_json::to_string(plan)?;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let now = now_rfc3339();
            ensure_profile(&tx, &uid, &now)?;
            tx.execute(
                "UPDATE profiles
                 SET survey_responses = ?2, recommendations = ?3,
                     survey_completed = 1, updated_at = ?4
                 WHERE uid = ?1",
                params![uid, responses, plan, now],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> Result<UserProfile> {
        let uid = uid.to_string();
        let preferences = update
            .preferences
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let needs = update
            .accessibility_needs
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let now = now_rfc3339();
            ensure_profile(&tx, &uid, &now)?;
            tx.execute(
                "UPDATE profiles
                 SET email = COALESCE(?2, email),
                     display_name = COALESCE(?3, display_name),
                     preferences = COALESCE(?4, preferences),
                     accessibility_needs = COALESCE(?5, accessibility_needs),
                     updated_at = ?6
                 WHERE uid = ?1",
                params![uid, update.email, update.display_name, preferences, needs, now],
            )?;
            let profile = load_profile(&tx, &uid)?;
            tx.commit()?;
            profile.ok_or_else(|| AccessHubError::Internal {
                message: format!("profile {} vanished during update", uid),
            })
        })
        .await
    }

    async fn update_preferences(&self, uid: &str, preferences: Map<String, Value>) -> Result<()> {
        self.update_profile(
            uid,
            ProfileUpdate {
                preferences: Some(preferences),
                ..Default::default()
            },
        )
        .await
        .map(|_| ())
    }

    async fn update_accessibility_needs(&self, uid: &str, needs: Vec<String>) -> Result<()> {
        self.update_profile(
            uid,
            ProfileUpdate {
                accessibility_needs: Some(needs),
                ..Default::default()
            },
        )
        .await
        .map(|_| ())
    }

    async fn add_history(&self, uid: &str, item: Map<String, Value>) -> Result<i64> {
        self.insert_item(ItemTable::History, uid, item).await
    }

    async fn history(&self, uid: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let items = self.list_items(ItemTable::History, uid, limit).await?;
        Ok(items.into_iter().map(HistoryEntry).collect())
    }

    async fn save_content(&self, uid: &str, item: Map<String, Value>) -> Result<i64> {
        self.insert_item(ItemTable::SavedContent, uid, item).await
    }

    async fn saved_content(&self, uid: &str, limit: usize) -> Result<Vec<SavedContent>> {
        let items = self.list_items(ItemTable::SavedContent, uid, limit).await?;
        Ok(items.into_iter().map(SavedContent).collect())
    }
}

/// Per-user append-only item tables
#[derive(Debug, Clone, Copy)]
enum ItemTable {
    History,
    SavedContent,
}

impl ItemTable {
    fn insert_sql(self) -> &'static str {
        match self {
            ItemTable::History => "INSERT INTO history (uid, item, created_at) VALUES (?1, ?2, ?3)",
            ItemTable::SavedContent => {
                "INSERT INTO saved_content (uid, item, saved_at) VALUES (?1, ?2, ?3)"
            }
        }
    }

    fn select_sql(self) -> &'static str {
        match self {
            ItemTable::History => {
                "SELECT id, item, created_at FROM history
                 WHERE uid = ?1 ORDER BY id DESC LIMIT ?2"
            }
            ItemTable::SavedContent => {
                "SELECT id, item, saved_at FROM saved_content
                 WHERE uid = ?1 ORDER BY id DESC LIMIT ?2"
            }
        }
    }
}

impl SqliteProfileStore {
    async fn insert_item(&self, table: ItemTable, uid: &str, item: Map<String, Value>) -> Result<i64> {
        let uid = uid.to_string();
        let item = serde_json::to_string(&item)?;
        self.with_conn(move |conn| {
            conn.execute(table.insert_sql(), params![uid, item, now_rfc3339()])?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn list_items(&self, table: ItemTable, uid: &str, limit: usize) -> Result<Vec<StoredItem>> {
        let uid = uid.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(table.select_sql())?;
            let rows = stmt
                .query_map(params![uid, limit], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter()
                .map(|(id, item, stamped)| -> Result<StoredItem> {
                    Ok(StoredItem {
                        id,
                        item: serde_json::from_str(&item)?,
                        timestamp: parse_timestamp(&stamped)?,
                    })
                })
                .collect()
        })
        .await
    }
}
