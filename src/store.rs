use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::models::{
    AudienceProfile, ChatMessage, ChatRole, ConnectedSheet, HeaderMapping, Lead, StoredDocument,
};

/// Device-local state the gateway never sees: the audience chat transcript,
/// uploaded document metadata, connected sheets and their header mappings,
/// the current audience profile, and starred lead ids.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open() -> Result<Self> {
        Self::open_at(Self::default_path()?)
    }

    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        let db = Self { conn, path };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_path() -> Result<PathBuf> {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "prospect") {
            Ok(proj_dirs.data_dir().join("prospect.db"))
        } else {
            // Fallback to current directory
            Ok(PathBuf::from("prospect.db"))
        }
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                content_type TEXT NOT NULL,
                uploaded_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS sheets (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                url TEXT NOT NULL,
                columns TEXT NOT NULL DEFAULT '[]',
                connected INTEGER NOT NULL DEFAULT 1,
                last_synced TEXT,
                row_count INTEGER
            );

            CREATE TABLE IF NOT EXISTS header_mappings (
                sheet_id TEXT NOT NULL REFERENCES sheets(id),
                source_header TEXT NOT NULL,
                lead_field TEXT NOT NULL,
                PRIMARY KEY (sheet_id, source_header)
            );

            CREATE TABLE IF NOT EXISTS audience_profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS starred_leads (
                lead_id TEXT PRIMARY KEY,
                starred_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    // --- Chat operations ---

    pub fn append_chat(&self, role: ChatRole, content: &str) -> Result<ChatMessage> {
        let created_at = now_utc();
        self.conn.execute(
            "INSERT INTO chat_messages (role, content, created_at) VALUES (?1, ?2, ?3)",
            params![role.as_str(), content, created_at],
        )?;
        Ok(ChatMessage {
            id: self.conn.last_insert_rowid(),
            role,
            content: content.to_string(),
            created_at,
        })
    }

    pub fn chat_history(&self) -> Result<Vec<ChatMessage>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, role, content, created_at FROM chat_messages ORDER BY id")?;
        let rows = stmt.query_map([], Self::row_to_message)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to load chat history")
    }

    /// Write the opening assistant message if the transcript is empty.
    /// Returns true when a greeting row was inserted.
    pub fn seed_chat(&self, greeting: &str) -> Result<bool> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM chat_messages", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(false);
        }
        self.append_chat(ChatRole::Assistant, greeting)?;
        Ok(true)
    }

    pub fn reset_chat(&self, greeting: &str) -> Result<()> {
        self.conn.execute("DELETE FROM chat_messages", [])?;
        self.append_chat(ChatRole::Assistant, greeting)?;
        Ok(())
    }

    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<ChatMessage> {
        let role_text: String = row.get(1)?;
        Ok(ChatMessage {
            id: row.get(0)?,
            // The CHECK constraint keeps this total in practice.
            role: ChatRole::from_str(&role_text).unwrap_or(ChatRole::Assistant),
            content: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    // --- Document operations ---

    pub fn add_document(
        &self,
        name: &str,
        size_bytes: i64,
        content_type: &str,
    ) -> Result<StoredDocument> {
        let uploaded_at = now_utc();
        self.conn.execute(
            "INSERT INTO documents (name, size_bytes, content_type, uploaded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, size_bytes, content_type, uploaded_at],
        )?;
        Ok(StoredDocument {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            size_bytes,
            content_type: content_type.to_string(),
            uploaded_at,
        })
    }

    pub fn list_documents(&self) -> Result<Vec<StoredDocument>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, size_bytes, content_type, uploaded_at
             FROM documents ORDER BY id DESC",
        )?;
        let rows = stmt.query_map([], Self::row_to_document)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list documents")
    }

    pub fn remove_document(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM documents WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<StoredDocument> {
        Ok(StoredDocument {
            id: row.get(0)?,
            name: row.get(1)?,
            size_bytes: row.get(2)?,
            content_type: row.get(3)?,
            uploaded_at: row.get(4)?,
        })
    }

    // --- Sheet operations ---

    pub fn upsert_sheet(&self, sheet: &ConnectedSheet) -> Result<()> {
        let columns = serde_json::to_string(&sheet.columns)?;
        self.conn.execute(
            "INSERT INTO sheets (id, name, url, columns, connected, last_synced, row_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 url = excluded.url,
                 columns = excluded.columns,
                 connected = excluded.connected,
                 last_synced = excluded.last_synced,
                 row_count = excluded.row_count",
            params![
                sheet.id,
                sheet.name,
                sheet.url,
                columns,
                sheet.connected,
                sheet.last_synced,
                sheet.row_count
            ],
        )?;
        Ok(())
    }

    pub fn list_sheets(&self) -> Result<Vec<ConnectedSheet>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, url, columns, connected, last_synced, row_count
             FROM sheets ORDER BY name",
        )?;
        let rows = stmt.query_map([], Self::row_to_sheet)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list sheets")
    }

    pub fn get_sheet(&self, id: &str) -> Result<Option<ConnectedSheet>> {
        let result = self.conn.query_row(
            "SELECT id, name, url, columns, connected, last_synced, row_count
             FROM sheets WHERE id = ?1",
            [id],
            Self::row_to_sheet,
        );
        match result {
            Ok(sheet) => Ok(Some(sheet)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn mark_sheet_synced(&self, id: &str, row_count: u32) -> Result<()> {
        self.conn.execute(
            "UPDATE sheets SET last_synced = ?1, row_count = ?2 WHERE id = ?3",
            params![now_utc(), row_count, id],
        )?;
        Ok(())
    }

    /// Forget the sheet locally. The backend connection is left alone.
    pub fn disconnect_sheet(&self, id: &str) -> Result<bool> {
        self.conn
            .execute("DELETE FROM header_mappings WHERE sheet_id = ?1", [id])?;
        let changed = self.conn.execute("DELETE FROM sheets WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    fn row_to_sheet(row: &rusqlite::Row) -> rusqlite::Result<ConnectedSheet> {
        let columns_json: String = row.get(3)?;
        Ok(ConnectedSheet {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            columns: serde_json::from_str(&columns_json).unwrap_or_else(|err| {
                log::warn!("sheet column list unreadable, treating as empty: {err}");
                Vec::new()
            }),
            connected: row.get(4)?,
            last_synced: row.get(5)?,
            row_count: row.get(6)?,
        })
    }

    // --- Header mapping operations ---

    pub fn save_mappings(&self, sheet_id: &str, mappings: &[HeaderMapping]) -> Result<()> {
        self.conn
            .execute("DELETE FROM header_mappings WHERE sheet_id = ?1", [sheet_id])?;
        for mapping in mappings {
            self.conn.execute(
                "INSERT INTO header_mappings (sheet_id, source_header, lead_field)
                 VALUES (?1, ?2, ?3)",
                params![sheet_id, mapping.source_header, mapping.lead_field],
            )?;
        }
        Ok(())
    }

    pub fn mappings_for(&self, sheet_id: &str) -> Result<Vec<HeaderMapping>> {
        let mut stmt = self.conn.prepare(
            "SELECT sheet_id, source_header, lead_field
             FROM header_mappings WHERE sheet_id = ?1 ORDER BY source_header",
        )?;
        let rows = stmt.query_map([sheet_id], |row| {
            Ok(HeaderMapping {
                sheet_id: row.get(0)?,
                source_header: row.get(1)?,
                lead_field: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to load header mappings")
    }

    // --- Profile operations ---

    /// Replace the stored profile wholesale. There is only ever one current
    /// profile; regeneration does not merge.
    pub fn save_profile(&self, profile: &AudienceProfile) -> Result<()> {
        let body = serde_json::to_string(profile)?;
        self.conn.execute(
            "INSERT INTO audience_profile (id, body, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![body, now_utc()],
        )?;
        Ok(())
    }

    pub fn load_profile(&self) -> Result<Option<AudienceProfile>> {
        let result = self.conn.query_row(
            "SELECT body FROM audience_profile WHERE id = 1",
            [],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(body) => {
                let profile =
                    serde_json::from_str(&body).context("Stored audience profile is corrupt")?;
                Ok(Some(profile))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn profile_updated_at(&self) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT updated_at FROM audience_profile WHERE id = 1",
            [],
            |row| row.get(0),
        );
        match result {
            Ok(at) => Ok(Some(at)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // --- Starred lead operations ---

    pub fn set_starred(&self, lead_id: &str, starred: bool) -> Result<()> {
        if starred {
            self.conn.execute(
                "INSERT OR IGNORE INTO starred_leads (lead_id, starred_at) VALUES (?1, ?2)",
                params![lead_id, now_utc()],
            )?;
        } else {
            self.conn
                .execute("DELETE FROM starred_leads WHERE lead_id = ?1", [lead_id])?;
        }
        Ok(())
    }

    /// Flip the star and return the new state.
    pub fn toggle_starred(&self, lead_id: &str) -> Result<bool> {
        let starred = self.starred_ids()?.contains(lead_id);
        self.set_starred(lead_id, !starred)?;
        Ok(!starred)
    }

    pub fn starred_ids(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT lead_id FROM starred_leads")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<HashSet<_>, _>>()
            .context("Failed to load starred leads")
    }

    /// Stamp the local star flag onto gateway leads before display.
    pub fn apply_stars(&self, leads: &mut [Lead]) -> Result<()> {
        let starred = self.starred_ids()?;
        for lead in leads {
            if let Some(id) = &lead.id {
                lead.starred = starred.contains(id);
            }
        }
        Ok(())
    }
}

fn now_utc() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
