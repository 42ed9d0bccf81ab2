use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{from_json, parse_datetime, parse_optional_datetime, to_i64, to_json, to_u32, to_u64},
    models::{ContextMetadata, ContextSnapshot},
};

const CONTEXT_COLUMNS: &str = "id, name, emoji, created_at, updated_at, last_restored, restore_count,
     windows_json, app_states_json, project, tags_json, duration_secs, app_count";

fn row_to_context(row: &Row) -> Result<ContextSnapshot> {
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let last_restored: Option<String> = row.get("last_restored")?;
    let restore_count: i64 = row.get("restore_count")?;
    let windows_json: String = row.get("windows_json")?;
    let app_states_json: String = row.get("app_states_json")?;
    let tags_json: String = row.get("tags_json")?;
    let duration_secs: i64 = row.get("duration_secs")?;
    let app_count: i64 = row.get("app_count")?;

    Ok(ContextSnapshot {
        id: row.get("id")?,
        name: row.get("name")?,
        emoji: row.get("emoji")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
        last_restored: parse_optional_datetime(last_restored, "last_restored")?,
        restore_count: to_u32(restore_count, "restore_count")?,
        windows: from_json(&windows_json, "windows_json")?,
        app_states: from_json(&app_states_json, "app_states_json")?,
        metadata: ContextMetadata {
            project: row.get("project")?,
            tags: from_json(&tags_json, "tags_json")?,
            duration_secs: to_u64(duration_secs, "duration_secs")?,
            app_count: to_u64(app_count, "app_count")? as usize,
        },
    })
}

fn query_contexts(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> Result<Vec<ContextSnapshot>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(args)?;
    let mut contexts = Vec::new();
    while let Some(row) = rows.next()? {
        contexts.push(row_to_context(row)?);
    }
    Ok(contexts)
}

impl Database {
    /// All snapshots, most recently inserted first.
    pub async fn load_all_contexts(&self) -> Result<Vec<ContextSnapshot>> {
        self.execute(|conn| {
            query_contexts(
                conn,
                &format!("SELECT {CONTEXT_COLUMNS} FROM contexts ORDER BY seq DESC"),
                [],
            )
            .context("failed to load contexts")
        })
        .await
    }

    pub async fn get_context(&self, context_id: &str) -> Result<Option<ContextSnapshot>> {
        let context_id = context_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONTEXT_COLUMNS} FROM contexts WHERE id = ?1"
            ))?;
            let mut rows = stmt.query(params![context_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_context(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Inserts a new snapshot at the head or updates an existing one in place.
    ///
    /// `updated_at` is always set to the write time. Rows beyond
    /// `max_retained` are evicted oldest-inserted first; their ids are
    /// returned.
    pub async fn upsert_context(
        &self,
        snapshot: &ContextSnapshot,
        max_retained: usize,
    ) -> Result<Vec<String>> {
        let record = snapshot.clone();
        let max_retained = max_retained.max(1);
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let updated_at = Utc::now().to_rfc3339();
            let windows_json = to_json(&record.windows, "windows")?;
            let app_states_json = to_json(&record.app_states, "app_states")?;
            let tags_json = to_json(&record.metadata.tags, "tags")?;

            let updated = tx.execute(
                "UPDATE contexts
                 SET name = ?2,
                     emoji = ?3,
                     created_at = ?4,
                     updated_at = ?5,
                     last_restored = ?6,
                     restore_count = ?7,
                     windows_json = ?8,
                     app_states_json = ?9,
                     project = ?10,
                     tags_json = ?11,
                     duration_secs = ?12,
                     app_count = ?13
                 WHERE id = ?1",
                params![
                    record.id,
                    record.name,
                    record.emoji,
                    record.created_at.to_rfc3339(),
                    updated_at,
                    record.last_restored.map(|dt| dt.to_rfc3339()),
                    record.restore_count,
                    windows_json,
                    app_states_json,
                    record.metadata.project,
                    tags_json,
                    to_i64(record.metadata.duration_secs)?,
                    to_i64(record.metadata.app_count as u64)?,
                ],
            )?;

            if updated == 0 {
                tx.execute(
                    "INSERT INTO contexts (id, name, emoji, created_at, updated_at, last_restored, restore_count,
                        windows_json, app_states_json, project, tags_json, duration_secs, app_count)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    params![
                        record.id,
                        record.name,
                        record.emoji,
                        record.created_at.to_rfc3339(),
                        updated_at,
                        record.last_restored.map(|dt| dt.to_rfc3339()),
                        record.restore_count,
                        windows_json,
                        app_states_json,
                        record.metadata.project,
                        tags_json,
                        to_i64(record.metadata.duration_secs)?,
                        to_i64(record.metadata.app_count as u64)?,
                    ],
                )
                .with_context(|| format!("failed to insert context {}", record.id))?;
            }

            let evicted = {
                let mut stmt = tx.prepare(
                    "SELECT id FROM contexts
                     WHERE seq NOT IN (SELECT seq FROM contexts ORDER BY seq DESC LIMIT ?1)",
                )?;
                let ids = stmt
                    .query_map(params![to_i64(max_retained as u64)?], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                ids
            };

            for id in &evicted {
                tx.execute("DELETE FROM folder_members WHERE context_id = ?1", params![id])?;
                tx.execute("DELETE FROM contexts WHERE id = ?1", params![id])?;
            }

            tx.commit().context("failed to commit context upsert")?;
            Ok(evicted)
        })
        .await
    }

    /// Returns whether a row was removed.
    pub async fn remove_context(&self, context_id: &str) -> Result<bool> {
        let context_id = context_id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM folder_members WHERE context_id = ?1",
                params![context_id],
            )?;
            let removed = tx.execute("DELETE FROM contexts WHERE id = ?1", params![context_id])?;
            tx.commit()?;
            Ok(removed > 0)
        })
        .await
    }

    pub async fn rename_context(&self, context_id: &str, name: &str) -> Result<bool> {
        let context_id = context_id.to_string();
        let name = name.to_string();
        self.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE contexts SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, Utc::now().to_rfc3339(), context_id],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    /// Case-insensitive substring match on the name, most recent first.
    pub async fn search_contexts(&self, query: &str) -> Result<Vec<ContextSnapshot>> {
        let needle = query.to_lowercase();
        let all = self.load_all_contexts().await?;
        Ok(all
            .into_iter()
            .filter(|context| context.name.to_lowercase().contains(&needle))
            .collect())
    }

    pub async fn recent_contexts(&self, limit: usize) -> Result<Vec<ContextSnapshot>> {
        let mut all = self.load_all_contexts().await?;
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        Ok(all)
    }

    pub async fn context_exists(&self, context_id: &str) -> Result<bool> {
        let context_id = context_id.to_string();
        self.execute(move |conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM contexts WHERE id = ?1",
                    params![context_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppState, AppStates, Bounds, TerminalState, WindowDescriptor};
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    fn snapshot(id: &str, name: &str) -> ContextSnapshot {
        let now = Utc::now();
        let states: AppStates = vec![AppState::Terminal(TerminalState {
            cwd: "/home/u/demo".into(),
            shell: "zsh".into(),
        })]
        .into_iter()
        .collect();
        ContextSnapshot {
            id: id.to_string(),
            name: name.to_string(),
            emoji: "⌨️".into(),
            created_at: now,
            updated_at: now - Duration::hours(1),
            last_restored: None,
            restore_count: 0,
            windows: vec![WindowDescriptor::new("Terminal", "zsh", Bounds::new(0, 0, 800, 600))],
            app_states: states,
            metadata: ContextMetadata {
                project: Some("demo".into()),
                tags: vec!["terminal".into(), "morning".into()],
                duration_secs: 0,
                app_count: 1,
            },
        }
    }

    #[tokio::test]
    async fn round_trip_preserves_everything_but_updated_at() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("contexts.db")).unwrap();
        let original = snapshot("a", "Demo Morning");

        db.upsert_context(&original, 50).await.unwrap();
        let loaded = db.get_context("a").await.unwrap().unwrap();

        assert!(loaded.updated_at > original.updated_at);
        let normalized = ContextSnapshot {
            updated_at: original.updated_at,
            ..loaded
        };
        assert_eq!(normalized, original);
    }

    #[tokio::test]
    async fn eviction_drops_oldest_inserted_only() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("contexts.db")).unwrap();

        for id in ["first", "second", "third"] {
            db.upsert_context(&snapshot(id, id), 3).await.unwrap();
        }
        // Updating keeps the insertion position.
        db.upsert_context(&snapshot("first", "renamed"), 3).await.unwrap();

        let evicted = db.upsert_context(&snapshot("fourth", "fourth"), 3).await.unwrap();
        assert_eq!(evicted, vec!["first".to_string()]);

        let ids: Vec<String> = db
            .load_all_contexts()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["fourth", "third", "second"]);
    }

    #[tokio::test]
    async fn search_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("contexts.db")).unwrap();
        db.upsert_context(&snapshot("a", "Demo Morning"), 50).await.unwrap();
        db.upsert_context(&snapshot("b", "Docs Evening"), 50).await.unwrap();

        let hits = db.search_contexts("demo").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
        assert!(db.remove_context("a").await.unwrap());
        assert!(!db.remove_context("a").await.unwrap());
    }
}
