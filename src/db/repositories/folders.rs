use anyhow::{bail, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{connection::Database, helpers::to_u32, models::Folder};

fn row_to_folder(row: &Row) -> Result<Folder> {
    let order_index: i64 = row.get("order_index")?;
    Ok(Folder {
        id: row.get("id")?,
        name: row.get("name")?,
        emoji: row.get("emoji")?,
        color: row.get("color")?,
        context_ids: Vec::new(),
        order: to_u32(order_index, "order_index")?,
    })
}

fn load_members(conn: &Connection, folder_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT context_id FROM folder_members WHERE folder_id = ?1 ORDER BY position ASC",
    )?;
    let ids = stmt
        .query_map(params![folder_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

fn folder_exists(conn: &Connection, folder_id: &str) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM folders WHERE id = ?1",
            params![folder_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

impl Database {
    /// Folders ordered by `order`, each with its members in insertion order.
    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        self.execute(|conn| {
            let mut folders = {
                let mut stmt = conn.prepare(
                    "SELECT id, name, emoji, color, order_index FROM folders
                     ORDER BY order_index ASC, id ASC",
                )?;
                let mut rows = stmt.query([])?;
                let mut folders = Vec::new();
                while let Some(row) = rows.next()? {
                    folders.push(row_to_folder(row)?);
                }
                folders
            };

            for folder in &mut folders {
                folder.context_ids = load_members(conn, &folder.id)?;
            }
            Ok(folders)
        })
        .await
    }

    pub async fn get_folder(&self, folder_id: &str) -> Result<Option<Folder>> {
        let folder_id = folder_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, emoji, color, order_index FROM folders WHERE id = ?1",
            )?;
            let mut rows = stmt.query(params![folder_id])?;
            let mut folder = match rows.next()? {
                Some(row) => row_to_folder(row)?,
                None => return Ok(None),
            };
            folder.context_ids = load_members(conn, &folder.id)?;
            Ok(Some(folder))
        })
        .await
    }

    pub async fn create_folder(&self, name: &str, emoji: &str, color: &str) -> Result<Folder> {
        let folder = Folder {
            id: format!("folder_{}", Uuid::new_v4()),
            name: name.to_string(),
            emoji: emoji.to_string(),
            color: color.to_string(),
            context_ids: Vec::new(),
            order: 0,
        };
        self.execute(move |conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM folders", [], |row| row.get(0))?;
            let folder = Folder {
                order: to_u32(count, "folder count")?,
                ..folder
            };
            conn.execute(
                "INSERT INTO folders (id, name, emoji, color, order_index) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![folder.id, folder.name, folder.emoji, folder.color, folder.order],
            )?;
            Ok(folder)
        })
        .await
    }

    pub async fn rename_folder(&self, folder_id: &str, name: &str) -> Result<bool> {
        let folder_id = folder_id.to_string();
        let name = name.to_string();
        self.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE folders SET name = ?1 WHERE id = ?2",
                params![name, folder_id],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    /// Members of a deleted folder become uncategorized.
    pub async fn delete_folder(&self, folder_id: &str) -> Result<bool> {
        let folder_id = folder_id.to_string();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM folder_members WHERE folder_id = ?1",
                params![folder_id],
            )?;
            let removed = tx.execute("DELETE FROM folders WHERE id = ?1", params![folder_id])?;
            tx.commit()?;
            Ok(removed > 0)
        })
        .await
    }

    /// Moves the context into `folder_id`, dropping any other membership first.
    pub async fn add_to_folder(&self, context_id: &str, folder_id: &str) -> Result<()> {
        let context_id = context_id.to_string();
        let folder_id = folder_id.to_string();
        self.execute(move |conn| {
            if !folder_exists(conn, &folder_id)? {
                bail!("folder {folder_id} not found");
            }
            let context_found = conn
                .query_row(
                    "SELECT 1 FROM contexts WHERE id = ?1",
                    params![context_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if !context_found {
                bail!("context {context_id} not found");
            }

            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM folder_members WHERE context_id = ?1",
                params![context_id],
            )?;
            let next_position: i64 = tx.query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM folder_members WHERE folder_id = ?1",
                params![folder_id],
                |row| row.get(0),
            )?;
            tx.execute(
                "INSERT INTO folder_members (context_id, folder_id, position) VALUES (?1, ?2, ?3)",
                params![context_id, folder_id, next_position],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn remove_from_folder(&self, context_id: &str, folder_id: &str) -> Result<bool> {
        let context_id = context_id.to_string();
        let folder_id = folder_id.to_string();
        self.execute(move |conn| {
            let removed = conn.execute(
                "DELETE FROM folder_members WHERE context_id = ?1 AND folder_id = ?2",
                params![context_id, folder_id],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    pub async fn folder_for_context(&self, context_id: &str) -> Result<Option<String>> {
        let context_id = context_id.to_string();
        self.execute(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT folder_id FROM folder_members WHERE context_id = ?1",
                    params![context_id],
                    |row| row.get::<_, String>(0),
                )
                .optional()?)
        })
        .await
    }

    /// Listed ids take positions 0..n in the given order; unlisted folders
    /// keep their relative order after them.
    pub async fn reorder_folders(&self, folder_ids: &[String]) -> Result<()> {
        let folder_ids = folder_ids.to_vec();
        self.execute(move |conn| {
            for id in &folder_ids {
                if !folder_exists(conn, id)? {
                    bail!("folder {id} not found");
                }
            }

            let rest = {
                let mut stmt =
                    conn.prepare("SELECT id FROM folders ORDER BY order_index ASC, id ASC")?;
                let ids = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                ids
            };

            let ordered = folder_ids
                .iter()
                .cloned()
                .chain(rest.into_iter().filter(|id| !folder_ids.contains(id)));

            let tx = conn.transaction()?;
            for (index, id) in ordered.enumerate() {
                tx.execute(
                    "UPDATE folders SET order_index = ?1 WHERE id = ?2",
                    params![index as i64, id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}
