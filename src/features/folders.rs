use std::collections::{HashMap, HashSet};

use anyhow::Result;

use crate::db::{ContextSummary, Database, FolderGroup};

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Moves a context between folders. `from` is only a hint; membership is
/// unique, so adding to `to` drops every other membership anyway.
pub async fn move_context(
    db: &Database,
    context_id: &str,
    from: Option<&str>,
    to: &str,
) -> Result<()> {
    if let Some(from) = from {
        db.remove_from_folder(context_id, from).await?;
    }
    db.add_to_folder(context_id, to).await
}

/// Folders in order with their contexts, then every context in no folder.
/// Members whose snapshot no longer exists are left out.
pub async fn organized_contexts(db: &Database) -> Result<Vec<FolderGroup>> {
    let folders = db.list_folders().await?;
    let contexts = db.load_all_contexts().await?;

    let summaries: HashMap<&str, ContextSummary> = contexts
        .iter()
        .map(|context| (context.id.as_str(), context.summary()))
        .collect();

    let mut categorized: HashSet<&str> = HashSet::new();
    let mut groups = Vec::with_capacity(folders.len() + 1);
    for folder in &folders {
        let members = folder
            .context_ids
            .iter()
            .filter_map(|id| summaries.get(id.as_str()).cloned())
            .collect();
        categorized.extend(folder.context_ids.iter().map(String::as_str));
        groups.push(FolderGroup {
            folder_id: Some(folder.id.clone()),
            name: folder.name.clone(),
            emoji: folder.emoji.clone(),
            contexts: members,
        });
    }

    groups.push(FolderGroup {
        folder_id: None,
        name: UNCATEGORIZED.to_string(),
        emoji: String::new(),
        contexts: contexts
            .iter()
            .filter(|context| !categorized.contains(context.id.as_str()))
            .map(|context| context.summary())
            .collect(),
    });

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_snapshot, temp_database};

    #[tokio::test]
    async fn groups_follow_folder_order_and_collect_the_rest() {
        let (_dir, db) = temp_database();
        for id in ["a", "b", "c"] {
            db.upsert_context(&sample_snapshot(id), 50).await.unwrap();
        }
        db.add_to_folder("a", "personal").await.unwrap();
        db.add_to_folder("b", "work").await.unwrap();

        let groups = organized_contexts(&db).await.unwrap();
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Work", "Personal", "System", UNCATEGORIZED]);
        assert_eq!(groups[0].contexts[0].id, "b");
        assert_eq!(groups[1].contexts[0].id, "a");
        assert_eq!(groups[3].contexts.len(), 1);
        assert_eq!(groups[3].contexts[0].id, "c");
    }

    #[tokio::test]
    async fn a_context_lives_in_at_most_one_folder() {
        let (_dir, db) = temp_database();
        db.upsert_context(&sample_snapshot("a"), 50).await.unwrap();

        db.add_to_folder("a", "work").await.unwrap();
        move_context(&db, "a", None, "system").await.unwrap();

        let folders = db.list_folders().await.unwrap();
        let holding: Vec<&str> = folders
            .iter()
            .filter(|f| f.context_ids.iter().any(|id| id == "a"))
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(holding, vec!["system"]);
    }

    #[tokio::test]
    async fn deleting_a_folder_uncategorizes_its_members() {
        let (_dir, db) = temp_database();
        db.upsert_context(&sample_snapshot("a"), 50).await.unwrap();
        db.add_to_folder("a", "work").await.unwrap();

        assert!(db.delete_folder("work").await.unwrap());
        let groups = organized_contexts(&db).await.unwrap();
        let uncategorized = groups.last().unwrap();
        assert_eq!(uncategorized.contexts[0].id, "a");
    }
}
