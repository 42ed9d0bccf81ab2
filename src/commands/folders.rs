use crate::db::models::{DEFAULT_FOLDER_COLOR, DEFAULT_FOLDER_EMOJI};
use crate::db::{Folder, FolderGroup};
use crate::features::folders;

use super::{not_found, AppContext};

pub async fn list_folders(ctx: &AppContext) -> Result<Vec<Folder>, String> {
    ctx.db.list_folders().await.map_err(|e| e.to_string())
}

pub async fn create_folder(
    ctx: &AppContext,
    name: &str,
    emoji: Option<String>,
    color: Option<String>,
) -> Result<Folder, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("folder name must not be empty".into());
    }
    let emoji = emoji.unwrap_or_else(|| DEFAULT_FOLDER_EMOJI.to_string());
    let color = color.unwrap_or_else(|| DEFAULT_FOLDER_COLOR.to_string());
    ctx.db
        .create_folder(name, &emoji, &color)
        .await
        .map_err(|e| e.to_string())
}

pub async fn rename_folder(ctx: &AppContext, folder_id: &str, name: &str) -> Result<(), String> {
    let renamed = ctx
        .db
        .rename_folder(folder_id, name.trim())
        .await
        .map_err(|e| e.to_string())?;
    if !renamed {
        return Err(not_found("folder", folder_id));
    }
    Ok(())
}

pub async fn delete_folder(ctx: &AppContext, folder_id: &str) -> Result<(), String> {
    let deleted = ctx
        .db
        .delete_folder(folder_id)
        .await
        .map_err(|e| e.to_string())?;
    if !deleted {
        return Err(not_found("folder", folder_id));
    }
    Ok(())
}

pub async fn add_to_folder(
    ctx: &AppContext,
    context_id: &str,
    folder_id: &str,
) -> Result<(), String> {
    ctx.db
        .add_to_folder(context_id, folder_id)
        .await
        .map_err(|e| e.to_string())
}

pub async fn remove_from_folder(
    ctx: &AppContext,
    context_id: &str,
    folder_id: &str,
) -> Result<(), String> {
    let removed = ctx
        .db
        .remove_from_folder(context_id, folder_id)
        .await
        .map_err(|e| e.to_string())?;
    if !removed {
        return Err(format!("context {context_id} is not in folder {folder_id}"));
    }
    Ok(())
}

pub async fn move_context(
    ctx: &AppContext,
    context_id: &str,
    from: Option<&str>,
    to: &str,
) -> Result<(), String> {
    folders::move_context(&ctx.db, context_id, from, to)
        .await
        .map_err(|e| e.to_string())
}

pub async fn reorder_folders(ctx: &AppContext, folder_ids: &[String]) -> Result<(), String> {
    ctx.db
        .reorder_folders(folder_ids)
        .await
        .map_err(|e| e.to_string())
}

pub async fn get_organized_contexts(ctx: &AppContext) -> Result<Vec<FolderGroup>, String> {
    folders::organized_contexts(&ctx.db)
        .await
        .map_err(|e| e.to_string())
}
