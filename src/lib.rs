pub mod adapters;
pub mod ai;
pub mod autosnap;
pub mod cli;
pub mod commands;
pub mod db;
pub mod engine;
pub mod features;
pub mod models;
pub mod os_bridge;
pub mod settings;
pub mod timer;
pub mod utils;
pub mod window_source;

#[cfg(test)]
mod test_support;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use cli::{Cli, Commands, ExportFormat, FolderCommands, SourceKind, TemplateCommands, TimerCommands};
use commands::{
    contexts, folders, insights, templates, timer as timer_commands, AppContext, CommandResponse,
};
use settings::default_data_dir;
use timer::TimerStatus;
use window_source::{AppleScriptWindowSource, TimeBucketWindowSource, WindowSource};

/// Prints the command result as JSON. Returns whether it succeeded.
fn emit<T: Serialize>(result: Result<T, String>) -> Result<bool> {
    let response = CommandResponse::from(result);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.success)
}

fn window_source(kind: SourceKind) -> Arc<dyn WindowSource> {
    match kind {
        SourceKind::Live => Arc::new(AppleScriptWindowSource),
        SourceKind::Demo => Arc::new(TimeBucketWindowSource::new()),
    }
}

async fn wait_for_ctrl_c() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")
}

/// Keeps the pomodoro in the foreground until it completes or Ctrl-C.
async fn follow_pomodoro(ctx: &AppContext) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if ctx.timer().snapshot().await.state.status == TimerStatus::Idle {
                    return Ok(());
                }
            }
            result = wait_for_ctrl_c() => return result,
        }
    }
}

async fn dispatch(ctx: &AppContext, command: Commands) -> Result<bool> {
    match command {
        Commands::Capture { name } => emit(contexts::capture_context(ctx, name).await),
        Commands::Restore { id } => emit(contexts::restore_context(ctx, &id).await),
        Commands::QuickRestore => emit(contexts::quick_restore(ctx).await),
        Commands::List => emit(contexts::get_all_contexts(ctx).await),
        Commands::Show { id } => emit(contexts::get_context(ctx, &id).await),
        Commands::Search { query } => emit(contexts::search_contexts(ctx, &query).await),
        Commands::Delete { id } => emit(contexts::delete_context(ctx, &id).await),
        Commands::Rename { id, name } => emit(contexts::rename_context(ctx, &id, &name).await),
        Commands::Duplicate { id } => emit(contexts::duplicate_context(ctx, &id).await),
        Commands::Folder { command } => dispatch_folder(ctx, command).await,
        Commands::Timer { command } => dispatch_timer(ctx, command).await,
        Commands::Template { command } => dispatch_template(ctx, command).await,
        Commands::Suggest => emit(insights::get_suggestions(ctx).await),
        Commands::Diff { a, b, text: true } => {
            let report = insights::diff_report(ctx, &a, &b).await;
            match report {
                Ok(report) => {
                    println!("{report}");
                    Ok(true)
                }
                Err(err) => emit::<()>(Err(err)),
            }
        }
        Commands::Diff { a, b, text: false } => emit(insights::diff_contexts(ctx, &a, &b).await),
        Commands::Export { format, id, output } => {
            let exported = match (format, id) {
                (ExportFormat::Json, _) => insights::export_json(ctx).await,
                (ExportFormat::Shell, Some(id)) => insights::export_shell_script(ctx, &id).await,
                (ExportFormat::Applescript, Some(id)) => {
                    insights::export_applescript(ctx, &id).await
                }
                (_, None) => Err("--id is required for script exports".to_string()),
            };
            match (exported, output) {
                (Ok(text), Some(path)) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    emit(Ok(path.display().to_string()))
                }
                (Ok(text), None) => {
                    println!("{text}");
                    Ok(true)
                }
                (Err(err), _) => emit::<()>(Err(err)),
            }
        }
        Commands::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            emit(insights::import_json(ctx, &text).await)
        }
        Commands::Focus => {
            let activated = emit(insights::toggle_focus_mode(ctx).await)?;
            if activated && ctx.focus().is_active().await {
                wait_for_ctrl_c().await?;
            }
            Ok(activated)
        }
        Commands::Settings { set: None } => emit(insights::get_settings(ctx)),
        Commands::Settings { set: Some(path) } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let settings = serde_json::from_str(&text).context("invalid settings JSON")?;
            emit(insights::update_settings(ctx, settings).await)
        }
        Commands::Analytics { cleanup_days } => {
            if let Some(days) = cleanup_days {
                if !emit(insights::cleanup_events(ctx, days).await)? {
                    return Ok(false);
                }
            }
            emit(insights::get_analytics_summary(ctx).await)
        }
        Commands::Adapters => emit(insights::list_adapters(ctx).await),
        Commands::Watch { interval_minutes } => {
            if !emit(insights::start_autosnap(ctx, interval_minutes).await)? {
                return Ok(false);
            }
            wait_for_ctrl_c().await?;
            Ok(true)
        }
    }
}

async fn dispatch_folder(ctx: &AppContext, command: FolderCommands) -> Result<bool> {
    match command {
        FolderCommands::List => emit(folders::list_folders(ctx).await),
        FolderCommands::Create { name, emoji, color } => {
            emit(folders::create_folder(ctx, &name, emoji, color).await)
        }
        FolderCommands::Rename { id, name } => emit(folders::rename_folder(ctx, &id, &name).await),
        FolderCommands::Delete { id } => emit(folders::delete_folder(ctx, &id).await),
        FolderCommands::Add { context, folder } => {
            emit(folders::add_to_folder(ctx, &context, &folder).await)
        }
        FolderCommands::Remove { context, folder } => {
            emit(folders::remove_from_folder(ctx, &context, &folder).await)
        }
        FolderCommands::Move { context, to, from } => {
            emit(folders::move_context(ctx, &context, from.as_deref(), &to).await)
        }
        FolderCommands::Reorder { ids } => emit(folders::reorder_folders(ctx, &ids).await),
        FolderCommands::Organized => emit(folders::get_organized_contexts(ctx).await),
    }
}

async fn dispatch_timer(ctx: &AppContext, command: TimerCommands) -> Result<bool> {
    match command {
        TimerCommands::Pomodoro { context, minutes } => {
            if !emit(timer_commands::start_pomodoro(ctx, &context, minutes).await)? {
                return Ok(false);
            }
            follow_pomodoro(ctx).await?;
            Ok(true)
        }
        TimerCommands::Total { context, days } => {
            emit(timer_commands::get_context_time(ctx, &context, days).await)
        }
        TimerCommands::Daily { date } => emit(timer_commands::get_daily_stats(ctx, date).await),
        TimerCommands::Weekly => emit(timer_commands::get_weekly_report(ctx).await),
        TimerCommands::MostProductive { days } => {
            emit(timer_commands::get_most_productive_context(ctx, days).await)
        }
        TimerCommands::Goal => emit(timer_commands::get_daily_goal_progress(ctx).await),
    }
}

async fn dispatch_template(ctx: &AppContext, command: TemplateCommands) -> Result<bool> {
    match command {
        TemplateCommands::List { category: None } => emit(templates::list_templates(ctx).await),
        TemplateCommands::List {
            category: Some(category),
        } => emit(templates::get_templates_by_category(ctx, &category).await),
        TemplateCommands::Categories => emit(templates::get_template_categories()),
        TemplateCommands::Show { id } => emit(templates::get_template(ctx, &id).await),
        TemplateCommands::Create {
            name,
            emoji,
            category,
            apps,
        } => emit(templates::create_custom_template(ctx, &name, &emoji, apps, &category).await),
        TemplateCommands::Delete { id } => emit(templates::delete_custom_template(ctx, &id).await),
        TemplateCommands::Apply { id } => emit(templates::apply_template(ctx, &id).await),
        TemplateCommands::Snap { id, name } => {
            emit(templates::create_context_from_template(ctx, &id, name).await)
        }
    }
}

async fn run_cli(cli: Cli) -> Result<bool> {
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let ctx = AppContext::initialize(Path::new(&data_dir), window_source(cli.source)).await?;

    let outcome = dispatch(&ctx, cli.command).await;
    ctx.shutdown().await?;
    outcome
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let result = tokio::runtime::Runtime::new()
        .context("failed to start the async runtime")
        .and_then(|runtime| runtime.block_on(run_cli(cli)))
        .and_then(|succeeded| {
            if succeeded {
                Ok(())
            } else {
                bail!("command failed")
            }
        });

    if let Err(err) = result {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
