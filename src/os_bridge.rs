//! Shell-outs to the host OS: AppleScript, application launch, process
//! inspection.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{anyhow, bail, Context, Result};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::process::Command;

pub async fn run_osascript(script: &str) -> Result<String> {
    run_command("osascript", &["-e", script]).await
}

/// Runs `program` to completion and returns trimmed stdout.
pub async fn run_command(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("failed to spawn {program}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{program} exited with {}: {}", output.status, stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub async fn open_application(app_name: &str) -> Result<()> {
    if app_name.trim().is_empty() {
        return Err(anyhow!("empty application name"));
    }

    #[cfg(target_os = "macos")]
    {
        run_command("open", &["-a", app_name]).await.map(|_| ())
    }

    #[cfg(target_os = "windows")]
    {
        run_command("cmd", &["/C", "start", "", app_name]).await.map(|_| ())
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        let binary = app_name.to_lowercase().replace(' ', "-");
        Command::new(&binary)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to launch {binary}"))?;
        Ok(())
    }
}

/// Opens `url`, in `app_name` where the platform supports choosing one.
pub async fn open_url(app_name: &str, url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        run_command("open", &["-a", app_name, url]).await.map(|_| ())
    }

    #[cfg(target_os = "windows")]
    {
        let _ = app_name;
        run_command("cmd", &["/C", "start", "", url]).await.map(|_| ())
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        let _ = app_name;
        run_command("xdg-open", &[url]).await.map(|_| ())
    }
}

/// Escapes a value for use inside a double-quoted AppleScript string.
pub fn escape_applescript(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Single-quotes a value for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Whether any running process name contains one of `names`, ignoring case.
pub fn process_running(names: &[&str]) -> bool {
    let mut system = System::new();
    system.refresh_processes_specifics(ProcessesToUpdate::All, ProcessRefreshKind::new());

    let needles: Vec<String> = names.iter().map(|name| name.to_lowercase()).collect();
    system.processes().values().any(|process| {
        let name = process.name().to_string_lossy().to_lowercase();
        needles.iter().any(|needle| name.contains(needle.as_str()))
    })
}

pub fn home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/"))
}

pub fn user_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default()
}
