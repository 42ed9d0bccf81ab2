use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;

use super::WindowSource;
use crate::models::{Bounds, WindowDescriptor};
use crate::os_bridge::{self, escape_applescript};

const LIST_WINDOWS_SCRIPT: &str = r#"
set output to ""
tell application "System Events"
    repeat with proc in (every application process whose visible is true)
        set appName to name of proc
        set isFront to frontmost of proc
        repeat with win in (every window of proc)
            try
                set winTitle to name of win
                set {px, py} to position of win
                set {sw, sh} to size of win
                set isMin to false
                try
                    set isMin to value of attribute "AXMinimized" of win
                end try
                set output to output & appName & tab & winTitle & tab & px & tab & py & tab & sw & tab & sh & tab & isMin & tab & isFront & linefeed
            end try
        end repeat
    end repeat
end tell
return output
"#;

/// Live windows through the System Events accessibility API.
pub struct AppleScriptWindowSource;

impl AppleScriptWindowSource {
    fn window_ref(window: &WindowDescriptor) -> String {
        let process = escape_applescript(&window.app);
        if window.title.is_empty() {
            format!("window 1 of process \"{process}\"")
        } else {
            format!(
                "(first window of process \"{process}\" whose name is \"{}\")",
                escape_applescript(&window.title)
            )
        }
    }
}

/// Parses the tab-separated listing produced by [`LIST_WINDOWS_SCRIPT`].
/// Malformed lines are skipped. Only the first window of the frontmost
/// process is marked focused.
pub fn parse_window_listing(output: &str) -> Vec<WindowDescriptor> {
    let mut windows = Vec::new();
    let mut focus_taken = false;

    for line in output.lines() {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 8 {
            if !line.trim().is_empty() {
                debug!("Skipping malformed window line: {line}");
            }
            continue;
        }

        let numbers: Option<Vec<i32>> = fields[2..6]
            .iter()
            .map(|raw| raw.trim().parse::<f64>().ok().map(|value| value.round() as i32))
            .collect();
        let Some(numbers) = numbers else {
            debug!("Skipping window line with bad geometry: {line}");
            continue;
        };

        let minimized = fields[6].trim() == "true";
        let frontmost = fields[7].trim() == "true";
        let focused = frontmost && !focus_taken && !minimized;
        focus_taken |= focused;

        windows.push(WindowDescriptor {
            id: windows.len() as u32 + 1,
            app: fields[0].to_string(),
            title: fields[1].to_string(),
            bounds: Bounds::new(numbers[0], numbers[1], numbers[2], numbers[3]),
            minimized,
            focused,
            visible: true,
        });
    }

    windows
}

#[async_trait]
impl WindowSource for AppleScriptWindowSource {
    async fn list_visible_windows(&self) -> Result<Vec<WindowDescriptor>> {
        let output = os_bridge::run_osascript(LIST_WINDOWS_SCRIPT)
            .await
            .context("failed to list windows via System Events")?;
        Ok(parse_window_listing(&output))
    }

    async fn launch_application(&self, app_name: &str) -> Result<()> {
        os_bridge::open_application(app_name).await
    }

    async fn set_bounds(&self, window: &WindowDescriptor, bounds: Bounds) -> Result<()> {
        let target = Self::window_ref(window);
        let script = format!(
            "tell application \"System Events\"\n\
             set position of {target} to {{{}, {}}}\n\
             set size of {target} to {{{}, {}}}\n\
             end tell",
            bounds.x, bounds.y, bounds.width, bounds.height
        );
        os_bridge::run_osascript(&script)
            .await
            .with_context(|| format!("failed to set bounds of {}", window.app))
            .map(|_| ())
    }

    async fn set_minimized(&self, window: &WindowDescriptor, minimized: bool) -> Result<()> {
        let script = format!(
            "tell application \"System Events\" to set value of attribute \"AXMinimized\" of {} to {}",
            Self::window_ref(window),
            minimized
        );
        os_bridge::run_osascript(&script)
            .await
            .with_context(|| format!("failed to change minimized state of {}", window.app))
            .map(|_| ())
    }

    async fn focus(&self, window: &WindowDescriptor) -> Result<()> {
        let script = format!(
            "tell application \"{}\" to activate\n\
             tell application \"System Events\" to perform action \"AXRaise\" of {}",
            escape_applescript(&window.app),
            Self::window_ref(window)
        );
        os_bridge::run_osascript(&script)
            .await
            .with_context(|| format!("failed to focus {}", window.app))
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_listing_and_marks_one_focused_window() {
        let output = "Terminal\tzsh - demo\t10\t20\t800\t600\tfalse\ttrue\n\
                      Terminal\tzsh - other\t0\t0\t640\t480\tfalse\ttrue\n\
                      Safari\tDocs\t100.0\t50.0\t1200\t800\ttrue\tfalse\n\
                      garbage line\n";
        let windows = parse_window_listing(output);

        assert_eq!(windows.len(), 3);
        assert!(windows[0].focused);
        assert!(!windows[1].focused);
        assert!(windows[2].minimized);
        assert_eq!(windows[2].bounds, Bounds::new(100, 50, 1200, 800));
        assert_eq!(windows[0].id, 1);
    }

    #[test]
    fn window_reference_escapes_titles() {
        let window = WindowDescriptor::new("Notes", r#"say "hi""#, Bounds::default());
        assert_eq!(
            AppleScriptWindowSource::window_ref(&window),
            r#"(first window of process "Notes" whose name is "say \"hi\"")"#
        );
    }
}
