use std::sync::LazyLock;

use async_trait::async_trait;
use log::warn;
use regex::Regex;

use super::{AppAdapter, CaptureOutcome, RestoreOutcome};
use crate::models::{AdapterKind, AppState, BrowserState, BrowserTab, WindowDescriptor};
use crate::os_bridge;

const ALIASES: &[&str] = &["Google Chrome", "Chrome", "Chromium", "Safari", "Arc", "Firefox"];
pub const BLANK_URL: &str = "about:blank";

static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+[-—]\s+(Google Chrome|Chromium|Chrome|Safari|Arc|Mozilla Firefox|Firefox)$")
        .unwrap()
});

static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" - ([\w.-]+\.[a-zA-Z]{2,})").unwrap());

/// Tab title and best-guess URL from a browser window title.
pub fn parse_title(title: &str) -> BrowserTab {
    let stripped = SUFFIX_RE.replace(title, "").trim().to_string();
    let url = DOMAIN_RE
        .captures(&stripped)
        .and_then(|caps| caps.get(1))
        .map(|domain| format!("https://{}", domain.as_str()))
        .unwrap_or_else(|| BLANK_URL.to_string());

    BrowserTab {
        url,
        title: stripped,
        active: true,
    }
}

pub struct BrowserAdapter;

#[async_trait]
impl AppAdapter for BrowserAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Browser
    }

    fn aliases(&self) -> &[&'static str] {
        ALIASES
    }

    async fn capture(&self, window: &WindowDescriptor) -> CaptureOutcome {
        if window.title.trim().is_empty() {
            return CaptureOutcome::Empty;
        }
        CaptureOutcome::Captured(AppState::Browser(BrowserState {
            tabs: vec![parse_title(&window.title)],
        }))
    }

    async fn restore(&self, window: &WindowDescriptor, state: &AppState) -> RestoreOutcome {
        let AppState::Browser(state) = state else {
            return RestoreOutcome::Skipped("not a browser state".into());
        };

        let urls: Vec<&str> = state
            .tabs
            .iter()
            .map(|tab| tab.url.as_str())
            .filter(|url| *url != BLANK_URL)
            .collect();
        if urls.is_empty() {
            return RestoreOutcome::Skipped("no tabs with a url".into());
        }

        let mut opened = 0usize;
        let mut last_error = None;
        for url in urls {
            match os_bridge::open_url(&window.app, url).await {
                Ok(()) => opened += 1,
                Err(err) => {
                    warn!("Failed to reopen {url} in {}: {err:#}", window.app);
                    last_error = Some(err.to_string());
                }
            }
        }

        match (opened, last_error) {
            (0, Some(reason)) => RestoreOutcome::Failed(reason),
            _ => RestoreOutcome::Applied,
        }
    }

    async fn is_available(&self) -> bool {
        os_bridge::process_running(ALIASES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_domain_and_strips_browser_suffix() {
        let tab = parse_title("Pull requests - github.com - Google Chrome");
        assert_eq!(tab.title, "Pull requests - github.com");
        assert_eq!(tab.url, "https://github.com");
    }

    #[test]
    fn falls_back_to_blank_url() {
        let tab = parse_title("New Tab - Google Chrome");
        assert_eq!(tab.title, "New Tab");
        assert_eq!(tab.url, BLANK_URL);
    }
}
