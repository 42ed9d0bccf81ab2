use std::collections::HashMap;
use std::sync::Arc;

use log::info;

use super::{
    AdapterInfo, AppAdapter, BrowserAdapter, EditorAdapter, GenericAdapter, TerminalAdapter,
};
use crate::models::AdapterKind;
use crate::os_bridge;

/// Application name to adapter lookup. Registration is append-only.
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn AppAdapter>>,
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    generic: Arc<dyn AppAdapter>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
            by_name: HashMap::new(),
            by_alias: HashMap::new(),
            generic: Arc::new(GenericAdapter),
        }
    }

    pub fn with_defaults() -> Self {
        Self::with_enabled(&[AdapterKind::Editor, AdapterKind::Browser, AdapterKind::Terminal])
    }

    /// Default adapters restricted to `enabled`, registered in a fixed order.
    pub fn with_enabled(enabled: &[AdapterKind]) -> Self {
        let home = os_bridge::home_dir();
        let mut registry = Self::new();
        if enabled.contains(&AdapterKind::Editor) {
            registry.register(Arc::new(EditorAdapter::new(&home)));
        }
        if enabled.contains(&AdapterKind::Browser) {
            registry.register(Arc::new(BrowserAdapter));
        }
        if enabled.contains(&AdapterKind::Terminal) {
            registry.register(Arc::new(TerminalAdapter::new(&home)));
        }
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn AppAdapter>) {
        let index = self.adapters.len();
        self.by_name
            .entry(adapter.name().to_lowercase())
            .or_insert(index);
        for alias in adapter.aliases() {
            self.by_alias.entry(alias.to_lowercase()).or_insert(index);
        }
        info!("Registered adapter {}", adapter.name());
        self.adapters.push(adapter);
    }

    /// Exact name, then exact alias, then the first adapter with an alias
    /// that contains or is contained in the name. Falls back to the generic
    /// adapter.
    pub fn resolve(&self, app_name: &str) -> Arc<dyn AppAdapter> {
        let normalized = app_name.trim().to_lowercase();
        if normalized.is_empty() {
            return self.generic.clone();
        }

        if let Some(&index) = self.by_name.get(&normalized) {
            return self.adapters[index].clone();
        }
        if let Some(&index) = self.by_alias.get(&normalized) {
            return self.adapters[index].clone();
        }

        self.adapters
            .iter()
            .find(|adapter| {
                adapter.aliases().iter().any(|alias| {
                    let alias = alias.to_lowercase();
                    normalized.contains(&alias) || alias.contains(&normalized)
                })
            })
            .cloned()
            .unwrap_or_else(|| self.generic.clone())
    }

    pub fn has_adapter(&self, app_name: &str) -> bool {
        self.resolve(app_name).kind() != AdapterKind::Generic
    }

    pub fn adapters(&self) -> &[Arc<dyn AppAdapter>] {
        &self.adapters
    }

    pub async fn describe(&self) -> Vec<AdapterInfo> {
        let mut infos = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            infos.push(AdapterInfo {
                name: adapter.name().to_string(),
                aliases: adapter.aliases().iter().map(|alias| alias.to_string()).collect(),
                available: adapter.is_available().await,
            });
        }
        infos
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exact_alias_then_substring() {
        let registry = AdapterRegistry::with_defaults();

        assert_eq!(registry.resolve("EDITOR").kind(), AdapterKind::Editor);
        assert_eq!(registry.resolve("Visual Studio Code").kind(), AdapterKind::Editor);
        assert_eq!(registry.resolve("Google Chrome Canary").kind(), AdapterKind::Browser);
        assert_eq!(registry.resolve("iterm").kind(), AdapterKind::Terminal);
        assert_eq!(registry.resolve("Finder").kind(), AdapterKind::Generic);
        assert_eq!(registry.resolve("").kind(), AdapterKind::Generic);
    }

    #[test]
    fn substring_match_is_literal() {
        // "xcode" contains the "code" alias.
        let registry = AdapterRegistry::with_defaults();
        assert!(registry.has_adapter("Xcode"));
        assert!(!registry.has_adapter("Slack"));
    }

    #[test]
    fn disabled_adapters_are_not_registered() {
        let registry = AdapterRegistry::with_enabled(&[AdapterKind::Terminal]);
        assert_eq!(registry.adapters().len(), 1);
        assert_eq!(registry.resolve("Safari").kind(), AdapterKind::Generic);
    }
}
