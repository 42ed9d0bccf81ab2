use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    Development,
    Design,
    Meeting,
    Communication,
    Personal,
}

impl TemplateCategory {
    pub const ALL: [TemplateCategory; 5] = [
        TemplateCategory::Development,
        TemplateCategory::Design,
        TemplateCategory::Meeting,
        TemplateCategory::Communication,
        TemplateCategory::Personal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::Development => "development",
            TemplateCategory::Design => "design",
            TemplateCategory::Meeting => "meeting",
            TemplateCategory::Communication => "communication",
            TemplateCategory::Personal => "personal",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| anyhow!("unknown template category {value}"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Single,
    Split,
    Triple,
    Grid,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Single => "single",
            Layout::Split => "split",
            Layout::Triple => "triple",
            Layout::Grid => "grid",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "single" => Ok(Layout::Single),
            "split" => Ok(Layout::Split),
            "triple" => Ok(Layout::Triple),
            "grid" => Ok(Layout::Grid),
            other => Err(anyhow!("unknown layout {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextTemplate {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub description: String,
    pub category: TemplateCategory,
    pub target_apps: Vec<String>,
    pub suggested_layout: Layout,
}

impl ContextTemplate {
    pub fn is_custom(&self) -> bool {
        self.id.starts_with("custom_")
    }
}
