pub mod connection;
pub mod helpers;
mod migrations;
pub mod models;
pub mod repositories;

pub use connection::Database;
pub use models::{
    AnalyticsSummary, ContextMetadata, ContextSnapshot, ContextSummary, ContextTemplate,
    EventType, Folder, FolderGroup, Layout, TemplateCategory, TimeBucket, TimerSession,
    UserEvent,
};
