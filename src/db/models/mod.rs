pub mod context;
pub mod event;
pub mod folder;
pub mod session;
pub mod template;

pub use context::{ContextMetadata, ContextSnapshot, ContextSummary};
pub use event::{AnalyticsSummary, EventType, TimeBucket, UserEvent};
pub use folder::{Folder, FolderGroup, DEFAULT_FOLDER_COLOR, DEFAULT_FOLDER_EMOJI};
pub use session::{ContextTime, DailyStats, GoalProgress, TimerSession, WeeklyEntry};
pub use template::{ContextTemplate, Layout, TemplateCategory};
