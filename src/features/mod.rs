pub mod diff;
pub mod focus;
pub mod folders;
pub mod import_export;
pub mod templates;

pub use diff::{compare, format_diff, ContextDiff};
pub use focus::{FocusMode, FocusStatus};
pub use import_export::{ExportBundle, ImportResult};
pub use templates::{CategoryInfo, TemplateApplication};
