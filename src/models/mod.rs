pub mod app_state;
pub mod window;

pub use app_state::{
    AdapterKind, AppState, AppStates, BrowserState, BrowserTab, EditorState, OpenFile,
    TerminalState,
};
pub use window::{Bounds, WindowDescriptor};
