pub mod contexts;
pub mod events;
pub mod folders;
pub mod templates;
pub mod timer_sessions;

pub use events::MAX_EVENTS;
