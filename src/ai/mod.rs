pub mod naming;
pub mod suggestions;

pub use suggestions::{generate_suggestions, ContextSuggestion};
