pub mod bots;
pub mod core;
pub mod documents;
pub mod logs;
pub mod matcher;
pub mod types;
pub mod workers;

// Re-export main types
pub use bots::Bot;
pub use logs::LogEntry;
pub use matcher::InvalidQuery;
pub use types::{Database, EntityChanges, Page, DEFAULT_DATABASE_URL};
pub use workers::Worker;

#[cfg(test)]
pub mod test_helpers;
