pub mod config;
pub mod error;

pub use self::config::JournalConfig;
pub use self::error::{BrewlogError, Result};
