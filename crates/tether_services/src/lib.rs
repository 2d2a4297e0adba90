//! Tether Services Layer
//!
//! Settings loading and the session collaborator scripts talk to.

pub mod session;
pub mod settings;

pub use session::Session;
pub use settings::{LoggingSettings, Settings, SettingsError};
