//! Runtime configuration.

mod settings;

pub use settings::{HttpSettings, MariadbSettings, Settings, SettingsError};
