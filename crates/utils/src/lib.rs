pub mod assets;
pub mod logging;

/// Application name used for the data directory and log targets.
pub const APP_NAME: &str = "focus-todo";
