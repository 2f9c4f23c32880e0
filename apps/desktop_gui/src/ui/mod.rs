//! UI layer for the console: app shell, panels, and tile gallery.

pub mod app;

pub use app::{DesktopGuiApp, PersistedConsoleSettings, StartupConfig, SETTINGS_STORAGE_KEY};
