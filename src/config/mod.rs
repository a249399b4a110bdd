//! User settings loaded from `<data_dir>/config.toml`.

pub mod settings;

pub use settings::Settings;
