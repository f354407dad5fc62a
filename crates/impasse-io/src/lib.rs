//! # impasse-io
//!
//! Settings files for the Impasse contact core.
//!
//! A [`SimulationSettings`] document configures the distance barrier
//! constraint and the barrier problem. It is read from JSON or TOML and
//! validated before anything is built from it.

pub mod settings;
pub mod validator;

pub use settings::{
    from_json_str, from_toml_str, load_settings, save_settings, SettingsFormat, SimulationSettings,
};
pub use validator::validate_settings;
