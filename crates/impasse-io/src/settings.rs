//! Settings documents.
//!
//! A settings file configures the distance barrier constraint and the
//! barrier problem. Both sections are optional; missing keys take their
//! defaults. Files are read as JSON or TOML depending on the extension.

use std::path::Path;

use impasse_contact::DistanceBarrierSettings;
use impasse_solver::BarrierProblemConfig;
use impasse_types::{ImpasseError, ImpasseResult};
use serde::{Deserialize, Serialize};

/// Complete settings for one contact-barrier setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Barrier activation, separation and detection settings.
    pub distance_barrier_constraint: DistanceBarrierSettings,
    /// Stiffness and termination settings of the barrier problem.
    pub barrier_problem: BarrierProblemConfig,
}

/// On-disk format of a settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Toml,
}

impl SettingsFormat {
    /// Picks the format from a file extension (`.json` or `.toml`).
    pub fn from_path(path: &Path) -> ImpasseResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            _ => Err(ImpasseError::InvalidConfig(format!(
                "Unsupported settings file '{}': expected a .json or .toml extension",
                path.display()
            ))),
        }
    }
}

/// Parses settings from a JSON string.
pub fn from_json_str(json: &str) -> ImpasseResult<SimulationSettings> {
    serde_json::from_str(json)
        .map_err(|e| ImpasseError::Serialization(format!("JSON settings: {e}")))
}

/// Parses settings from a TOML string.
pub fn from_toml_str(text: &str) -> ImpasseResult<SimulationSettings> {
    toml::from_str(text).map_err(|e| ImpasseError::Serialization(format!("TOML settings: {e}")))
}

/// Serializes settings in the given format.
pub fn to_string(settings: &SimulationSettings, format: SettingsFormat) -> ImpasseResult<String> {
    match format {
        SettingsFormat::Json => serde_json::to_string_pretty(settings)
            .map_err(|e| ImpasseError::Serialization(format!("JSON settings: {e}"))),
        SettingsFormat::Toml => toml::to_string_pretty(settings)
            .map_err(|e| ImpasseError::Serialization(format!("TOML settings: {e}"))),
    }
}

/// Reads, parses and validates a settings file.
pub fn load_settings(path: impl AsRef<Path>) -> ImpasseResult<SimulationSettings> {
    let path = path.as_ref();
    let format = SettingsFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    let settings = match format {
        SettingsFormat::Json => from_json_str(&text)?,
        SettingsFormat::Toml => from_toml_str(&text)?,
    };
    crate::validator::validate_settings(&settings)?;
    Ok(settings)
}

/// Writes settings to a file, in the format given by its extension.
pub fn save_settings(settings: &SimulationSettings, path: impl AsRef<Path>) -> ImpasseResult<()> {
    let path = path.as_ref();
    let text = to_string(settings, SettingsFormat::from_path(path)?)?;
    std::fs::write(path, text)?;
    Ok(())
}
