//! Settings validation.
//!
//! Catches out-of-range parameters before they reach the constraint or
//! the solver, with a message naming the offending key.

use impasse_types::{ImpasseError, ImpasseResult};

use crate::settings::SimulationSettings;

/// Validates a complete settings document.
///
/// Each section runs its own range checks; failures are reported with
/// the section name prefixed to the key.
pub fn validate_settings(settings: &SimulationSettings) -> ImpasseResult<()> {
    settings
        .distance_barrier_constraint
        .validate()
        .map_err(|e| qualify("distance_barrier_constraint", e))?;
    settings
        .barrier_problem
        .validate()
        .map_err(|e| qualify("barrier_problem", e))?;
    Ok(())
}

fn qualify(section: &str, error: ImpasseError) -> ImpasseError {
    match error {
        ImpasseError::InvalidConfig(message) => {
            ImpasseError::InvalidConfig(format!("{section}.{message}"))
        }
        other => other,
    }
}
