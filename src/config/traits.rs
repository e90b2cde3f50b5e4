use crate::error::EnsembleError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), EnsembleError>;
}

pub(crate) fn check_range(
    section: &str,
    field: &str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), EnsembleError> {
    if !(min..=max).contains(&value) {
        return Err(EnsembleError::Configuration(format!(
            "{}.{} must be between {} and {}, got {}",
            section, field, min, max, value
        )));
    }
    Ok(())
}
