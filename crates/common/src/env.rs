//! Environment configuration helpers.
//!
//! Required values are validated at startup; a missing variable is a fatal
//! configuration error, never a runtime one.

use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Read a required environment variable.
pub fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

/// Read and parse a required environment variable.
pub fn required_parsed<T>(name: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = required(name)?;
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value,
        reason: e.to_string(),
    })
}

/// Read and parse an optional environment variable, falling back to a default.
///
/// A value that is present but unparseable is still a startup error.
pub fn optional_parsed<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Identifier of the running stage instance (the container hostname in a
/// docker deployment).
pub fn worker_id() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_is_an_error() {
        let err = required("COINFLOW_TEST_UNSET_VAR").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing("COINFLOW_TEST_UNSET_VAR")
        ));
    }

    #[test]
    fn test_optional_falls_back_to_default() {
        let value: u64 = optional_parsed("COINFLOW_TEST_UNSET_VAR", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_invalid_value_is_reported() {
        std::env::set_var("COINFLOW_TEST_BAD_VAR", "not-a-number");
        let err = required_parsed::<u64>("COINFLOW_TEST_BAD_VAR").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "COINFLOW_TEST_BAD_VAR",
                ..
            }
        ));
        std::env::remove_var("COINFLOW_TEST_BAD_VAR");
    }
}
