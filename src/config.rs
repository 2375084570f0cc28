use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// Backing file for the JSON store. `None` keeps everything in memory.
    pub data_path: Option<PathBuf>,
    pub simulation_interval: Duration,
    pub storage_timeout: Duration,
    pub notification_buffer_size: usize,
    pub seed_defaults: bool,
    pub simulation_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let simulation_interval_secs: u64 = parse_or_default("SIMULATION_INTERVAL_SECS", 15)?;
        let storage_timeout_ms: u64 = parse_or_default("STORAGE_TIMEOUT_MS", 2000)?;

        if simulation_interval_secs == 0 {
            return Err(AppError::Config(
                "SIMULATION_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            data_path: env::var("DATA_PATH")
                .ok()
                .filter(|raw| !raw.trim().is_empty())
                .map(PathBuf::from),
            simulation_interval: Duration::from_secs(simulation_interval_secs),
            storage_timeout: Duration::from_millis(storage_timeout_ms),
            notification_buffer_size: parse_or_default("NOTIFICATION_BUFFER_SIZE", 256)?,
            seed_defaults: parse_or_default("SEED_DEFAULTS", true)?,
            simulation_seed: parse_optional("SIMULATION_SEED")?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional(key)?.unwrap_or(default))
}

fn parse_optional<T>(key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, env::var(key).ok().as_deref())
}

/// Parses a raw variable value. `key` only names the variable in errors.
fn parse_value<T>(key: &str, raw: Option<&str>) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|err| AppError::Config(format!("invalid {key}: {err}")))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::parse_value;

    #[test]
    fn missing_value_parses_as_none() {
        let value: Option<u64> = parse_value("SIMULATION_INTERVAL_SECS", None).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn unparsable_value_is_a_config_error() {
        let result: Result<Option<u64>, _> = parse_value("STORAGE_TIMEOUT_MS", Some("soon"));
        let err = result.unwrap_err();
        assert!(matches!(err, crate::error::AppError::Config(_)));
        assert!(err.to_string().contains("STORAGE_TIMEOUT_MS"));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let seed: Option<u64> = parse_value("SIMULATION_SEED", Some(" 42 ")).unwrap();
        assert_eq!(seed, Some(42));

        let seed_defaults: Option<bool> = parse_value("SEED_DEFAULTS", Some("false\n")).unwrap();
        assert_eq!(seed_defaults, Some(false));
    }
}
