use crate::config::types::{Config, Tuning};
use crate::config::validation::validate;
use crate::ConfigResult;
use std::path::Path;

/// Loads and parses a tuning file from the given path
///
/// Every table and key is optional; missing values keep their defaults.
///
/// # Arguments
///
/// * `path` - Path to the TOML tuning file
///
/// # Returns
///
/// * `Ok(Tuning)` - Successfully parsed tuning values
/// * `Err(ConfigError)` - Failed to read or parse the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use deepshot::config::load_tuning;
///
/// let tuning = load_tuning(Path::new("deepshot.toml")).unwrap();
/// println!("Checkpoint every {} pages", tuning.checkpoint.interval);
/// ```
pub fn load_tuning(path: &Path) -> ConfigResult<Tuning> {
    let content = std::fs::read_to_string(path)?;
    parse_tuning(&content)
}

/// Parses tuning values from TOML text
pub fn parse_tuning(content: &str) -> ConfigResult<Tuning> {
    let tuning: Tuning = toml::from_str(content)?;
    Ok(tuning)
}

/// Attaches an optional tuning file to a configuration and validates it
///
/// # Arguments
///
/// * `config` - Configuration built from command-line arguments
/// * `tuning_path` - Optional TOML tuning file
///
/// # Returns
///
/// * `Ok(Config)` - Validated configuration
/// * `Err(ConfigError)` - The tuning file is unreadable or a value is invalid
pub fn finalize_config(mut config: Config, tuning_path: Option<&Path>) -> ConfigResult<Config> {
    if let Some(path) = tuning_path {
        config.tuning = load_tuning(path)?;
    }

    validate(&config)?;
    Ok(config)
}
