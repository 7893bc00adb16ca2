// Configuration loader for the Caption Summary API
//
// This module handles loading configuration from the TOML configuration file
// and environment variables with appropriate precedence.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use toml::Value;

pub const CONFIG_FILE_PATH: &str = "caption_summary_api.conf";

/// Flatten a TOML document into string key-value pairs.
///
/// The file is expected to be flat; arrays and tables are skipped with a warning.
pub fn parse_config(content: &str) -> Result<HashMap<String, String>, toml::de::Error> {
    let table: toml::Table = content.parse()?;
    let mut config_map = HashMap::new();

    for (key, value) in table {
        let value = match value {
            Value::String(s) => s,
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            _ => {
                warn!("Skipping unsupported TOML value type for key: {}", key);
                continue;
            }
        };
        config_map.insert(key, value);
    }

    Ok(config_map)
}

/// Loads configuration from the TOML file into the environment
///
/// Configuration precedence (highest to lowest):
/// 1. Environment variables
/// 2. Configuration file values
/// 3. Default values (application defaults, not handled here)
///
/// Must run before any worker thread is spawned.
///
/// # Returns
///
/// Returns true if the config file was successfully loaded, false otherwise
pub fn load_config() -> bool {
    load_config_from(Path::new(CONFIG_FILE_PATH))
}

/// Same as [`load_config`] with an explicit file path
pub fn load_config_from(config_path: &Path) -> bool {
    if !config_path.exists() {
        debug!("Configuration file not found at: {}", config_path.display());
        return false;
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read configuration file: {}", e);
            return false;
        }
    };

    let config_map = match parse_config(&config_content) {
        Ok(map) => map,
        Err(e) => {
            warn!("Failed to parse configuration file: {}", e);
            return false;
        }
    };

    for (key, value) in config_map {
        if env::var(&key).is_err() {
            debug!("Setting env var from config file: {} = {}", key, value);
            env::set_var(key, value);
        } else {
            debug!("Env var already exists, skipping: {}", key);
        }
    }

    info!("Configuration loaded from {}", config_path.display());
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flat_values_become_strings() {
        let map = parse_config(
            "CAPTION_LANGUAGE = \"fr\"\nHTTP_WORKER_NUMBER = 4\nMETRICS_ENABLED = false\n",
        )
        .unwrap();
        assert_eq!(map["CAPTION_LANGUAGE"], "fr");
        assert_eq!(map["HTTP_WORKER_NUMBER"], "4");
        assert_eq!(map["METRICS_ENABLED"], "false");
    }

    #[test]
    fn nested_values_are_skipped() {
        let map = parse_config("A = [1, 2]\n[section]\nB = \"x\"\n").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(parse_config("not toml at all =").is_err());
    }

    #[test]
    fn environment_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "CSA_LOADER_TEST_KEPT = \"from-file\"\nCSA_LOADER_TEST_NEW = \"from-file\""
        )
        .unwrap();
        env::set_var("CSA_LOADER_TEST_KEPT", "from-env");
        env::remove_var("CSA_LOADER_TEST_NEW");

        assert!(load_config_from(file.path()));
        assert_eq!(env::var("CSA_LOADER_TEST_KEPT").unwrap(), "from-env");
        assert_eq!(env::var("CSA_LOADER_TEST_NEW").unwrap(), "from-file");
    }

    #[test]
    fn missing_file_is_not_loaded() {
        assert!(!load_config_from(Path::new("/definitely/not/here.conf")));
    }
}
