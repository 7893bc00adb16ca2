// Configuration validation module for the Caption Summary API
//
// This module validates the environment-driven configuration at startup so that bad values
// are reported once, with the offending variable and a suggestion, instead of surfacing as
// request failures later.

use std::env;
use std::path::Path;

use log::{error, info, warn};

use crate::config::defaults;

/// Configuration parameter types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigType {
    String,
    UnsignedInteger,
    Boolean,
    Port,
    FilePath,
    DirectoryPath,
    Enum(&'static [&'static str]),
}

/// Validation severity levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationLevel {
    Critical, // Must be valid for application to start
    Warning,  // Optional, generates warnings only
}

/// Configuration parameter definition
#[derive(Debug, Clone)]
pub struct ConfigParam {
    pub name: &'static str,
    pub description: &'static str,
    pub param_type: ConfigType,
    pub default_value: Option<&'static str>,
    pub validation_level: ValidationLevel,
    pub max_value: Option<usize>,
}

/// Known configuration parameters
pub const CONFIG_PARAMS: &[ConfigParam] = &[
    ConfigParam {
        name: "CAPTION_SUMMARY_API_PORT",
        description: "Port for the API server",
        param_type: ConfigType::Port,
        default_value: Some("5000"),
        validation_level: ValidationLevel::Critical,
        max_value: None,
    },
    ConfigParam {
        name: "HTTP_WORKER_NUMBER",
        description: "Number of HTTP workers (0 = use CPU cores)",
        param_type: ConfigType::UnsignedInteger,
        default_value: Some("0"),
        validation_level: ValidationLevel::Critical,
        max_value: Some(64),
    },
    ConfigParam {
        name: "CAPTION_SUMMARY_API_KEEPALIVE",
        description: "Keep-alive timeout in seconds",
        param_type: ConfigType::UnsignedInteger,
        default_value: Some("75"),
        validation_level: ValidationLevel::Critical,
        max_value: Some(3600),
    },
    ConfigParam {
        name: "YTDLP_COMMAND",
        description: "yt-dlp executable name or path",
        param_type: ConfigType::String,
        default_value: Some(defaults::YTDLP_COMMAND),
        validation_level: ValidationLevel::Critical,
        max_value: None,
    },
    ConfigParam {
        name: "CAPTION_TMP_DIR",
        description: "Directory receiving temporary caption files",
        param_type: ConfigType::DirectoryPath,
        default_value: Some(defaults::CAPTION_TMP_DIR),
        validation_level: ValidationLevel::Warning,
        max_value: None,
    },
    ConfigParam {
        name: "CAPTION_COOKIES_FILE",
        description: "Cookie file passed to yt-dlp to avoid being blocked",
        param_type: ConfigType::FilePath,
        default_value: Some(defaults::COOKIES_FILE),
        validation_level: ValidationLevel::Warning,
        max_value: None,
    },
    ConfigParam {
        name: "CAPTION_LANGUAGE",
        description: "Subtitle language requested from yt-dlp",
        param_type: ConfigType::String,
        default_value: Some(defaults::CAPTION_LANGUAGE),
        validation_level: ValidationLevel::Critical,
        max_value: None,
    },
    ConfigParam {
        name: "METRICS_ENABLED",
        description: "Enable metrics collection",
        param_type: ConfigType::Boolean,
        default_value: Some("true"),
        validation_level: ValidationLevel::Critical,
        max_value: None,
    },
    ConfigParam {
        name: "METRICS_BACKEND",
        description: "Metrics exporter",
        param_type: ConfigType::Enum(&defaults::VALID_METRICS_BACKENDS),
        default_value: Some("none"),
        validation_level: ValidationLevel::Critical,
        max_value: None,
    },
];

/// Configuration validation errors with detailed context
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub value: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Configuration error in '{}': {} (value: '{}')",
            self.field, self.message, self.value
        )?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " - Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validation results
#[derive(Debug, Default)]
pub struct ValidationResults {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResults {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn print_summary(&self) {
        for (i, err) in self.errors.iter().enumerate() {
            error!("  {}. {}", i + 1, err);
        }
        for (i, warning) in self.warnings.iter().enumerate() {
            warn!("  {}. {}", i + 1, warning);
        }

        if self.is_valid() && self.warnings.is_empty() {
            info!("Configuration validation passed successfully");
        } else if self.is_valid() {
            info!(
                "Configuration validation passed with {} warning(s)",
                self.warnings.len()
            );
        } else {
            error!(
                "Configuration validation found {} error(s)",
                self.errors.len()
            );
        }
    }
}

fn invalid(param: &ConfigParam, value: &str, message: &str, suggestion: &str) -> ConfigValidationError {
    ConfigValidationError {
        field: param.name.to_string(),
        value: value.to_string(),
        message: message.to_string(),
        suggestion: Some(suggestion.to_string()),
    }
}

/// Check one value against its parameter definition
pub fn validate_value(param: &ConfigParam, value: &str) -> Result<(), ConfigValidationError> {
    match param.param_type {
        ConfigType::String => {
            if value.trim().is_empty() {
                return Err(invalid(param, value, "Value must not be empty", "Unset the variable to use the default"));
            }
        }
        ConfigType::UnsignedInteger => {
            let parsed = value.parse::<usize>().map_err(|_| {
                invalid(param, value, "Invalid unsigned integer format", "Use a valid positive integer number")
            })?;
            if let Some(max) = param.max_value {
                if parsed > max {
                    return Err(invalid(
                        param,
                        value,
                        &format!("Value {} is above maximum {}", parsed, max),
                        &format!("Use a value <= {}", max),
                    ));
                }
            }
        }
        ConfigType::Boolean => {
            value.parse::<bool>().map_err(|_| {
                invalid(param, value, "Invalid boolean value", "Use 'true' or 'false'")
            })?;
        }
        ConfigType::Port => {
            let port = value.parse::<u16>().map_err(|_| {
                invalid(param, value, "Invalid port number format", "Use a number between 1 and 65535")
            })?;
            if port == 0 {
                return Err(invalid(param, value, "Port number cannot be 0", "Use a port between 1 and 65535"));
            }
        }
        ConfigType::FilePath => {
            if !Path::new(value).is_file() {
                return Err(invalid(param, value, "File does not exist", "Ensure the file exists and the path is correct"));
            }
        }
        ConfigType::DirectoryPath => {
            if !Path::new(value).is_dir() {
                return Err(invalid(param, value, "Directory does not exist", "Create the directory or fix the path"));
            }
        }
        ConfigType::Enum(valid_values) => {
            if !valid_values.contains(&value.to_lowercase().as_str()) {
                return Err(invalid(
                    param,
                    value,
                    &format!("Invalid value, must be one of: {}", valid_values.join(", ")),
                    &format!("Use one of: {}", valid_values.join(", ")),
                ));
            }
        }
    }
    Ok(())
}

/// Validate every known parameter, reading values through `lookup`
pub fn validate_with<F>(lookup: F) -> ValidationResults
where
    F: Fn(&str) -> Option<String>,
{
    let mut results = ValidationResults::default();

    for param in CONFIG_PARAMS {
        let value = match lookup(param.name).or_else(|| param.default_value.map(String::from)) {
            Some(value) => value,
            None => continue,
        };
        if let Err(error) = validate_value(param, &value) {
            match param.validation_level {
                ValidationLevel::Critical => results.errors.push(error),
                ValidationLevel::Warning => results.warnings.push(error),
            }
        }
    }

    results
}

/// Validate the process environment
pub fn validate_environment() -> ValidationResults {
    info!("Validating configuration...");
    validate_with(|name| env::var(name).ok())
}

/// Generate a sample configuration file with all parameters and descriptions
pub fn generate_sample_config() -> String {
    let mut output = String::from("# Caption Summary API configuration\n");
    output.push_str("# Environment variables take precedence over this file.\n\n");
    for param in CONFIG_PARAMS {
        output.push_str(&format!("# {}\n", param.description));
        match param.default_value {
            Some(default) => output.push_str(&format!("{} = \"{}\"\n\n", param.name, default)),
            None => output.push_str(&format!("# {} = \"\"\n\n", param.name)),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_have_no_errors() {
        let results = validate_with(lookup_from(&[]));
        assert!(results.is_valid(), "{:?}", results.errors);
    }

    #[test]
    fn bad_port_is_critical() {
        let results = validate_with(lookup_from(&[("CAPTION_SUMMARY_API_PORT", "0")]));
        assert!(!results.is_valid());
        assert_eq!(results.errors[0].field, "CAPTION_SUMMARY_API_PORT");

        let results = validate_with(lookup_from(&[("CAPTION_SUMMARY_API_PORT", "http")]));
        assert!(!results.is_valid());
    }

    #[test]
    fn unknown_metrics_backend_is_rejected() {
        let results = validate_with(lookup_from(&[("METRICS_BACKEND", "statsd")]));
        assert!(!results.is_valid());
        let results = validate_with(lookup_from(&[("METRICS_BACKEND", "Prometheus")]));
        assert!(results.is_valid());
    }

    #[test]
    fn worker_count_is_bounded() {
        let results = validate_with(lookup_from(&[("HTTP_WORKER_NUMBER", "65")]));
        assert!(!results.is_valid());
    }

    #[test]
    fn missing_cookie_file_only_warns() {
        let results = validate_with(lookup_from(&[(
            "CAPTION_COOKIES_FILE",
            "/definitely/not/here/cookies.txt",
        )]));
        assert!(results.is_valid());
        assert!(results
            .warnings
            .iter()
            .any(|w| w.field == "CAPTION_COOKIES_FILE"));
    }

    #[test]
    fn sample_config_lists_every_parameter() {
        let sample = generate_sample_config();
        for param in CONFIG_PARAMS {
            assert!(sample.contains(param.name));
        }
        assert!(sample.parse::<toml::Value>().is_ok());
    }
}
