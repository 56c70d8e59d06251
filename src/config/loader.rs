// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_CAMEL_BEHAVIOR_CLASS, DEFAULT_EXTENSION_NAMESPACE, DEFAULT_MULE_BEHAVIOR_CLASS,
    DEFAULT_RULES_RESULT_VARIABLE, DEFAULT_SCRIPT_LANGUAGE, DEFAULT_SERVICE_TASK_BEAN_NAME,
    DEFAULT_TIME_ZONE,
};
use crate::errors::ConfigValidationError;
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Engine-level settings consulted while compiling process definitions.
///
/// Every field is optional in the YAML source and falls back to the constants
/// in [`consts`](crate::config::consts).
///
/// # Example
/// ```yaml
/// extension_namespace: conductor
/// default_service_task_bean: defaultServiceTaskBehavior
/// default_script_language: lua
/// integrations:
///   camel_default_class: integration::camel::DefaultCamelBehavior
/// scheduling:
///   default_time_zone: Europe/Amsterdam
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub extension_namespace: String,
    pub default_service_task_bean: String,
    pub default_script_language: String,
    pub rules_result_variable: String,
    pub integrations: IntegrationConfig,
    pub scheduling: SchedulingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extension_namespace: DEFAULT_EXTENSION_NAMESPACE.to_string(),
            default_service_task_bean: DEFAULT_SERVICE_TASK_BEAN_NAME.to_string(),
            default_script_language: DEFAULT_SCRIPT_LANGUAGE.to_string(),
            rules_result_variable: DEFAULT_RULES_RESULT_VARIABLE.to_string(),
            integrations: IntegrationConfig::default(),
            scheduling: SchedulingConfig::default(),
        }
    }
}

/// Default bridge classes for the optional integration tasks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    pub camel_default_class: String,
    pub mule_default_class: String,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            camel_default_class: DEFAULT_CAMEL_BEHAVIOR_CLASS.to_string(),
            mule_default_class: DEFAULT_MULE_BEHAVIOR_CLASS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub default_time_zone: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_time_zone: DEFAULT_TIME_ZONE.to_string(),
        }
    }
}

impl SchedulingConfig {
    /// Resolve the configured zone name.
    pub fn time_zone(&self) -> Result<Tz, ConfigValidationError> {
        self.default_time_zone
            .parse::<Tz>()
            .map_err(|_| ConfigValidationError::UnknownTimeZone {
                zone: self.default_time_zone.clone(),
            })
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let cfg: EngineConfig = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Check every setting, collecting all problems instead of stopping at the first.
pub fn validate_config(cfg: &EngineConfig) -> Result<(), Vec<ConfigValidationError>> {
    let mut errors = Vec::new();

    let named_settings = [
        ("extension_namespace", &cfg.extension_namespace),
        ("default_service_task_bean", &cfg.default_service_task_bean),
        ("default_script_language", &cfg.default_script_language),
        ("rules_result_variable", &cfg.rules_result_variable),
        ("integrations.camel_default_class", &cfg.integrations.camel_default_class),
        ("integrations.mule_default_class", &cfg.integrations.mule_default_class),
    ];
    for (setting, value) in named_settings {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError::EmptySetting {
                setting: setting.to_string(),
            });
        }
    }

    if let Err(e) = cfg.scheduling.time_zone() {
        errors.push(e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn load_and_validate_config<P: AsRef<Path>>(
    path: P,
) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let cfg = load_config(path)?;

    if let Err(validation_errors) = validate_config(&cfg) {
        let error_messages: Vec<String> = validation_errors.iter().map(|e| e.to_string()).collect();
        let combined_error = format!(
            "Configuration validation failed:\n{}",
            error_messages.join("\n")
        );
        return Err(combined_error.into());
    }

    Ok(cfg)
}
