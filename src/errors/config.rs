// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur during engine configuration validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// A setting that must name something was left empty
    EmptySetting {
        /// The dotted path of the setting
        setting: String,
    },
    /// The scheduling time zone is not a known IANA zone
    UnknownTimeZone {
        /// The configured zone name
        zone: String,
    },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValidationError::EmptySetting { setting } => {
                write!(f, "Setting '{}' must not be empty", setting)
            }
            ConfigValidationError::UnknownTimeZone { zone } => {
                write!(f, "Unknown time zone '{}'", zone)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}
