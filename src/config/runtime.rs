// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::calendar::{BusinessCalendarManager, DefaultClock};
use crate::compiler::{BehaviorCompiler, ClassRegistry, DefaultBehaviorFactory};
use crate::config::EngineConfig;
use crate::errors::ConfigValidationError;

/// Compiler runtime builder: wires the compiler and the timer calendars from configuration.
///
/// # Examples
///
/// ```
/// use the_conductor::config::{CompilerBuilder, EngineConfig};
/// use the_conductor::calendar::Clock;
///
/// let (compiler, calendars, clock) = CompilerBuilder::from_config(&EngineConfig::default()).unwrap();
///
/// assert_eq!(calendars.names(), vec!["cycle", "dueDate", "duration"]);
/// assert_eq!(clock.zone(), chrono_tz::UTC);
/// # let _ = compiler;
/// ```
pub struct CompilerBuilder;

impl CompilerBuilder {
    /// Build with the standard class registry.
    ///
    /// Returns:
    /// - `BehaviorCompiler`: dispatcher over a [`DefaultBehaviorFactory`]
    /// - `BusinessCalendarManager`: the `cycle`, `duration` and `dueDate` calendars
    /// - `DefaultClock`: system time, in the configured default zone
    pub fn from_config(
        cfg: &EngineConfig,
    ) -> Result<(BehaviorCompiler, BusinessCalendarManager, DefaultClock), ConfigValidationError> {
        Self::with_registry(cfg, ClassRegistry::standard())
    }

    /// Build against a caller-supplied registry, e.g. one holding integration bridges.
    pub fn with_registry(
        cfg: &EngineConfig,
        registry: ClassRegistry,
    ) -> Result<(BehaviorCompiler, BusinessCalendarManager, DefaultClock), ConfigValidationError> {
        let zone = cfg.scheduling.time_zone()?;

        let factory = DefaultBehaviorFactory::builder(cfg.clone())
            .class_registry(Arc::new(registry))
            .build();
        let expressions = factory.expression_manager();
        let compiler = BehaviorCompiler::new(Arc::new(factory), expressions);

        Ok((compiler, BusinessCalendarManager::standard(), DefaultClock::new(zone)))
    }
}
