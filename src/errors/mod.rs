// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod compilation;
mod config;
mod execution;
mod schedule;

pub use compilation::CompilationError;
pub use config::ConfigValidationError;
pub use execution::ExecutionError;
pub use schedule::{ScheduleParseError, TimerError};
