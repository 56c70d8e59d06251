// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for structured logging.
//!
//! * `compiler` - behavior compilation events
//! * `calendar` - repeating-schedule and business-calendar events

use tracing::Span;

pub mod calendar;
pub mod compiler;

/// Emit a message as a `tracing` event with its fields attached, or open a
/// span carrying the same fields.
pub trait StructuredLog {
    fn log(&self);

    fn span(&self, name: &str) -> Span;
}
