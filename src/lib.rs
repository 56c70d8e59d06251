// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod calendar;   // timer schedules and business calendars
pub mod compiler;   // node -> behavior compilation
pub mod config;     // engine config + builder
pub mod errors;     // error handling
pub mod model;      // in-memory process graph
pub mod observability;
pub mod testing;    // no-op tasks and the override harness
pub mod traits;     // delegate and runtime contracts
