// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured logging for the compiler and the timer calendars.
//!
//! Every log event is a small struct with a `Display` impl, so the message
//! text lives in one place and call sites only fill in fields. Messages are
//! grouped by subsystem:
//!
//! * `messages::compiler` - definition compilation, delegate resolution, test overrides
//! * `messages::calendar` - schedule parsing and due-date computation
//!
//! # Usage
//!
//! ```rust
//! use the_conductor::observability::messages::compiler::NodeCompiled;
//! use the_conductor::observability::messages::StructuredLog;
//!
//! NodeCompiled {
//!     node_id: "approve",
//!     node_kind: "userTask",
//!     behavior: "user_task",
//! }
//! .log();
//! ```

pub mod messages;
