// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Support for exercising process definitions in tests without their real
//! service implementations.

mod harness;
mod no_op;

pub use harness::TestBehaviorFactory;
pub use no_op::{NoOpServiceTask, NO_OP_CALLS_VARIABLE, NO_OP_SERVICE_TASK_CLASS};
