// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod delegate;
pub mod runtime;

pub use delegate::{Delegate, Variables};
pub use runtime::ExecutionRuntime;
