// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Smallest accepted `executor_options.max_concurrency`
pub const MIN_CONCURRENCY: usize = 1;
/// Largest accepted `executor_options.max_concurrency`
pub const MAX_CONCURRENCY: usize = 1024;
