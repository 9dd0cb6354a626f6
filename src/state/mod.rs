// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod container;
mod merger;
mod schema;

pub use container::{FinalState, PartialState, State, StateSnapshot, StateUpdate};
pub use merger::{MergeMode, StateMerger};
pub use schema::{FieldKind, FieldSpec, Reducer, StateSchema};
