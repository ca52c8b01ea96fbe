//! Observability: ephemeral, in-memory counters for engine operations.
//!
//! This module does not access storage internals directly; execution logic
//! reports through the `record_*` helpers only.

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

thread_local! {
    static STATE: RefCell<CounterState> = RefCell::new(CounterState::default());
}

///
/// CounterState
/// Point-in-time counter snapshot for endpoint/test plumbing.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CounterState {
    pub ops: CounterOps,
    pub since_ms: u64,
}

impl Default for CounterState {
    fn default() -> Self {
        Self {
            ops: CounterOps::default(),
            since_ms: Timestamp::now().as_millis(),
        }
    }
}

///
/// CounterOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CounterOps {
    // Executor entrypoints
    pub fetch_calls: u64,

    // Rows touched
    pub rows_scanned: u64,
    pub rows_returned: u64,

    // Bookmark protocol
    pub bookmarks_recovered: u64,
}

fn with_state_mut<T>(f: impl FnOnce(&mut CounterState) -> T) -> T {
    STATE.with(|cell| f(&mut cell.borrow_mut()))
}

/// Snapshot the current counter state.
#[must_use]
pub fn report() -> CounterState {
    STATE.with(|cell| cell.borrow().clone())
}

/// Reset all counter state.
pub fn reset_all() {
    STATE.with(|cell| *cell.borrow_mut() = CounterState::default());
}

pub(crate) fn record_fetch_call() {
    with_state_mut(|state| state.ops.fetch_calls = state.ops.fetch_calls.saturating_add(1));
}

pub(crate) fn record_rows_scanned(rows: u64) {
    with_state_mut(|state| state.ops.rows_scanned = state.ops.rows_scanned.saturating_add(rows));
}

pub(crate) fn record_rows_returned(rows: u64) {
    with_state_mut(|state| state.ops.rows_returned = state.ops.rows_returned.saturating_add(rows));
}

pub(crate) fn record_bookmark_recovered() {
    with_state_mut(|state| {
        state.ops.bookmarks_recovered = state.ops.bookmarks_recovered.saturating_add(1);
    });
}

///
/// TESTS
///
