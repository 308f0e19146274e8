//! Process table
//!
//! [`parse_snapshot`] joins per-process CPU ticks, UID ownership and command
//! lines by PID into a [`ProcessSnapshot`]. [`reconcile`] turns two
//! snapshots into a [`ProcessTable`] with CPU percentages, and
//! [`ProcessTracker`] keeps the previous snapshot between polls.

mod parser;
mod reconcile;

pub use parser::{
    ProcessSnapshot, ProcessState, RawProcessEntry, parse_args_listing, parse_owner_listing,
    parse_pid_stat, parse_snapshot,
};
pub use reconcile::{
    APP_UID_THRESHOLD, PAGE_SIZE_BYTES, ProcessRow, ProcessTable, ProcessTracker, reconcile,
};
