//! Core logic for the agenda calendar.
//!
//! This crate is pure: it owns no timers and performs no I/O beyond loading
//! its config file. It provides:
//! - `event` and `calendar` record types as they travel over the sync channel
//! - `recurrence` for expanding repeat rules into dated occurrences
//! - `alert` for deciding which reminders are due in the current minute
//! - `notification` payloads and snooze derivation
//! - `protocol` messages exchanged with the host application
//! - `ics` import/export

pub mod alert;
pub mod calendar;
pub mod config;
pub mod date_math;
pub mod date_range;
pub mod error;
pub mod event;
pub mod ics;
pub mod notification;
pub mod protocol;
pub mod recurrence;

// Re-export the record types at crate root for convenience
pub use event::*;
