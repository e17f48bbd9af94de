//! ICS import and export.
//!
//! Reads and writes event definitions as RFC 5545 VEVENTs. Only the fields the
//! agenda stores travel through: repeat rules are limited to FREQ and
//! INTERVAL, and start times are written as floating local time.

mod generate;
mod parse;

pub use generate::generate_ics;
pub use parse::parse_events;
