//! Utility functions and helpers

pub mod time;

pub use time::{format_age, format_minutes, minutes_between, parse_timestamp};
