//! HTTP handlers for the relay.

pub mod print;
pub mod status;
