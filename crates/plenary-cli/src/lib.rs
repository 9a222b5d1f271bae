//! Plenary CLI Library
//!
//! Terminal interface for browsing the legislature's public polls and
//! casting this device's vote.

pub mod favorites_cmd;
pub mod poll_cmd;
pub mod poll_fmt;
