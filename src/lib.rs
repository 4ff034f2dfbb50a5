//! Mediacheck - conformance checks for fragmented MP4 streams
//!
//! This library crate exposes the job configuration, the extraction passes
//! and the report for the binary and for integration testing.

pub mod check;
pub mod config;
pub mod extract;
pub mod report;
