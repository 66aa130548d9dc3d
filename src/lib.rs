//! Tubedigest - channel upload aggregator
//!
//! Five independently scheduled workers move each discovered video through
//! `discovered -> transcribed -> summarized -> translated -> published`.
//! This library crate exposes the workers, their capability clients and the
//! wiring for integration testing.

pub mod admin;
pub mod config;
pub mod pipeline;
pub mod providers;
pub mod workers;
