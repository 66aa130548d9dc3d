//! Shared types and pure helpers for the tubedigest workspace.
//!
//! This crate has no I/O. It provides the unified [`Error`] type, typed
//! identifiers, the content [`Stage`] tag, the compact duration parser and
//! the channel keyword filter.

pub mod duration;
pub mod error;
pub mod ids;
pub mod keywords;
pub mod stage;

pub use duration::{format_duration, parse_duration};
pub use error::{Error, Result};
pub use ids::{ContentId, FeatureId};
pub use keywords::{filter_by_keywords, Searchable};
pub use stage::Stage;
