//! Database query modules.

pub mod channels;
pub mod contents;
pub mod features;
