//! Enrichment stage of a content item.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The enrichment stage a content item has reached.
///
/// Stages only move forward, one step at a time. Each worker selects items in
/// exactly one stage and advances them to the next, so the readiness sets of
/// the five workers never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Persisted by discovery; waiting for captions.
    Discovered,
    /// Raw and filtered transcripts are stored; waiting for a summary.
    Transcribed,
    /// Primary summary is stored; waiting for translation.
    Summarized,
    /// Translated summary is stored; waiting to be posted.
    Translated,
    /// Posted to the social page. Terminal.
    Published,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 5] = [
        Stage::Discovered,
        Stage::Transcribed,
        Stage::Summarized,
        Stage::Translated,
        Stage::Published,
    ];

    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Discovered => "discovered",
            Stage::Transcribed => "transcribed",
            Stage::Summarized => "summarized",
            Stage::Translated => "translated",
            Stage::Published => "published",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "discovered" => Ok(Stage::Discovered),
            "transcribed" => Ok(Stage::Transcribed),
            "summarized" => Ok(Stage::Summarized),
            "translated" => Ok(Stage::Translated),
            "published" => Ok(Stage::Published),
            other => Err(Error::Validation(format!("unknown stage: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        let mut sorted = Stage::ALL;
        sorted.sort();
        assert_eq!(sorted, Stage::ALL);
    }

    #[test]
    fn parse_round_trips_display() {
        for stage in Stage::ALL {
            assert_eq!(stage.to_string().parse::<Stage>().unwrap(), stage);
        }
        assert_eq!("Translated".parse::<Stage>().unwrap(), Stage::Translated);
    }

    #[test]
    fn unknown_stage_rejected() {
        assert!(matches!("archived".parse::<Stage>(), Err(Error::Validation(_))));
    }
}
