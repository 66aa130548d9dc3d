//! Summarization: condense transcripts into an anonymized narrative and tag
//! the known participants.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tubedigest_common::{Error, FeatureId, Result, Stage};
use tubedigest_db::models::{ContentItem, Feature};
use tubedigest_db::pool::{get_conn, DbPool};
use tubedigest_db::queries::{contents, features};

use super::{cancellable, CycleReport, Worker};
use crate::providers::Summarizer;

/// System instruction sent with every transcript.
pub const SUMMARY_INSTRUCTION: &str = "\
You summarize radio shows, podcasts and other recorded conversations, usually between two people.

On the first line of your answer, list the names of the participants separated by commas. Put nothing else on that line.

Starting on the next line, summarize the conversation by its themes, ideas and key points. Never name or attribute statements to any participant, even when their role (host or guest) is obvious. Refer to them as \"the participants\", \"the speakers\" or \"they\", and prefer impersonal phrasing such as \"It is argued that...\" or \"The conversation explores...\".

Example: instead of \"Dr. Smith explained that climate change accelerates biodiversity loss\", write \"The conversation highlights that climate change accelerates biodiversity loss\".";

/// A summarizer answer split into its two parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSummary {
    /// The first line as returned, trimmed.
    pub participants: String,
    pub summary: String,
}

/// Split a summarizer answer into the participant line and the summary body.
///
/// # Errors
///
/// [`Error::Format`] when the answer has no line break or the body is empty.
pub fn parse_summary(response: &str) -> Result<ParsedSummary> {
    let response = response.trim_start();
    let (first, rest) = response
        .split_once('\n')
        .ok_or_else(|| Error::format("summary has no participant line"))?;

    let summary = rest.trim();
    if summary.is_empty() {
        return Err(Error::format("summary body is empty"));
    }

    Ok(ParsedSummary {
        participants: first.trim().to_string(),
        summary: summary.to_string(),
    })
}

/// Features whose English last name appears as a token of the participant
/// line. Tokens are split on commas and spaces and compared case-insensitively.
pub fn match_features(participants: &str, known: &[Feature]) -> Vec<FeatureId> {
    let mut matched = Vec::new();
    for token in participants.split([',', ' ']).map(str::trim).filter(|t| !t.is_empty()) {
        let token = token.to_lowercase();
        for feature in known {
            if feature.last_name_en.to_lowercase() == token && !matched.contains(&feature.id) {
                matched.push(feature.id);
            }
        }
    }
    matched
}

pub struct SummarizationWorker {
    db: DbPool,
    summarizer: Arc<dyn Summarizer>,
    interval: Duration,
}

impl SummarizationWorker {
    pub fn new(db: DbPool, summarizer: Arc<dyn Summarizer>, interval: Duration) -> Self {
        Self {
            db,
            summarizer,
            interval,
        }
    }

    async fn summarize(
        &self,
        item: &ContentItem,
        known: &[Feature],
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let transcript = item.filtered_transcript.as_deref().unwrap_or_default();
        let response = cancellable(
            cancel,
            self.summarizer.complete(SUMMARY_INSTRUCTION, transcript),
        )
        .await?;

        let parsed = parse_summary(&response)?;
        let linked = match_features(&parsed.participants, known);

        let conn = get_conn(&self.db)?;
        contents::record_summary(
            &conn,
            item.id,
            &parsed.summary,
            Some(parsed.participants.as_str()).filter(|p| !p.is_empty()),
            &linked,
        )
    }
}

#[async_trait]
impl Worker for SummarizationWorker {
    fn name(&self) -> &'static str {
        "summarization"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport> {
        let (items, known) = {
            let conn = get_conn(&self.db)?;
            (
                contents::list_ready(&conn, Stage::Transcribed, None)?,
                features::list_features(&conn)?,
            )
        };

        let mut report = CycleReport {
            selected: items.len(),
            ..Default::default()
        };

        for item in &items {
            tracing::info!(video_id = %item.video_id, "Requesting summary");
            match self.summarize(item, &known, cancel).await {
                Ok(true) => report.completed += 1,
                Ok(false) => {
                    report.skipped += 1;
                    tracing::debug!(video_id = %item.video_id, "Item already advanced");
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(video_id = %item.video_id, error = %e, "Summarization failed");
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn feature(first: &str, last: &str) -> Feature {
        Feature {
            id: FeatureId::new(),
            first_name_en: first.into(),
            last_name_en: last.into(),
            first_name_local: None,
            last_name_local: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn splits_participants_from_body() {
        let parsed = parse_summary("Alice Smith, Bob Jones\n\nThe speakers discuss budgets.\n").unwrap();
        assert_eq!(parsed.participants, "Alice Smith, Bob Jones");
        assert_eq!(parsed.summary, "The speakers discuss budgets.");
    }

    #[test]
    fn leading_blank_lines_are_ignored() {
        let parsed = parse_summary("\n\nAlice\nBody").unwrap();
        assert_eq!(parsed.participants, "Alice");
        assert_eq!(parsed.summary, "Body");
    }

    #[test]
    fn single_line_is_format_error() {
        assert_matches!(parse_summary("Only one line"), Err(Error::Format(_)));
    }

    #[test]
    fn empty_body_is_format_error() {
        assert_matches!(parse_summary("Alice, Bob\n   \n"), Err(Error::Format(_)));
    }

    #[test]
    fn matches_last_names_case_insensitively() {
        let smith = feature("Alice", "Smith");
        let jones = feature("Bob", "Jones");
        let other = feature("Carol", "White");
        let known = vec![smith.clone(), jones.clone(), other];

        let ids = match_features("alice SMITH,Bob jones", &known);
        assert_eq!(ids, vec![smith.id, jones.id]);
    }

    #[test]
    fn first_names_and_partial_tokens_do_not_match() {
        let known = vec![feature("Alice", "Smith")];
        assert!(match_features("Alice Smithson", &known).is_empty());
    }

    #[test]
    fn repeated_name_links_once() {
        let smith = feature("Alice", "Smith");
        let ids = match_features("Smith, Smith", &[smith.clone()]);
        assert_eq!(ids, vec![smith.id]);
    }
}
