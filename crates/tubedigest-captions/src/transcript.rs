//! SRT caption markup to plain transcript text.

/// Normalize raw SRT captions into plain text.
///
/// Blank lines, cue sequence numbers and timing lines (anything containing
/// `-->`) are dropped, the remaining lines are trimmed, and consecutive
/// duplicates are collapsed. Auto-generated captions repeat each line as the
/// cue rolls over, so the collapse matters. Lines are joined with `\n`.
pub fn normalize_transcript(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for line in raw.trim_start_matches('\u{feff}').lines() {
        let line = line.trim();
        if line.is_empty() || line.contains("-->") || line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if lines.last() == Some(&line) {
            continue;
        }
        lines.push(line);
    }

    lines.join("\n")
}
