//! Caption download through yt-dlp.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tubedigest_common::{Error, Result};

use crate::command::ToolCommand;
use crate::tools::get_tool_path;

/// Marker yt-dlp prints on stdout when a video has no captions in the
/// requested language. The process still exits successfully.
const NO_SUBTITLES_MARKER: &str = "There are no subtitles for the requested languages";

const TOOL_NAME: &str = "yt-dlp";

/// What a caption download produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionOutcome {
    /// Caption file inside the working directory.
    Captions(PathBuf),
    /// The video has no captions (yet). Not an error.
    NoCaptions,
}

/// Capability that downloads captions for one video.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Tool name for logging.
    fn name(&self) -> &str;

    /// Download captions for `video_id` into `workdir`.
    ///
    /// `workdir` is a fresh directory owned by the caller and removed after
    /// the call.
    async fn fetch(&self, video_id: &str, workdir: &Path) -> Result<CaptionOutcome>;
}

/// [`CaptionSource`] backed by the yt-dlp command-line tool.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    language: String,
    timeout: Duration,
}

impl YtDlp {
    /// Use the yt-dlp executable at `program`.
    pub fn new(program: PathBuf, language: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program,
            language: language.into(),
            timeout,
        }
    }

    /// Locate yt-dlp, preferring `configured` over a `PATH` search.
    pub fn discover(
        configured: Option<&Path>,
        language: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let program = get_tool_path(TOOL_NAME, configured)?;
        Ok(Self::new(program, language, timeout))
    }

    /// Path of the executable in use.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, video_id: &str, workdir: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.args([
            "--write-auto-sub",
            "--sub-lang",
            self.language.as_str(),
            "--convert-subs",
            "srt",
            "--output",
            "subtitle.%(ext)s",
            "--skip-download",
        ])
        .arg(watch_url(video_id))
        .current_dir(workdir)
        .timeout(self.timeout);
        cmd
    }
}

#[async_trait]
impl CaptionSource for YtDlp {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    async fn fetch(&self, video_id: &str, workdir: &Path) -> Result<CaptionOutcome> {
        let output = self.command(video_id, workdir).execute().await?;

        if output.stdout.contains(NO_SUBTITLES_MARKER) {
            tracing::debug!(video_id, "No captions available");
            return Ok(CaptionOutcome::NoCaptions);
        }

        match find_caption_file(workdir)? {
            Some(path) => Ok(CaptionOutcome::Captions(path)),
            None => Err(Error::tool(
                TOOL_NAME,
                format!("finished without writing a caption file for {video_id}"),
            )),
        }
    }
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Locate the `.srt` file yt-dlp wrote into `dir`.
fn find_caption_file(dir: &Path) -> Result<Option<PathBuf>> {
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "srt"))
        .collect();
    found.sort();

    if found.len() > 1 {
        tracing::debug!(count = found.len(), "Several caption files written, using the first");
    }
    Ok(found.into_iter().next())
}
