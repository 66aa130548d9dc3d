//! tubedigest-captions: caption retrieval for the transcription stage.
//!
//! This crate wraps the external caption tool (yt-dlp) behind the
//! [`CaptionSource`] trait, provides the disposable [`ScratchWorkspace`] each
//! download runs in, and turns raw SRT caption markup into plain transcript
//! text with [`normalize_transcript`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tubedigest_captions::{CaptionOutcome, CaptionSource, ScratchWorkspace, YtDlp};
//!
//! # async fn example() -> tubedigest_common::Result<()> {
//! let tool = YtDlp::discover(None, "en", Duration::from_secs(600))?;
//! let workspace = ScratchWorkspace::new()?;
//! match tool.fetch("dQw4w9WgXcQ", workspace.path()).await? {
//!     CaptionOutcome::Captions(path) => println!("captions at {}", path.display()),
//!     CaptionOutcome::NoCaptions => println!("no captions yet"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod tools;
pub mod transcript;
pub mod workspace;
pub mod ytdlp;

pub use command::{ToolCommand, ToolOutput};
pub use tools::{check_tool, get_tool_path, require_tool, ToolInfo};
pub use transcript::normalize_transcript;
pub use workspace::ScratchWorkspace;
pub use ytdlp::{CaptionOutcome, CaptionSource, YtDlp};
