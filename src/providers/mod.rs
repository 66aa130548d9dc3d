//! Clients for the external services the pipeline depends on.
//!
//! # Module layout
//!
//! - [`capability`] -- Trait definitions and shared data types.
//! - [`youtube`] -- Video platform metadata (YouTube Data API v3).
//! - [`chat`] -- Summarization through an OpenAI-compatible chat endpoint.
//! - [`azure`] -- Translation through Azure AI Translator.
//! - [`facebook`] -- Page posts through the Facebook Graph API.

pub mod azure;
pub mod capability;
pub mod chat;
pub mod facebook;
mod http;
pub mod youtube;

pub use azure::AzureTranslator;
pub use capability::{
    ChannelDetails, ChannelMatch, MetadataProvider, SearchHit, SocialPoster, Summarizer,
    Translator, VideoDetails,
};
pub use chat::ChatCompletionClient;
pub use facebook::GraphPoster;
pub use youtube::YoutubeClient;
