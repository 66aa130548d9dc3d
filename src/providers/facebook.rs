//! Facebook Graph API page poster.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use tubedigest_common::{Error, Result};

use super::capability::SocialPoster;
use super::http::{build_client, decode, ensure_success, transport};
use crate::config::PublisherConfig;

const SERVICE: &str = "facebook";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct PostResponse {
    id: String,
}

/// [`SocialPoster`] that creates page feed posts.
pub struct GraphPoster {
    client: reqwest::Client,
    graph_url: String,
    access_token: String,
}

impl GraphPoster {
    pub fn new(graph_url: &str, access_token: String) -> Result<Self> {
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            graph_url: graph_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    pub fn from_config(config: &PublisherConfig) -> Result<Self> {
        let token = config
            .access_token
            .clone()
            .ok_or_else(|| Error::Config("publisher.access_token is not set".into()))?;
        Self::new(&config.graph_url, token)
    }
}

#[async_trait]
impl SocialPoster for GraphPoster {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn post(
        &self,
        page_id: &str,
        link: Option<&str>,
        message: Option<&str>,
    ) -> Result<String> {
        let link = link.filter(|l| !l.is_empty());
        let message = message.filter(|m| !m.is_empty());
        if link.is_none() && message.is_none() {
            return Err(Error::Validation(
                "a post needs a link or a message".into(),
            ));
        }

        let mut form: Vec<(&str, &str)> = vec![("access_token", self.access_token.as_str())];
        if let Some(link) = link {
            form.push(("link", link));
        }
        if let Some(message) = message {
            form.push(("message", message));
        }

        let url = format!("{}/{page_id}/feed", self.graph_url);
        debug!(page_id, "Creating page post");

        let resp = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| transport(SERVICE, e))?;
        let body: PostResponse = decode(SERVICE, ensure_success(SERVICE, resp).await?).await?;
        Ok(body.id)
    }
}
