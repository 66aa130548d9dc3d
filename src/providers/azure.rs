//! Azure AI Translator (Text Translation v3) client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tubedigest_common::{Error, Result};

use super::capability::Translator;
use super::http::{build_client, decode, ensure_success, transport};
use crate::config::TranslatorConfig;

const SERVICE: &str = "translator";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Service limit on array elements per request.
const MAX_BATCH: usize = 100;

#[derive(Debug, Serialize)]
struct TextItem<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslationResult {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// [`Translator`] backed by the Azure Text Translation REST API.
pub struct AzureTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    region: Option<String>,
}

impl AzureTranslator {
    pub fn new(endpoint: &str, api_key: String, region: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            endpoint: format!("{}/translate", endpoint.trim_end_matches('/')),
            api_key,
            region,
        })
    }

    pub fn from_config(config: &TranslatorConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("translator.api_key is not set".into()))?;
        Self::new(&config.endpoint, api_key, config.region.clone())
    }

    async fn translate_chunk(
        &self,
        source: &str,
        target: &str,
        texts: &[String],
    ) -> Result<Vec<String>> {
        let body: Vec<TextItem<'_>> = texts.iter().map(|t| TextItem { text: t }).collect();

        let mut req = self
            .client
            .post(&self.endpoint)
            .query(&[("api-version", "3.0"), ("from", source), ("to", target)])
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .json(&body);
        if let Some(region) = &self.region {
            req = req.header("Ocp-Apim-Subscription-Region", region);
        }

        let resp = req.send().await.map_err(|e| transport(SERVICE, e))?;
        let results: Vec<TranslationResult> =
            decode(SERVICE, ensure_success(SERVICE, resp).await?).await?;

        if results.len() != texts.len() {
            return Err(Error::format(format!(
                "translator returned {} results for {} texts",
                results.len(),
                texts.len()
            )));
        }

        results
            .into_iter()
            .map(|r| {
                r.translations
                    .into_iter()
                    .next()
                    .map(|t| t.text)
                    .ok_or_else(|| Error::format("translation result without translations"))
            })
            .collect()
    }
}

#[async_trait]
impl Translator for AzureTranslator {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn translate(&self, source: &str, target: &str, texts: &[String]) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH) {
            debug!(count = chunk.len(), source, target, "Translating batch");
            out.extend(self.translate_chunk(source, target, chunk).await?);
        }
        Ok(out)
    }
}
