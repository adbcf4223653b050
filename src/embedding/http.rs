//! OpenAI-compatible HTTP embedding provider.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::RETRY_AFTER;
use serde_json::Value;
use tracing::debug;

use super::EmbeddingProvider;
use super::config::ProviderConfig;
use super::error::{ProviderError, ProviderResult};

/// Calls `POST {api_base}/embeddings` with a bearer token.
///
/// The client carries the configured timeout, so a call blocks for at most one
/// round trip. Nothing is retried here.
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for HttpEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbeddingProvider")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpEmbeddingProvider {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        config.validate()?;

        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::InvalidConfig {
                reason: "api_key is required".to_string(),
            })?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EmbeddingProvider for HttpEmbeddingProvider {
    fn embed(&self, texts: &[String], model_id: &str) -> ProviderResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            endpoint = %self.endpoint,
            model_id,
            batch = texts.len(),
            "Requesting embeddings"
        );

        let body = serde_json::json!({
            "model": model_id,
            "input": texts,
        });

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::Authentication {
                status: status.as_u16(),
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = res
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Err(ProviderError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = res.text()?;
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = res.json()?;
        let vectors = parse_embedding_response(json)?;

        if vectors.len() != texts.len() {
            return Err(ProviderError::InvalidResponse {
                reason: format!(
                    "requested {} embeddings, received {}",
                    texts.len(),
                    vectors.len()
                ),
            });
        }

        Ok(vectors)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Extracts `data[].embedding` ordered by `data[].index`.
pub(crate) fn parse_embedding_response(json: Value) -> ProviderResult<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ProviderError::InvalidResponse {
            reason: "response is missing data array".to_string(),
        })?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(fallback_index);
        let embedding = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ProviderError::InvalidResponse {
                reason: "embedding item missing embedding array".to_string(),
            })?;
        let mut vec = Vec::with_capacity(embedding.len());
        for value in embedding {
            let number = value.as_f64().ok_or_else(|| ProviderError::InvalidResponse {
                reason: "embedding value must be numeric".to_string(),
            })?;
            vec.push(number as f32);
        }
        indexed.push((index, vec));
    }

    indexed.sort_by_key(|(index, _)| *index);

    // Indices must cover 0..len exactly once.
    if let Some((position, (index, _))) = indexed
        .iter()
        .enumerate()
        .find(|(position, (index, _))| position != index)
    {
        return Err(ProviderError::InvalidResponse {
            reason: format!(
                "duplicate or out-of-range index {index} at position {position} of {}",
                indexed.len()
            ),
        });
    }

    Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}
