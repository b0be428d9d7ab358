//! Delegated channel lookups through a mainchain's public service.
//!
//! `POST {url}/invoke` with `{endpoint, params}`; the service answers
//! `{data}` on success and `{error}` otherwise.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::ChainId;
use tracing::debug;

use crate::domain::{mainchain_service_url, ChainResolverError, ChannelInfo};
use crate::ports::ChannelSource;

const GET_CHANNEL: &str = "interoperability_getChannel";

#[derive(Debug, Serialize)]
struct InvokeRequest<'a, P: Serialize> {
    endpoint: &'a str,
    params: P,
}

#[derive(Debug, Serialize)]
struct ChannelParams {
    #[serde(rename = "chainID")]
    chain_id: ChainId,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse<T> {
    data: Option<T>,
    error: Option<serde_json::Value>,
}

pub struct MainchainServiceClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl MainchainServiceClient {
    /// Every request is bounded by `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ChainResolverError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainResolverError::Transport(format!("HTTP client setup: {e}")))?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Client for the mainchain of `local`'s network. `override_url` wins over
    /// the built-in table.
    pub fn for_network(
        local: &ChainId,
        override_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ChainResolverError> {
        let url = match override_url {
            Some(url) => url,
            None => mainchain_service_url(local)
                .ok_or(ChainResolverError::UnknownNetwork(local.network_id()))?,
        };
        Self::new(url, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Unwrap an invoke envelope.
fn parse_invoke_response<T>(response: InvokeResponse<T>) -> Result<T, ChainResolverError> {
    if let Some(error) = response.error {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ChainResolverError::Remote(message));
    }
    response.data.ok_or_else(|| {
        ChainResolverError::InvalidResponse("response carries neither data nor error".into())
    })
}

#[async_trait]
impl ChannelSource for MainchainServiceClient {
    async fn get_channel(&self, chain_id: &ChainId) -> Result<ChannelInfo, ChainResolverError> {
        let request = InvokeRequest {
            endpoint: GET_CHANNEL,
            params: ChannelParams { chain_id: *chain_id },
        };
        debug!(url = %self.base_url, chain_id = %chain_id, "Delegating channel lookup");

        let response = self
            .http_client
            .post(format!("{}/invoke", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainResolverError::Transport(e.to_string()))?;

        let body: InvokeResponse<ChannelInfo> = response
            .json()
            .await
            .map_err(|e| ChainResolverError::InvalidResponse(e.to_string()))?;

        parse_invoke_response(body)
    }
}
