//! Circle Iris API attestation provider implementation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, trace};
use url::Url;

use crate::config::{IrisEnvironment, RelayConfig, MESSAGES_PATH_V2};
use crate::error::{RelayError, Result};
use crate::protocol::{AttestationRequest, MessagesResponse};
use crate::traits::AttestationProvider;

/// Production attestation provider using Circle's Iris API.
///
/// # Examples
///
/// ```rust,no_run
/// use cctp_relay::providers::IrisAttestationProvider;
/// use cctp_relay::{AttestationProvider, AttestationRequest, Domain};
/// use alloy_primitives::TxHash;
///
/// # async fn example() -> Result<(), cctp_relay::RelayError> {
/// let provider = IrisAttestationProvider::sandbox();
/// let request = AttestationRequest::new(Domain::ARBITRUM, TxHash::ZERO);
/// let response = provider.fetch_messages(&request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IrisAttestationProvider {
    base_url: Url,
    client: Client,
}

impl IrisAttestationProvider {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    pub fn production() -> Self {
        Self::new(IrisEnvironment::Production.base_url())
    }

    pub fn sandbox() -> Self {
        Self::new(IrisEnvironment::Sandbox.base_url())
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.iris_url.clone())
    }

    /// `{base}/v2/messages/{sourceDomain}?transactionHash={txHash}`
    pub fn messages_url(&self, request: &AttestationRequest) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!(
                "{MESSAGES_PATH_V2}{}",
                request.source_domain.as_u32()
            ))
            .map_err(|e| RelayError::InvalidUrl {
                reason: format!("Failed to construct messages URL: {e}"),
            })?;
        url.query_pairs_mut()
            .append_pair("transactionHash", &request.transaction_hash.to_string());
        Ok(url)
    }
}

#[async_trait]
impl AttestationProvider for IrisAttestationProvider {
    #[instrument(
        skip(self),
        fields(source_domain = %request.source_domain, tx_hash = %request.transaction_hash)
    )]
    async fn fetch_messages(
        &self,
        request: &AttestationRequest,
    ) -> Result<Option<MessagesResponse>> {
        let url = self.messages_url(request)?;
        trace!(url = %url, event = "iris_request");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        trace!(status_code = status.as_u16(), event = "iris_response");

        match status {
            StatusCode::NOT_FOUND => {
                debug!(event = "attestation_not_found");
                return Ok(None);
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|h| h.to_str().ok())
                    .map(str::to_owned);
                debug!(retry_after = ?retry_after, event = "rate_limit_exceeded");
                return Err(RelayError::TransientTransport(
                    "rate limited by attestation service".to_string(),
                ));
            }
            status if !status.is_success() => {
                return Err(RelayError::TransientTransport(format!(
                    "attestation service returned HTTP {status}"
                )));
            }
            _ => {}
        }

        let body = response.text().await?;
        let parsed: MessagesResponse = serde_json::from_str(&body).inspect_err(|e| {
            debug!(error = %e, response_body = %body, event = "attestation_decode_failed");
        })?;
        debug!(messages = parsed.messages.len(), event = "attestation_response_parsed");
        Ok(Some(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Domain;
    use alloy_primitives::b256;

    #[test]
    fn test_messages_url_sandbox() {
        let provider = IrisAttestationProvider::sandbox();
        let request = AttestationRequest::new(
            Domain::ARBITRUM,
            b256!("810159dab3f69d2df42ef9e2febe9498e9b88504a6bfb0690db6eb8f67abb69c"),
        );

        insta::assert_snapshot!(
            provider.messages_url(&request).unwrap().as_str(),
            @"https://iris-api-sandbox.circle.com/v2/messages/3?transactionHash=0x810159dab3f69d2df42ef9e2febe9498e9b88504a6bfb0690db6eb8f67abb69c"
        );
    }

    #[test]
    fn test_messages_url_custom_base() {
        let provider = IrisAttestationProvider::new(Url::parse("http://localhost:8080").unwrap());
        let request = AttestationRequest::new(Domain::UNICHAIN, Default::default());

        let url = provider.messages_url(&request).unwrap();
        assert_eq!(url.path(), "/v2/messages/10");
        assert_eq!(url.host_str(), Some("localhost"));
    }
}
