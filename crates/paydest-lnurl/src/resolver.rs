use std::time::Duration;

use async_trait::async_trait;
use paydest_parser::LnurlPointer;
use serde_json::Value;
use url::Url;

use crate::error::LnurlError;
use crate::pointer::pointer_target;
use crate::response::{FailureReason, LnurlResolution, classify_body, remote_error};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// LNURL responses are small JSON documents; anything larger is refused.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Resolves an [`LnurlPointer`] with one network round-trip. Never retries and
/// never fails outside of [`LnurlResolution::ResolutionFailure`].
#[async_trait]
pub trait LnurlResolver: Send + Sync {
    async fn resolve(&self, pointer: &LnurlPointer) -> LnurlResolution;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub timeout: Duration,
    /// Accept clearnet `http://` services. Onion services are always allowed.
    pub allow_insecure_http: bool,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            allow_insecure_http: false,
            user_agent: format!("paydest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpLnurlResolver {
    config: ResolverConfig,
    http: reqwest::Client,
}

impl HttpLnurlResolver {
    pub fn new(config: ResolverConfig) -> Result<Self, LnurlError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|error| LnurlError::Client(error.to_string()))?;
        Ok(Self { config, http })
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    async fn fetch(&self, url: &Url) -> Result<LnurlResolution, FailureReason> {
        let response = self
            .http
            .get(url.clone())
            .header("accept", "application/json")
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        let body_bytes = read_capped(response).await?;
        let body = serde_json::from_slice::<Value>(&body_bytes);

        if let Some(reason) = body.as_ref().ok().and_then(remote_error) {
            return Err(FailureReason::Remote(reason));
        }
        if !status.is_success() {
            return Err(FailureReason::HttpStatus(status.as_u16()));
        }

        let body = body.map_err(|error| FailureReason::Malformed(error.to_string()))?;
        classify_body(body, url)
    }
}

#[async_trait]
impl LnurlResolver for HttpLnurlResolver {
    async fn resolve(&self, pointer: &LnurlPointer) -> LnurlResolution {
        let target = match pointer_target(pointer, self.config.allow_insecure_http) {
            Ok(target) => target,
            Err(reason) => return failure(reason),
        };

        if target.login {
            tracing::info!(url = %target.url, "lnurl login is not supported; not fetching");
            return LnurlResolution::UnsupportedRequest {
                tag: "login".to_string(),
            };
        }

        tracing::debug!(url = %target.url, "resolving lnurl");
        match self.fetch(&target.url).await {
            Ok(resolution) => {
                if let LnurlResolution::UnsupportedRequest { tag } = &resolution {
                    tracing::info!(url = %target.url, tag = %tag, "lnurl request type not supported");
                }
                resolution
            }
            Err(reason) => failure(reason),
        }
    }
}

fn failure(reason: FailureReason) -> LnurlResolution {
    tracing::warn!(
        category = reason.category().as_str(),
        reason = %reason,
        "lnurl resolution failed"
    );
    LnurlResolution::ResolutionFailure { reason }
}

async fn read_capped(mut response: reqwest::Response) -> Result<Vec<u8>, FailureReason> {
    let oversized = || FailureReason::Malformed(format!("body exceeds {MAX_BODY_BYTES} bytes"));
    let declared = response.content_length().unwrap_or(0);
    if usize::try_from(declared)
        .ok()
        .is_none_or(|declared| declared > MAX_BODY_BYTES)
    {
        return Err(oversized());
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(transport_failure)? {
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(oversized());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn transport_failure(error: reqwest::Error) -> FailureReason {
    if error.is_timeout() {
        FailureReason::Timeout
    } else if error.is_connect() {
        FailureReason::Unreachable(error.to_string())
    } else if error.is_decode() {
        FailureReason::Malformed(error.to_string())
    } else {
        FailureReason::Transport(error.to_string())
    }
}
