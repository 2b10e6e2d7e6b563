use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Result of resolving one LNURL pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LnurlResolution {
    PayRequest { params: PayRequestParams },
    UnsupportedRequest { tag: String },
    ResolutionFailure { reason: FailureReason },
}

/// LUD-06 `payRequest` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayRequestParams {
    pub callback: Url,
    pub min_sendable_msats: u64,
    pub max_sendable_msats: u64,
    /// Raw metadata string; the payee commits to its hash in the invoice.
    pub metadata: String,
    /// `text/plain` entry of the metadata.
    pub description: Option<String>,
    pub comment_allowed: u32,
    /// Host the pointer resolved against.
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("invalid lnurl: {0}")]
    InvalidPointer(String),
    #[error("service unreachable: {0}")]
    Unreachable(String),
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected http status {0}")]
    HttpStatus(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Reason string returned by the service in a `{"status":"ERROR"}` body.
    #[error("{0}")]
    Remote(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    InvalidPointer,
    Transport,
    Malformed,
    Remote,
}

impl FailureCategory {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPointer => "invalid pointer",
            Self::Transport => "transport failure",
            Self::Malformed => "malformed response",
            Self::Remote => "remote error",
        }
    }
}

impl FailureReason {
    #[must_use]
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::InvalidPointer(_) => FailureCategory::InvalidPointer,
            Self::Unreachable(_) | Self::Timeout | Self::Transport(_) | Self::HttpStatus(_) => {
                FailureCategory::Transport
            }
            Self::Malformed(_) => FailureCategory::Malformed,
            Self::Remote(_) => FailureCategory::Remote,
        }
    }

    /// Human-readable reason supplied by the remote party, if any.
    #[must_use]
    pub fn remote_reason(&self) -> Option<&str> {
        match self {
            Self::Remote(reason) => Some(reason.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayRequestWire {
    callback: String,
    min_sendable: u64,
    max_sendable: u64,
    metadata: String,
    #[serde(default)]
    comment_allowed: u32,
}

/// `{"status":"ERROR","reason":"..."}` payloads, returned with any HTTP status.
pub(crate) fn remote_error(body: &Value) -> Option<String> {
    let status = body.get("status")?.as_str()?;
    if !status.eq_ignore_ascii_case("error") {
        return None;
    }
    let reason = body
        .get("reason")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .unwrap_or("unspecified error");
    Some(reason.to_string())
}

/// Map a decoded response body onto a resolution. `payRequest` is the only
/// supported tag; everything else is rejected with its tag.
pub(crate) fn classify_body(body: Value, origin: &Url) -> Result<LnurlResolution, FailureReason> {
    let tag = body
        .get("tag")
        .and_then(Value::as_str)
        .ok_or_else(|| FailureReason::Malformed("missing tag".to_string()))?
        .to_string();

    if tag != "payRequest" {
        return Ok(LnurlResolution::UnsupportedRequest { tag });
    }

    let wire = serde_json::from_value::<PayRequestWire>(body)
        .map_err(|error| FailureReason::Malformed(error.to_string()))?;
    let callback = Url::parse(&wire.callback)
        .map_err(|error| FailureReason::Malformed(format!("callback: {error}")))?;
    if wire.min_sendable > wire.max_sendable {
        return Err(FailureReason::Malformed(format!(
            "minSendable {} exceeds maxSendable {}",
            wire.min_sendable, wire.max_sendable
        )));
    }

    Ok(LnurlResolution::PayRequest {
        params: PayRequestParams {
            callback,
            min_sendable_msats: wire.min_sendable,
            max_sendable_msats: wire.max_sendable,
            description: plain_text_description(&wire.metadata),
            metadata: wire.metadata,
            comment_allowed: wire.comment_allowed,
            domain: origin.host_str().unwrap_or_default().to_string(),
        },
    })
}

fn plain_text_description(metadata: &str) -> Option<String> {
    let entries = match serde_json::from_str::<Vec<Vec<Value>>>(metadata) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::debug!(%error, "payRequest metadata is not a json array");
            return None;
        }
    };
    entries.iter().find_map(|entry| match entry.as_slice() {
        [mime, text, ..] if mime.as_str() == Some("text/plain") => {
            text.as_str().map(str::to_string)
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::json;
    use url::Url;

    use super::{FailureCategory, FailureReason, LnurlResolution, classify_body, remote_error};

    fn origin() -> Result<Url> {
        Ok(Url::parse("https://service.com/lnurlp/alice")?)
    }

    #[test]
    fn pay_request_is_parsed_with_description() -> Result<()> {
        let body = json!({
            "tag": "payRequest",
            "callback": "https://service.com/lnurlp/alice/callback",
            "minSendable": 1000,
            "maxSendable": 5_000_000,
            "metadata": "[[\"text/plain\",\"Pay alice\"],[\"text/identifier\",\"alice@service.com\"]]",
            "commentAllowed": 140
        });

        match classify_body(body, &origin()?)? {
            LnurlResolution::PayRequest { params } => {
                assert_eq!(params.min_sendable_msats, 1000);
                assert_eq!(params.max_sendable_msats, 5_000_000);
                assert_eq!(params.description.as_deref(), Some("Pay alice"));
                assert_eq!(params.comment_allowed, 140);
                assert_eq!(params.domain, "service.com");
            }
            other => panic!("expected pay request, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn other_tags_are_unsupported() -> Result<()> {
        let body = json!({"tag": "withdrawRequest", "k1": "abc"});
        assert_eq!(
            classify_body(body, &origin()?)?,
            LnurlResolution::UnsupportedRequest {
                tag: "withdrawRequest".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn broken_pay_requests_are_malformed() -> Result<()> {
        let missing_tag = classify_body(json!({"callback": "x"}), &origin()?);
        assert!(matches!(missing_tag, Err(FailureReason::Malformed(_))));

        let inverted = classify_body(
            json!({
                "tag": "payRequest",
                "callback": "https://service.com/cb",
                "minSendable": 10,
                "maxSendable": 1,
                "metadata": "[]"
            }),
            &origin()?,
        );
        assert!(matches!(inverted, Err(FailureReason::Malformed(_))));

        let bad_callback = classify_body(
            json!({
                "tag": "payRequest",
                "callback": "not a url",
                "minSendable": 1,
                "maxSendable": 10,
                "metadata": "[]"
            }),
            &origin()?,
        );
        assert!(matches!(bad_callback, Err(FailureReason::Malformed(_))));
        Ok(())
    }

    #[test]
    fn remote_errors_surface_the_reason() {
        assert_eq!(
            remote_error(&json!({"status": "ERROR", "reason": "Amount too small"})),
            Some("Amount too small".to_string())
        );
        assert_eq!(
            remote_error(&json!({"status": "error"})),
            Some("unspecified error".to_string())
        );
        assert_eq!(remote_error(&json!({"status": "OK"})), None);
        assert_eq!(remote_error(&json!({"tag": "payRequest"})), None);
    }

    #[test]
    fn failure_categories_distinguish_transport_malformed_and_remote() {
        assert_eq!(FailureReason::Timeout.category().as_str(), "transport failure");
        assert_eq!(
            FailureReason::Unreachable("refused".to_string()).category(),
            FailureCategory::Transport
        );
        assert_eq!(
            FailureReason::Malformed("x".to_string()).category().as_str(),
            "malformed response"
        );
        let remote = FailureReason::Remote("Invoice expired".to_string());
        assert_eq!(remote.category().as_str(), "remote error");
        assert_eq!(remote.remote_reason(), Some("Invoice expired"));
        assert_eq!(remote.to_string(), "Invoice expired");
    }
}
