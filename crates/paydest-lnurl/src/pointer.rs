//! LNURL pointer decoding: bech32 payloads, LUD-17 schemes and Lightning
//! Addresses all end up as one fetchable URL.

use bech32::{Bech32, Hrp};
use paydest_parser::{LnurlEncoding, LnurlPointer};
use url::Url;

use crate::error::LnurlError;
use crate::response::FailureReason;

const LNURL_HRP: &str = "lnurl";
const LOGIN_TAG: &str = "login";

/// URL a pointer resolves against, plus whether fetching it would be a
/// LUD-04 login (which has side effects and is never fetched).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerTarget {
    pub url: Url,
    pub login: bool,
}

pub fn pointer_target(
    pointer: &LnurlPointer,
    allow_insecure_http: bool,
) -> Result<PointerTarget, FailureReason> {
    let (url, login_scheme) = match pointer.encoding {
        LnurlEncoding::Bech32 => (decode_bech32(&pointer.lnurl)?, false),
        LnurlEncoding::Scheme => rewrite_scheme(&pointer.lnurl, allow_insecure_http)?,
        LnurlEncoding::LightningAddress => {
            (well_known_url(&pointer.lnurl, allow_insecure_http)?, false)
        }
    };

    match url.scheme() {
        "https" => {}
        "http" if allow_insecure_http || is_onion(&url) => {}
        "http" => {
            return Err(FailureReason::InvalidPointer(format!(
                "refusing clearnet http url {url}"
            )));
        }
        other => {
            return Err(FailureReason::InvalidPointer(format!(
                "unsupported url scheme {other}"
            )));
        }
    }

    let login = login_scheme
        || url
            .query_pairs()
            .any(|(key, value)| key == "tag" && value == LOGIN_TAG);
    Ok(PointerTarget { url, login })
}

/// Bech32-encode `url` the way LUD-01 publishes it in QR codes.
pub fn encode_lnurl(url: &Url) -> Result<String, LnurlError> {
    let hrp = Hrp::parse(LNURL_HRP).map_err(|error| LnurlError::Encode(error.to_string()))?;
    let encoded = bech32::encode::<Bech32>(hrp, url.as_str().as_bytes())
        .map_err(|error| LnurlError::Encode(error.to_string()))?;
    Ok(encoded.to_ascii_uppercase())
}

fn decode_bech32(lnurl: &str) -> Result<Url, FailureReason> {
    if lnurl.bytes().any(|byte| byte.is_ascii_lowercase())
        && lnurl.bytes().any(|byte| byte.is_ascii_uppercase())
    {
        return Err(FailureReason::InvalidPointer(
            "bech32: mixed-case string".to_string(),
        ));
    }
    let (hrp, data) = bech32::decode(&lnurl.to_ascii_lowercase())
        .map_err(|error| FailureReason::InvalidPointer(format!("bech32: {error}")))?;
    if !hrp.as_str().eq_ignore_ascii_case(LNURL_HRP) {
        return Err(FailureReason::InvalidPointer(format!(
            "unexpected prefix {hrp}"
        )));
    }
    let text = String::from_utf8(data)
        .map_err(|error| FailureReason::InvalidPointer(format!("payload is not utf-8: {error}")))?;
    Url::parse(&text).map_err(|error| FailureReason::InvalidPointer(format!("url: {error}")))
}

// LUD-17: `lnurlp://host/path` is `https://host/path` (`http` for onion hosts).
fn rewrite_scheme(raw: &str, allow_insecure_http: bool) -> Result<(Url, bool), FailureReason> {
    let (scheme, rest) = raw
        .split_once("://")
        .ok_or_else(|| FailureReason::InvalidPointer(format!("missing scheme in {raw}")))?;
    let login = scheme.eq_ignore_ascii_case("keyauth");
    let host = host_of(rest);
    let transport = transport_scheme(host, allow_insecure_http);
    let url = Url::parse(&format!("{transport}://{rest}"))
        .map_err(|error| FailureReason::InvalidPointer(format!("url: {error}")))?;
    Ok((url, login))
}

// LUD-16: `user@domain` is served from `/.well-known/lnurlp/<user>`.
fn well_known_url(address: &str, allow_insecure_http: bool) -> Result<Url, FailureReason> {
    let (user, domain) = address
        .split_once('@')
        .ok_or_else(|| FailureReason::InvalidPointer(format!("not a lightning address: {address}")))?;
    let transport = transport_scheme(domain, allow_insecure_http);
    Url::parse(&format!(
        "{transport}://{domain}/.well-known/lnurlp/{}",
        user.to_ascii_lowercase()
    ))
    .map_err(|error| FailureReason::InvalidPointer(format!("url: {error}")))
}

fn transport_scheme(host: &str, allow_insecure_http: bool) -> &'static str {
    let bare_host = host.split(':').next().unwrap_or(host);
    if allow_insecure_http || bare_host.to_ascii_lowercase().ends_with(".onion") {
        "http"
    } else {
        "https"
    }
}

fn host_of(rest: &str) -> &str {
    rest.split(['/', '?', '#']).next().unwrap_or(rest)
}

fn is_onion(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| host.to_ascii_lowercase().ends_with(".onion"))
}
