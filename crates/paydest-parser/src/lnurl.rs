//! Textual LNURL recognition. Nothing here decodes or fetches anything.

use url::Url;

use crate::destination::{LnurlEncoding, LnurlPointer};

const LNURL_BECH32_PREFIX: &str = "lnurl1";
const LUD17_SCHEMES: [&str; 4] = ["lnurlp://", "lnurlw://", "lnurlc://", "keyauth://"];

/// Recognize an LNURL payload, after any `lightning:` prefix has been removed.
pub(crate) fn detect(raw: &str) -> Option<LnurlPointer> {
    if is_bech32_lnurl(raw) {
        return Some(LnurlPointer {
            lnurl: raw.to_ascii_lowercase(),
            encoding: LnurlEncoding::Bech32,
        });
    }

    if LUD17_SCHEMES.iter().any(|scheme| starts_with_ignore_case(raw, scheme)) {
        return Some(LnurlPointer {
            lnurl: raw.to_string(),
            encoding: LnurlEncoding::Scheme,
        });
    }

    if let Some(embedded) = fallback_parameter(raw) {
        return Some(LnurlPointer {
            lnurl: embedded,
            encoding: LnurlEncoding::Bech32,
        });
    }

    if is_lightning_address(raw) {
        return Some(LnurlPointer {
            lnurl: raw.to_ascii_lowercase(),
            encoding: LnurlEncoding::LightningAddress,
        });
    }

    None
}

// Bech32 is single-case; mixed case is not an LNURL.
fn is_bech32_lnurl(raw: &str) -> bool {
    starts_with_ignore_case(raw, LNURL_BECH32_PREFIX)
        && raw.len() > LNURL_BECH32_PREFIX.len()
        && raw.bytes().all(|byte| byte.is_ascii_alphanumeric())
        && !(raw.bytes().any(|byte| byte.is_ascii_lowercase())
            && raw.bytes().any(|byte| byte.is_ascii_uppercase()))
}

// LUD-01 fallback: `https://service.com/?lightning=LNURL1...`.
fn fallback_parameter(raw: &str) -> Option<String> {
    if !starts_with_ignore_case(raw, "https://") && !starts_with_ignore_case(raw, "http://") {
        return None;
    }
    let url = Url::parse(raw).ok()?;
    url.query_pairs()
        .find(|(key, _)| key.eq_ignore_ascii_case("lightning"))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| is_bech32_lnurl(value))
        .map(|value| value.to_ascii_lowercase())
}

fn is_lightning_address(raw: &str) -> bool {
    let Some((user, domain)) = raw.split_once('@') else {
        return false;
    };
    let user_ok = !user.is_empty()
        && user
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'+'));
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b':'));
    user_ok && domain_ok
}

pub(crate) fn starts_with_ignore_case(raw: &str, prefix: &str) -> bool {
    raw.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::detect;
    use crate::destination::LnurlEncoding;

    const LNURL: &str = "LNURL1DP68GURN8GHJ7UM9WFMXJCM99E3K7MF0V9CXJ0M385EKVCENXC6R2C35XVUKXEFCV5MKVV34X5EKZD3EV56NYD3HXQURZEPEXEJXXEPNXSCRVWFNV9NXZCN9XQ6XYEFHVGCXXCMYXYMNSERXFQ5FNS";

    #[test]
    fn detects_bech32_lnurl_in_any_case() {
        let pointer = detect(LNURL);
        assert_eq!(
            pointer.as_ref().map(|pointer| pointer.encoding),
            Some(LnurlEncoding::Bech32)
        );
        assert_eq!(
            pointer.map(|pointer| pointer.lnurl),
            Some(LNURL.to_ascii_lowercase())
        );
        assert!(detect("lnurl1dp68gurn8ghj7").is_some());
    }

    #[test]
    fn rejects_mixed_case_bech32_lnurl() {
        let mixed = format!("lnurl{}", &LNURL[5..]);
        assert!(detect(&mixed).is_none());
        assert!(detect("LnUrl1DP68GURN8GHJ7").is_none());
        assert!(detect(&format!("https://service.com/giftcard?lightning={mixed}")).is_none());
    }

    #[test]
    fn detects_lud17_schemes_and_fallback_urls() {
        assert_eq!(
            detect("lnurlp://service.com/pay/42").map(|pointer| pointer.encoding),
            Some(LnurlEncoding::Scheme)
        );
        assert_eq!(
            detect("KEYAUTH://service.com/login").map(|pointer| pointer.encoding),
            Some(LnurlEncoding::Scheme)
        );

        let fallback = detect(&format!("https://service.com/giftcard?lightning={LNURL}"));
        assert_eq!(
            fallback.map(|pointer| pointer.lnurl),
            Some(LNURL.to_ascii_lowercase())
        );
        assert!(detect("https://service.com/giftcard?lightning=notanlnurl").is_none());
    }

    #[test]
    fn detects_lightning_addresses() {
        assert_eq!(
            detect("Satoshi@Bitcoin.org").map(|pointer| pointer.lnurl),
            Some("satoshi@bitcoin.org".to_string())
        );
        assert!(detect("satoshi@localhost").is_none());
        assert!(detect("@bitcoin.org").is_none());
        assert!(detect("sat oshi@bitcoin.org").is_none());
    }

    #[test]
    fn ignores_other_grammars() {
        assert!(detect("lnbc1qqqqqq").is_none());
        assert!(detect("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").is_none());
        assert!(detect("lnurl1").is_none());
        assert!(detect("").is_none());
    }
}
