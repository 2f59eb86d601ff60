use crate::error::ProxyError;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Validate and parse the user-supplied target URL (SSRF protection).
///
/// Only `http://` and `https://` targets are accepted. IP-literal hosts are
/// checked against private and reserved ranges unless `allow_private` is set
/// (dev mode and test servers run on loopback). Hostnames pass without DNS
/// resolution; DNS rebinding is an accepted limitation.
///
/// Returns the parsed [`Url`] so callers never re-parse the target.
///
/// # Errors
/// Returns [`ProxyError::InvalidTarget`] for unparseable URLs, non-HTTP(S)
/// schemes, host-less URLs, and blocked IP literals.
pub fn validate_target_url(url: &str, allow_private: bool) -> Result<Url, ProxyError> {
    let parsed =
        Url::parse(url).map_err(|e| ProxyError::InvalidTarget(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ProxyError::InvalidTarget(format!(
                "scheme '{scheme}' not allowed, only http/https"
            )));
        }
    }

    let Some(host) = parsed.host() else {
        return Err(ProxyError::InvalidTarget(format!("no host in {url}")));
    };

    if !allow_private {
        let blocked = match host {
            Host::Ipv4(ip) => is_private_ipv4(ip),
            Host::Ipv6(ip) => is_private_ipv6(ip),
            // Hostnames cannot be checked without async DNS; let them through.
            Host::Domain(_) => false,
        };
        if blocked {
            return Err(ProxyError::InvalidTarget(format!(
                "private or reserved address not allowed: {host}"
            )));
        }
    }

    Ok(parsed)
}

/// Private/reserved IPv4 ranges: 0.0.0.0/8, 10/8, 127/8, 169.254/16 (cloud
/// metadata), 172.16/12, 192.168/16.
fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();

    a == 0
        || a == 10
        || a == 127
        || (a == 169 && b == 254)
        || (a == 172 && (16..=31).contains(&b))
        || (a == 192 && b == 168)
}

/// Private/reserved IPv6 ranges: ::1, fe80::/10 link-local, fc00::/7 ULA.
fn is_private_ipv6(ip: Ipv6Addr) -> bool {
    let head = ip.segments()[0];

    ip.is_loopback() || (head & 0xffc0) == 0xfe80 || (head & 0xfe00) == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(url: &str) -> Result<Url, ProxyError> {
        validate_target_url(url, false)
    }

    #[test]
    fn rejects_loopback_and_rfc1918() {
        for url in [
            "http://127.0.0.1/stream.m3u8",
            "http://10.0.0.1/stream.m3u8",
            "http://172.16.0.1/stream.m3u8",
            "http://172.31.255.255/stream.m3u8",
            "http://192.168.1.1/stream.m3u8",
            "http://0.0.0.0/stream.m3u8",
        ] {
            assert!(strict(url).is_err(), "{url}");
        }
    }

    #[test]
    fn rejects_cloud_metadata_endpoint() {
        assert!(strict("http://169.254.169.254/latest/meta-data/").is_err());
    }

    #[test]
    fn rejects_private_ipv6() {
        assert!(strict("http://[::1]/stream.m3u8").is_err());
        assert!(strict("http://[fe80::1]/stream.m3u8").is_err());
        assert!(strict("http://[fd00::1]/stream.m3u8").is_err());
    }

    #[test]
    fn allows_public_addresses() {
        assert!(strict("http://203.0.113.1/stream.m3u8").is_ok());
        assert!(strict("https://cdn.example.com/live/playlist.m3u8").is_ok());
        assert!(strict("https://cdn.example.com/seg.ts?token=abc").is_ok());
    }

    #[test]
    fn allow_private_admits_loopback() {
        assert!(validate_target_url("http://127.0.0.1:9000/playlist.m3u8", true).is_ok());
        assert!(validate_target_url("http://[::1]/playlist.m3u8", true).is_ok());
    }

    #[test]
    fn rejects_non_http_schemes_even_when_private_allowed() {
        assert!(validate_target_url("file:///etc/passwd", true).is_err());
        assert!(validate_target_url("ftp://cdn.example.com/a.ts", true).is_err());
        assert!(validate_target_url("gopher://cdn.example.com/x", true).is_err());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(strict("").is_err());
        assert!(strict("not a url").is_err());
        assert!(strict("cdn.example.com/stream.m3u8").is_err());
    }

    #[test]
    fn range_boundaries_172() {
        // 172.15 and 172.32 sit just outside 172.16.0.0/12
        assert!(strict("http://172.15.255.255/x.m3u8").is_ok());
        assert!(strict("http://172.32.0.0/x.m3u8").is_ok());
    }

    #[test]
    fn returns_parsed_url() {
        let url = strict("https://cdn.example.com/live/playlist.m3u8?tok=1").unwrap();
        assert_eq!(url.path(), "/live/playlist.m3u8");
        assert_eq!(url.query(), Some("tok=1"));
    }
}
