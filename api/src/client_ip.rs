//! Client address resolution.
//!
//! No single header is trustworthy across direct connections, reverse
//! proxies and CDNs, so the resolver walks a fixed list of sources and takes
//! the first one present:
//!
//! 1. first entry of `x-forwarded-for`
//! 2. `x-real-ip`
//! 3. `cf-connecting-ip`
//! 4. `x-client-ip`
//! 5. the transport peer address
//! 6. the address reported by the serving framework
//!
//! Headers are taken at face value. There is no trusted-proxy chain, so any
//! client can claim any address.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::{ACCEPT_LANGUAGE, USER_AGENT};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use fraudgate_types::{ForwardedHeaders, VerificationContext, VerificationMode};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";
pub const CF_CONNECTING_IP: &str = "cf-connecting-ip";
pub const X_CLIENT_IP: &str = "x-client-ip";

/// Shown when no source yields an address.
pub const UNKNOWN_IP: &str = "unknown";

/// Address the serving layer believes the client has, when it differs from
/// the socket peer (for example when an embedding proxy layer rewrites it).
/// Insert it as a request extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameworkAddr(pub IpAddr);

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Snapshot of the forwarding headers exactly as received.
pub fn forwarded_headers(headers: &HeaderMap) -> ForwardedHeaders {
    let owned = |name: &str| header_str(headers, name).map(str::to_string);
    ForwardedHeaders {
        x_forwarded_for: owned(X_FORWARDED_FOR),
        x_real_ip: owned(X_REAL_IP),
        cf_connecting_ip: owned(CF_CONNECTING_IP),
        x_client_ip: owned(X_CLIENT_IP),
    }
}

/// Best-known client address, or `None` if no source has one.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    framework: Option<IpAddr>,
) -> Option<String> {
    let forwarded_first = header_str(headers, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded_first
        .or_else(|| header_str(headers, X_REAL_IP))
        .or_else(|| header_str(headers, CF_CONNECTING_IP))
        .or_else(|| header_str(headers, X_CLIENT_IP))
        .map(str::to_string)
        .or_else(|| peer.map(|ip| ip.to_string()))
        .or_else(|| framework.map(|ip| ip.to_string()))
}

/// Loopback in any of the spellings clients send.
pub fn is_localhost(ip: &str) -> bool {
    ip == "127.0.0.1" || ip == "::1" || ip.contains("localhost")
}

/// Request metadata the dispatcher needs: resolved address, the raw
/// sources it was resolved from, and a few descriptive headers.
#[derive(Clone, Debug)]
pub struct ClientMeta {
    pub ip: String,
    pub peer: Option<SocketAddr>,
    pub framework_ip: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub accept_language: Option<String>,
    pub forwarded: ForwardedHeaders,
}

impl ClientMeta {
    pub fn from_parts(
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
        framework: Option<FrameworkAddr>,
    ) -> Self {
        let peer_ip = peer.map(|addr| addr.ip());
        let framework_ip = framework.map(|f| f.0).or(peer_ip);
        Self {
            ip: resolve_client_ip(headers, peer_ip, framework_ip)
                .unwrap_or_else(|| UNKNOWN_IP.to_string()),
            peer,
            framework_ip,
            user_agent: header_str(headers, USER_AGENT.as_str()).map(str::to_string),
            accept_language: header_str(headers, ACCEPT_LANGUAGE.as_str()).map(str::to_string),
            forwarded: forwarded_headers(headers),
        }
    }

    pub fn is_localhost(&self) -> bool {
        is_localhost(&self.ip)
    }

    /// Build the verifier request for this client.
    pub fn context(&self, mode: VerificationMode) -> VerificationContext {
        VerificationContext {
            mode,
            ip: self.ip.clone(),
            user_agent: self.user_agent.clone(),
            accept_language: self.accept_language.clone(),
            forwarded: self.forwarded.clone(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let framework = parts.extensions.get::<FrameworkAddr>().copied();
        Ok(Self::from_parts(&parts.headers, peer, framework))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    const PEER: &str = "10.0.0.9";

    fn peer() -> Option<IpAddr> {
        Some(PEER.parse().unwrap())
    }

    #[test]
    fn forwarded_for_first_entry_wins() {
        let h = headers(&[
            (X_FORWARDED_FOR, "1.2.3.4, 5.6.6.7"),
            (X_REAL_IP, "9.9.9.9"),
        ]);
        assert_eq!(resolve_client_ip(&h, peer(), None).as_deref(), Some("1.2.3.4"));
    }

    #[test]
    fn falls_through_header_order() {
        let h = headers(&[(CF_CONNECTING_IP, "3.3.3.3"), (X_CLIENT_IP, "4.4.4.4")]);
        assert_eq!(resolve_client_ip(&h, peer(), None).as_deref(), Some("3.3.3.3"));

        let h = headers(&[(X_REAL_IP, "2.2.2.2"), (CF_CONNECTING_IP, "3.3.3.3")]);
        assert_eq!(resolve_client_ip(&h, peer(), None).as_deref(), Some("2.2.2.2"));

        let h = headers(&[(X_CLIENT_IP, "4.4.4.4")]);
        assert_eq!(resolve_client_ip(&h, peer(), None).as_deref(), Some("4.4.4.4"));
    }

    #[test]
    fn blank_headers_are_skipped() {
        let h = headers(&[(X_FORWARDED_FOR, " , 5.6.6.7"), (X_REAL_IP, "  ")]);
        assert_eq!(resolve_client_ip(&h, peer(), None).as_deref(), Some(PEER));
    }

    #[test]
    fn peer_then_framework_then_nothing() {
        let framework: Option<IpAddr> = Some("192.168.1.1".parse().unwrap());
        let empty = HeaderMap::new();
        assert_eq!(resolve_client_ip(&empty, peer(), framework).as_deref(), Some(PEER));
        assert_eq!(
            resolve_client_ip(&empty, None, framework).as_deref(),
            Some("192.168.1.1")
        );
        assert_eq!(resolve_client_ip(&empty, None, None), None);
    }

    #[test]
    fn meta_defaults_to_unknown_and_reads_descriptive_headers() {
        let h = headers(&[("user-agent", "curl/8.0"), ("accept-language", "pt-BR")]);
        let meta = ClientMeta::from_parts(&h, None, None);
        assert_eq!(meta.ip, UNKNOWN_IP);
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(meta.accept_language.as_deref(), Some("pt-BR"));
        assert!(!meta.is_localhost());
    }

    #[test]
    fn localhost_spellings() {
        assert!(is_localhost("127.0.0.1"));
        assert!(is_localhost("::1"));
        assert!(is_localhost("localhost:3000"));
        assert!(!is_localhost("192.168.0.10"));
    }

    proptest! {
        /// Whatever follows the first comma never influences the result.
        #[test]
        fn only_first_forwarded_entry_matters(
            a in any::<[u8; 4]>(),
            rest in proptest::collection::vec(any::<[u8; 4]>(), 0..5),
        ) {
            let first = IpAddr::from(a).to_string();
            let mut value = first.clone();
            for r in &rest {
                value.push_str(", ");
                value.push_str(&IpAddr::from(*r).to_string());
            }
            let h = headers(&[(X_FORWARDED_FOR, value.as_str())]);
            prop_assert_eq!(resolve_client_ip(&h, peer(), None), Some(first));
        }
    }
}
