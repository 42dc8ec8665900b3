use axum::extract::{ConnectInfo, FromRequestParts};
use http::{request::Parts, StatusCode};
use std::{
    fmt::{self, Formatter},
    net::SocketAddr,
};

/// Caller network address resolved from proxy headers, falling back to the
/// socket peer. CF-Connecting-IP is checked first so deployments behind
/// Cloudflare report the real address instead of the edge's.
pub struct ClientIp(String);

impl ClientIp {
    pub fn new(ip: impl Into<String>) -> Self {
        ClientIp(ip.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        for header in ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"] {
            if let Some(value) = parts.headers.get(header) {
                if let Ok(ip) = value.to_str() {
                    // X-Forwarded-For may carry a chain; the first hop is the caller
                    let first = ip.split(',').next().unwrap_or(ip).trim();
                    if !first.is_empty() {
                        return Ok(ClientIp(first.to_string()));
                    }
                }
            }
        }

        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return Ok(ClientIp(addr.ip().to_string()));
        }

        Ok(ClientIp("unknown".to_string()))
    }
}

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
