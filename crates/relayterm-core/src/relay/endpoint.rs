//! Relay endpoint addressing
//!
//! The relay lives on the same host as the page that embeds the terminal,
//! under a fixed path. A page served over https talks `wss`, anything else `ws`.

use url::Url;

use crate::error::{RelayError, Result};

/// Default relay path on the page's host
pub const DEFAULT_RELAY_PATH: &str = "/ws/terminal";

/// Resolved `ws://` or `wss://` relay URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEndpoint {
    url: Url,
}

impl RelayEndpoint {
    /// Derive the endpoint from the URL of the hosting page.
    pub fn for_page(page_url: &str, path: &str) -> Result<Self> {
        let page = parse_url(page_url)?;
        let scheme = match page.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => return Err(RelayError::UnsupportedScheme(other.to_string())),
        };
        let host = page
            .host_str()
            .ok_or_else(|| RelayError::MissingHost(page_url.to_string()))?;

        let authority = match page.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        let url = format!("{scheme}://{authority}{path}");
        Ok(Self { url: parse_url(&url)? })
    }

    /// Use an explicit relay URL.
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = parse_url(url)?;
        match parsed.scheme() {
            "ws" | "wss" => {}
            other => return Err(RelayError::UnsupportedScheme(other.to_string())),
        }
        if parsed.host_str().is_none() {
            return Err(RelayError::MissingHost(url.to_string()));
        }
        Ok(Self { url: parsed })
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "wss"
    }
}

impl std::fmt::Display for RelayEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|source| RelayError::InvalidEndpoint {
        url: url.to_string(),
        source,
    })
}
