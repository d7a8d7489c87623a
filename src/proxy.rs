//! Proxy configuration shared by the browser session and the HTTP client.
//!
//! A proxy is validated once, when the fetchers are constructed. Nothing
//! mutates it afterwards.

use reqwest::Proxy as ReqwestProxy;
use url::Url;

use crate::util::is_url;
use crate::{Result, SearchError};

/// Proxy protocol type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyProtocol {
    /// HTTP proxy
    #[default]
    Http,
    /// HTTPS proxy
    Https,
    /// SOCKS5 proxy
    Socks5,
}

impl ProxyProtocol {
    fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }

    fn default_port(&self) -> u16 {
        match self {
            ProxyProtocol::Http | ProxyProtocol::Https => 8080,
            ProxyProtocol::Socks5 => 1080,
        }
    }
}

/// A single proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy host (IP or domain)
    pub host: String,
    /// Proxy port
    pub port: u16,
    /// Proxy protocol
    pub protocol: ProxyProtocol,
    /// Optional username for authentication
    pub username: Option<String>,
    /// Optional password for authentication
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Creates a new proxy configuration.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            protocol: ProxyProtocol::Http,
            username: None,
            password: None,
        }
    }

    /// Parses and validates a proxy URL such as `socks5://127.0.0.1:1080`.
    ///
    /// Fails with [`SearchError::InvalidProxy`] when the value is not a
    /// well-formed URL or uses an unsupported scheme.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| SearchError::InvalidProxy(format!("{}: {}", raw, e)))?;

        let protocol = match url.scheme() {
            "http" => ProxyProtocol::Http,
            "https" => ProxyProtocol::Https,
            "socks5" | "socks5h" => ProxyProtocol::Socks5,
            scheme => {
                return Err(SearchError::InvalidProxy(format!(
                    "unsupported proxy protocol: {}",
                    scheme
                )))
            }
        };

        // Reuse the navigation-target check on an http-normalized form so
        // socks URLs get the same host validation.
        let host = url
            .host_str()
            .ok_or_else(|| SearchError::InvalidProxy(format!("{}: missing host", raw)))?;
        let probe = format!("http://{}", host);
        if !is_url(&probe) {
            return Err(SearchError::InvalidProxy(format!("{}: malformed host", raw)));
        }

        let port = url.port().unwrap_or(protocol.default_port());
        let mut config = ProxyConfig::new(host, port).with_protocol(protocol);
        if let Some(password) = url.password() {
            config = config.with_auth(url.username(), password);
        }
        Ok(config)
    }

    /// Sets the proxy protocol.
    pub fn with_protocol(mut self, protocol: ProxyProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Sets authentication credentials.
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Returns the proxy URL string, including credentials.
    pub fn url(&self) -> String {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => format!(
                "{}://{}:{}@{}:{}",
                self.protocol.scheme(),
                user,
                pass,
                self.host,
                self.port
            ),
            _ => self.server(),
        }
    }

    /// Returns the proxy URL without credentials, as Chrome's
    /// `--proxy-server` flag expects.
    pub fn server(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }

    /// Converts to a reqwest proxy covering all schemes.
    pub fn to_reqwest(&self) -> Result<ReqwestProxy> {
        ReqwestProxy::all(self.url())
            .map_err(|e| SearchError::InvalidProxy(format!("{}: {}", self.server(), e)))
    }
}
