//! Pooled HTTP client for engine requests

use super::proxy::ProxyRotation;
use super::user_agent::{accept_html, generate_user_agent};
use crate::config::OutgoingSettings;
use crate::error::FetchError;
use crate::resilience::ConnectionPool;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Anything that can turn a URL into a response body.
///
/// Only a 200 response yields `Ok`; every other outcome is a [`FetchError`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// A pooled session: one reqwest client per proxy route, built on first use.
pub struct Session {
    verify_ssl: bool,
    clients: HashMap<Option<String>, Client>,
}

impl Session {
    /// Create a session with its direct-route client ready.
    pub fn new(verify_ssl: bool) -> Result<Self, FetchError> {
        let mut session = Self {
            verify_ssl,
            clients: HashMap::new(),
        };
        session.client_for(None)?;
        Ok(session)
    }

    /// Client for the given proxy route.
    pub fn client_for(&mut self, proxy: Option<&str>) -> Result<&Client, FetchError> {
        let key = proxy.map(str::to_owned);
        if !self.clients.contains_key(&key) {
            let client = build_client(proxy, self.verify_ssl)?;
            self.clients.insert(key.clone(), client);
        }
        self.clients
            .get(&key)
            .ok_or_else(|| FetchError::Session("client missing after insert".to_string()))
    }

    pub fn routes(&self) -> usize {
        self.clients.len()
    }
}

fn build_client(proxy: Option<&str>, verify_ssl: bool) -> Result<Client, FetchError> {
    let mut builder = Client::builder()
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .redirect(reqwest::redirect::Policy::limited(10));

    if !verify_ssl {
        builder = builder.danger_accept_invalid_certs(true);
    }
    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| FetchError::InvalidRequest(format!("bad proxy {proxy_url}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| FetchError::Session(e.to_string()))
}

/// HTTP client wrapper: pooled sessions, rotating proxies and user agents
#[derive(Clone)]
pub struct HttpClient {
    pool: ConnectionPool<Session>,
    proxies: Arc<ProxyRotation>,
    user_agent: Option<String>,
    accept_language: String,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Self {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Self {
        let verify_ssl = settings.verify_ssl;
        Self {
            pool: ConnectionPool::new(settings.pool_size, move || Session::new(verify_ssl)),
            proxies: Arc::new(ProxyRotation::new(settings.proxies.clone())),
            user_agent: settings.useragent.clone(),
            accept_language: settings.accept_language.clone(),
            extra_headers: settings.extra_headers.clone(),
        }
    }

    pub fn pool(&self) -> &ConnectionPool<Session> {
        &self.pool
    }

    /// Perform a GET and return the body of a 200 response.
    pub async fn get(&self, url: &str) -> Result<String, FetchError> {
        let proxy = self.proxies.next().map(str::to_owned);
        let mut session = self.pool.acquire().await?;
        let client = session.client_for(proxy.as_deref())?.clone();

        let user_agent = self
            .user_agent
            .clone()
            .unwrap_or_else(generate_user_agent);

        let mut request = client
            .get(url)
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, accept_html())
            .header(ACCEPT_LANGUAGE, self.accept_language.as_str())
            .header("DNT", "1");
        for (key, value) in &self.extra_headers {
            request = request.header(key.as_str(), value.as_str());
        }

        debug!(
            "Sending request to {} via {}",
            url,
            proxy.as_deref().unwrap_or("direct")
        );
        let response = request.send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        self.pool.release(session);
        Ok(body)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.get(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = Session::new(true).unwrap();
        assert_eq!(session.routes(), 1);
    }

    #[test]
    fn test_session_rejects_bad_proxy() {
        let mut session = Session::new(true).unwrap();
        let err = session.client_for(Some("not a proxy url")).unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_retryable() {
        let client = HttpClient::new();
        let err = client.get("not a url").await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(client.pool().in_use(), 0);
    }
}
