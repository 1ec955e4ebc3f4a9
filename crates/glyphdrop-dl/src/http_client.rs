use std::{
    sync::{Arc, LazyLock, PoisonError, RwLock},
    time::Duration,
};

use ureq::{
    http::{self, HeaderMap, Uri},
    typestate::WithoutBody,
    Agent, Proxy, RequestBuilder,
};

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: Option<String>,
    pub headers: Option<HeaderMap>,
    pub proxy: Option<Proxy>,
    pub connect_timeout: Option<Duration>,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    /// Creates a default ClientConfig for talking to the release host.
    ///
    /// The default sets a user agent of "glyphdrop/<version>", a 30 second connect timeout and
    /// leaves proxy, headers, and the global timeout unset.
    fn default() -> Self {
        Self {
            user_agent: Some(concat!("glyphdrop/", env!("CARGO_PKG_VERSION")).into()),
            proxy: None,
            headers: None,
            connect_timeout: Some(Duration::from_secs(30)),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Builds an HTTP `Agent` configured from this `ClientConfig`.
    ///
    /// The agent refuses plain `http://` URLs and only negotiates TLS 1.2 or newer (the
    /// rustls backend has no older protocol versions). HTTP status codes are returned to the
    /// caller instead of being turned into errors, so callers can decide what is retryable.
    pub fn build(&self) -> Agent {
        let mut config = ureq::Agent::config_builder()
            .https_only(true)
            .http_status_as_error(false)
            .proxy(self.proxy.clone())
            .timeout_connect(self.connect_timeout)
            .timeout_global(self.timeout);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }

        config.build().into()
    }
}

struct SharedClient {
    agent: Agent,
    config: ClientConfig,
}

static SHARED_CLIENT_STATE: LazyLock<Arc<RwLock<SharedClient>>> = LazyLock::new(|| {
    let config = ClientConfig::default();
    let agent = config.build();

    Arc::new(RwLock::new(SharedClient {
        agent,
        config,
    }))
});

#[derive(Clone, Default)]
pub struct SharedAgent;

impl SharedAgent {
    pub fn new() -> Self {
        Self
    }

    /// Create a GET request builder for the given URI using the shared agent.
    ///
    /// Any global headers configured in the shared client are applied to the request.
    pub fn get<T>(&self, uri: T) -> RequestBuilder<WithoutBody>
    where
        Uri: TryFrom<T>,
        <Uri as TryFrom<T>>::Error: Into<http::Error>,
    {
        let state = SHARED_CLIENT_STATE
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let req = state.agent.get(uri);
        apply_headers(req, &state.config.headers)
    }
}

fn apply_headers<B>(mut req: RequestBuilder<B>, headers: &Option<HeaderMap>) -> RequestBuilder<B> {
    if let Some(headers) = headers {
        for (key, value) in headers.iter() {
            req = req.header(key, value);
        }
    }
    req
}

pub static SHARED_AGENT: LazyLock<SharedAgent> = LazyLock::new(SharedAgent::new);

/// Updates the global shared HTTP client configuration and rebuilds the shared Agent.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use glyphdrop_dl::http_client::configure_http_client;
///
/// configure_http_client(|cfg| {
///     cfg.timeout = Some(Duration::from_secs(120));
/// });
/// ```
pub fn configure_http_client<F>(updater: F)
where
    F: FnOnce(&mut ClientConfig),
{
    let mut state = SHARED_CLIENT_STATE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    let mut new_config = state.config.clone();
    updater(&mut new_config);
    state.agent = new_config.build();
    state.config = new_config;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert!(config
            .user_agent
            .as_deref()
            .is_some_and(|ua| ua.starts_with("glyphdrop/")));
        assert!(config.proxy.is_none());
        assert!(config.headers.is_none());
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(30)));
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_client_config_build_with_timeout() {
        let config = ClientConfig {
            timeout: Some(Duration::from_secs(30)),
            ..ClientConfig::default()
        };
        let _agent = config.build();
    }

    #[test]
    fn test_shared_agent_get() {
        let agent = SharedAgent::new();
        let _req = agent.get("https://example.com");
    }

    #[test]
    fn test_configure_http_client() {
        configure_http_client(|cfg| {
            cfg.user_agent = Some("custom-agent/1.0".to_string());
        });

        let _req = SharedAgent::default().get("https://example.com");
    }

    #[test]
    fn test_apply_headers_some() {
        let agent: ureq::Agent = ureq::Agent::config_builder().build().into();
        let req = agent.get("https://example.com");

        let mut headers = ureq::http::HeaderMap::new();
        headers.insert(
            ureq::http::header::ACCEPT,
            ureq::http::HeaderValue::from_static("application/json"),
        );

        let _req = apply_headers(req, &Some(headers));
    }
}
