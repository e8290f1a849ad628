//! # Impress Core HTTP Client
//!
//! The shared outbound HTTP handle published at startup. Views reach it
//! through [`AppContext::http`](crate::kernel::AppContext::http); it only
//! provisions a configured `reqwest` client and resolves request paths
//! against the configured base URL.
pub mod error;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::HttpConfig;
use crate::kernel::component::KernelComponent;
use crate::kernel::error::Result as KernelResult;

pub use error::HttpError;

pub type Result<T> = std::result::Result<T, HttpError>;

/// Shared HTTP client
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Option<Url>,
    timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let base_url = config.base_url.as_deref().map(parse_base_url).transpose()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self {
            client,
            base_url,
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Underlying `reqwest` client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Absolute `http`/`https` URLs pass through; anything else is joined
    /// onto the base URL, including paths such as `documents:batchGet`.
    pub fn resolve_url(&self, path: &str) -> Result<Url> {
        match Url::parse(path) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => return Ok(url),
            _ => {}
        }
        let base = self.base_url.as_ref().ok_or_else(|| HttpError::InvalidUrl {
            url: path.to_string(),
            reason: "relative URL without a configured base_url".to_string(),
        })?;
        // `./` keeps a colon in the first segment from reading as a scheme
        base.join(&format!("./{}", path.trim_start_matches('/')))
            .map_err(|e| HttpError::InvalidUrl {
                url: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Start a request against a resolved URL.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.resolve_url(path)?;
        log::debug!("HTTP {} {}", method, url);
        Ok(self.client.request(method, url))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let builder = self.request(Method::GET, path)?;
        Self::send_json(builder, path).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path)?.json(body);
        Self::send_json(builder, path).await
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder, path: &str) -> Result<T> {
        let request_error = |source| HttpError::Request {
            url: path.to_string(),
            source,
        };
        let response = builder.send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: path.to_string(),
                status: status.as_u16(),
            });
        }
        response.json::<T>().await.map_err(request_error)
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[async_trait]
impl KernelComponent for HttpClient {
    fn name(&self) -> &'static str {
        "HttpClient"
    }

    async fn initialize(&self) -> KernelResult<()> {
        match &self.base_url {
            Some(base) => log::debug!("HTTP client ready, base URL {}", base),
            None => log::debug!("HTTP client ready without a base URL"),
        }
        Ok(())
    }
}

// A base without a trailing slash would drop its last path segment on join
fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&normalized).map_err(|e| HttpError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(HttpError::InvalidUrl {
            url: raw.to_string(),
            reason: "cannot be used as a base URL".to_string(),
        });
    }
    Ok(url)
}
