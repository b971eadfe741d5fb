use async_trait::async_trait;
use log::trace;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde_json::Value as Json;

use crate::config::ClientConfig;
use crate::error::TransportError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// JSON-over-HTTP seam of the sync controller. Paths are relative to the service base url.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Json, TransportError>;

    /// `None` when the service answers with an empty body.
    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: &Json,
    ) -> Result<Option<Json>, TransportError>;

    async fn delete(&self, path: &str) -> Result<(), TransportError>;
}

pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.bearer_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder().default_headers(headers).build()?;
        Ok(HttpTransport { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn check(method: Method, path: &str, response: &Response) -> Result<(), TransportError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status {
                method: method.as_str(),
                path: path.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, path: &str) -> Result<Json, TransportError> {
        let url = self.config.url(path);
        trace!("GET {url}");
        let response = self.client.get(&url).send().await?;
        Self::check(Method::Get, path, &response)?;
        Ok(response.json::<Json>().await?)
    }

    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: &Json,
    ) -> Result<Option<Json>, TransportError> {
        let url = self.config.url(path);
        trace!("{} {url}", method.as_str());
        let response = self
            .client
            .request(method.to_reqwest(), &url)
            .json(body)
            .send()
            .await?;
        Self::check(method, path, &response)?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn delete(&self, path: &str) -> Result<(), TransportError> {
        let url = self.config.url(path);
        trace!("DELETE {url}");
        let response = self.client.delete(&url).send().await?;
        Self::check(Method::Delete, path, &response)
    }
}
