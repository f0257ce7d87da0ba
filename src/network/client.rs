use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tokio::time::timeout;

use crate::config::NetworkConfig;
use crate::network::{HttpClient, HttpMethod, HttpRequest, HttpResponse, TransportError};

/// Default transport backed by a pooled `reqwest` client.
pub struct ReqwestClient {
    client: Client,
    request_timeout: Duration,
}

impl ReqwestClient {
    pub fn new(config: &NetworkConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds as u64))
            .build()?;

        Ok(Self {
            client,
            request_timeout: Duration::from_secs(config.timeout_seconds as u64),
        })
    }

    async fn do_fetch(&self, url: &str, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(to_method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn fetch(&self, url: &str, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::debug!(url = %url, method = %request.method, "Fetching view");
        match timeout(self.request_timeout, self.do_fetch(url, request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.request_timeout.as_secs())),
        }
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}
