use std::collections::HashMap;

use reqwest::{Method, RequestBuilder as ReqwestRequestBuilder};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{self, GatewayError};

/// HTTP method for API endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }
}

/// Authentication method for API requests
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Bearer token authentication (Authorization: Bearer <token>)
    Bearer(String),
}

/// Represents an API endpoint with its configuration
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
}

impl Endpoint {
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
        }
    }
}

/// Configuration for request building
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub base_url: String,
    pub auth: Option<AuthMethod>,
    pub default_headers: HashMap<String, String>,
}

impl RequestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: None,
            default_headers: HashMap::new(),
        }
    }

    pub fn with_auth(mut self, auth: AuthMethod) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

/// Generic request builder that handles common HTTP patterns
#[derive(Clone)]
pub struct RequestBuilder {
    client: reqwest::Client,
    config: RequestConfig,
}

impl RequestBuilder {
    pub fn new(client: reqwest::Client, config: RequestConfig) -> Self {
        Self { client, config }
    }

    /// Build a reqwest RequestBuilder for the given endpoint
    pub fn build_request(&self, endpoint: &Endpoint) -> ReqwestRequestBuilder {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.path.trim_start_matches('/')
        );
        let method: Method = endpoint.method.into();

        let mut req = self.client.request(method, &url);

        if let Some(ref auth) = self.config.auth {
            req = match auth {
                AuthMethod::Bearer(token) => req.bearer_auth(token),
            };
        }

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        if endpoint.method == HttpMethod::Post {
            req = req.header("content-type", "application/json");
        }

        req
    }

    /// Execute a request with JSON body and return the deserialized response.
    /// One call is one attempt; retry decisions belong to the caller.
    pub async fn request_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
    ) -> Result<T, GatewayError> {
        let mut req = self.build_request(endpoint);

        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await?;
        handle_response(res).await
    }
}

/// Handle response, classifying non-success statuses into the error taxonomy
async fn handle_response<T: DeserializeOwned>(
    res: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = res.status();

    if !status.is_success() {
        return Err(error::error_from_response(res).await);
    }

    let bytes = res.bytes().await?;
    serde_json::from_slice::<T>(&bytes).map_err(|e| {
        let body_str = String::from_utf8_lossy(&bytes);
        GatewayError::UnexpectedResponse(format!(
            "HTTP {} but failed to decode JSON: {}; body: {}",
            status.as_u16(),
            e,
            body_str
        ))
    })
}
