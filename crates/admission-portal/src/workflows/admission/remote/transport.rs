use std::convert::Infallible;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::Router;
use tower::ServiceExt;

use super::wire::MAX_DOCUMENT_BYTES;
use super::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl WireMethod {
    fn as_method(self) -> Method {
        match self {
            WireMethod::Get => Method::GET,
            WireMethod::Post => Method::POST,
            WireMethod::Put => Method::PUT,
            WireMethod::Delete => Method::DELETE,
        }
    }
}

/// One HTTP exchange, described independently of the client library carrying it.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: WireMethod,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl WireResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, RemoteError>;
}

/// Blocking `ureq` agent driven from the tokio blocking pool.
#[derive(Clone)]
pub struct UreqTransport {
    base_url: String,
    agent: ureq::Agent,
}

impl UreqTransport {
    /// `timeout` of `None` leaves the agent's own defaults in place.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn authorize<B>(builder: ureq::RequestBuilder<B>, bearer: Option<&str>) -> ureq::RequestBuilder<B> {
    match bearer {
        Some(token) => builder.header("Authorization", &format!("Bearer {token}")),
        None => builder,
    }
}

fn execute(agent: &ureq::Agent, url: &str, request: &WireRequest) -> Result<WireResponse, ureq::Error> {
    let bearer = request.bearer.as_deref();
    let body = request.body.as_deref().unwrap_or_default();
    let mut response = match request.method {
        WireMethod::Get => authorize(agent.get(url), bearer).call()?,
        WireMethod::Delete => authorize(agent.delete(url), bearer).call()?,
        WireMethod::Post => authorize(agent.post(url), bearer)
            .header("Content-Type", "application/json")
            .send(body)?,
        WireMethod::Put => authorize(agent.put(url), bearer)
            .header("Content-Type", "application/json")
            .send(body)?,
    };

    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .with_config()
        .limit(MAX_DOCUMENT_BYTES as u64)
        .read_to_vec()?;
    Ok(WireResponse { status, body })
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, RemoteError> {
        let agent = self.agent.clone();
        let url = format!("{}{}", self.base_url, request.path);
        tokio::task::spawn_blocking(move || execute(&agent, &url, &request))
            .await
            .map_err(|err| RemoteError::Transport(format!("request task failed: {err}")))?
            .map_err(|err| RemoteError::Transport(err.to_string()))
    }
}

/// Dispatches requests straight into an axum router without opening a socket.
#[derive(Clone)]
pub struct RouterTransport {
    router: Router,
}

impl RouterTransport {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

#[async_trait]
impl Transport for RouterTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, RemoteError> {
        let mut builder = Request::builder()
            .method(request.method.as_method())
            .uri(request.path.as_str());
        if let Some(token) = &request.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match request.body {
            Some(bytes) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };
        let http_request = builder
            .body(body)
            .map_err(|err| RemoteError::Transport(err.to_string()))?;

        let response = self
            .router
            .clone()
            .oneshot(http_request)
            .await
            .map_err(|never: Infallible| -> RemoteError { match never {} })?;
        let status = response.status().as_u16();
        let body = axum::body::to_bytes(response.into_body(), MAX_DOCUMENT_BYTES)
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()))?;

        Ok(WireResponse {
            status,
            body: body.to_vec(),
        })
    }
}
