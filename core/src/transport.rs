//! The I/O seam: executes `HttpRequest` values and returns `HttpResponse`s.
//!
//! # Design
//! Everything above this trait is deterministic data shuffling. Tests plug in
//! scripted transports; production uses `UreqTransport`, which drives a
//! blocking `ureq` agent on tokio's blocking pool so the async caller never
//! stalls the event loop.
//!
//! Non-2xx statuses are returned as data, not errors. Interpreting status
//! codes is the client's job.

use std::future::Future;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations must only fail with `ApiError::Transport` when no
/// response was obtained at all.
pub trait Transport: Send + Sync + 'static {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

/// `ureq`-backed transport.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute_blocking(&agent, request))
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    // The body encoder owns content-type; multipart needs its boundary.
    for (name, value) in headers {
        if !name.eq_ignore_ascii_case("content-type") {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    builder
}

fn execute_blocking(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, ApiError> {
    let encoded = request.body.encode();
    let url = request.path.as_str();

    let result = match request.method {
        HttpMethod::Get => with_headers(agent.get(url), &request.headers).call(),
        HttpMethod::Delete => with_headers(agent.delete(url), &request.headers).call(),
        HttpMethod::Post | HttpMethod::Put => {
            let builder = if request.method == HttpMethod::Post {
                agent.post(url)
            } else {
                agent.put(url)
            };
            let builder = with_headers(builder, &request.headers);
            match encoded {
                Some((content_type, bytes)) => builder.content_type(content_type).send(&bytes[..]),
                None => builder.send_empty(),
            }
        }
    };

    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
