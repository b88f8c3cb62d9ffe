use std::collections::HashMap;

use futures::FutureExt;
use gloo_net::http::Request;

use crate::application::ports::{ApiClient, EnvelopeFuture};
use crate::domain::logging::LogComponent;
use crate::domain::{ApiRequest, Envelope, TransportError};
use crate::infrastructure::csrf::{CSRF_HEADER, current_token};
use crate::{log_debug, log_warn};

/// Dashboard API client on top of gloo's fetch wrapper.
///
/// Every call is a JSON POST carrying the page's CSRF token. The body is
/// decoded as an envelope whatever the HTTP status, because the backend
/// reports failures as `{success: false, error}` with 4xx/5xx codes.
#[derive(Clone)]
pub struct GlooApiClient {
    base_url: String,
    default_headers: HashMap<String, String>,
}

impl Default for GlooApiClient {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl GlooApiClient {
    /// `base_url` is prefixed to every path; empty means same origin.
    pub fn new(base_url: String) -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("Content-Type".to_string(), "application/json".to_string());
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        Self { base_url, default_headers }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send(
        url: String,
        headers: HashMap<String, String>,
        body: Option<String>,
    ) -> Result<Envelope, TransportError> {
        log_debug!(LogComponent::Infrastructure("HTTP"), "POST {}", url);

        let mut builder = Request::post(&url);
        for (key, value) in &headers {
            builder = builder.header(key, value);
        }
        builder = builder.header(CSRF_HEADER, &current_token());

        let response = match body {
            Some(body) => builder
                .body(body)
                .map_err(|e| TransportError::Request(e.to_string()))?
                .send()
                .await,
            None => builder.send().await,
        }
        .map_err(|e| TransportError::Request(e.to_string()))?;

        match response.json::<Envelope>().await {
            Ok(envelope) => Ok(envelope),
            Err(err) if !response.ok() => {
                log_warn!(
                    LogComponent::Infrastructure("HTTP"),
                    "POST {} -> {} ({})",
                    url,
                    response.status(),
                    err
                );
                Err(TransportError::Status {
                    status: response.status(),
                    status_text: response.status_text(),
                })
            }
            Err(err) => Err(TransportError::Decode(err.to_string())),
        }
    }
}

impl ApiClient for GlooApiClient {
    fn post(&self, request: ApiRequest) -> EnvelopeFuture {
        Self::send(self.url(&request.path), self.default_headers.clone(), request.body).boxed_local()
    }
}
