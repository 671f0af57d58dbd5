//! Side-effect hooks: optional outbound notifications fired on breaker state
//! transitions.
//!
//! A hook is any value exposing [`Hook::perform`]; the built-in [`Webhook`]
//! issues a single outbound HTTP request via the gateway's `reqwest` client.
//! Hooks run detached (see [`dispatch`]) so a slow or failing notification
//! never adds latency to the request path that triggered the transition.

use crate::breaker::BreakerState;
use log::warn;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Capability invoked after a breaker commits a state transition.
pub trait Hook: Send + Sync {
    fn perform(&self, breaker_name: &str, previous: BreakerState, new: BreakerState, at: Instant);
}

/// Either a raw body or a form-encoded one, matching the two payload shapes
/// the gateway's outbound webhook support offers.
#[derive(Debug, Clone)]
pub enum WebhookBody {
    Raw(String),
    Form(Vec<(String, String)>),
}

/// Outbound HTTP notification fired on a state transition.
#[derive(Debug, Clone)]
pub struct Webhook {
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    body: Option<WebhookBody>,
    timeout: Duration,
    client: reqwest::Client,
}

impl Webhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: Duration::from_secs(1),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: WebhookBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn send(&self, breaker_name: String, previous: BreakerState, new: BreakerState) {
        let mut request = self.client.request(self.method.clone(), &self.url);
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        request = match &self.body {
            Some(WebhookBody::Raw(text)) => request.body(text.clone()),
            Some(WebhookBody::Form(fields)) => request.form(fields),
            None => request,
        };

        let outcome = tokio::time::timeout(self.timeout, request.send()).await;
        match outcome {
            Ok(Ok(response)) if response.status().is_success() => {}
            Ok(Ok(response)) => {
                warn!(
                    "webhook for breaker '{breaker_name}' ({previous:?} -> {new:?}) returned {}",
                    response.status()
                );
            }
            Ok(Err(err)) => {
                warn!("webhook for breaker '{breaker_name}' ({previous:?} -> {new:?}) failed: {err}");
            }
            Err(_) => {
                warn!("webhook for breaker '{breaker_name}' ({previous:?} -> {new:?}) timed out");
            }
        }
    }
}

impl Hook for Webhook {
    fn perform(&self, breaker_name: &str, previous: BreakerState, new: BreakerState, _at: Instant) {
        let webhook = self.clone();
        let breaker_name = breaker_name.to_string();
        tokio::spawn(async move {
            webhook.send(breaker_name, previous, new).await;
        });
    }
}

/// Fires `hook` in a detached task so the caller never waits on it. The
/// breaker's mutex must already be released before this is called (§5).
pub fn dispatch(hook: &Arc<dyn Hook>, breaker_name: &str, previous: BreakerState, new: BreakerState, at: Instant) {
    hook.perform(breaker_name, previous, new, at);
}
