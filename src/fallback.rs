//! Fallback handlers: the short-circuit response a breaker serves instead of
//! forwarding to the upstream, while Tripped or rejected during Recovering.
//!
//! Two variants satisfy the same capability: build an Actix
//! [`HttpResponse`](actix_web::HttpResponse) without touching the next
//! handler. Both validate their configuration at construction time so a
//! misconfigured breaker fails fast instead of at request time.

use crate::error::FallbackError;
use actix_web::http::header;
use actix_web::HttpResponse;

/// Serves a fixed status code, optional content type, and body.
#[derive(Debug, Clone)]
pub struct ResponseFallback {
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl ResponseFallback {
    /// Fails if `status` is outside the valid HTTP range `100..599`.
    pub fn new(status: u16, content_type: Option<String>, body: impl Into<Vec<u8>>) -> Result<Self, FallbackError> {
        if !(100..599).contains(&status) {
            return Err(FallbackError::InvalidStatus(status));
        }
        Ok(Self {
            status,
            content_type,
            body: body.into(),
        })
    }

    pub fn respond(&self) -> HttpResponse {
        let status = actix_web::http::StatusCode::from_u16(self.status)
            .unwrap_or(actix_web::http::StatusCode::SERVICE_UNAVAILABLE);
        let mut builder = HttpResponse::build(status);
        if let Some(content_type) = &self.content_type {
            builder.insert_header((header::CONTENT_TYPE, content_type.as_str()));
        }
        builder.body(self.body.clone())
    }
}

/// Serves a 302 redirect to a configured URL.
#[derive(Debug, Clone)]
pub struct RedirectFallback {
    location: String,
}

impl RedirectFallback {
    /// Fails if `url` cannot be parsed.
    pub fn new(url: impl Into<String>) -> Result<Self, FallbackError> {
        let url = url.into();
        if let Err(err) = reqwest::Url::parse(&url) {
            return Err(FallbackError::InvalidRedirectUrl(url, err.to_string()));
        }
        Ok(Self { location: url })
    }

    pub fn respond(&self) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((header::LOCATION, self.location.as_str()))
            .finish()
    }
}

/// The two built-in short-circuit responses a breaker can serve.
#[derive(Debug, Clone)]
pub enum Fallback {
    Response(ResponseFallback),
    Redirect(RedirectFallback),
}

impl Fallback {
    pub fn respond(&self) -> HttpResponse {
        match self {
            Fallback::Response(r) => r.respond(),
            Fallback::Redirect(r) => r.respond(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_fallback_rejects_out_of_range_status() {
        assert!(ResponseFallback::new(99, None, "x").is_err());
        assert!(ResponseFallback::new(600, None, "x").is_err());
        assert!(ResponseFallback::new(400, None, "x").is_ok());
    }

    #[test]
    fn response_fallback_serves_configured_status_and_body() {
        let fallback = ResponseFallback::new(400, Some("text/plain".into()), "Come back later").unwrap();
        let response = fallback.respond();
        assert_eq!(response.status().as_u16(), 400);
    }

    #[test]
    fn redirect_fallback_rejects_unparseable_url() {
        assert!(RedirectFallback::new("not a url").is_err());
    }

    #[test]
    fn redirect_fallback_serves_a_302_with_location() {
        let fallback = RedirectFallback::new("https://example.com/maintenance").unwrap();
        let response = fallback.respond();
        assert_eq!(response.status().as_u16(), 302);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://example.com/maintenance"
        );
    }

    #[test]
    fn fallback_enum_dispatches_to_the_right_variant() {
        let response = Fallback::Response(ResponseFallback::new(503, None, "").unwrap());
        assert_eq!(response.respond().status().as_u16(), 503);

        let redirect = Fallback::Redirect(RedirectFallback::new("https://example.com").unwrap());
        assert_eq!(redirect.respond().status().as_u16(), 302);
    }
}
