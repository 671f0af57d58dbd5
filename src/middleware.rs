//! Actix Web `Transform`/`Service` middleware wiring a [`Breaker`] into the
//! request path: the breaker decides admission, the instrumenting wrapper
//! observes the upstream's outcome, and the breaker records it.

use crate::breaker::{Admission, Breaker, Outcome};
use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error as ActixError,
};
use futures::future::{LocalBoxFuture, Ready};
use std::{
    sync::Arc,
    task::{Context, Poll},
    time::Instant,
};

/// Transform factory: wraps a next handler with a shared [`Breaker`].
#[derive(Clone)]
pub struct CircuitBreakerMiddleware {
    breaker: Arc<Breaker>,
}

impl CircuitBreakerMiddleware {
    pub fn new(breaker: Arc<Breaker>) -> Self {
        Self { breaker }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CircuitBreakerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixError;
    type Transform = CircuitBreakerService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        futures::future::ready(Ok(CircuitBreakerService {
            service: Arc::new(service),
            breaker: self.breaker.clone(),
        }))
    }
}

/// The per-request middleware, holding the shared next handler and breaker.
pub struct CircuitBreakerService<S> {
    service: Arc<S>,
    breaker: Arc<Breaker>,
}

impl<S, B> Service<ServiceRequest> for CircuitBreakerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let breaker = self.breaker.clone();

        Box::pin(async move {
            match breaker.admit() {
                Admission::Forward => {
                    let started_at = Instant::now();

                    match service.call(req).await {
                        Ok(response) => {
                            let latency = started_at.elapsed();
                            breaker.record(Outcome::Status(response.status().as_u16()), latency);
                            Ok(response.map_into_left_body())
                        }
                        Err(err) => {
                            breaker.record(Outcome::TransportError, started_at.elapsed());
                            Err(err)
                        }
                    }
                }
                Admission::ShortCircuit => {
                    let response = breaker.fallback_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
