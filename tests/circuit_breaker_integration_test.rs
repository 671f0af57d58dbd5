//! Integration test exercising the breaker wired into an Actix Web service
//! via [`CircuitBreakerMiddleware`].

use actix_web::{test, web, App, HttpResponse};
use kairos_breaker::breaker::{Breaker, BreakerConfig};
use kairos_breaker::clock::ManualClock;
use kairos_breaker::fallback::{Fallback, ResponseFallback};
use kairos_breaker::middleware::CircuitBreakerMiddleware;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn always_fails() -> HttpResponse {
    HttpResponse::BadGateway().finish()
}

async fn always_succeeds() -> HttpResponse {
    HttpResponse::Ok().finish()
}

#[actix_web::test]
async fn standby_forwards_every_request_to_the_upstream() {
    let clock = ManualClock::new();
    let fallback = Fallback::Response(ResponseFallback::new(503, None, "unavailable").unwrap());
    let breaker = Arc::new(
        Breaker::new(
            "upstream",
            "NetworkErrorRatio() > 0.5",
            fallback,
            BreakerConfig::default(),
            Arc::new(clock.clone()),
        )
        .unwrap(),
    );

    let app = test::init_service(
        App::new()
            .wrap(CircuitBreakerMiddleware::new(breaker))
            .route("/", web::get().to(always_succeeds)),
    )
    .await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn tripped_breaker_serves_the_fallback_instead_of_the_upstream() {
    let clock = ManualClock::new();
    let fallback = Fallback::Response(ResponseFallback::new(503, None, "unavailable").unwrap());
    let breaker = Arc::new(
        Breaker::new(
            "upstream",
            "NetworkErrorRatio() > 0.5",
            fallback,
            BreakerConfig::default(),
            Arc::new(clock.clone()),
        )
        .unwrap(),
    );

    let upstream_hits = Arc::new(AtomicUsize::new(0));
    let hits = upstream_hits.clone();
    let app = test::init_service(
        App::new()
            .wrap(CircuitBreakerMiddleware::new(breaker.clone()))
            .route(
                "/",
                web::get().to(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        always_fails().await
                    }
                }),
            ),
    )
    .await;

    for _ in 0..100 {
        let req = test::TestRequest::get().uri("/").to_request();
        test::call_service(&app, req).await;
    }
    clock.advance(Duration::from_millis(101));
    // One more request to let the pending periodic check fire.
    let req = test::TestRequest::get().uri("/").to_request();
    test::call_service(&app, req).await;

    assert_eq!(breaker.state(), kairos_breaker::breaker::BreakerState::Tripped);

    let hits_before_fallback = upstream_hits.load(Ordering::SeqCst);
    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);
    assert_eq!(
        upstream_hits.load(Ordering::SeqCst),
        hits_before_fallback,
        "tripped breaker must not forward to the upstream"
    );
}
