#![cfg(feature = "macros")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_web::{test, web, App, HttpRequest, HttpResponse};
use cachex::backend::memory::MemoryBackend;
use cachex::backend::GLOBAL_BACKEND;
use cachex::cached;

static CALLS: AtomicUsize = AtomicUsize::new(0);

#[cached(ttl = 60)]
async fn show(req: HttpRequest) -> HttpResponse {
    let n = CALLS.fetch_add(1, Ordering::SeqCst) + 1;
    HttpResponse::Ok().body(format!("{{\"count\":{n}}}"))
}

/// Exercises the `#[cached(...)]` attribute macro end-to-end: the second
/// call must be served from `GLOBAL_BACKEND` without re-invoking the
/// handler body.
#[actix_web::test]
async fn cached_attribute_serves_second_call_from_backend() {
    GLOBAL_BACKEND.set_backend(Arc::new(MemoryBackend::new()));
    CALLS.store(0, Ordering::SeqCst);

    let app = test::init_service(
        App::new().service(web::resource("/show").route(web::get().to(show))),
    )
    .await;

    let req1 = test::TestRequest::get().uri("/show").to_request();
    let resp1 = test::call_service(&app, req1).await;
    assert_eq!(resp1.status(), 200);
    let body1 = test::read_body(resp1).await;

    let req2 = test::TestRequest::get().uri("/show").to_request();
    let resp2 = test::call_service(&app, req2).await;
    assert_eq!(resp2.status(), 200);
    let body2 = test::read_body(resp2).await;

    assert_eq!(body1, body2);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);

    GLOBAL_BACKEND.clear_backend();
}

static HITS: AtomicUsize = AtomicUsize::new(0);

#[cached(ttl = 60)]
async fn counted(req: HttpRequest) -> HttpResponse {
    let n = HITS.fetch_add(1, Ordering::SeqCst) + 1;
    HttpResponse::Ok().body(format!("{{\"hits\":{n}}}"))
}

/// With no backend installed, `#[cached(...)]` installs a default
/// in-process memory backend on first use rather than bypassing caching.
#[actix_web::test]
async fn first_call_with_no_backend_installs_a_default() {
    GLOBAL_BACKEND.clear_backend();
    HITS.store(0, Ordering::SeqCst);

    let app = test::init_service(
        App::new().service(web::resource("/counted").route(web::get().to(counted))),
    )
    .await;

    let req1 = test::TestRequest::get().uri("/counted").to_request();
    let resp1 = test::call_service(&app, req1).await;
    assert_eq!(resp1.status(), 200);
    let body1 = test::read_body(resp1).await;

    let req2 = test::TestRequest::get().uri("/counted").to_request();
    let resp2 = test::call_service(&app, req2).await;
    let body2 = test::read_body(resp2).await;

    assert_eq!(body1, body2);
    assert_eq!(HITS.load(Ordering::SeqCst), 1);

    GLOBAL_BACKEND.clear_backend();
}
