use std::sync::Arc;

use actix_web::{test, web, App};
use cachex::backend::memory::MemoryBackend;
use cachex::backend::Backend;
use cachex::cache::content::{Content, ETagContent};
use cachex::monitor;

/// Grounded on `original_source/tests/test_routes.py::TestCachedHitsRoute`:
/// no backend configured reads as an all-zero empty response.
#[actix_web::test]
async fn cached_hits_with_no_backend_is_all_zero() {
    let app = test::init_service(App::new().configure(monitor::configure("/monitor"))).await;

    let req = test::TestRequest::get()
        .uri("/monitor/cached-hits")
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["total_hits"], 0);
    assert_eq!(body["summary"]["total_cached_entries"], 0);
    assert!(body["summary"]["frequently_cached_routes"]
        .as_array()
        .unwrap()
        .is_empty());
}

/// A configured backend's entries surface in both routes, with
/// `frequently_cached_routes` deduplicated and sorted.
#[actix_web::test]
async fn cached_hits_reflects_backend_contents() {
    let backend = MemoryBackend::new();
    backend
        .set(
            "GET|||example.com|||/a|||",
            ETagContent::new("\"e1\"".to_string(), Content::Text("one".to_string())),
            Some(60),
        )
        .await
        .unwrap();
    backend
        .set(
            "GET|||example.com|||/b|||",
            ETagContent::new("\"e2\"".to_string(), Content::Bytes(b"two-bytes".to_vec())),
            Some(60),
        )
        .await
        .unwrap();
    let backend: Arc<dyn Backend> = Arc::new(backend);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(backend))
            .configure(monitor::configure("/monitor")),
    )
    .await;

    let hits_req = test::TestRequest::get()
        .uri("/monitor/cached-hits")
        .to_request();
    let hits: serde_json::Value = test::call_and_read_body_json(&app, hits_req).await;
    assert_eq!(hits["total_hits"], 2);
    assert_eq!(hits["valid_hits"], 2);
    assert_eq!(
        hits["summary"]["frequently_cached_routes"],
        serde_json::json!(["/a", "/b"])
    );

    let records_req = test::TestRequest::get()
        .uri("/monitor/cached-records")
        .to_request();
    let records: serde_json::Value = test::call_and_read_body_json(&app, records_req).await;
    assert_eq!(records["total_records"], 2);
    assert_eq!(records["active_records"], 2);
    assert_eq!(records["expired_records"], 0);
    assert_eq!(records["unique_routes"], 2);
    assert_eq!(records["summary"]["total_entries"], 2);
    assert_eq!(records["summary"]["valid_entries"], 2);

    let by_path: std::collections::HashMap<String, serde_json::Value> = records
        ["cached_records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| (r["path"].as_str().unwrap().to_string(), r.clone()))
        .collect();

    let a = &by_path["/a"];
    assert_eq!(a["method"], "GET");
    assert_eq!(a["host"], "example.com");
    assert_eq!(a["content_type"], "str");
    assert_eq!(a["content_size"], 3);
    assert_eq!(a["content_preview"], "one");
    assert_eq!(a["is_expired"], false);

    let b = &by_path["/b"];
    assert_eq!(b["content_type"], "bytes");
    assert_eq!(b["content_size"], 9);
    assert_eq!(b["content_preview"], "two-bytes");

    let total_size = records["total_cache_size_bytes"].as_u64().unwrap();
    assert_eq!(total_size, 12);
    assert!((records["summary"]["estimated_cache_size_kb"].as_f64().unwrap() - 12.0 / 1024.0).abs() < 1e-9);
}
