pub mod routes;

use actix_web::web;

/// Mounts the monitoring routes under `prefix` (default `""`), matching
/// `original_source/fastapi_cachex`'s `add_routes(app, prefix=...)`.
pub fn configure(prefix: impl Into<String>) -> impl FnOnce(&mut web::ServiceConfig) {
    let prefix = prefix.into();
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(
            web::scope(&prefix)
                .route("/cached-hits", web::get().to(routes::cached_hits))
                .route("/cached-records", web::get().to(routes::cached_records)),
        );
    }
}
