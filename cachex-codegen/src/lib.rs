use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemFn};

mod cached;

/// Caches an Actix Web handler's response.
///
/// ```ignore
/// #[cached(ttl = 60, public)]
/// async fn get_users(req: actix_web::HttpRequest) -> actix_web::HttpResponse {
///     actix_web::HttpResponse::Ok().json(users())
/// }
/// ```
///
/// See [`cachex::cache::CacheConfig`] for what each argument controls.
#[proc_macro_attribute]
pub fn cached(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as cached::CachedArgs);
    let item = parse_macro_input!(item as ItemFn);
    cached::expand(args, item).into()
}
