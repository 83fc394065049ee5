use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Expr, ExprAssign, ItemFn, Lit, Token};

/// Parsed `#[cached(...)]` attribute arguments.
///
/// Mirrors the keyword arguments of
/// `original_source/fastapi_cachex/cache.py`'s `cache()` decorator.
#[derive(Default)]
pub(crate) struct CachedArgs {
    pub(crate) ttl: Option<u64>,
    pub(crate) stale_ttl: Option<u64>,
    pub(crate) no_store: bool,
    pub(crate) no_cache: bool,
    pub(crate) must_revalidate: bool,
    pub(crate) public: bool,
    pub(crate) private: bool,
    pub(crate) immutable: bool,
    pub(crate) stale_while_revalidate: bool,
    pub(crate) stale_if_error: bool,
}

impl Parse for CachedArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = CachedArgs::default();
        let exprs = Punctuated::<Expr, Token![,]>::parse_terminated(input)?;
        for expr in exprs {
            match expr {
                Expr::Assign(ExprAssign { left, right, .. }) => {
                    let name = quote!(#left).to_string();
                    let value = match *right {
                        Expr::Lit(lit) => lit.lit,
                        other => {
                            return Err(syn::Error::new_spanned(other, "expected a literal value"))
                        }
                    };
                    match (name.as_str(), value) {
                        ("ttl", Lit::Int(v)) => args.ttl = Some(v.base10_parse()?),
                        ("stale_ttl", Lit::Int(v)) => args.stale_ttl = Some(v.base10_parse()?),
                        (other, _) => {
                            return Err(syn::Error::new_spanned(
                                left,
                                format!("unknown or mistyped cached() argument `{other}`"),
                            ))
                        }
                    }
                }
                Expr::Path(path) => {
                    let name = quote!(#path).to_string();
                    match name.as_str() {
                        "no_store" => args.no_store = true,
                        "no_cache" => args.no_cache = true,
                        "must_revalidate" => args.must_revalidate = true,
                        "public" => args.public = true,
                        "private" => args.private = true,
                        "immutable" => args.immutable = true,
                        "stale_while_revalidate" => args.stale_while_revalidate = true,
                        "stale_if_error" => args.stale_if_error = true,
                        other => {
                            return Err(syn::Error::new_spanned(
                                path,
                                format!("unknown cached() flag `{other}`"),
                            ))
                        }
                    }
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "expected `name = value` or a bare flag",
                    ))
                }
            }
        }
        Ok(args)
    }
}

/// Wraps an async Actix handler so it consults the configured backend
/// before running, and stores its response afterward.
///
/// The annotated function must take `req: actix_web::HttpRequest` (or
/// `&actix_web::HttpRequest`) as a parameter and return
/// `actix_web::HttpResponse`. Structured the same way as a hand-written
/// `#[cache(ttl=...)]` call site would be in the source library, but
/// expanded at compile time instead of wrapping at call time, since Rust
/// has no runtime decorator equivalent.
pub(crate) fn expand(args: CachedArgs, item: ItemFn) -> proc_macro2::TokenStream {
    let ttl = option_tokens(args.ttl);
    let stale_ttl = option_tokens(args.stale_ttl);
    let no_store = args.no_store;
    let no_cache = args.no_cache;
    let must_revalidate = args.must_revalidate;
    let visibility = match (args.public, args.private) {
        (true, _) => quote!(Some(::cachex::cache::Visibility::Public)),
        (_, true) => quote!(Some(::cachex::cache::Visibility::Private)),
        _ => quote!(None),
    };
    let immutable = args.immutable;
    let stale_while_revalidate = args.stale_while_revalidate;
    let stale_if_error = args.stale_if_error;

    let vis = &item.vis;
    let sig = &item.sig;
    let fn_name = &sig.ident;
    let block = &item.block;
    let attrs = &item.attrs;

    let inner_name = syn::Ident::new(&format!("__cachex_inner_{fn_name}"), fn_name.span());
    let mut inner_sig = sig.clone();
    inner_sig.ident = inner_name.clone();

    quote! {
        #(#attrs)*
        #vis #sig {
            #inner_sig #block

            let __cachex_config = ::cachex::cache::CacheConfig {
                max_age: #ttl,
                stale_ttl: #stale_ttl,
                no_store: #no_store,
                no_cache: #no_cache,
                must_revalidate: #must_revalidate,
                visibility: #visibility,
                immutable: #immutable,
                stale_while_revalidate: #stale_while_revalidate,
                stale_if_error: #stale_if_error,
            };

            let __cachex_req = req.clone();
            ::cachex::cache::macros::cached_call(
                &__cachex_req,
                __cachex_config,
                move || #inner_name(req),
            )
            .await
        }
    }
}

fn option_tokens(value: Option<u64>) -> proc_macro2::TokenStream {
    match value {
        Some(v) => quote!(Some(#v)),
        None => quote!(None),
    }
}
