//! `#[rpc_function]` expansion
//!
//! Input:
//! ```ignore
//! /// Add two numbers
//! #[rpc_function]
//! pub async fn add(a: i64, b: i64) -> Result<i64, Fault> {
//!     Ok(a + b)
//! }
//! ```
//!
//! Generated output:
//! ```ignore
//! /// Add two numbers
//! pub fn add() -> ::smdrpc_server::Method {
//!     async fn __rpc_inner(a: i64, b: i64) -> Result<i64, Fault> {
//!         Ok(a + b)
//!     }
//!     // signature + from_fn closure decoding the arguments and calling __rpc_inner
//! }
//! ```

use crate::signature::{
    call_args, collect_params, conversion_tokens, decode_tokens, doc_string, signature_tokens,
    take_method_options,
};
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{ItemFn, LitStr};

/// Parse the attribute arguments: nothing, or `name = "..."`
pub fn parse_name(attr: TokenStream2) -> syn::Result<Option<String>> {
    if attr.is_empty() {
        return Ok(None);
    }
    let mut name = None;
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            let lit: LitStr = meta.value()?.parse()?;
            name = Some(lit.value());
            Ok(())
        } else {
            Err(meta.error("expected `name = \"...\"`"))
        }
    });
    syn::parse::Parser::parse2(parser, attr)?;
    Ok(name)
}

pub fn rpc_function_impl(rename: Option<String>, mut item: ItemFn) -> syn::Result<TokenStream2> {
    if let Some(recv) = item.sig.receiver() {
        return Err(syn::Error::new_spanned(
            recv,
            "#[rpc_function] is for free functions; use #[rpc_service] on the impl block",
        ));
    }
    if !item.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.sig.generics,
            "#[rpc_function] does not support generic functions",
        ));
    }

    let options = take_method_options(&mut item.attrs)?;
    let params = collect_params(&mut item.sig)?;

    let fn_name = item.sig.ident.clone();
    let fn_vis = &item.vis;
    let fn_attrs = &item.attrs;
    let name = rename
        .or(options.name)
        .unwrap_or_else(|| fn_name.to_string());

    let signature = signature_tokens(&name, &doc_string(&item.attrs), &params, &item.sig.output);
    let decode = decode_tokens(&params);
    let args = call_args(&params);
    let conversion = conversion_tokens(&item.sig.output);
    let await_tok = item.sig.asyncness.map(|_| quote! { .await });

    let inner_ident = format_ident!("__rpc_inner");
    let mut inner = item.clone();
    inner.sig.ident = inner_ident.clone();
    inner.vis = syn::Visibility::Inherited;
    inner.attrs.clear();

    Ok(quote! {
        #(#fn_attrs)*
        #fn_vis fn #fn_name() -> ::smdrpc_server::Method {
            #inner

            let __signature = #signature;
            let __handler = ::smdrpc_server::from_fn(
                |__args: ::std::vec::Vec<::smdrpc_server::__private::serde_json::Value>| async move {
                    #decode
                    let __output = #inner_ident(#(#args),*) #await_tok;
                    let __value: ::smdrpc_server::__private::Result<
                        ::smdrpc_server::__private::serde_json::Value,
                    > = #conversion;
                    __value
                },
            );
            ::smdrpc_server::Method::new(__signature, __handler)
        }
    })
}
