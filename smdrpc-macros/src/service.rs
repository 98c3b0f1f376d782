//! `#[rpc_service]` expansion
//!
//! Input:
//! ```ignore
//! #[rpc_service]
//! impl Foo {
//!     /// Bar
//!     pub fn bar(&self, one: bool, #[rpc(default = "two")] two: String) -> Vec<Value> { .. }
//! }
//! ```
//!
//! Output: the impl block with `#[rpc]` attributes removed, plus
//! ```ignore
//! impl ::smdrpc_server::ServiceProvider for Foo {
//!     fn methods(self: Arc<Self>) -> Vec<Method> {
//!         // one Method per public fn: signature + from_fn closure
//!     }
//! }
//! ```

use crate::signature::{
    call_args, collect_params, conversion_tokens, decode_tokens, doc_string, receiver,
    signature_tokens, take_method_options,
};
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{ImplItem, ImplItemFn, ItemImpl, Visibility};

pub fn rpc_service_impl(mut item: ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[rpc_service] goes on an inherent impl block",
        ));
    }

    let mut registrations = Vec::new();
    for impl_item in item.items.iter_mut() {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        let options = take_method_options(&mut method.attrs)?;
        if options.skip || !matches!(method.vis, Visibility::Public(_)) {
            continue;
        }
        registrations.push(registration(method, options.name)?);
    }

    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();

    Ok(quote! {
        #item

        impl #impl_generics ::smdrpc_server::ServiceProvider for #self_ty #where_clause {
            fn methods(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::vec::Vec<::smdrpc_server::Method> {
                let mut __methods = ::std::vec::Vec::new();
                #(#registrations)*
                __methods
            }
        }
    })
}

fn registration(method: &mut ImplItemFn, rename: Option<String>) -> syn::Result<TokenStream2> {
    let has_self = receiver(&method.sig)?;
    let params = collect_params(&mut method.sig)?;

    let ident = &method.sig.ident;
    let name = rename.unwrap_or_else(|| ident.to_string());
    let signature = signature_tokens(&name, &doc_string(&method.attrs), &params, &method.sig.output);
    let decode = decode_tokens(&params);
    let args = call_args(&params);
    let conversion = conversion_tokens(&method.sig.output);
    let await_tok = method.sig.asyncness.map(|_| quote! { .await });

    let (capture, call) = if has_self {
        (
            quote! { let __this = ::std::sync::Arc::clone(&__this); },
            quote! { __this.#ident(#(#args),*) },
        )
    } else {
        (quote! {}, quote! { Self::#ident(#(#args),*) })
    };

    Ok(quote! {
        {
            let __this = ::std::sync::Arc::clone(&self);
            let __signature = #signature;
            let __handler = ::smdrpc_server::from_fn(
                move |__args: ::std::vec::Vec<::smdrpc_server::__private::serde_json::Value>| {
                    #capture
                    async move {
                        #decode
                        let __output = #call #await_tok;
                        let __value: ::smdrpc_server::__private::Result<
                            ::smdrpc_server::__private::serde_json::Value,
                        > = #conversion;
                        __value
                    }
                },
            );
            __methods.push(::smdrpc_server::Method::new(__signature, __handler));
        }
    })
}
