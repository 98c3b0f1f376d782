//! Shared pieces of the `#[rpc_service]` and `#[rpc_function]` expansions
//!
//! Both attributes read a Rust function signature and produce two things:
//! a `MethodSignature` expression describing it, and the body of a handler
//! closure that decodes the bound argument vector and calls the function.

use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{
    Attribute, Expr, FnArg, GenericArgument, Ident, LitStr, Pat, PathArguments, ReturnType,
    Signature, Type,
};

/// Options from `#[rpc(...)]` on a method or function
#[derive(Default)]
pub struct MethodOptions {
    pub name: Option<String>,
    pub skip: bool,
}

/// One declared parameter of the annotated function
pub struct ParamInfo {
    pub name: String,
    pub binding: Ident,
    /// Owned type the argument decodes into
    pub decode_ty: TokenStream2,
    /// Pass `&binding` instead of `binding`
    pub by_ref: bool,
    pub smd_type: String,
    pub optional: bool,
    pub default: Option<Expr>,
}

/// Parse `#[rpc(name = "...", skip)]` and strip it from `attrs`
pub fn take_method_options(attrs: &mut Vec<Attribute>) -> syn::Result<MethodOptions> {
    let mut options = MethodOptions::default();
    let mut error = None;

    attrs.retain(|attr| {
        if !attr.path().is_ident("rpc") {
            return true;
        }
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                options.name = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"` or `skip`"))
            }
        });
        if let Err(e) = parsed {
            error.get_or_insert(e);
        }
        false
    });

    match error {
        Some(e) => Err(e),
        None => Ok(options),
    }
}

/// Parse `#[rpc(default = expr)]` on a parameter and strip it
fn take_param_default(attrs: &mut Vec<Attribute>) -> syn::Result<Option<Expr>> {
    let mut default = None;
    let mut error = None;

    attrs.retain(|attr| {
        if !attr.path().is_ident("rpc") {
            return true;
        }
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                default = Some(meta.value()?.parse::<Expr>()?);
                Ok(())
            } else {
                Err(meta.error("expected `default = ...`"))
            }
        });
        if let Err(e) = parsed {
            error.get_or_insert(e);
        }
        false
    });

    match error {
        Some(e) => Err(e),
        None => Ok(default),
    }
}

/// Joined `///` lines
pub fn doc_string(attrs: &[Attribute]) -> String {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect();
    lines.join(" ")
}

/// Collect the typed parameters, stripping their `#[rpc]` attributes
pub fn collect_params(sig: &mut Signature) -> syn::Result<Vec<ParamInfo>> {
    let mut params = Vec::new();

    for (index, input) in sig.inputs.iter_mut().enumerate() {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let default = take_param_default(&mut pat_type.attrs)?;
        let name = match pat_type.pat.as_ref() {
            Pat::Ident(pat) => pat.ident.unraw().to_string(),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "rpc parameters must be plain identifiers",
                ))
            }
        };

        let (decode_ty, by_ref) = owned_type(&pat_type.ty);
        let (smd_type, optional) = smd_type(&pat_type.ty);
        params.push(ParamInfo {
            name: name.trim_start_matches('_').to_string(),
            binding: format_ident!("__arg{}", index),
            decode_ty,
            by_ref,
            smd_type,
            optional,
            default,
        });
    }

    Ok(params)
}

/// Whether the signature takes `&self`; `self` by value and `&mut self` are rejected
pub fn receiver(sig: &Signature) -> syn::Result<bool> {
    match sig.receiver() {
        None => Ok(false),
        Some(recv) if recv.reference.is_some() && recv.mutability.is_none() => Ok(true),
        Some(recv) => Err(syn::Error::new_spanned(
            recv,
            "rpc methods take `&self`; shared state needs interior mutability",
        )),
    }
}

/// `MethodSignature` expression for a function
pub fn signature_tokens(name: &str, description: &str, params: &[ParamInfo], output: &ReturnType) -> TokenStream2 {
    let params = params.iter().map(|param| {
        let pname = &param.name;
        let ptype = &param.smd_type;
        let optional = param.optional.then(|| quote! { .optional() });
        let default = param.default.as_ref().map(|expr| {
            quote! { .with_default(::smdrpc_server::__private::serde_json::json!(#expr)) }
        });
        quote! {
            .param(::smdrpc_server::ParamSignature::new(#pname, #ptype) #optional #default)
        }
    });
    let returns = return_types(output);

    quote! {
        ::smdrpc_server::MethodSignature::new(#name)
            .description(#description)
            #(#params)*
            #(.returns(#returns))*
    }
}

/// Statements decoding the argument iterator `__args` into bindings
pub fn decode_tokens(params: &[ParamInfo]) -> TokenStream2 {
    let decodes = params.iter().map(|param| {
        let binding = &param.binding;
        let ty = &param.decode_ty;
        let name = &param.name;
        quote! {
            let #binding: #ty = ::smdrpc_server::__private::arg(__args.next(), #name)?;
        }
    });
    quote! {
        let mut __args = __args.into_iter();
        #(#decodes)*
    }
}

/// Call arguments, borrowing where the function takes a reference
pub fn call_args(params: &[ParamInfo]) -> Vec<TokenStream2> {
    params
        .iter()
        .map(|param| {
            let binding = &param.binding;
            if param.by_ref {
                quote! { &#binding }
            } else {
                quote! { #binding }
            }
        })
        .collect()
}

/// Expression converting `__output` into `Result<Value>`
pub fn conversion_tokens(output: &ReturnType) -> TokenStream2 {
    if returns_result(output) {
        quote! { ::smdrpc_server::__private::from_result(__output) }
    } else {
        quote! { ::smdrpc_server::__private::into_value(__output) }
    }
}

fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => last_segment(ty).is_some_and(|(ident, _)| ident == "Result"),
        ReturnType::Default => false,
    }
}

fn return_types(output: &ReturnType) -> Vec<String> {
    let ty = match output {
        ReturnType::Default => return vec!["void".to_string()],
        ReturnType::Type(_, ty) => ty.as_ref(),
    };
    let ty = match last_segment(ty) {
        Some((ident, Some(inner))) if ident == "Result" => inner,
        _ => ty,
    };
    match smd_type(ty) {
        (name, true) => vec![name, "null".to_string()],
        (name, false) => vec![name],
    }
}

/// Last path segment and its first generic type argument
fn last_segment(ty: &Type) -> Option<(String, Option<&Type>)> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    let inner = match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    };
    Some((segment.ident.to_string(), inner))
}

/// SMD type name for a Rust type, and whether it is optional
pub fn smd_type(ty: &Type) -> (String, bool) {
    let name = match ty {
        Type::Reference(reference) => return smd_type(&reference.elem),
        Type::Paren(paren) => return smd_type(&paren.elem),
        Type::Group(group) => return smd_type(&group.elem),
        Type::Tuple(tuple) if tuple.elems.is_empty() => "null",
        Type::Tuple(_) | Type::Array(_) | Type::Slice(_) => "array",
        Type::Path(_) => match last_segment(ty) {
            Some((ident, Some(inner))) if ident == "Option" => {
                return (smd_type(inner).0, true);
            }
            Some((ident, inner)) => match ident.as_str() {
                "bool" => "boolean",
                "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
                | "u128" | "usize" => "integer",
                "f32" | "f64" => "float",
                "String" | "str" | "char" => "string",
                "Vec" | "VecDeque" | "HashSet" | "BTreeSet" => "array",
                "HashMap" | "BTreeMap" | "Map" => "object",
                "Value" => "any",
                "Box" | "Arc" | "Rc" | "Cow" => match inner {
                    Some(inner) => return smd_type(inner),
                    None => "object",
                },
                _ => "object",
            },
            None => "object",
        },
        _ => "any",
    };
    (name.to_string(), false)
}

/// Owned type to decode a parameter into, and whether to pass it by reference
fn owned_type(ty: &Type) -> (TokenStream2, bool) {
    let Type::Reference(reference) = ty else {
        return (quote! { #ty }, false);
    };
    let elem = reference.elem.as_ref();
    let owned = match elem {
        Type::Path(path) if path.path.is_ident("str") => quote! { ::std::string::String },
        Type::Slice(slice) => {
            let inner = &slice.elem;
            quote! { ::std::vec::Vec<#inner> }
        }
        other => quote! { #other },
    };
    (owned, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_smd_type_mapping() {
        let cases: Vec<(Type, &str, bool)> = vec![
            (parse_quote!(bool), "boolean", false),
            (parse_quote!(u32), "integer", false),
            (parse_quote!(f64), "float", false),
            (parse_quote!(&str), "string", false),
            (parse_quote!(Vec<String>), "array", false),
            (parse_quote!(std::collections::HashMap<String, i64>), "object", false),
            (parse_quote!(serde_json::Value), "any", false),
            (parse_quote!(Option<i64>), "integer", true),
            (parse_quote!(MyStruct), "object", false),
            (parse_quote!(()), "null", false),
        ];
        for (ty, expected, optional) in cases {
            assert_eq!(smd_type(&ty), (expected.to_string(), optional));
        }
    }

    #[test]
    fn test_return_types() {
        let output: ReturnType = parse_quote!(-> Result<Option<String>, Fault>);
        assert_eq!(return_types(&output), vec!["string", "null"]);
        assert_eq!(return_types(&ReturnType::Default), vec!["void"]);
        assert!(returns_result(&output));
    }

    #[test]
    fn test_collect_params_strips_attributes() {
        let mut sig: Signature =
            parse_quote!(fn bar(&self, one: bool, #[rpc(default = "two")] two: String, three: Option<i64>));
        let params = collect_params(&mut sig).unwrap();

        assert_eq!(params.len(), 3);
        assert_eq!(params[1].name, "two");
        assert!(params[1].default.is_some());
        assert!(params[2].optional);
        assert!(quote!(#sig).to_string().find("rpc").is_none());
    }

    #[test]
    fn test_mut_receiver_rejected() {
        let sig: Signature = parse_quote!(fn bump(&mut self));
        assert!(receiver(&sig).is_err());
        let sig: Signature = parse_quote!(fn get(&self));
        assert!(receiver(&sig).unwrap());
    }

    #[test]
    fn test_method_options() {
        let mut attrs: Vec<Attribute> = vec![
            parse_quote!(#[doc = " Bar method"]),
            parse_quote!(#[rpc(name = "foo.bar")]),
        ];
        let options = take_method_options(&mut attrs).unwrap();
        assert_eq!(options.name.as_deref(), Some("foo.bar"));
        assert!(!options.skip);
        assert_eq!(attrs.len(), 1);
        assert_eq!(doc_string(&attrs), "Bar method");
    }
}
