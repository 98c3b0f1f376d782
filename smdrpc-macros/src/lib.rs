//! Procedural macros for smdrpc
//!
//! Writing a `MethodSignature` by hand for every method repeats what the
//! Rust signature already says. These attributes read it instead:
//!
//! - parameter names and order come from the function's parameters
//! - SMD types come from the Rust types (`bool` → `boolean`, integers →
//!   `integer`, `String`/`&str` → `string`, `Vec` → `array`, maps and
//!   structs → `object`, `Value` → `any`)
//! - `Option<T>` parameters are optional; `#[rpc(default = expr)]` adds a
//!   published default
//! - `///` comments become the description
//! - `Result<T, E>` returns forward `E` (anything `Into<smdrpc_core::Error>`,
//!   such as `Fault`) as the response error
//!
//! # Available Macros
//!
//! ## `#[rpc_service]`
//!
//! On an inherent `impl` block. Every `pub fn` taking `&self` or no
//! receiver becomes a method of a generated `ServiceProvider` impl, sync or
//! async alike.
//!
//! ```ignore
//! use smdrpc_macros::rpc_service;
//! use smdrpc_core::Fault;
//!
//! pub struct Foo;
//!
//! #[rpc_service]
//! impl Foo {
//!     /// Bar
//!     pub fn bar(&self, one: bool, #[rpc(default = "two")] two: String, three: Option<i64>) -> serde_json::Value {
//!         serde_json::json!([one, two, three])
//!     }
//!
//!     pub async fn baz(&self) -> Result<(), Fault> {
//!         Err(Fault::other("application error"))
//!     }
//!
//!     #[rpc(skip)]
//!     pub fn helper(&self) {}
//! }
//!
//! server.set_class(Foo)?;
//! ```
//!
//! ## `#[rpc_function]`
//!
//! On a free function. The function is replaced by a factory of the same
//! name returning a `Method`, ready for `Server::add_function`.
//!
//! ```ignore
//! /// Add two integers
//! #[rpc_function(name = "math.add")]
//! async fn add(a: i64, b: i64) -> i64 {
//!     a + b
//! }
//!
//! server.add_function(add())?;
//! ```
//!
//! Generated code refers to `::smdrpc_server`, which must be a dependency of
//! the calling crate.

mod function;
mod service;
mod signature;

use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemFn, ItemImpl};

/// Derive a `ServiceProvider` from an `impl` block
///
/// Method attributes: `#[rpc(name = "...")]` publishes under another name,
/// `#[rpc(skip)]` leaves a public fn out. Parameter attribute:
/// `#[rpc(default = expr)]`, where `expr` is anything `serde_json::json!`
/// accepts.
///
/// # Limitations
///
/// - `&mut self` and `self` receivers are rejected; keep mutable state
///   behind a lock
/// - parameters must be plain identifiers, not patterns
#[proc_macro_attribute]
pub fn rpc_service(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = parse_macro_input!(item as ItemImpl);
    service::rpc_service_impl(item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Turn a free function into a factory returning a `Method`
///
/// The method is published under the function name unless
/// `#[rpc_function(name = "...")]` says otherwise.
///
/// # Limitations
///
/// - no receivers and no generics
#[proc_macro_attribute]
pub fn rpc_function(attr: TokenStream, item: TokenStream) -> TokenStream {
    let rename = match function::parse_name(attr.into()) {
        Ok(rename) => rename,
        Err(e) => return e.into_compile_error().into(),
    };
    let item = parse_macro_input!(item as ItemFn);
    function::rpc_function_impl(rename, item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
