//! Procedural macros for the Rivet plugin wiring layer.
//!
//! This crate provides:
//!
//! - `#[derive(Injectable)]` - Generates the injection-point table and the
//!   field setter consumed by `rivet_core::inject::Injector`
//!
//! # Injectable Derive Macro
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rivet_core::Injectable;
//!
//! #[derive(Default, Injectable)]
//! pub struct WelcomePlugin {
//!     #[inject]
//!     greeting: Option<Arc<dyn GreetingService>>,
//!     #[inject(required = false)]
//!     audit: Option<Arc<AuditLog>>,
//!     // Unmarked fields are left alone.
//!     greeted: usize,
//! }
//! ```

mod inject;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `rivet_core::inject::Injectable` for a struct with named fields.
///
/// Every field marked with `#[inject]` must have the type `Option<Arc<T>>`
/// where `T` is the service contract looked up in the registry (concrete
/// types and `dyn Trait` objects both work). The field stays `None` until an
/// injector fills it.
///
/// # Field attributes
///
/// - `#[inject]` - Required dependency (injection fails when missing)
/// - `#[inject(required = false)]` / `#[inject(optional)]` - Optional dependency
///
/// # Container attributes
///
/// - `#[injectable(crate = "path")]` - Path to the `rivet_core` crate when it
///   is re-exported under another name (default: `::rivet_core`)
#[proc_macro_derive(Injectable, attributes(inject, injectable))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match inject::derive_injectable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
