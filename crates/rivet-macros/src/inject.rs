//! Injectable derive macro implementation.
//!
//! # Overview
//!
//! `#[derive(Injectable)]` turns field-level `#[inject]` markers into a
//! static descriptor table. It generates one `impl Injectable` with:
//!
//! 1. `injection_points`: one `InjectionPoint` per marked field, in
//!    declaration order
//! 2. `inject_field`: a `match` over field names that downcasts the
//!    type-erased service and stores it in the field
//!
//! # Field-level attributes `#[inject(...)]`
//!
//! | Form | Meaning |
//! |------|---------|
//! | `#[inject]` | Required dependency |
//! | `#[inject(required = false)]` | Optional dependency |
//! | `#[inject(optional)]` | Shorthand for `required = false` |
//!
//! # Container attribute `#[injectable(...)]`
//!
//! | Key | Example | Description |
//! |-----|---------|-------------|
//! | `crate` | `"rivet::core"` | Path to `rivet_core` (default `::rivet_core`) |

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Fields, GenericArgument, Ident, LitBool, LitStr, Path,
    PathArguments, Type, spanned::Spanned,
};

// ============================================================================
// Attribute structures
// ============================================================================

/// One `#[inject]`-marked field.
struct MarkedField {
    ident: Ident,
    /// The `T` in `Option<Arc<T>>`.
    service: Type,
    required: bool,
}

// ============================================================================
// Entry point
// ============================================================================

pub fn derive_injectable(input: &DeriveInput) -> syn::Result<TokenStream> {
    let krate = parse_crate_path(&input.attrs)?;

    let marked = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => collect_marked_fields(named.named.iter())?,
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new(
                    input.span(),
                    "Injectable requires a struct with named fields",
                ));
            }
        },
        Data::Enum(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Injectable cannot be derived for enums",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Injectable cannot be derived for unions",
            ));
        }
    };

    Ok(generate_impl(input, &krate, &marked))
}

// ============================================================================
// Attribute parsing
// ============================================================================

fn parse_crate_path(attrs: &[Attribute]) -> syn::Result<Path> {
    let mut krate: Option<Path> = None;

    for attr in attrs {
        if !attr.path().is_ident("injectable") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let lit: LitStr = meta.value()?.parse()?;
                krate = Some(lit.parse()?);
                Ok(())
            } else {
                Err(meta.error("unknown injectable attribute; expected `crate = \"…\"`"))
            }
        })?;
    }

    Ok(krate.unwrap_or_else(|| syn::parse_quote!(::rivet_core)))
}

/// Returns `Some(required)` when the field carries `#[inject]`.
fn parse_inject_attr(attrs: &[Attribute]) -> syn::Result<Option<bool>> {
    let mut marker = None;

    for attr in attrs {
        if !attr.path().is_ident("inject") {
            continue;
        }
        let mut required = true;
        if !matches!(attr.meta, syn::Meta::Path(_)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("required") {
                    let lit: LitBool = meta.value()?.parse()?;
                    required = lit.value;
                    Ok(())
                } else if meta.path.is_ident("optional") {
                    required = false;
                    Ok(())
                } else {
                    Err(meta.error(
                        "unknown inject attribute; expected `required = <bool>` or `optional`",
                    ))
                }
            })?;
        }
        marker = Some(required);
    }

    Ok(marker)
}

fn collect_marked_fields<'a>(
    fields: impl Iterator<Item = &'a syn::Field>,
) -> syn::Result<Vec<MarkedField>> {
    let mut marked = Vec::new();

    for field in fields {
        let Some(required) = parse_inject_attr(&field.attrs)? else {
            continue;
        };
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let service = service_type(&field.ty).cloned().ok_or_else(|| {
            syn::Error::new(
                field.ty.span(),
                "#[inject] fields must have the type `Option<Arc<T>>`",
            )
        })?;
        marked.push(MarkedField {
            ident,
            service,
            required,
        });
    }

    Ok(marked)
}

/// `Option<Arc<T>>` → `T`.
fn service_type(ty: &Type) -> Option<&Type> {
    let arc = single_generic_arg(ty, "Option")?;
    single_generic_arg(arc, "Arc")
}

fn single_generic_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

// ============================================================================
// Code generation
// ============================================================================

fn generate_impl(input: &DeriveInput, krate: &Path, marked: &[MarkedField]) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let points = marked.iter().map(|f| {
        let field_name = f.ident.to_string();
        let service = &f.service;
        let required = f.required;
        quote! {
            #krate::inject::InjectionPoint::new(
                #field_name,
                #krate::service::ServiceKey::of::<#service>(),
                #required,
            )
        }
    });

    let arms = marked.iter().map(|f| {
        let ident = &f.ident;
        let field_name = f.ident.to_string();
        let service = &f.service;
        quote! {
            #field_name => match service.downcast_ref::<::std::sync::Arc<#service>>() {
                ::std::option::Option::Some(value) => {
                    self.#ident = ::std::option::Option::Some(::std::sync::Arc::clone(value));
                    true
                }
                ::std::option::Option::None => false,
            },
        }
    });

    quote! {
        impl #impl_generics #krate::inject::Injectable for #name #ty_generics #where_clause {
            fn injection_points(&self) -> ::std::vec::Vec<#krate::inject::InjectionPoint> {
                ::std::vec![#(#points),*]
            }

            #[allow(unused_variables)]
            fn inject_field(
                &mut self,
                field: &str,
                service: &#krate::service::ServiceArc,
            ) -> bool {
                match field {
                    #(#arms)*
                    _ => false,
                }
            }
        }
    }
}
