//! Derive macro for the `StructuralHash` trait.
//!
//! This crate provides a derive macro for automatically implementing the
//! `StructuralHash` trait from the `datahasher` crate on structs and enums.
//!
//! # Examples
//!
//! ## Struct
//!
//! ```ignore
//! use datahasher::StructuralHash;
//!
//! #[derive(StructuralHash)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//! ```
//!
//! ## Embedded Struct
//!
//! ```ignore
//! use datahasher::StructuralHash;
//!
//! #[derive(StructuralHash)]
//! struct Audit {
//!     created_by: String,
//!     revision: u32,
//! }
//!
//! #[derive(StructuralHash)]
//! struct Document {
//!     title: String,
//!     #[structural_hash(flatten)]
//!     audit: Audit,
//!     #[structural_hash(skip)]
//!     render_cache: Vec<u8>,
//! }
//! ```
//!
//! ## Custom Fingerprint
//!
//! ```ignore
//! use datahasher::{Fingerprint, StructuralHash};
//!
//! #[derive(StructuralHash)]
//! #[structural_hash(custom)]
//! struct Handle {
//!     id: u64,
//!     buffer: Vec<u8>,
//! }
//!
//! impl Fingerprint for Handle {
//!     fn fingerprint(&self) -> u64 { self.id }
//! }
//! ```

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DataEnum, DataStruct, DeriveInput, Field, Fields, Index,
    parse_macro_input,
};

/// Options parsed from `#[structural_hash(...)]` on a field.
#[derive(Default)]
struct FieldOptions {
    skip: bool,
    flatten: bool,
}

impl FieldOptions {
    fn parse(field: &Field) -> syn::Result<Self> {
        let mut options = Self::default();

        for attr in &field.attrs {
            if !attr.path().is_ident("structural_hash") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    options.skip = true;
                    Ok(())
                } else if meta.path.is_ident("flatten") {
                    options.flatten = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown structural_hash field attribute"))
                }
            })?;
        }

        if options.skip && options.flatten {
            return Err(syn::Error::new_spanned(
                field,
                "a field cannot be both skipped and flattened",
            ));
        }

        Ok(options)
    }
}

/// Returns whether the container carries `#[structural_hash(custom)]`.
fn is_custom(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut custom = false;

    for attr in attrs {
        if !attr.path().is_ident("structural_hash") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("custom") {
                custom = true;
                Ok(())
            } else {
                Err(meta.error("unknown structural_hash container attribute"))
            }
        })?;
    }

    Ok(custom)
}

/// Derive macro for `StructuralHash`.
///
/// The generated implementation:
///
/// - For structs: folds every non-skipped field in declaration order;
///   flattened fields have their own fields promoted in place
/// - For enums: seeds the accumulator with the variant index, then folds the
///   variant's fields
/// - With `#[structural_hash(custom)]`: returns `Fingerprint::fingerprint`
///   verbatim and visits no field
///
/// The crate path defaults to `::datahasher` and can be overridden with
/// `#[datahasher_crate(path)]`.
#[proc_macro_derive(
    StructuralHash,
    attributes(structural_hash, datahasher_crate)
)]
pub fn derive_structural_hash(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let crate_path: syn::Path = if let Some(attr) = input
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("datahasher_crate"))
    {
        attr.parse_args::<syn::Path>().map_err(|_| {
            syn::Error::new_spanned(
                attr,
                "invalid `#[datahasher_crate(...)]` attribute",
            )
        })?
    } else {
        syn::parse_quote!(::datahasher)
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) =
        input.generics.split_for_impl();

    let mut where_clause =
        where_clause.cloned().unwrap_or_else(|| syn::parse_quote!(where));

    for param in &input.generics.params {
        if let syn::GenericParam::Type(type_param) = param {
            let ident = &type_param.ident;
            where_clause
                .predicates
                .push(syn::parse_quote!(#ident: #crate_path::StructuralHash));
        }
    }

    let body = if is_custom(&input.attrs)? {
        quote! {
            fn structural_hash(
                &self,
                _state: &mut #crate_path::Traversal<'_>,
            ) -> u64 {
                #crate_path::Fingerprint::fingerprint(self)
            }
        }
    } else {
        match &input.data {
            Data::Struct(data_struct) => {
                impl_struct(&crate_path, data_struct)?
            }
            Data::Enum(data_enum) => impl_enum(&crate_path, data_enum)?,
            Data::Union(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "StructuralHash cannot be derived for unions: the active \
                     field is not known",
                ));
            }
        }
    };

    Ok(quote! {
        #[allow(clippy::trait_duplication_in_bounds)]
        impl #impl_generics #crate_path::StructuralHash for #name #ty_generics #where_clause {
            #body
        }
    })
}

/// Emits the statement feeding one field (bound to `access`) into `fields`.
fn feed_field(
    crate_path: &syn::Path,
    options: &FieldOptions,
    access: &proc_macro2::TokenStream,
) -> proc_macro2::TokenStream {
    if options.flatten {
        quote! {
            #crate_path::StructuralHash::promote_fields(#access, fields);
        }
    } else {
        quote! {
            fields.field(#access);
        }
    }
}

fn impl_struct(
    crate_path: &syn::Path,
    data_struct: &DataStruct,
) -> syn::Result<proc_macro2::TokenStream> {
    let mut feeds = Vec::new();

    for (i, field) in data_struct.fields.iter().enumerate() {
        let options = FieldOptions::parse(field)?;
        if options.skip {
            continue;
        }

        let access = match &field.ident {
            Some(ident) => quote!(&self.#ident),
            None => {
                let index = Index::from(i);
                quote!(&self.#index)
            }
        };

        feeds.push(feed_field(crate_path, &options, &access));
    }

    Ok(quote! {
        fn structural_hash(
            &self,
            state: &mut #crate_path::Traversal<'_>,
        ) -> u64 {
            let mut fields = state.structure();
            #crate_path::StructuralHash::promote_fields(self, &mut fields);
            fields.finish()
        }

        #[allow(unused_variables)]
        fn promote_fields(&self, fields: &mut #crate_path::Fields<'_, '_>) {
            #(#feeds)*
        }
    })
}

fn impl_enum(
    crate_path: &syn::Path,
    data_enum: &DataEnum,
) -> syn::Result<proc_macro2::TokenStream> {
    let mut arms = Vec::new();

    for (index, variant) in data_enum.variants.iter().enumerate() {
        let variant_name = &variant.ident;
        let index = u32::try_from(index).map_err(|_| {
            syn::Error::new_spanned(variant, "too many enum variants")
        })?;

        // Bind positionally so field names cannot shadow `state`/`fields`.
        let mut members = Vec::new();
        let mut bindings = Vec::new();
        let mut feeds = Vec::new();

        for (i, field) in variant.fields.iter().enumerate() {
            let options = FieldOptions::parse(field)?;
            let binding = format_ident!("__field_{}", i);

            if !options.skip {
                feeds.push(feed_field(crate_path, &options, &quote!(#binding)));
            }

            members.push(field.ident.clone());
            bindings.push(binding);
        }

        let pattern = match &variant.fields {
            Fields::Named(_) => {
                let members = members.iter().flatten();
                quote!(Self::#variant_name { #(#members: #bindings),* })
            }
            Fields::Unnamed(_) => quote!(Self::#variant_name(#(#bindings),*)),
            Fields::Unit => quote!(Self::#variant_name),
        };

        arms.push(quote! {
            #[allow(unused_variables)]
            #pattern => {
                let mut fields = state.variant(#index);
                {
                    let fields = &mut fields;
                    #(#feeds)*
                }
                fields.finish()
            }
        });
    }

    // An uninhabited enum has no value to visit.
    let scrutinee = if arms.is_empty() { quote!(*self) } else { quote!(self) };

    Ok(quote! {
        #[allow(unused_variables)]
        fn structural_hash(
            &self,
            state: &mut #crate_path::Traversal<'_>,
        ) -> u64 {
            match #scrutinee {
                #(#arms)*
            }
        }
    })
}
