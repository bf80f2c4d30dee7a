//! Derive macro implementation for `FromRow`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

pub fn derive_from_row_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("FromRow only supports structs with named fields"),
        },
        _ => panic!("FromRow can only be derived for structs"),
    };

    // Skipped fields do not consume a column, so the column index is
    // tracked independently of the field position.
    let mut column = 0usize;
    let mut field_inits = Vec::new();

    for field in fields {
        let field_ident = field.ident.as_ref().unwrap();

        if has_skip_attr(&field.attrs) {
            field_inits.push(quote! { #field_ident: Default::default() });
            continue;
        }

        let index = column;
        field_inits.push(quote! {
            #field_ident: if #index < row.len() {
                cassette_core::serialization::FromCql::from_cql(row.value(#index)?)?
            } else {
                Default::default()
            }
        });
        column += 1;
    }

    let expanded = quote! {
        impl #impl_generics cassette_core::protocol::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &cassette_core::protocol::Row) -> cassette_core::error::Result<Self> {
                Ok(Self {
                    #(#field_inits,)*
                })
            }
        }
    };

    TokenStream::from(expanded)
}

fn has_skip_attr(attrs: &[syn::Attribute]) -> bool {
    for attr in attrs {
        if !attr.path().is_ident("cassette") {
            continue;
        }
        let mut skip = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
            }
            Ok(())
        });
        if skip {
            return true;
        }
    }
    false
}
