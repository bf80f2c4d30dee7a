//! Derive macros for `cassette-core`.
//!
//! This crate provides one derive macro:
//!
//! - [`FromRow`] — generates a `FromRow` implementation binding a result
//!   row to a struct, positionally: field `i` decodes from column `i`.
//!
//! # Example
//!
//! ```ignore
//! use cassette_derive::FromRow;
//!
//! #[derive(Debug, Default, FromRow)]
//! struct User {
//!     user_name: String,
//!     birth_year: i64,
//!     #[cassette(skip)]
//!     cached_score: Option<f64>,
//! }
//! ```

extern crate proc_macro;

mod row;

use proc_macro::TokenStream;

/// Derives the `FromRow` trait for a struct with named fields.
///
/// Binding is positional: the first field decodes from the first result
/// column, and so on. Columns beyond the last field are ignored; fields
/// beyond the last column take `Default::default()`; a column value of
/// the wrong type fails with a decoding error. Every field type must
/// implement `FromCql` and `Default` (wrap nullable columns in
/// `Option<T>`).
///
/// # Attributes
///
/// - `#[cassette(skip)]` — the field does not consume a column and is
///   always set to its default value.
#[proc_macro_derive(FromRow, attributes(cassette))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    row::derive_from_row_impl(input)
}
