use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

pub fn derive_asset(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let ast = parse_macro_input!(input as DeriveInput);

    let struct_name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    // `::tickworks` resolves inside the crate through `extern crate self as tickworks;` in lib.rs
    // and outside of it through the normal dependency.
    TokenStream::from(quote! {
        impl #impl_generics ::tickworks::ecs::Asset for #struct_name #ty_generics #where_clause {
        }
    })
}
