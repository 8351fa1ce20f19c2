use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Member, parse_macro_input, spanned::Spanned};

/// Derive `Bundle` for a struct whose fields are all components.
///
/// Every field becomes one component of the bundle. Named and tuple structs are supported; the
/// generated `decode` rebuilds the struct with `Self { member: value, .. }`, which is valid for
/// both (`Self { 0: a, 1: b }`).
pub fn derive_bundle(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let struct_name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unnamed(unnamed) => unnamed.unnamed.iter().collect::<Vec<_>>(),
            Fields::Unit => {
                return syn::Error::new(
                    ast.span(),
                    "Bundle cannot be derived for a unit struct, it has no components",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(ast.span(), "Bundle can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let members: Vec<Member> = fields
        .iter()
        .enumerate()
        .map(|(index, field)| match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(index.into()),
        })
        .collect();
    let types: Vec<_> = fields.iter().map(|field| &field.ty).collect();

    TokenStream::from(quote! {
        impl #impl_generics ::tickworks::ecs::component::Bundle for #struct_name #ty_generics #where_clause {
            fn component_ids(
                registry: &::tickworks::ecs::component::Registry,
            ) -> ::std::vec::Vec<::tickworks::ecs::component::Id> {
                ::std::vec![#(registry.register::<#types>()),*]
            }

            fn encode(self, encoder: &mut ::tickworks::ecs::component::Encoder<'_>) {
                #(encoder.push::<#types>(self.#members);)*
            }

            fn decode(
                decoder: &::tickworks::ecs::component::Decoder<'_>,
            ) -> ::std::option::Option<Self> {
                ::std::option::Option::Some(Self {
                    #(#members: decoder.get::<#types>()?,)*
                })
            }
        }
    })
}
