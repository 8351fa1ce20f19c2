mod asset;
mod bundle;
mod component;

use proc_macro::TokenStream;

#[proc_macro_derive(Component)]
pub fn derive_component(item: TokenStream) -> TokenStream {
    component::derive_component(item)
}

#[proc_macro_derive(Asset)]
pub fn derive_asset(item: TokenStream) -> TokenStream {
    asset::derive_asset(item)
}

#[proc_macro_derive(Bundle)]
pub fn derive_bundle(item: TokenStream) -> TokenStream {
    bundle::derive_bundle(item)
}
