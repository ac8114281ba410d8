use proc_macro::TokenStream;
use quote::{quote, ToTokens};
use std::env::var_os;
use syn::parse::Parse;

mod attr_parsing;
mod injectable;

/// Implements `nestor::Injectable` for the type of an inherent `impl` block from its `#[inject]` markers.
///
/// - `#[inject]` on an associated function returning `Self` adds a constructor,
///   on one returning `Result<Self, E>` a fallible constructor.
/// - `#[inject(constructor)]` does the same and marks the constructor as the one to select among several.
/// - `#[inject(allocator)]` on a function without parameters sets the raw allocator.
/// - `#[inject]` on a `&mut self` method calls it after construction with its resolved parameters.
/// - `#[inject(property = "name")]` on a `&mut self` method with one parameter uses it as the property's setter.
///
/// `#[injectable(disposable)]` also enables the type's `nestor::Dispose` implementation.
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match syn::parse::<injectable::InjectableArgs>(attr) {
        Ok(args) => args,
        Err(err) => return err.into_compile_error().into(),
    };
    expand_with(item, |item| injectable::expand(item, &args))
}

fn expand_with<F, I, K>(input: TokenStream, f: F) -> TokenStream
where
    F: FnOnce(I) -> syn::Result<K>,
    I: Parse,
    K: ToTokens,
{
    expand(syn::parse(input).and_then(f))
}

fn expand<T>(result: syn::Result<T>) -> TokenStream
where
    T: ToTokens,
{
    match result {
        Ok(tokens) => {
            let tokens = (quote! { #tokens }).into();
            if var_os("MACROS_DEBUG").is_some() {
                eprintln!("{tokens}");
            }
            tokens
        }
        Err(err) => err.into_compile_error().into(),
    }
}
