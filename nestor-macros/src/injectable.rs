mod attr;

pub(crate) use attr::InjectableArgs;

use crate::injectable::attr::{parse_method_attrs, InjectArgs};

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned, ToTokens as _};
use syn::{spanned::Spanned as _, Error, FnArg, ImplItem, ImplItemFn, Item, ItemImpl, ReturnType, Type};

fn is_self_type(ty: &Type, self_ty: &Type) -> bool {
    let ty = ty.to_token_stream().to_string();
    ty == "Self" || ty == self_ty.to_token_stream().to_string()
}

fn typed_params_len(impl_item_fn: &ImplItemFn) -> usize {
    impl_item_fn
        .sig
        .inputs
        .iter()
        .filter(|input| matches!(input, FnArg::Typed(_)))
        .count()
}

fn expand_constructor(impl_item_fn: &ImplItemFn, self_ty: &Type, args: &InjectArgs) -> syn::Result<TokenStream> {
    let fn_name = &impl_item_fn.sig.ident;
    let span = impl_item_fn.span();

    let fallible = match &impl_item_fn.sig.output {
        ReturnType::Default => {
            return Err(Error::new_spanned(
                &impl_item_fn.sig,
                "constructor must return `Self` or `Result<Self, E>`",
            ))
        }
        ReturnType::Type(_, ty) => !is_self_type(ty, self_ty),
    };

    if args.allocator.is_some() {
        if typed_params_len(impl_item_fn) != 0 {
            return Err(Error::new_spanned(
                &impl_item_fn.sig.inputs,
                "allocator can't have parameters",
            ));
        }
        if fallible {
            return Err(Error::new_spanned(&impl_item_fn.sig.output, "allocator must return `Self`"));
        }
        return Ok(quote_spanned! { span => ty.allocator(Self::#fn_name); });
    }

    let marked = args.constructor.is_some();
    Ok(match (fallible, marked) {
        (false, false) => quote_spanned! { span => ty.constructor(Self::#fn_name); },
        (false, true) => quote_spanned! { span => ty.inject_constructor(Self::#fn_name); },
        (true, false) => quote_spanned! { span => ty.try_constructor(Self::#fn_name); },
        (true, true) => quote_spanned! { span => ty.try_inject_constructor(Self::#fn_name); },
    })
}

fn expand_member(impl_item_fn: &ImplItemFn, args: &InjectArgs) -> syn::Result<TokenStream> {
    let fn_name = &impl_item_fn.sig.ident;
    let span = impl_item_fn.span();

    if let Some(kw) = &args.constructor {
        return Err(Error::new_spanned(kw, "constructor can't have a `self` receiver"));
    }
    if let Some(kw) = &args.allocator {
        return Err(Error::new_spanned(kw, "allocator can't have a `self` receiver"));
    }

    let is_mut_ref = impl_item_fn
        .sig
        .receiver()
        .is_some_and(|receiver| receiver.reference.is_some() && receiver.mutability.is_some());
    if !is_mut_ref {
        return Err(Error::new_spanned(
            &impl_item_fn.sig.inputs,
            "injected method must take `&mut self`",
        ));
    }

    if let Some((_, name)) = &args.property {
        if typed_params_len(impl_item_fn) != 1 {
            return Err(Error::new_spanned(
                &impl_item_fn.sig.inputs,
                "property setter must have exactly one parameter",
            ));
        }
        return Ok(quote_spanned! { span => ty.property(#name, Self::#fn_name); });
    }

    let name = fn_name.to_string();
    Ok(quote_spanned! { span => ty.method(#name, Self::#fn_name); })
}

fn expand_marker(impl_item_fn: &ImplItemFn, self_ty: &Type, args: &InjectArgs) -> syn::Result<TokenStream> {
    if impl_item_fn.sig.asyncness.is_some() {
        return Err(Error::new_spanned(
            impl_item_fn.sig.asyncness,
            "async functions can't be injected",
        ));
    }

    if impl_item_fn.sig.receiver().is_some() {
        expand_member(impl_item_fn, args)
    } else {
        if let Some((kw, _)) = &args.property {
            return Err(Error::new_spanned(kw, "property setter must take `&mut self`"));
        }
        expand_constructor(impl_item_fn, self_ty, args)
    }
}

pub(crate) fn expand(mut item: Item, args: &InjectableArgs) -> syn::Result<TokenStream> {
    let (items, self_ty, generics) = match &mut item {
        Item::Impl(ItemImpl {
            trait_: Some((_, path, _)),
            ..
        }) => return Err(Error::new_spanned(path, "#[injectable] can't be used on trait implementations")),
        Item::Impl(ItemImpl {
            trait_: None,
            items,
            self_ty,
            generics,
            ..
        }) => (items, &**self_ty, &*generics),
        other => return Err(Error::new_spanned(other, "#[injectable] can only be used on `impl` blocks")),
    };

    let mut statements = Vec::new();
    for impl_item in items.iter_mut() {
        let ImplItem::Fn(impl_item_fn) = impl_item else {
            continue;
        };
        let Some(inject_args) = parse_method_attrs(&impl_item_fn.attrs) else {
            continue;
        };
        let inject_args = inject_args?;

        // Remove `inject` attributes from final code
        impl_item_fn.attrs.retain(|attr| !attr.path().is_ident("inject"));

        statements.push(expand_marker(impl_item_fn, self_ty, &inject_args)?);
    }

    if let Some(kw) = &args.disposable {
        statements.push(quote_spanned! { kw.span() => ty.disposable(); });
    }

    let (impl_generics, _, where_clause) = generics.split_for_impl();
    let injectable_impl = quote! {
        impl #impl_generics ::nestor::Injectable for #self_ty #where_clause {
            fn describe(ty: &mut ::nestor::Describe<Self>) {
                #( #statements )*
            }
        }
    };

    Ok(quote! {
        #item
        #injectable_impl
    })
}
