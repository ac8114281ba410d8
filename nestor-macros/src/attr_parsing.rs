use core::any;
use quote::ToTokens;
use syn::{
    parse::{Parse, ParseStream},
    Meta, Token,
};

fn keyword_name<K>() -> &'static str {
    any::type_name::<K>().rsplit("::").next().unwrap_or_default()
}

fn duplicated<K: ToTokens>(kw: K) -> syn::Error {
    syn::Error::new_spanned(kw, ["`", keyword_name::<K>(), "` specified more than once"].concat())
}

pub(crate) fn parse_assignment_attribute<K, T>(input: ParseStream<'_>, out: &mut Option<(K, T)>) -> syn::Result<()>
where
    K: Parse + ToTokens,
    T: Parse,
{
    let kw = input.parse()?;
    input.parse::<Token![=]>()?;
    let inner = input.parse()?;

    if out.is_some() {
        return Err(duplicated(kw));
    }

    *out = Some((kw, inner));

    Ok(())
}

pub(crate) fn parse_flag_attribute<K>(input: ParseStream<'_>, out: &mut Option<K>) -> syn::Result<()>
where
    K: Parse + ToTokens,
{
    let kw = input.parse()?;

    if out.is_some() {
        return Err(duplicated(kw));
    }

    *out = Some(kw);

    Ok(())
}

pub(crate) trait Combine: Sized {
    fn combine(self, other: Self) -> syn::Result<Self>;
}

/// Parses and combines every attribute named `ident`. A bare `#[ident]` parses as `T::default()`.
pub(crate) fn parse_attrs<T>(ident: &str, attrs: &[syn::Attribute]) -> Option<Result<T, (syn::Error, syn::Attribute)>>
where
    T: Combine + Parse + Default,
{
    let mut iter = attrs
        .iter()
        .filter(|attr| attr.meta.path().is_ident(ident))
        .map(|attr| match &attr.meta {
            Meta::Path(_) => (attr, Ok(T::default())),
            _ => (attr, attr.parse_args::<T>()),
        });

    let first = match iter.next() {
        Some((_, Ok(first))) => first,
        Some((attr, Err(err))) => return Some(Err((err, attr.clone()))),
        None => return None,
    };

    let result = iter.try_fold(first, |out, (attr, next_result)| match next_result {
        Ok(next) => out.combine(next).map_err(|err| (err, attr.clone())),
        Err(err) => Err((err, attr.clone())),
    });

    Some(result)
}

pub(crate) fn combine_attribute<K, T>(a: &mut Option<(K, T)>, b: Option<(K, T)>) -> syn::Result<()>
where
    K: ToTokens,
{
    if let Some((kw, inner)) = b {
        if a.is_some() {
            return Err(duplicated(kw));
        }
        *a = Some((kw, inner));
    }
    Ok(())
}

pub(crate) fn combine_flag<K>(a: &mut Option<K>, b: Option<K>) -> syn::Result<()>
where
    K: ToTokens,
{
    if let Some(kw) = b {
        if a.is_some() {
            return Err(duplicated(kw));
        }
        *a = Some(kw);
    }
    Ok(())
}
