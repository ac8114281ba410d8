use syn::{
    parse::{Parse, ParseStream},
    Attribute, LitStr, Token,
};

use crate::attr_parsing::{combine_attribute, combine_flag, parse_assignment_attribute, parse_attrs, parse_flag_attribute, Combine};

pub(crate) mod kw {
    syn::custom_keyword!(constructor);
    syn::custom_keyword!(allocator);
    syn::custom_keyword!(property);
    syn::custom_keyword!(disposable);
}

/// Arguments of `#[inject(..)]`.
#[derive(Default)]
pub(crate) struct InjectArgs {
    pub(super) constructor: Option<kw::constructor>,
    pub(super) allocator: Option<kw::allocator>,
    pub(super) property: Option<(kw::property, LitStr)>,
}

impl Parse for InjectArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = Self::default();

        while !input.is_empty() {
            let lh = input.lookahead1();
            if lh.peek(kw::constructor) {
                parse_flag_attribute(input, &mut args.constructor)?;
            } else if lh.peek(kw::allocator) {
                parse_flag_attribute(input, &mut args.allocator)?;
            } else if lh.peek(kw::property) {
                parse_assignment_attribute(input, &mut args.property)?;
            } else {
                return Err(lh.error());
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

impl Combine for InjectArgs {
    fn combine(mut self, other: Self) -> syn::Result<Self> {
        let Self {
            constructor,
            allocator,
            property,
        } = other;
        combine_flag(&mut self.constructor, constructor)?;
        combine_flag(&mut self.allocator, allocator)?;
        combine_attribute(&mut self.property, property)?;
        Ok(self)
    }
}

/// Arguments of `#[injectable(..)]`.
#[derive(Default)]
pub(crate) struct InjectableArgs {
    pub(super) disposable: Option<kw::disposable>,
}

impl Parse for InjectableArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = Self::default();

        while !input.is_empty() {
            let lh = input.lookahead1();
            if lh.peek(kw::disposable) {
                parse_flag_attribute(input, &mut args.disposable)?;
            } else {
                return Err(lh.error());
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

pub(crate) fn parse_method_attrs(attrs: &[Attribute]) -> Option<syn::Result<InjectArgs>> {
    parse_attrs("inject", attrs).map(|result| result.map_err(|(err, attr)| syn::Error::new_spanned(attr, err)))
}
