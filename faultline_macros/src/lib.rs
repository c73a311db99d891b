use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, ExprArray, Result as SynResult};

/// Kinds parsed from one `#[fault(...)]` attribute
struct FaultAttr {
    kind: Expr,
    also: Vec<Expr>,
}

fn parse_fault_attr(attrs: &[Attribute], span: proc_macro2::Span) -> SynResult<FaultAttr> {
    let mut kind = None;
    let mut also = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("fault")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("kind") {
                kind = Some(meta.value()?.parse::<Expr>()?);
                Ok(())
            } else if meta.path.is_ident("also") {
                let list: ExprArray = meta.value()?.parse()?;
                also.extend(list.elems);
                Ok(())
            } else {
                Err(meta.error("unexpected key, expected `kind` or `also`"))
            }
        })?;
    }
    match kind {
        Some(kind) => Ok(FaultAttr { kind, also }),
        None => Err(syn::Error::new(
            span,
            "missing #[fault(kind = ...)] attribute",
        )),
    }
}

fn also_body(also: &[Expr]) -> TokenStream2 {
    quote! {
        const ALSO: &[::faultline::kind::ErrorKind] = &[#(#also),*];
        ALSO
    }
}

/// Derive `faultline::kind::Fault`.
///
/// Structs take one `#[fault(kind = KIND)]` attribute; enums take one per variant.
/// `also = [A, B]` lists extra classifications.
#[proc_macro_derive(Fault, attributes(fault))]
pub fn derive_fault(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> SynResult<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let (kind_body, also_fn) = match &input.data {
        Data::Struct(_) => {
            let attr = parse_fault_attr(&input.attrs, name.span())?;
            let kind = &attr.kind;
            let also = also_body(&attr.also);
            (
                quote! { #kind },
                quote! {
                    fn also_classified_as(&self) -> &[::faultline::kind::ErrorKind] {
                        #also
                    }
                },
            )
        }
        Data::Enum(data) => {
            let mut kind_arms = Vec::new();
            let mut also_arms = Vec::new();
            for variant in &data.variants {
                let ident = &variant.ident;
                let attr = parse_fault_attr(&variant.attrs, ident.span())?;
                let kind = &attr.kind;
                let also = also_body(&attr.also);
                kind_arms.push(quote! { Self::#ident { .. } => #kind, });
                also_arms.push(quote! { Self::#ident { .. } => { #also } });
            }
            (
                quote! {
                    match self {
                        #(#kind_arms)*
                    }
                },
                quote! {
                    fn also_classified_as(&self) -> &[::faultline::kind::ErrorKind] {
                        match self {
                            #(#also_arms)*
                        }
                    }
                },
            )
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                name.span(),
                "Fault cannot be derived for unions",
            ))
        }
    };

    Ok(quote! {
        impl #impl_generics ::faultline::kind::Fault for #name #ty_generics #where_clause {
            fn kind(&self) -> ::faultline::kind::ErrorKind {
                #kind_body
            }

            #also_fn
        }
    })
}
