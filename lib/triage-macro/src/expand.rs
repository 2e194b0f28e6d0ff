//! Macro expansion logic for `#[service]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{FnArg, Ident, ItemTrait, Pat, TraitItem, TraitItemFn, parse2};

use crate::attrs::{
    HttpMethod, MethodParam, PARAM_ATTRS, ParamKind, extract_path_placeholders, parse_param_attr,
};
use crate::codegen::{
    MethodDescription, ReturnShape, analyze_return_type, generate_client_struct,
    generate_method_body,
};

/// A parsed service method.
struct ServiceMethod {
    sig: syn::Signature,
    attrs: Vec<syn::Attribute>,
    http_method: HttpMethod,
    path: String,
    params: Vec<MethodParam>,
    shape: ReturnShape,
}

impl ServiceMethod {
    fn description(&self) -> MethodDescription<'_> {
        MethodDescription {
            name: &self.sig.ident,
            http_method: self.http_method,
            path: &self.path,
            params: &self.params,
            shape: &self.shape,
        }
    }
}

/// Expand `#[service]` on a trait.
pub(crate) fn expand_service(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(attr, "#[service] takes no arguments"));
    }
    let trait_def: ItemTrait = parse2(item)?;
    if !trait_def.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &trait_def.generics,
            "#[service] traits cannot be generic",
        ));
    }

    let trait_name = &trait_def.ident;
    let client_name = format_ident!("{}Client", trait_name);
    let vis = &trait_def.vis;

    let methods = extract_methods(&trait_def)?;
    let descriptions: Vec<_> = methods.iter().map(ServiceMethod::description).collect();

    let clean_trait = generate_clean_trait(&trait_def, &methods);
    let client = generate_client_struct(vis, trait_name, &client_name, &descriptions);

    let impls = methods.iter().zip(&descriptions).map(|(method, description)| {
        let sig = strip_param_attrs(&method.sig);
        let body = generate_method_body(description);
        quote! {
            #sig {
                #body
            }
        }
    });

    Ok(quote! {
        #clean_trait
        #client

        impl #trait_name for #client_name {
            #(#impls)*
        }
    })
}

fn extract_methods(trait_def: &ItemTrait) -> syn::Result<Vec<ServiceMethod>> {
    let mut methods = Vec::new();
    for item in &trait_def.items {
        let TraitItem::Fn(method) = item else {
            return Err(syn::Error::new_spanned(
                item,
                "#[service] traits may only contain methods",
            ));
        };
        methods.push(parse_method(method)?);
    }
    Ok(methods)
}

fn parse_method(method: &TraitItemFn) -> syn::Result<ServiceMethod> {
    let sig = &method.sig;
    let Some((http_method, path)) = HttpMethod::find(&method.attrs)? else {
        return Err(syn::Error::new_spanned(
            sig,
            "missing HTTP method attribute: add #[get(\"path\")], #[post(\"path\")], ...",
        ));
    };
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "service methods return a call, remove `async`",
        ));
    }
    if method.default.is_some() {
        return Err(syn::Error::new_spanned(
            sig,
            "service methods cannot have a default body",
        ));
    }
    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(sig, "service methods must take `&self`"));
        }
    }

    let shape = analyze_return_type(&sig.output)?;
    let params = parse_params(sig, &path, http_method)?;
    let attrs = method
        .attrs
        .iter()
        .filter(|a| a.path().is_ident("doc") || a.path().is_ident("allow"))
        .cloned()
        .collect();

    Ok(ServiceMethod {
        sig: sig.clone(),
        attrs,
        http_method,
        path,
        params,
        shape,
    })
}

/// Classify the parameters of a method.
///
/// Explicit attributes win; an unattributed parameter named like a path
/// placeholder is a path parameter; anything else is an error.
fn parse_params(
    sig: &syn::Signature,
    path: &str,
    http_method: HttpMethod,
) -> syn::Result<Vec<MethodParam>> {
    let placeholders = extract_path_placeholders(path);
    let mut params = Vec::new();

    for input in &sig.inputs {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "service method parameters must be plain identifiers",
            ));
        };
        let name: Ident = pat_ident.ident.clone();

        let mut kind = None;
        for attr in &pat_type.attrs {
            if let Some(found) = parse_param_attr(attr)? {
                kind = Some(found);
            }
        }
        let kind = match kind {
            Some(kind) => kind,
            None if placeholders.contains(&name.to_string()) => ParamKind::Path(None),
            None => {
                return Err(syn::Error::new_spanned(
                    pat_type,
                    format!(
                        "parameter `{name}` matches no placeholder of \"{path}\"; \
                         add #[path], #[query], #[header(\"Name\")] or #[body]"
                    ),
                ));
            }
        };

        if kind == ParamKind::Body {
            if !http_method.supports_body() {
                return Err(syn::Error::new_spanned(
                    pat_type,
                    format!(
                        "{} requests cannot carry a #[body]",
                        http_method.variant().to_uppercase()
                    ),
                ));
            }
            if params.iter().any(|p: &MethodParam| p.kind == ParamKind::Body) {
                return Err(syn::Error::new_spanned(
                    pat_type,
                    "only one #[body] parameter is allowed",
                ));
            }
        }

        params.push(MethodParam {
            name,
            ty: (*pat_type.ty).clone(),
            kind,
        });
    }

    let bound: Vec<String> = params
        .iter()
        .filter(|p| matches!(p.kind, ParamKind::Path(_)))
        .map(MethodParam::wire_name)
        .collect();
    for placeholder in &placeholders {
        if !bound.contains(placeholder) {
            return Err(syn::Error::new_spanned(
                sig,
                format!("placeholder `{{{placeholder}}}` has no #[path] parameter"),
            ));
        }
    }
    for name in &bound {
        if !placeholders.contains(name) {
            return Err(syn::Error::new_spanned(
                sig,
                format!("#[path] parameter `{name}` has no placeholder in \"{path}\""),
            ));
        }
    }

    Ok(params)
}

/// The trait as users see it, without our attributes.
fn generate_clean_trait(trait_def: &ItemTrait, methods: &[ServiceMethod]) -> TokenStream {
    let vis = &trait_def.vis;
    let name = &trait_def.ident;
    let trait_attrs: Vec<_> = trait_def
        .attrs
        .iter()
        .filter(|a| {
            let path = a.path();
            path.is_ident("doc") || path.is_ident("allow") || path.is_ident("cfg")
        })
        .collect();

    let signatures = methods.iter().map(|m| {
        let attrs = &m.attrs;
        let sig = strip_param_attrs(&m.sig);
        quote! {
            #(#attrs)*
            #sig;
        }
    });

    quote! {
        #(#trait_attrs)*
        #vis trait #name {
            #(#signatures)*
        }
    }
}

fn strip_param_attrs(sig: &syn::Signature) -> syn::Signature {
    let mut clean = sig.clone();
    for input in &mut clean.inputs {
        if let FnArg::Typed(pat_type) = input {
            pat_type
                .attrs
                .retain(|attr| !PARAM_ATTRS.iter().any(|name| attr.path().is_ident(name)));
        }
    }
    clean
}

/// Expansion of a method attribute used outside a `#[service]` trait.
pub(crate) fn expand_stray_method_attr(name: &str, item: TokenStream) -> TokenStream {
    let message = format!("#[{name}] is only valid on a method of a #[service] trait");
    let error = syn::Error::new(proc_macro2::Span::call_site(), message).to_compile_error();
    quote! {
        #error
        #item
    }
}
