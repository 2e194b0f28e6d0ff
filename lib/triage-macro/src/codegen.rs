//! Code generation for the `#[service]` macro.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, Type, Visibility};

use crate::attrs::{HttpMethod, MethodParam, ParamKind};

/// Declared return type of a service method.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ReturnShape {
    /// Last path segment, e.g. `PendingCall`.
    pub(crate) raw: String,
    /// Type arguments as written, e.g. `["Vec<ToDoItem>"]`.
    pub(crate) arguments: Vec<String>,
}

/// Message for a `PendingCall` declared without its payload type.
pub(crate) const MISSING_TYPE_ARGUMENT: &str =
    "PendingCall must have a generic type (e.g. PendingCall<Vec<ToDoItem>>)";

/// Analyze a method's declared return type.
///
/// Any path type is accepted: adapters decide at service creation which
/// shapes they handle. A bare `PendingCall` is rejected here already.
pub(crate) fn analyze_return_type(output: &syn::ReturnType) -> syn::Result<ReturnShape> {
    let ty = match output {
        syn::ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                output,
                "service methods must return a call type such as PendingCall<T>",
            ));
        }
        syn::ReturnType::Type(_, ty) => ty.as_ref(),
    };

    let Type::Path(type_path) = ty else {
        return Err(syn::Error::new_spanned(
            ty,
            "service methods must return a call type such as PendingCall<T>",
        ));
    };
    let Some(segment) = type_path.path.segments.last() else {
        return Err(syn::Error::new_spanned(ty, "empty return type path"));
    };

    let raw = segment.ident.to_string();
    let arguments: Vec<String> = match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(type_to_string(ty)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    if raw == "PendingCall" && arguments.is_empty() {
        return Err(syn::Error::new_spanned(ty, MISSING_TYPE_ARGUMENT));
    }

    Ok(ReturnShape { raw, arguments })
}

/// Render a type the way it is usually written: `Vec<ToDoItem>`.
pub(crate) fn type_to_string(ty: &Type) -> String {
    quote!(#ty)
        .to_string()
        .replace(" :: ", "::")
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace("& ", "&")
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
    {
        return segment.ident == "Option";
    }
    false
}

/// Name of the adapter field for a method.
pub(crate) fn adapter_field(method: &Ident) -> Ident {
    format_ident!("adapter_{}", method)
}

/// Generate the client struct and its `ServiceDefinition` impl.
pub(crate) fn generate_client_struct(
    vis: &Visibility,
    trait_name: &Ident,
    client_name: &Ident,
    methods: &[MethodDescription<'_>],
) -> TokenStream {
    let service_name = trait_name.to_string();
    let fields: Vec<_> = methods.iter().map(|m| adapter_field(m.name)).collect();
    let descriptors: Vec<_> = methods.iter().map(generate_descriptor).collect();
    let missing: Vec<_> = methods
        .iter()
        .map(|m| format!("{service_name}::{}: no call adapter resolved", m.name))
        .collect();
    let surplus = format!("{service_name}: more call adapters than methods");
    let doc = format!("Client for [`{trait_name}`], created with `ServiceClient::create`.");

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone)]
        #vis struct #client_name {
            client: ::triage::ServiceClient,
            #( #fields: ::triage::CallAdapter, )*
        }

        impl #client_name {
            /// The service client this service was created from.
            #[must_use]
            pub fn service_client(&self) -> &::triage::ServiceClient {
                &self.client
            }
        }

        impl ::triage::ServiceDefinition for #client_name {
            const NAME: &'static str = #service_name;
            const METHODS: &'static [::triage::MethodDescriptor] = &[ #(#descriptors),* ];

            fn from_parts(
                client: ::triage::ServiceClient,
                adapters: ::std::vec::Vec<::triage::CallAdapter>,
            ) -> ::triage::Result<Self> {
                let mut adapters = adapters.into_iter();
                #(
                    let #fields = adapters
                        .next()
                        .ok_or_else(|| ::triage::Error::configuration(#missing))?;
                )*
                if adapters.next().is_some() {
                    return ::std::result::Result::Err(::triage::Error::configuration(#surplus));
                }
                ::std::result::Result::Ok(Self { client, #(#fields),* })
            }
        }
    }
}

/// What code generation needs to know about one method.
pub(crate) struct MethodDescription<'a> {
    pub(crate) name: &'a Ident,
    pub(crate) http_method: HttpMethod,
    pub(crate) path: &'a str,
    pub(crate) params: &'a [MethodParam],
    pub(crate) shape: &'a ReturnShape,
}

fn endpoint_expr(method: &MethodDescription<'_>) -> TokenStream {
    let variant = format_ident!("{}", method.http_method.variant());
    let path = method.path;
    quote! { ::triage::Endpoint::new(::triage::Method::#variant, #path) }
}

fn generate_descriptor(method: &MethodDescription<'_>) -> TokenStream {
    let name = method.name.to_string();
    let endpoint = endpoint_expr(method);
    let raw = &method.shape.raw;
    let arguments = &method.shape.arguments;
    quote! {
        ::triage::MethodDescriptor::new(
            #name,
            #endpoint,
            ::triage::ReturnShape::new(#raw, &[ #(#arguments),* ]),
        )
    }
}

/// Generate the body of one service method.
pub(crate) fn generate_method_body(method: &MethodDescription<'_>) -> TokenStream {
    let endpoint = endpoint_expr(method);
    let field = adapter_field(method.name);

    let path_params: Vec<_> = method
        .params
        .iter()
        .filter(|p| matches!(p.kind, ParamKind::Path(_)))
        .map(|p| {
            let key = p.wire_name();
            let name = &p.name;
            quote! { (#key, ::std::string::ToString::to_string(&#name)) }
        })
        .collect();

    let configure: Vec<_> = method
        .params
        .iter()
        .filter_map(generate_param_code)
        .collect();

    quote! {
        const ENDPOINT: ::triage::Endpoint = #endpoint;
        let request = self.client.request(
            &ENDPOINT,
            &[ #(#path_params),* ],
            |builder: ::triage::RequestBuilder| -> ::triage::Result<::triage::RequestBuilder> {
                #(#configure)*
                ::std::result::Result::Ok(builder)
            },
        );
        self.client.new_call(request, &self.#field)
    }
}

/// Statement applying a non-path parameter to `builder`.
fn generate_param_code(param: &MethodParam) -> Option<TokenStream> {
    let name = &param.name;
    let key = param.wire_name();
    let code = match &param.kind {
        ParamKind::Path(_) => return None,
        ParamKind::Query(_) if is_option_type(&param.ty) => quote! {
            let builder = match &#name {
                ::std::option::Option::Some(value) => {
                    builder.query(#key, &::std::string::ToString::to_string(value))
                }
                ::std::option::Option::None => builder,
            };
        },
        ParamKind::Query(_) => quote! {
            let builder = builder.query(#key, &::std::string::ToString::to_string(&#name));
        },
        ParamKind::Header(_) if is_option_type(&param.ty) => quote! {
            let builder = match &#name {
                ::std::option::Option::Some(value) => {
                    builder.header(#key, ::std::string::ToString::to_string(value))
                }
                ::std::option::Option::None => builder,
            };
        },
        ParamKind::Header(_) => quote! {
            let builder = builder.header(#key, ::std::string::ToString::to_string(&#name));
        },
        ParamKind::Body => quote! {
            let builder = builder.json(&#name)?;
        },
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;

    #[test]
    fn pending_call_shape() {
        let output: syn::ReturnType = parse_quote!(-> PendingCall<Vec<ToDoItem>>);
        let shape = analyze_return_type(&output).expect("valid shape");
        assert_eq!(shape.raw, "PendingCall");
        assert_eq!(shape.arguments, vec!["Vec<ToDoItem>".to_string()]);
    }

    #[test]
    fn qualified_path_uses_last_segment() {
        let output: syn::ReturnType = parse_quote!(-> triage::RawCall<std::collections::HashMap<String, u32>>);
        let shape = analyze_return_type(&output).expect("valid shape");
        assert_eq!(shape.raw, "RawCall");
        assert_eq!(
            shape.arguments,
            vec!["std::collections::HashMap<String, u32>".to_string()]
        );
    }

    #[test]
    fn bare_pending_call_is_rejected() {
        let output: syn::ReturnType = parse_quote!(-> PendingCall);
        let err = analyze_return_type(&output).expect_err("must fail");
        assert_eq!(err.to_string(), MISSING_TYPE_ARGUMENT);
    }

    #[test]
    fn missing_return_type_is_rejected() {
        let output: syn::ReturnType = parse_quote!();
        assert!(analyze_return_type(&output).is_err());
    }

    #[test]
    fn option_detection() {
        assert!(is_option_type(&parse_quote!(Option<u32>)));
        assert!(is_option_type(&parse_quote!(std::option::Option<&str>)));
        assert!(!is_option_type(&parse_quote!(u32)));
    }
}
