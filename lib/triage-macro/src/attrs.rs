//! Attribute parsing for the `#[service]` macro.

use syn::{Ident, Type};

/// HTTP method of a service method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// Attribute names, in the order they are tried.
    pub(crate) const ALL: [(&'static str, Self); 7] = [
        ("get", Self::Get),
        ("post", Self::Post),
        ("put", Self::Put),
        ("delete", Self::Delete),
        ("patch", Self::Patch),
        ("head", Self::Head),
        ("options", Self::Options),
    ];

    /// Variant name of `triage::Method`.
    #[must_use]
    pub(crate) const fn variant(self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::Post => "Post",
            Self::Put => "Put",
            Self::Delete => "Delete",
            Self::Patch => "Patch",
            Self::Head => "Head",
            Self::Options => "Options",
        }
    }

    /// Returns true if a `#[body]` parameter is allowed.
    #[must_use]
    pub(crate) const fn supports_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }

    /// Find the method attribute among `attrs`.
    pub(crate) fn find(attrs: &[syn::Attribute]) -> syn::Result<Option<(Self, String)>> {
        for attr in attrs {
            let found = Self::ALL
                .iter()
                .find(|(name, _)| attr.path().is_ident(name));
            if let Some((_, method)) = found {
                let path = parse_string_arg(attr)?;
                return Ok(Some((*method, path)));
            }
        }
        Ok(None)
    }
}

/// Parameter kind for method arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParamKind {
    /// `#[path]` or `#[path("name")]`.
    Path(Option<String>),
    /// `#[query]` or `#[query("name")]`.
    Query(Option<String>),
    /// `#[header("Name")]`.
    Header(String),
    /// `#[body]`, serialized as JSON.
    Body,
}

/// Parameter attribute names stripped from the emitted trait.
pub(crate) const PARAM_ATTRS: &[&str] = &["path", "query", "header", "body"];

/// A parsed method parameter.
#[derive(Debug)]
pub(crate) struct MethodParam {
    /// Parameter name from the signature.
    pub(crate) name: Ident,
    /// Parameter type.
    pub(crate) ty: Type,
    /// How the value reaches the request.
    pub(crate) kind: ParamKind,
}

impl MethodParam {
    /// Wire name: the alias if any, else the parameter name.
    pub(crate) fn wire_name(&self) -> String {
        match &self.kind {
            ParamKind::Path(Some(alias)) | ParamKind::Query(Some(alias)) => alias.clone(),
            ParamKind::Header(name) => name.clone(),
            _ => self.name.to_string(),
        }
    }
}

/// Parse a parameter attribute, `None` if it is not one of ours.
pub(crate) fn parse_param_attr(attr: &syn::Attribute) -> syn::Result<Option<ParamKind>> {
    let path = attr.path();

    if path.is_ident("path") {
        return parse_optional_string_arg(attr).map(|alias| Some(ParamKind::Path(alias)));
    }
    if path.is_ident("query") {
        return parse_optional_string_arg(attr).map(|alias| Some(ParamKind::Query(alias)));
    }
    if path.is_ident("header") {
        return parse_string_arg(attr).map(|name| Some(ParamKind::Header(name)));
    }
    if path.is_ident("body") {
        return Ok(Some(ParamKind::Body));
    }
    Ok(None)
}

/// Parse `#[attr("value")]`.
pub(crate) fn parse_string_arg(attr: &syn::Attribute) -> syn::Result<String> {
    match &attr.meta {
        syn::Meta::List(meta_list) => {
            let lit: syn::LitStr = syn::parse2(meta_list.tokens.clone())?;
            Ok(lit.value())
        }
        _ => Err(syn::Error::new_spanned(attr, "expected a string argument")),
    }
}

/// Parse `#[attr]` or `#[attr("value")]`.
fn parse_optional_string_arg(attr: &syn::Attribute) -> syn::Result<Option<String>> {
    match &attr.meta {
        syn::Meta::Path(_) => Ok(None),
        _ => parse_string_arg(attr).map(Some),
    }
}

/// Placeholder names of a path template.
///
/// `todos/{id}/comments/{comment_id}` yields `["id", "comment_id"]`.
#[must_use]
pub(crate) fn extract_path_placeholders(path: &str) -> Vec<String> {
    let mut placeholders = Vec::new();
    let mut rest = path;
    while let Some((_, after)) = rest.split_once('{') {
        let Some((name, tail)) = after.split_once('}') else {
            break;
        };
        if !name.is_empty() {
            placeholders.push(name.to_string());
        }
        rest = tail;
    }
    placeholders
}
