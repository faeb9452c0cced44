//! HTTP client for the webstore's basket endpoints.
//!
//! Everything is same-origin, so paths are passed through as-is. Responses
//! are mostly server-rendered HTML; the fragments the popup layer needs are
//! pulled out with an inert `<template>`.

use crate::dom;
use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder, Response};
use sf_api_types::{
    AddPackageRequest, BasketIdentResponse, IDENT_PATH, PackageId, UPDATE_PATH, remove_package_path,
};
use sf_basket::{AddResponse, BackendError, BasketBackend};
use std::collections::BTreeMap;
use wasm_bindgen::JsCast;
use web_sys::{AbortSignal, DocumentFragment, FormData, HtmlFormElement, UrlSearchParams};

fn fetch_error(err: gloo_net::Error) -> BackendError {
    match err {
        gloo_net::Error::JsError(e) if e.name == "AbortError" => BackendError::Aborted,
        other => BackendError::Network(other.to_string()),
    }
}

fn status_error(resp: &Response) -> BackendError {
    BackendError::Status {
        status: resp.status(),
        status_text: resp.status_text(),
    }
}

fn encode(pairs: &[(String, String)]) -> Result<UrlSearchParams, BackendError> {
    let params = UrlSearchParams::new().map_err(|e| BackendError::Network(format!("{:?}", e)))?;
    for (key, value) in pairs {
        params.append(key, value);
    }
    Ok(params)
}

async fn send(builder: RequestBuilder) -> Result<Response, BackendError> {
    builder.send().await.map_err(fetch_error)
}

async fn post_urlencoded(
    builder: RequestBuilder,
    pairs: &[(String, String)],
) -> Result<Response, BackendError> {
    let request = builder.body(encode(pairs)?).map_err(fetch_error)?;
    request.send().await.map_err(fetch_error)
}

/// GET a page as text. Non-2xx is an error.
pub async fn fetch_page(url: &str, signal: Option<&AbortSignal>) -> Result<String, BackendError> {
    let resp = send(Request::get(url).abort_signal(signal)).await?;
    if !resp.ok() {
        return Err(status_error(&resp));
    }
    resp.text().await.map_err(fetch_error)
}

/// POST form fields url-encoded; only the status matters.
pub async fn post_form(url: &str, fields: &[(String, String)]) -> Result<(), BackendError> {
    let resp = post_urlencoded(Request::post(url), fields).await?;
    if resp.ok() { Ok(()) } else { Err(status_error(&resp)) }
}

/// Every entry of a form, in document order. File inputs are skipped.
pub fn form_fields(form: &HtmlFormElement) -> Vec<(String, String)> {
    let Ok(data) = FormData::new_with_form(form) else {
        return Vec::new();
    };
    let Ok(Some(entries)) = js_sys::try_iter(&data) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let pair = entry.dyn_into::<js_sys::Array>().ok()?;
            Some((pair.get(0).as_string()?, pair.get(1).as_string()?))
        })
        .collect()
}

/// Pull the facts the add flow needs out of a response page.
pub fn parse_add_response(ok: bool, body: String) -> AddResponse<DocumentFragment> {
    let Some(parsed) = dom::parse(&body) else {
        return AddResponse {
            ok,
            has_site: false,
            toast: None,
            options_form: None,
            body,
        };
    };
    let site = parsed.query_selector(".site").ok().flatten();
    let toast = site.as_ref().and_then(|s| dom::data(s, "toast"));
    let options_form = parsed
        .query_selector("[data-popup].store-product-options")
        .ok()
        .flatten()
        .map(|el| dom::move_children(&el));
    AddResponse {
        ok,
        has_site: site.is_some(),
        toast,
        options_form,
        body,
    }
}

/// The webstore over `fetch`.
#[derive(Clone, Default)]
pub struct FetchBackend;

impl FetchBackend {
    pub fn new() -> Self {
        Self
    }

    fn add_builder(request: &AddPackageRequest, post: bool) -> RequestBuilder {
        let path = request.path();
        let builder = if post {
            Request::post(&path)
        } else {
            Request::get(&path)
        };
        match &request.gift_to {
            Some(username) => builder.query([("username", username.as_str())]),
            None => builder,
        }
    }

    async fn read_add_response(resp: Response) -> Result<AddResponse<DocumentFragment>, BackendError> {
        let ok = resp.ok();
        let body = resp.text().await.map_err(fetch_error)?;
        Ok(parse_add_response(ok, body))
    }
}

#[async_trait(?Send)]
impl BasketBackend for FetchBackend {
    type OptionsForm = DocumentFragment;

    async fn add_package(
        &self,
        request: &AddPackageRequest,
    ) -> Result<AddResponse<DocumentFragment>, BackendError> {
        let resp = send(Self::add_builder(request, false)).await?;
        Self::read_add_response(resp).await
    }

    async fn add_package_with_options(
        &self,
        request: &AddPackageRequest,
        fields: &[(String, String)],
    ) -> Result<AddResponse<DocumentFragment>, BackendError> {
        let mut pairs = fields.to_vec();
        pairs.push((
            "username".to_owned(),
            request.gift_to.clone().unwrap_or_default(),
        ));
        pairs.push(("submit".to_owned(), "1".to_owned()));
        let resp = post_urlencoded(Self::add_builder(request, true), &pairs).await?;
        let mut parsed = Self::read_add_response(resp).await?;
        // The options step never asks for more options.
        parsed.options_form = None;
        Ok(parsed)
    }

    async fn update_quantities(&self, quantities: &BTreeMap<String, u32>) -> Result<(), BackendError> {
        let pairs: Vec<(String, String)> = quantities
            .iter()
            .map(|(field, qty)| (field.clone(), qty.to_string()))
            .collect();
        post_form(UPDATE_PATH, &pairs).await
    }

    async fn remove_package(&self, package_id: &PackageId) -> Result<(), BackendError> {
        let resp = send(Request::get(&remove_package_path(package_id))).await?;
        if resp.ok() { Ok(()) } else { Err(status_error(&resp)) }
    }

    async fn basket_ident(&self) -> Result<Option<String>, BackendError> {
        let resp = send(Request::get(IDENT_PATH)).await?;
        if !resp.ok() {
            return Err(status_error(&resp));
        }
        let parsed: BasketIdentResponse = resp
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        Ok(parsed.ident)
    }
}
