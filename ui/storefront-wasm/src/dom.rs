//! DOM helpers.
//!
//! Thin wrappers over `web_sys` used by every other module. Lookups return
//! `Option`/`Vec` so callers decide how missing markup is handled.

use sf_core::timing::parse_css_duration;
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, DocumentFragment, Element, HtmlElement, HtmlTemplateElement, Window};

pub fn window() -> Window {
    gloo_utils::window()
}

pub fn document() -> Document {
    gloo_utils::document()
}

pub fn body() -> HtmlElement {
    gloo_utils::body()
}

pub fn query(selector: &str) -> Option<Element> {
    document().query_selector(selector).ok()?
}

pub fn query_all(selector: &str) -> Vec<Element> {
    match document().query_selector_all(selector) {
        Ok(nl) => collect_nodes(&nl),
        Err(_) => Vec::new(),
    }
}

pub fn query_within(parent: &Element, selector: &str) -> Option<Element> {
    parent.query_selector(selector).ok()?
}

pub fn query_all_within(parent: &Element, selector: &str) -> Vec<Element> {
    match parent.query_selector_all(selector) {
        Ok(nl) => collect_nodes(&nl),
        Err(_) => Vec::new(),
    }
}

fn collect_nodes(nl: &web_sys::NodeList) -> Vec<Element> {
    let mut v = Vec::new();
    for i in 0..nl.length() {
        if let Some(e) = nl.item(i) {
            if let Ok(el) = e.dyn_into::<Element>() {
                v.push(el);
            }
        }
    }
    v
}

pub fn add_class(el: &Element, cls: &str) {
    let _ = el.class_list().add_1(cls);
}

pub fn remove_class(el: &Element, cls: &str) {
    let _ = el.class_list().remove_1(cls);
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

pub fn has_class(el: &Element, cls: &str) -> bool {
    el.class_list().contains(cls)
}

/// Add every space-separated class in `classes`.
pub fn add_classes(el: &Element, classes: &str) {
    for cls in classes.split_whitespace() {
        add_class(el, cls);
    }
}

pub fn create_element(tag: &str) -> Result<HtmlElement, JsValue> {
    document().create_element(tag)?.dyn_into::<HtmlElement>().map_err(Into::into)
}

pub fn data(el: &Element, name: &str) -> Option<String> {
    el.get_attribute(&format!("data-{name}"))
}

pub fn set_hidden(el: &Element, hidden: bool) {
    if let Some(html) = el.dyn_ref::<HtmlElement>() {
        html.set_hidden(hidden);
    }
}

pub fn closest(el: &Element, selector: &str) -> Option<Element> {
    el.closest(selector).ok()?
}

/// `no-scroll` on the root element locks page scrolling behind popups.
pub fn set_scroll_lock(locked: bool) {
    if let Some(root) = document().document_element() {
        toggle_class(&root, "no-scroll", locked);
    }
}

pub fn computed_property(el: &Element, name: &str) -> String {
    window()
        .get_computed_style(el)
        .ok()
        .flatten()
        .and_then(|style| style.get_property_value(name).ok())
        .unwrap_or_default()
}

/// The element's `--fade-duration`, 300ms when unset.
pub fn fade_duration(el: &Element) -> Duration {
    parse_css_duration(&computed_property(el, "--fade-duration"))
}

pub fn set_translate(el: &Element, value: &str) {
    if let Some(html) = el.dyn_ref::<HtmlElement>() {
        let style = html.style();
        if value.is_empty() {
            let _ = style.remove_property("translate");
        } else {
            let _ = style.set_property("translate", value);
        }
    }
}

/// Parsed fragment of a fetched document.
pub struct Extracted {
    pub title: String,
    pub content: DocumentFragment,
}

/// Parse `html` in an inert template and move the children of the first
/// `selector` match into a fragment.
pub fn extract(html: &str, selector: &str) -> Option<Extracted> {
    let template: HtmlTemplateElement = document().create_element("template").ok()?.dyn_into().ok()?;
    template.set_inner_html(html);
    let parsed = template.content();
    let found = parsed.query_selector(selector).ok()??;
    let title = parsed
        .query_selector("title")
        .ok()
        .flatten()
        .and_then(|t| t.text_content())
        .unwrap_or_default();
    Some(Extracted {
        title,
        content: move_children(&found),
    })
}

/// Parse `html` and return the template content whole.
pub fn parse(html: &str) -> Option<DocumentFragment> {
    let template: HtmlTemplateElement = document().create_element("template").ok()?.dyn_into().ok()?;
    template.set_inner_html(html);
    Some(template.content())
}

pub fn move_children(from: &Element) -> DocumentFragment {
    let fragment = document().create_document_fragment();
    while let Some(child) = from.first_child() {
        if fragment.append_child(&child).is_err() {
            break;
        }
    }
    fragment
}

pub fn navigate(href: &str) {
    let _ = window().location().set_href(href);
}
