//! Which URLs may be opened as popups.

use regex::Regex;
use sf_api_types::{BASKET_PATH, LOGIN_PATH};
use std::sync::LazyLock;

static PRODUCT_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/package/\S+").expect("static regex"));
static QUOTE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/tier/quote").expect("static regex"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PopupRoute {
    Login,
    Basket,
    Product,
    Quote,
}

impl PopupRoute {
    /// Classify an already-parsed URL. Foreign origins never qualify.
    pub fn classify(page_origin: &str, url_origin: &str, pathname: &str) -> Option<Self> {
        if url_origin != page_origin {
            return None;
        }
        if pathname == LOGIN_PATH {
            Some(Self::Login)
        } else if pathname == BASKET_PATH {
            Some(Self::Basket)
        } else if PRODUCT_PATH.is_match(pathname) {
            Some(Self::Product)
        } else if QUOTE_PATH.is_match(pathname) {
            Some(Self::Quote)
        } else {
            None
        }
    }

    /// Routes that `popstate` can bring back without user interaction.
    pub fn restorable(&self) -> bool {
        !matches!(self, Self::Quote)
    }
}

/// Split an absolute `http(s)://host[:port]/path?query#hash` URL into origin and path.
/// Returns `None` for anything that is not absolute.
pub fn split_origin(url: &str) -> Option<(&str, &str)> {
    let scheme_end = url.find("://")?;
    let after_scheme = &url[scheme_end + 3..];
    let host_len = after_scheme
        .find(['/', '?', '#'])
        .unwrap_or(after_scheme.len());
    if host_len == 0 {
        return None;
    }
    let origin_end = scheme_end + 3 + host_len;
    let rest = &url[origin_end..];
    let path_end = rest.find(['?', '#']).unwrap_or(rest.len());
    let path = &rest[..path_end];
    Some((&url[..origin_end], if path.is_empty() { "/" } else { path }))
}

pub fn is_popup_url(page_origin: &str, url: &str) -> bool {
    route_for(page_origin, url).is_some()
}

pub fn route_for(page_origin: &str, url: &str) -> Option<PopupRoute> {
    let (origin, path) = split_origin(url)?;
    PopupRoute::classify(page_origin, origin, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://shop.example";

    #[test]
    fn recognises_the_four_popup_routes() {
        assert_eq!(route_for(ORIGIN, "https://shop.example/login"), Some(PopupRoute::Login));
        assert_eq!(
            route_for(ORIGIN, "https://shop.example/checkout/basket"),
            Some(PopupRoute::Basket)
        );
        assert_eq!(
            route_for(ORIGIN, "https://shop.example/package/abc123"),
            Some(PopupRoute::Product)
        );
        assert_eq!(
            route_for(ORIGIN, "https://shop.example/tier/quote?tier=2"),
            Some(PopupRoute::Quote)
        );
    }

    #[test]
    fn rejects_everything_else() {
        for url in [
            "https://shop.example/",
            "https://shop.example/category/vip",
            "https://shop.example/package/",
            "https://shop.example/login/extra",
            "https://evil.example/login",
            "https://evil.example/package/abc123",
            "/package/abc123",
            "javascript:alert(1)",
            "",
        ] {
            assert!(!is_popup_url(ORIGIN, url), "{url} must not open a popup");
        }
    }

    #[test]
    fn split_origin_handles_query_and_hash() {
        assert_eq!(
            split_origin("http://localhost:8080/package/7?x=1#top"),
            Some(("http://localhost:8080", "/package/7"))
        );
        assert_eq!(split_origin("https://shop.example"), Some(("https://shop.example", "/")));
        assert_eq!(split_origin("https:///nohost"), None);
    }

    #[test]
    fn quote_popups_are_not_restored_from_history() {
        assert!(PopupRoute::Basket.restorable());
        assert!(!PopupRoute::Quote.restorable());
    }
}
