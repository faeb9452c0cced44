//! Server-rendered HTML shaped like the hosted webstore's templates.

use crate::catalog::{Availability, Catalog, Package};
use crate::state::Session;
use sf_api_types::{PurchaseType, TemplateConstants, package_page_path, remove_package_path};
use std::fmt::Write as _;

const STORE_NAME: &str = "متجر السيرفر";

pub(crate) fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full document. `toast` lands on `.site[data-toast]`, which is what the
/// frontend reads after an add request.
pub(crate) fn layout(title: &str, constants: &TemplateConstants, toast: Option<&str>, body: &str) -> String {
    let constants_json = serde_json::to_string(constants).unwrap_or_else(|_| "{}".to_owned());
    let toast_attr = toast
        .map(|t| format!(r#" data-toast="{}""#, escape(t)))
        .unwrap_or_default();
    format!(
        r#"<!doctype html>
<html lang="ar" dir="rtl">
<head>
<meta charset="utf-8">
<title>{title} | {STORE_NAME}</title>
<link rel="stylesheet" href="/pkg/storefront.css">
<script>
window.__kTemplateConstants = {constants_json};
window.__ = (text) => text;
</script>
</head>
<body>
<div class="site"{toast_attr}>
<header>
<button class="toggle-navigation" type="button">القائمة</button>
<nav class="site-navigation"><div class="menu">
<button class="close-navigation" type="button">إغلاق</button>
<div class="menu-item"><a href="/">الرئيسية</a></div>
<div class="menu-item"><button class="toggle" type="button">المنتجات</button><div class="submenu"><a href="/package/activation">تفعيل</a></div></div>
<div class="menu-item"><a href="/tier/quote">اشترك في النشرة</a></div>
</div></nav>
<a href="/login">تسجيل الدخول</a>
<button class="open-basket" type="button">السلة</button>
</header>
<main>{body}</main>
</div>
<script type="module">import init from "/pkg/storefront_wasm.js"; init();</script>
</body>
</html>"#,
        title = escape(title),
    )
}

pub(crate) fn package_actions(package: &Package, quantity: u32) -> String {
    let id = escape(package.id);
    let zero = quantity == 0;
    let hidden = |show: bool| if show { "" } else { " hidden" };
    let max = package
        .max_quantity
        .map(|m| format!(r#" max="{m}""#))
        .unwrap_or_default();

    let mut out = format!(
        r#"<div class="product-actions" data-package="{id}" data-package-type="{}">"#,
        package.availability.as_str()
    );
    if package.availability.allows(PurchaseType::Single) {
        let _ = write!(
            out,
            r#"<a class="add" href="/checkout/packages/add/{id}/single"{}>أضف إلى السلة</a>"#,
            hidden(zero)
        );
    }
    if package.availability.allows(PurchaseType::Subscribe) {
        let _ = write!(
            out,
            r#"<a class="subscribe" href="/checkout/packages/add/{id}/subscribe"{}>اشترك</a>"#,
            hidden(zero)
        );
    }
    let _ = write!(
        out,
        r##"<a class="gift" href="#">أهدِ</a>
<div class="quantity-field"{}><button class="decrease" type="button">-</button><input class="quantity" type="number" name="{}" min="0"{max} value="{quantity}"><button class="increase" type="button">+</button></div>
<button class="open-basket open-basket-cta" type="button"{}>عرض السلة</button>
</div>"##,
        hidden(!zero),
        escape(&package.quantity_field()),
        hidden(!zero),
    );
    out
}

fn package_card(package: &Package, quantity: u32) -> String {
    let countdown = package
        .countdown_secs
        .map(|s| format!(r#"<p class="countdown" data-countdown="{s}"></p>"#))
        .unwrap_or_default();
    format!(
        r#"<article class="store-product">
<h3><a href="{href}">{name}</a></h3>
<p>{description}</p>
<p class="price">{price:.2} SAR <small>{label}</small></p>
{countdown}
{actions}
</article>"#,
        href = package_page_path(&package.id.into()),
        name = escape(package.name),
        description = escape(package.description),
        price = package.price,
        label = availability_label(package.availability),
        actions = package_actions(package, quantity),
    )
}

pub(crate) fn index_body(catalog: &Catalog, session: &Session) -> String {
    let mut out = String::from(r#"<section class="store-products">"#);
    for package in catalog.iter() {
        out.push_str(&package_card(package, session.quantity(package.id)));
    }
    out.push_str(r#"</section><p>كود الخصم: <span class="copy" data-copy="RAMADAN10">RAMADAN10</span></p>"#);
    out
}

pub(crate) fn package_body(package: &Package, quantity: u32) -> String {
    format!(
        r#"<div data-popup class="store-product-full">{}</div>"#,
        package_card(package, quantity)
    )
}

/// The `[data-popup].store-product-options` fragment for a variable package.
pub(crate) fn options_body(package: &Package, purchase_type: PurchaseType, gift_to: Option<&str>) -> String {
    let mut action = format!("/checkout/packages/add/{}/{}", escape(package.id), purchase_type);
    if let Some(username) = gift_to {
        let _ = write!(action, "/gift?username={}", escape(username));
    }
    let mut fields = String::new();
    for option in &package.options {
        let _ = write!(
            fields,
            r#"<label>{}<select name="{}" required><option value="">-</option>"#,
            escape(option.label),
            escape(option.name)
        );
        for choice in option.choices {
            let choice = escape(choice);
            let _ = write!(fields, r#"<option value="{choice}">{choice}</option>"#);
        }
        fields.push_str("</select></label>");
    }
    format!(
        r#"<div data-popup class="store-product-options"><form method="post" action="{action}">
<h2>{name}</h2>
{fields}
<div class="actions"><button class="btn-primary" type="submit">متابعة</button></div>
</form></div>"#,
        name = escape(package.name),
    )
}

pub(crate) fn login_body() -> String {
    r#"<div data-popup><form class="store-form" method="post" action="/login">
<h2>تسجيل الدخول</h2>
<input type="text" name="username" required class="form-control">
<div class="actions"><button class="btn-primary" type="submit">دخول</button></div>
</form></div>"#
        .to_owned()
}

pub(crate) fn quote_body() -> String {
    r#"<div data-popup><div class="store-quote"><form method="post" action="/tier/quote">
<h2>اشترك في النشرة</h2>
<input type="email" name="email" required class="form-control">
<div class="actions"><button class="btn-primary" type="submit">اشترك</button></div>
</form></div></div>"#
        .to_owned()
}

/// Empty baskets render no fragment at all.
pub(crate) fn basket_body(catalog: &Catalog, session: &Session) -> String {
    if session.is_empty() {
        return r#"<p class="basket-empty">السلة فارغة</p>"#.to_owned();
    }

    let mut items = String::new();
    let mut count = 0;
    for (id, line) in session.lines() {
        let Some(package) = catalog.get(id) else {
            continue;
        };
        count += line.quantity;
        let gift = line
            .gift_to
            .as_deref()
            .map(|u| format!(r#"<span class="gift-to">🎁 {}</span>"#, escape(u)))
            .unwrap_or_default();
        let options: String = line
            .options
            .iter()
            .map(|(k, v)| format!(r#"<span class="option">{}: {}</span>"#, escape(k), escape(v)))
            .collect();
        let max = package
            .max_quantity
            .map(|m| format!(r#" max="{m}""#))
            .unwrap_or_default();
        let _ = write!(
            items,
            r#"<div class="basket-item" data-package="{id}">
<span class="name">{name}</span><span class="type">{kind}</span>{gift}{options}
<div class="quantity-field"><button class="decrease" type="button">-</button><input class="quantity" type="number" name="{field}" min="0"{max} value="{quantity}"><button class="increase" type="button">+</button></div>
<a class="remove" href="{remove}">حذف</a>
</div>"#,
            id = escape(id),
            name = escape(package.name),
            kind = line.purchase_type,
            field = escape(&package.quantity_field()),
            quantity = line.quantity,
            remove = remove_package_path(&id.as_str().into()),
        );
    }

    format!(
        r#"<div data-popup><form class="basket" method="post" action="/checkout/update">
<div class="basket-header"><h2>السلة</h2></div>
<div class="basket-second-header"><span class="count">{count}</span></div>
<div class="basket-content">{items}</div>
<div class="basket-redeem"><span class="redeemed"></span></div>
<div class="basket-checkout"><span class="total">{total:.2} SAR</span><button class="checkout" type="button">الدفع</button></div>
</form></div>"#,
        total = session.total(catalog),
    )
}

pub(crate) fn availability_label(availability: Availability) -> &'static str {
    match availability {
        Availability::Single => "شراء لمرة واحدة",
        Availability::Subscribe => "اشتراك",
        Availability::Both => "شراء أو اشتراك",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_attribute_breakers() {
        assert_eq!(escape(r#"<a href="x">'&'"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;");
    }

    #[test]
    fn zero_quantity_shows_add_and_hides_the_quantity_field() {
        let catalog = Catalog::seeded();
        let html = package_actions(catalog.get("priority-entry").unwrap(), 0);
        assert!(html.contains(r#"data-package="priority-entry""#));
        assert!(html.contains(r#"data-package-type="both""#));
        assert!(html.contains(r#"<a class="add" href="/checkout/packages/add/priority-entry/single">"#));
        assert!(html.contains(r#"<div class="quantity-field" hidden>"#));
    }

    #[test]
    fn options_form_posts_back_to_the_gift_path() {
        let catalog = Catalog::seeded();
        let html = options_body(catalog.get("interview").unwrap(), PurchaseType::Single, Some("steve"));
        assert!(html.contains(r#"action="/checkout/packages/add/interview/single/gift?username=steve""#));
        assert!(html.contains(r#"name="slot""#));
    }
}
