use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use serde::Deserialize;
use sf_api_types::{BasketIdentResponse, GIFT_INVALID_USERNAME, PurchaseType, TemplateConstants};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::catalog::Package;
use crate::state::{AppState, Session};
use crate::{ApiResult, ErrorResponse, bad_request, not_found, pages};

/// HTML endpoints answer failures with a bare text body, which the frontend
/// shows verbatim as the toast message.
type PageResult = Result<Html<String>, (StatusCode, String)>;

#[derive(Debug, Deserialize)]
pub(crate) struct GiftQuery {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteForm {
    email: String,
}

fn constants(state: &AppState, session: &Session) -> TemplateConstants {
    TemplateConstants {
        login_required: state.config.login_required,
        is_logged_in: session.is_logged_in(),
        toast: None,
        toast_type: None,
        checkout_theme: "dark".to_owned(),
        locale: "ar_SA".to_owned(),
    }
}

fn page(state: &AppState, session: &Session, title: &str, toast: Option<&str>, body: &str) -> Html<String> {
    Html(pages::layout(title, &constants(state, session), toast, body))
}

fn text_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, String) {
    (status, message.into())
}

fn is_valid_username(username: &str) -> bool {
    (3..=16).contains(&username.len()) && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) async fn index(State(state): State<AppState>) -> Html<String> {
    let session = state.session.read().await;
    page(&state, &session, "الرئيسية", None, &pages::index_body(&state.catalog, &session))
}

pub(crate) async fn package_page(State(state): State<AppState>, Path(id): Path<String>) -> PageResult {
    let package = state
        .catalog
        .get(&id)
        .ok_or_else(|| text_error(StatusCode::NOT_FOUND, "Package not found"))?;
    let session = state.session.read().await;
    Ok(page(
        &state,
        &session,
        package.name,
        None,
        &pages::package_body(package, session.quantity(package.id)),
    ))
}

pub(crate) async fn add_package(State(state): State<AppState>, Path((id, kind)): Path<(String, String)>) -> PageResult {
    add(&state, &id, &kind, None, None).await
}

pub(crate) async fn add_package_with_options(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
    Form(fields): Form<Vec<(String, String)>>,
) -> PageResult {
    add(&state, &id, &kind, None, Some(fields)).await
}

pub(crate) async fn gift_package(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
    Query(query): Query<GiftQuery>,
) -> PageResult {
    let username = query.username.unwrap_or_default();
    add(&state, &id, &kind, Some(username), None).await
}

pub(crate) async fn gift_package_with_options(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
    Query(query): Query<GiftQuery>,
    Form(fields): Form<Vec<(String, String)>>,
) -> PageResult {
    let username = query.username.unwrap_or_default();
    add(&state, &id, &kind, Some(username), Some(fields)).await
}

async fn add(
    state: &AppState,
    id: &str,
    kind: &str,
    gift_to: Option<String>,
    fields: Option<Vec<(String, String)>>,
) -> PageResult {
    let package = state
        .catalog
        .get(id)
        .ok_or_else(|| text_error(StatusCode::NOT_FOUND, "Package not found"))?;
    let purchase_type = PurchaseType::sanitize(kind);
    if !package.availability.allows(purchase_type) {
        return Err(text_error(
            StatusCode::BAD_REQUEST,
            format!("{} cannot be bought as {purchase_type}", package.name),
        ));
    }

    let mut session = state.session.write().await;
    if state.config.login_required && !session.is_logged_in() {
        return Err(text_error(StatusCode::UNAUTHORIZED, "Login required"));
    }

    if let Some(username) = &gift_to {
        if !is_valid_username(username.trim()) {
            debug!(package = id, username, "rejecting gift recipient");
            return Ok(page(state, &session, package.name, Some(GIFT_INVALID_USERNAME), ""));
        }
    }
    let gift_to = gift_to.map(|u| u.trim().to_owned());

    let options = match fields {
        None if package.needs_options() => {
            let body = pages::options_body(package, purchase_type, gift_to.as_deref());
            return Ok(page(state, &session, package.name, None, &body));
        }
        None => Vec::new(),
        Some(fields) => collect_options(package, fields)?,
    };

    let quantity = session.add(package, purchase_type, gift_to, options);
    info!(package = id, %purchase_type, quantity, "added to basket");
    let toast = format!("تمت إضافة {} إلى السلة", package.name);
    let body = pages::package_body(package, quantity);
    Ok(page(state, &session, package.name, Some(&toast), &body))
}

/// Keep only the package's declared options; every one must carry a known choice.
fn collect_options(package: &Package, fields: Vec<(String, String)>) -> Result<Vec<(String, String)>, (StatusCode, String)> {
    let submitted: HashMap<String, String> = fields.into_iter().collect();
    package
        .options
        .iter()
        .map(|option| match submitted.get(option.name) {
            Some(value) if option.choices.contains(&value.as_str()) => {
                Ok((option.name.to_owned(), value.clone()))
            }
            _ => Err(text_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Missing option: {}", option.label),
            )),
        })
        .collect()
}

pub(crate) async fn update_basket(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let mut updates = Vec::with_capacity(fields.len());
    for (field, value) in &fields {
        let id = field
            .strip_prefix("quantity[")
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| bad_request("quantity fields must look like quantity[<package>]"))?;
        let package = state
            .catalog
            .get(id)
            .ok_or_else(|| not_found("package not found"))?;
        let quantity: u32 = value
            .trim()
            .parse()
            .map_err(|_| bad_request("quantity must be a non-negative integer"))?;
        updates.push((package, quantity));
    }

    let mut session = state.session.write().await;
    if updates.iter().any(|(package, _)| session.quantity(package.id) == 0) {
        return Err(not_found("package is not in the basket"));
    }
    for (package, quantity) in updates {
        session.set_quantity(package, quantity);
    }
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn remove_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    if state.catalog.get(&id).is_none() {
        return Err(not_found("package not found"));
    }
    let removed = state.session.write().await.remove(&id);
    debug!(package = id, removed, "remove from basket");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn basket_ident(State(state): State<AppState>) -> ApiResult<BasketIdentResponse> {
    let ident = state
        .session
        .write()
        .await
        .ident()
        .ok_or_else(|| not_found("basket is empty"))?;
    Ok(Json(BasketIdentResponse {
        ident: Some(ident.to_string()),
    }))
}

pub(crate) async fn basket_page(State(state): State<AppState>) -> Html<String> {
    let session = state.session.read().await;
    page(&state, &session, "السلة", None, &pages::basket_body(&state.catalog, &session))
}

pub(crate) async fn login_page(State(state): State<AppState>) -> Html<String> {
    let session = state.session.read().await;
    page(&state, &session, "تسجيل الدخول", None, &pages::login_body())
}

pub(crate) async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Redirect, (StatusCode, String)> {
    let username = form.username.trim();
    if !is_valid_username(username) {
        return Err(text_error(StatusCode::BAD_REQUEST, GIFT_INVALID_USERNAME));
    }
    state.session.write().await.username = Some(username.to_owned());
    info!(username, "signed in");
    Ok(Redirect::to("/"))
}

pub(crate) async fn logout(State(state): State<AppState>) -> Redirect {
    state.session.write().await.username = None;
    Redirect::to("/")
}

pub(crate) async fn quote_page(State(state): State<AppState>) -> Html<String> {
    let session = state.session.read().await;
    page(&state, &session, "النشرة البريدية", None, &pages::quote_body())
}

pub(crate) async fn subscribe_quote(Form(form): Form<QuoteForm>) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let email = form.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(bad_request("email is required"));
    }
    info!(email, "newsletter subscription");
    Ok(StatusCode::NO_CONTENT)
}
