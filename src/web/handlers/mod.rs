pub mod word;
pub mod words;

use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use serde::Serialize;
use std::sync::Arc;

use crate::categories::category_lookup;
use crate::client::WordsApi;
use crate::config::CONFIG;
use crate::web::templates;

pub type ApiHandle = Arc<dyn WordsApi>;

/// One rendered error row; pages show these in a uniform error summary.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub text: String,
}

pub fn error_list(messages: &[String]) -> Vec<ErrorMessage> {
    messages
        .iter()
        .map(|message| ErrorMessage {
            text: message.clone(),
        })
        .collect()
}

/// A category checkbox row for the create and update forms.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryOption {
    pub id: String,
    pub name: &'static str,
    pub checked: bool,
}

pub fn category_options(selected: &[String]) -> Vec<CategoryOption> {
    category_lookup()
        .into_iter()
        .map(|(id, name)| CategoryOption {
            checked: selected.contains(&id),
            id,
            name,
        })
        .collect()
}

/// The email-form identity recorded against moderation actions. Session
/// handling is out of scope, so this comes from configuration.
pub fn acting_user() -> String {
    CONFIG
        .get()
        .map(|config| config.admin.email.clone())
        .unwrap_or_else(|| "admin@wordgate.local".to_string())
}

pub(crate) fn render_page(name: &str, ctx: minijinja::Value) -> Result<Html<String>, StatusCode> {
    templates::render(name, ctx).map_err(|e| {
        log::error!("Failed to render {name}: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub(crate) fn redirect_with_query(path: &str, params: &[(&str, &str)]) -> Redirect {
    let query = serde_urlencoded::to_string(params).unwrap_or_default();

    Redirect::to(&format!("{path}?{query}"))
}

/// Decoded body pairs of an HTML form submission. `axum::Form` cannot express
/// repeated keys (the category checkboxes), so forms are decoded pairwise.
pub(crate) fn form_pairs(body: &[u8]) -> Vec<(String, String)> {
    serde_urlencoded::from_bytes(body).unwrap_or_default()
}

pub(crate) fn form_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

pub(crate) fn form_values(pairs: &[(String, String)], key: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value.clone())
        .collect()
}
