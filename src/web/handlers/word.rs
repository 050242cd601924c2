use axum::{
    extract::{Path, Query, RawForm},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension,
};
use log::{error, info};
use minijinja::context;
use serde::Deserialize;

use crate::categories::{category_lookup, category_names};
use crate::client::{PatchWordRequest, WordPatch};
use crate::mapper::{categories_history, super_restricted_history_cells, RestrictedWordViewModel};
use crate::update::{decide_update, CurrentWordState, RequestedWordChange, UpdateFields};

use super::{
    acting_user, category_options, error_list, form_pairs, form_value, form_values, render_page,
    ApiHandle,
};

#[derive(Deserialize, Default)]
pub struct WordQuery {
    #[serde(rename = "setSuperRestricted")]
    pub set_super_restricted: Option<String>,
    #[serde(rename = "setCategories")]
    pub set_categories: Option<String>,
}

fn render_word_page(
    word: &RestrictedWordViewModel,
    query: &WordQuery,
    errors: &[String],
) -> Result<Html<String>, StatusCode> {
    let lookup = category_lookup();

    let word_category_history: Vec<_> = categories_history(&word.categories_audit_log)
        .into_iter()
        .map(|entry| {
            context! {
                changed_at => entry.changed_at,
                changed_by => entry.changed_by,
                changed_reason => entry.changed_reason,
                categories => category_names(&lookup, &entry.categories),
            }
        })
        .collect();

    render_page(
        "word.html",
        context! {
            word,
            word_categories => category_names(&lookup, &word.categories),
            category_options => category_options(&word.categories),
            word_history => super_restricted_history_cells(&word.super_restricted_audit_log),
            word_category_history,
            set_super_restricted => query.set_super_restricted.as_deref(),
            set_categories => query.set_categories.as_deref(),
            errors => error_list(errors),
        },
    )
}

pub async fn get_word(
    Extension(api): Extension<ApiHandle>,
    Path(id): Path<String>,
    Query(query): Query<WordQuery>,
) -> Result<Html<String>, StatusCode> {
    let word = match api.get_single_word(&id) {
        Ok(word) => word,
        Err(api_error) => {
            return render_page(
                "word.html",
                context! { errors => error_list(&api_error.messages()) },
            )
        }
    };

    render_word_page(&word, &query, &[])
}

fn valid_word_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// The redirect target carries flags naming which field(s) the patch set, so
/// the detail page can confirm what changed.
fn updated_word_url(id: &str, fields: UpdateFields) -> String {
    let flags = match fields {
        UpdateFields::SuperRestricted => "?setSuperRestricted=true",
        UpdateFields::Categories => "?setCategories=true",
        UpdateFields::Both => "?setSuperRestricted=true&setCategories=true",
    };

    format!("/word/{id}{flags}")
}

pub async fn post_update_word(
    Extension(api): Extension<ApiHandle>,
    Path(id): Path<String>,
    RawForm(body): RawForm,
) -> Result<Response, StatusCode> {
    let pairs = form_pairs(&body);

    let super_restricted = form_value(&pairs, "superRestricted") == Some("true");
    let categories = form_values(&pairs, "categories");
    let changed_reason = form_value(&pairs, "changedReason").map(str::to_string);

    if !valid_word_id(&id) {
        let message = format!("Provided id: ({id}) is not valid. Must be alpha numeric.");
        error!("{message}");

        return Ok(render_page(
            "word.html",
            context! { errors => error_list(&[message]) },
        )?
        .into_response());
    }

    let current = match api.get_single_word(&id) {
        Ok(word) => word,
        Err(api_error) => {
            return Ok(render_page(
                "word.html",
                context! { errors => error_list(&api_error.messages()) },
            )?
            .into_response())
        }
    };

    let requested = RequestedWordChange {
        super_restricted,
        categories: categories.clone(),
        changed_reason: changed_reason.clone(),
    };

    let current_state = CurrentWordState {
        super_restricted: current.super_restricted,
        categories: current.categories.clone(),
    };

    let fields = match decide_update(&current_state, &requested) {
        Ok(fields) => fields,
        Err(api_error) => {
            return Ok(
                render_word_page(&current, &WordQuery::default(), &api_error.messages())?
                    .into_response(),
            )
        }
    };

    let patch = match fields {
        UpdateFields::SuperRestricted => WordPatch::SuperRestricted { super_restricted },
        UpdateFields::Categories => WordPatch::Categories {
            categories,
            changed_reason: changed_reason.unwrap_or_default(),
        },
        UpdateFields::Both => WordPatch::Both {
            super_restricted,
            categories,
            changed_reason: changed_reason.unwrap_or_default(),
        },
    };

    info!(
        "Attempting to update \"{}\" with id \"{}\" ({})",
        current.word, id, fields
    );

    let request = PatchWordRequest {
        id: id.clone(),
        patched_by: acting_user(),
        patch,
    };

    match api.patch_word(&request) {
        Ok(()) => {
            info!(
                "Successfully updated \"{}\" with id \"{}\"",
                current.word, id
            );

            Ok(Redirect::to(&updated_word_url(&id, fields)).into_response())
        }
        Err(api_error) => {
            error!(
                "Error updating \"{}\" with id \"{}\": {}",
                current.word,
                id,
                api_error.messages().join(", ")
            );

            // Re-fetch so the page reflects the authoritative state.
            match api.get_single_word(&id) {
                Ok(word) => Ok(render_word_page(
                    &word,
                    &WordQuery::default(),
                    &api_error.messages(),
                )?
                .into_response()),
                Err(fetch_error) => Ok(render_page(
                    "word.html",
                    context! { errors => error_list(&fetch_error.messages()) },
                )?
                .into_response()),
            }
        }
    }
}
