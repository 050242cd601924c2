use axum::{
    extract::{Query, RawForm},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Extension,
};
use log::{error, info};
use minijinja::context;
use serde::Deserialize;

use crate::client::{CreateWordRequest, QueryOptions};
use crate::pager::Pager;

use super::{
    category_options, error_list, form_pairs, form_value, form_values, redirect_with_query,
    render_page, ApiHandle,
};

#[derive(Deserialize, Default)]
pub struct ListQuery {
    #[serde(rename = "filterWord")]
    pub filter_word: Option<String>,
    #[serde(rename = "filterStatus")]
    pub filter_status: Option<String>,
    #[serde(rename = "filterSuperRestricted")]
    pub filter_super_restricted: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "deletedWord")]
    pub deleted_word: Option<String>,
    #[serde(rename = "addedWord")]
    pub added_word: Option<String>,
}

/// Maps the list page's filter parameters onto the service query.
fn query_options(query: &ListQuery) -> QueryOptions {
    let mut options = QueryOptions {
        contains: query
            .filter_word
            .clone()
            .filter(|word| !word.is_empty()),
        ..QueryOptions::default()
    };

    match query.filter_status.as_deref() {
        Some("Active") => options.deleted = Some(false),
        Some("Deleted") => options.deleted = Some(true),
        _ => {}
    }

    match query.filter_super_restricted.as_deref() {
        Some("Super") => options.super_restricted = Some(true),
        Some("Normal") => options.super_restricted = Some(false),
        _ => {}
    }

    options
}

/// Query-string echo appended to pagination links so the active filters
/// survive page navigation.
fn filter_url(query: &ListQuery) -> String {
    let mut url_params: Vec<(&str, &str)> = Vec::new();

    if let Some(status) = query.filter_status.as_deref().filter(|s| !s.is_empty()) {
        url_params.push(("filterStatus", status));
    }

    if let Some(word) = query.filter_word.as_deref().filter(|w| !w.is_empty()) {
        url_params.push(("filterWord", word));
    }

    if let Some(super_restricted) = query
        .filter_super_restricted
        .as_deref()
        .filter(|s| !s.is_empty())
    {
        url_params.push(("filterSuperRestricted", super_restricted));
    }

    format!(
        "?{}",
        serde_urlencoded::to_string(&url_params).unwrap_or_default()
    )
}

pub async fn get_all_words(
    Extension(api): Extension<ApiHandle>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, StatusCode> {
    let words = match api.get_all_words(&query_options(&query)) {
        Ok(words) => words,
        Err(api_error) => {
            return render_page(
                "all.html",
                context! { errors => error_list(&api_error.messages()) },
            )
        }
    };

    let pager = Pager::new(query.page.as_deref(), words);

    render_page(
        "all.html",
        context! {
            filter_url => filter_url(&query),
            words => pager.page_results(),
            deleted_word => query.deleted_word,
            added_word => query.added_word,
            filter_params => context! {
                word => query.filter_word,
                status => query.filter_status,
                super_restricted => query.filter_super_restricted,
            },
            pagination => pager.pagination_options(),
        },
    )
}

pub async fn create_new_word() -> Result<Html<String>, StatusCode> {
    render_page(
        "add-new-word.html",
        context! { categories => category_options(&[]) },
    )
}

pub async fn handle_create_new_word(
    Extension(api): Extension<ApiHandle>,
    RawForm(body): RawForm,
) -> Result<Response, StatusCode> {
    let pairs = form_pairs(&body);

    let word = form_value(&pairs, "word").unwrap_or_default().to_string();
    let created_reason = form_value(&pairs, "createdReason")
        .unwrap_or_default()
        .to_string();
    let categories = form_values(&pairs, "categories");
    let super_restricted = form_value(&pairs, "superRestricted") == Some("true");
    let delete_conflicting = form_value(&pairs, "deleteConflicting") == Some("true");

    info!("Attempting to create new word \"{word}\".");

    let request = CreateWordRequest {
        word: word.clone(),
        created_reason: created_reason.clone(),
        categories: categories.clone(),
        super_restricted,
        delete_conflicting,
    };

    if let Err(api_error) = api.create_word(&request) {
        error!(
            "Error creating new word \"{}\": {}",
            word,
            api_error.messages().join(", ")
        );

        return Ok(render_page(
            "add-new-word.html",
            context! {
                errors => error_list(&api_error.messages()),
                conflicting_words => api_error.conflicting_words(),
                categories => category_options(&categories),
                form => context! {
                    word,
                    created_reason,
                    super_restricted,
                },
            },
        )?
        .into_response());
    }

    info!("Successfully created new word \"{word}\".");

    Ok(redirect_with_query("/", &[("addedWord", &word)]).into_response())
}

#[derive(Deserialize, Default)]
pub struct DeleteQuery {
    pub id: Option<String>,
    pub word: Option<String>,
}

pub async fn delete_word(Query(query): Query<DeleteQuery>) -> Result<Html<String>, StatusCode> {
    render_page(
        "delete-word.html",
        context! {
            id => query.id,
            word => query.word,
        },
    )
}

pub async fn handle_delete_word(
    Extension(api): Extension<ApiHandle>,
    RawForm(body): RawForm,
) -> Result<Response, StatusCode> {
    let pairs = form_pairs(&body);

    let id = form_value(&pairs, "id").unwrap_or_default().to_string();
    let word = form_value(&pairs, "word").unwrap_or_default().to_string();
    let deleted_reason = form_value(&pairs, "deletedReason").unwrap_or_default();

    info!("Attempting to delete \"{word}\" with id \"{id}\"");

    if let Err(api_error) = api.delete_word(&id, deleted_reason) {
        error!(
            "Error deleting \"{}\" with id \"{}\": {}",
            word,
            id,
            api_error.messages().join(", ")
        );

        return Ok(render_page(
            "delete-word.html",
            context! {
                id,
                word,
                errors => error_list(&api_error.messages()),
            },
        )?
        .into_response());
    }

    info!("Successfully deleted \"{word}\" with id \"{id}\"");

    Ok(redirect_with_query("/", &[("deletedWord", &word)]).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Bytes};
    use axum::http::header;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    use crate::client::{ApiError, PatchWordRequest, WordsApi};
    use crate::mapper::RestrictedWordViewModel;

    struct ScriptedApi {
        words: Vec<RestrictedWordViewModel>,
        create_result: Result<(), ApiError>,
        delete_result: Result<(), ApiError>,
        creates: Mutex<Vec<CreateWordRequest>>,
    }

    impl ScriptedApi {
        fn new(words: Vec<RestrictedWordViewModel>) -> Self {
            Self {
                words,
                create_result: Ok(()),
                delete_result: Ok(()),
                creates: Mutex::new(Vec::new()),
            }
        }
    }

    impl WordsApi for ScriptedApi {
        fn get_all_words(
            &self,
            _options: &QueryOptions,
        ) -> Result<Vec<RestrictedWordViewModel>, ApiError> {
            Ok(self.words.clone())
        }

        fn get_single_word(&self, _id: &str) -> Result<RestrictedWordViewModel, ApiError> {
            Err(ApiError::Unknown)
        }

        fn create_word(&self, request: &CreateWordRequest) -> Result<(), ApiError> {
            self.creates.lock().unwrap().push(request.clone());
            self.create_result.clone()
        }

        fn delete_word(&self, _id: &str, _deleted_reason: &str) -> Result<(), ApiError> {
            self.delete_result.clone()
        }

        fn patch_word(&self, _request: &PatchWordRequest) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn view_model(id: &str, word: &str) -> RestrictedWordViewModel {
        RestrictedWordViewModel {
            id: id.to_string(),
            word: word.to_string(),
            categories: vec!["restricted".to_string()],
            created_by: "admin".to_string(),
            created_reason: "registry request".to_string(),
            deleted_by: None,
            deleted_reason: None,
            created_at: "04 Jun 20".to_string(),
            deleted_at: "-".to_string(),
            deleted: false,
            super_restricted: false,
            super_restricted_audit_log: Vec::new(),
            categories_audit_log: Vec::new(),
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn list_page_renders_words_and_pagination() {
        let handle: ApiHandle = Arc::new(ScriptedApi::new(vec![
            view_model("1", "Example word 1"),
            view_model("2", "Example word 2"),
        ]));

        let page = get_all_words(Extension(handle), Query(ListQuery::default()))
            .await
            .unwrap();

        assert!(page.0.contains("Example word 1"));
        assert!(page.0.contains("Example word 2"));
        assert!(page.0.contains("Showing 1 to 2"));
        assert!(page.0.contains("of 2 results"));
        assert!(page.0.contains("Page 1 of 1"));
    }

    #[tokio::test]
    async fn successful_creation_redirects_with_the_added_word() {
        let api = Arc::new(ScriptedApi::new(Vec::new()));
        let handle: ApiHandle = api.clone();

        let response = handle_create_new_word(
            Extension(handle),
            RawForm(Bytes::from_static(
                b"word=offlimits&createdReason=registry+request&categories=restricted&superRestricted=true",
            )),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/?addedWord=offlimits"
        );

        let creates = api.creates.lock().unwrap();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].word, "offlimits");
        assert!(creates[0].super_restricted);
        assert_eq!(creates[0].categories, vec!["restricted".to_string()]);
    }

    #[tokio::test]
    async fn conflicting_creation_rerenders_the_form_with_the_words() {
        let api = Arc::new(ScriptedApi {
            create_result: Err(ApiError::Conflict {
                messages: vec!["\"firstword\" conflicts with existing restricted words.".to_string()],
                conflicting_words: vec!["first".to_string()],
            }),
            ..ScriptedApi::new(Vec::new())
        });
        let handle: ApiHandle = api.clone();

        let response = handle_create_new_word(
            Extension(handle),
            RawForm(Bytes::from_static(
                b"word=firstword&createdReason=registry+request&categories=restricted",
            )),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("conflicts with existing restricted words"));
        assert!(body.contains("first"));
        assert!(body.contains("deleteConflicting"));
    }

    #[tokio::test]
    async fn successful_deletion_redirects_with_the_deleted_word() {
        let handle: ApiHandle = Arc::new(ScriptedApi::new(Vec::new()));

        let response = handle_delete_word(
            Extension(handle),
            RawForm(Bytes::from_static(
                b"id=17&word=offlimits&deletedReason=cleanup",
            )),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/?deletedWord=offlimits"
        );
    }

    #[tokio::test]
    async fn failed_deletion_rerenders_the_confirmation_page() {
        let api = Arc::new(ScriptedApi {
            delete_result: Err(ApiError::validation("Test message")),
            ..ScriptedApi::new(Vec::new())
        });
        let handle: ApiHandle = api.clone();

        let response = handle_delete_word(
            Extension(handle),
            RawForm(Bytes::from_static(b"id=17&word=offlimits&deletedReason=")),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Test message"));
        assert!(body.contains("offlimits"));
    }

    fn list_query(status: Option<&str>, word: Option<&str>, super_restricted: Option<&str>) -> ListQuery {
        ListQuery {
            filter_word: word.map(str::to_string),
            filter_status: status.map(str::to_string),
            filter_super_restricted: super_restricted.map(str::to_string),
            ..ListQuery::default()
        }
    }

    #[test]
    fn active_status_filters_to_undeleted_words() {
        let options = query_options(&list_query(Some("Active"), None, None));

        assert_eq!(options.deleted, Some(false));
        assert_eq!(options.contains, None);
    }

    #[test]
    fn deleted_status_filters_to_deleted_words() {
        let options = query_options(&list_query(Some("Deleted"), None, None));

        assert_eq!(options.deleted, Some(true));
    }

    #[test]
    fn super_and_normal_map_to_the_super_restricted_filter() {
        assert_eq!(
            query_options(&list_query(None, None, Some("Super"))).super_restricted,
            Some(true)
        );
        assert_eq!(
            query_options(&list_query(None, None, Some("Normal"))).super_restricted,
            Some(false)
        );
    }

    #[test]
    fn filter_word_becomes_a_contains_filter() {
        let options = query_options(&list_query(None, Some("fred"), None));

        assert_eq!(options.contains.as_deref(), Some("fred"));
    }

    #[test]
    fn filter_url_echoes_supplied_params_encoded() {
        let url = filter_url(&list_query(Some("Active"), Some("two words"), None));

        assert_eq!(url, "?filterStatus=Active&filterWord=two+words");
    }

    #[test]
    fn filter_url_is_a_bare_question_mark_without_filters() {
        assert_eq!(filter_url(&list_query(None, None, None)), "?");
    }
}
