use chrono::Utc;
use log::{error, info};
use std::str::FromStr;
use thiserror::Error;

use crate::categories::Category;
use crate::database::Database;
use crate::error::WordgateError;
use crate::mapper::{self, RestrictedWordViewModel};
use crate::words::{NewWordRow, Words};

pub const UNKNOWN_ERROR: &str = "An unknown error has occurred.";
pub const WORD_REQUIRED: &str = "A word is required.";
pub const CREATED_REASON_REQUIRED: &str = "A created reason is required.";
pub const DELETED_REASON_REQUIRED: &str = "A deleted reason is required.";
pub const ALREADY_DELETED: &str = "This word has already been deleted.";

/// Service failures, dispatched by variant rather than by probing for fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{}", messages.join(", "))]
    Validation { messages: Vec<String> },

    #[error("{}", messages.join(", "))]
    Conflict {
        messages: Vec<String>,
        conflicting_words: Vec<String>,
    },

    #[error("{UNKNOWN_ERROR}")]
    Unknown,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            messages: vec![message.into()],
        }
    }

    /// Human-readable messages for the uniform error list rendering.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ApiError::Validation { messages } => messages.clone(),
            ApiError::Conflict { messages, .. } => messages.clone(),
            ApiError::Unknown => vec![UNKNOWN_ERROR.to_string()],
        }
    }

    pub fn conflicting_words(&self) -> &[String] {
        match self {
            ApiError::Conflict {
                conflicting_words, ..
            } => conflicting_words,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub starts_with: Option<String>,
    pub contains: Option<String>,
    pub deleted: Option<bool>,
    pub super_restricted: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWordRequest {
    pub word: String,
    pub created_reason: String,
    pub categories: Vec<String>,
    pub super_restricted: bool,
    pub delete_conflicting: bool,
}

/// Exactly one of the three patch payload shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPatch {
    SuperRestricted {
        super_restricted: bool,
    },
    Categories {
        categories: Vec<String>,
        changed_reason: String,
    },
    Both {
        super_restricted: bool,
        categories: Vec<String>,
        changed_reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchWordRequest {
    pub id: String,
    pub patched_by: String,
    pub patch: WordPatch,
}

/// The word-service contract the web layer depends on. Handlers only ever see
/// this trait, so tests can drive them with a scripted implementation.
pub trait WordsApi: Send + Sync {
    fn get_all_words(&self, options: &QueryOptions)
        -> Result<Vec<RestrictedWordViewModel>, ApiError>;

    fn get_single_word(&self, id: &str) -> Result<RestrictedWordViewModel, ApiError>;

    fn create_word(&self, request: &CreateWordRequest) -> Result<(), ApiError>;

    fn delete_word(&self, id: &str, deleted_reason: &str) -> Result<(), ApiError>;

    fn patch_word(&self, request: &PatchWordRequest) -> Result<(), ApiError>;
}

/// Default `WordsApi` backed by the SQLite word store. Carries the acting
/// username for audit attribution on create and delete; patches name their
/// actor explicitly in the request.
#[derive(Clone)]
pub struct SqliteWordsApi {
    database: Database,
    username: String,
}

impl SqliteWordsApi {
    pub fn new(database: Database, username: String) -> Self {
        Self { database, username }
    }

    fn unknown(context: &str, err: WordgateError) -> ApiError {
        error!("{context}: {err}");
        ApiError::Unknown
    }

    fn parse_word_id(id: &str) -> Result<i64, ApiError> {
        id.parse()
            .map_err(|_| ApiError::validation(format!("No word found with id \"{id}\".")))
    }

    fn not_found(id: &str) -> ApiError {
        ApiError::validation(format!("No word found with id \"{id}\"."))
    }

    fn validate_categories(categories: &[String]) -> Result<(), ApiError> {
        for id in categories {
            if Category::from_str(id).is_err() {
                return Err(ApiError::validation(format!(
                    "\"{id}\" is not a valid category."
                )));
            }
        }

        Ok(())
    }
}

impl WordsApi for SqliteWordsApi {
    fn get_all_words(
        &self,
        options: &QueryOptions,
    ) -> Result<Vec<RestrictedWordViewModel>, ApiError> {
        let conn = self
            .database
            .conn()
            .map_err(|e| Self::unknown("Listing words", e))?;

        let words =
            Words::list(&conn, options).map_err(|e| Self::unknown("Listing words", e))?;

        Ok(words.iter().map(mapper::map_from_api).collect())
    }

    fn get_single_word(&self, id: &str) -> Result<RestrictedWordViewModel, ApiError> {
        let word_id = Self::parse_word_id(id)?;

        let conn = self
            .database
            .conn()
            .map_err(|e| Self::unknown("Fetching word", e))?;

        let word = Words::get_by_id(&conn, word_id)
            .map_err(|e| Self::unknown("Fetching word", e))?
            .ok_or_else(|| Self::not_found(id))?;

        Ok(mapper::map_from_api(&word))
    }

    fn create_word(&self, request: &CreateWordRequest) -> Result<(), ApiError> {
        let word = request.word.trim();

        if word.is_empty() {
            return Err(ApiError::validation(WORD_REQUIRED));
        }

        if request.created_reason.trim().is_empty() {
            return Err(ApiError::validation(CREATED_REASON_REQUIRED));
        }

        Self::validate_categories(&request.categories)?;

        let mut conn = self
            .database
            .conn()
            .map_err(|e| Self::unknown("Creating word", e))?;

        let tx = conn
            .transaction()
            .map_err(|e| Self::unknown("Creating word", e.into()))?;

        let conflicting =
            Words::find_conflicting(&tx, word).map_err(|e| Self::unknown("Creating word", e))?;

        if !conflicting.is_empty() {
            if request.delete_conflicting {
                let deleted_at = Utc::now().to_rfc3339();

                for (conflict_id, conflict_word) in &conflicting {
                    info!("Deleting conflicting word \"{conflict_word}\".");
                    Words::soft_delete(
                        &tx,
                        *conflict_id,
                        &self.username,
                        &format!("Conflicted with new word \"{word}\"."),
                        &deleted_at,
                    )
                    .map_err(|e| Self::unknown("Creating word", e))?;
                }
            } else {
                return Err(ApiError::Conflict {
                    messages: vec![format!(
                        "\"{word}\" conflicts with existing restricted words."
                    )],
                    conflicting_words: conflicting
                        .into_iter()
                        .map(|(_, conflict_word)| conflict_word)
                        .collect(),
                });
            }
        }

        Words::insert(
            &tx,
            &NewWordRow {
                full_word: word,
                created_by: &self.username,
                created_reason: request.created_reason.trim(),
                created_at: &Utc::now().to_rfc3339(),
                super_restricted: request.super_restricted,
                categories: &request.categories,
            },
        )
        .map_err(|e| Self::unknown("Creating word", e))?;

        tx.commit()
            .map_err(|e| Self::unknown("Creating word", e.into()))?;

        Ok(())
    }

    fn delete_word(&self, id: &str, deleted_reason: &str) -> Result<(), ApiError> {
        if deleted_reason.trim().is_empty() {
            return Err(ApiError::validation(DELETED_REASON_REQUIRED));
        }

        let word_id = Self::parse_word_id(id)?;

        let conn = self
            .database
            .conn()
            .map_err(|e| Self::unknown("Deleting word", e))?;

        let word = Words::get_by_id(&conn, word_id)
            .map_err(|e| Self::unknown("Deleting word", e))?
            .ok_or_else(|| Self::not_found(id))?;

        if word.deleted {
            return Err(ApiError::validation(ALREADY_DELETED));
        }

        Words::soft_delete(
            &conn,
            word_id,
            &self.username,
            deleted_reason.trim(),
            &Utc::now().to_rfc3339(),
        )
        .map_err(|e| Self::unknown("Deleting word", e))?;

        Ok(())
    }

    fn patch_word(&self, request: &PatchWordRequest) -> Result<(), ApiError> {
        let word_id = Self::parse_word_id(&request.id)?;

        let mut conn = self
            .database
            .conn()
            .map_err(|e| Self::unknown("Patching word", e))?;

        let tx = conn
            .transaction()
            .map_err(|e| Self::unknown("Patching word", e.into()))?;

        Words::get_by_id(&tx, word_id)
            .map_err(|e| Self::unknown("Patching word", e))?
            .ok_or_else(|| Self::not_found(&request.id))?;

        let changed_at = Utc::now().to_rfc3339();

        match &request.patch {
            WordPatch::SuperRestricted { super_restricted } => {
                Words::set_super_restricted(&tx, word_id, *super_restricted)
                    .map_err(|e| Self::unknown("Patching word", e))?;
                Words::append_super_restricted_audit(
                    &tx,
                    word_id,
                    &changed_at,
                    &request.patched_by,
                    *super_restricted,
                )
                .map_err(|e| Self::unknown("Patching word", e))?;
            }
            WordPatch::Categories {
                categories,
                changed_reason,
            } => {
                Self::validate_categories(categories)?;
                Words::set_categories(&tx, word_id, categories)
                    .map_err(|e| Self::unknown("Patching word", e))?;
                Words::append_categories_audit(
                    &tx,
                    word_id,
                    &changed_at,
                    &request.patched_by,
                    changed_reason,
                    categories,
                )
                .map_err(|e| Self::unknown("Patching word", e))?;
            }
            WordPatch::Both {
                super_restricted,
                categories,
                changed_reason,
            } => {
                Self::validate_categories(categories)?;
                Words::set_super_restricted(&tx, word_id, *super_restricted)
                    .map_err(|e| Self::unknown("Patching word", e))?;
                Words::append_super_restricted_audit(
                    &tx,
                    word_id,
                    &changed_at,
                    &request.patched_by,
                    *super_restricted,
                )
                .map_err(|e| Self::unknown("Patching word", e))?;
                Words::set_categories(&tx, word_id, categories)
                    .map_err(|e| Self::unknown("Patching word", e))?;
                Words::append_categories_audit(
                    &tx,
                    word_id,
                    &changed_at,
                    &request.patched_by,
                    changed_reason,
                    categories,
                )
                .map_err(|e| Self::unknown("Patching word", e))?;
            }
        }

        tx.commit()
            .map_err(|e| Self::unknown("Patching word", e.into()))?;

        Ok(())
    }
}
