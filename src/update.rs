use strum::{AsRefStr, Display, EnumString};

use crate::client::ApiError;

pub const NO_DATA_TO_UPDATE: &str =
    "No data to update provided in the request, a new super restricted value and/or categories is required.";
pub const CHANGED_REASON_REQUIRED: &str = "A changed reason is required when updating categories.";
pub const NO_CHANGES_MADE: &str = "No changes have been made.";

/// Which fields a patch is allowed to touch. Selects the payload shape sent to
/// the word service.
#[derive(AsRefStr, Display, EnumString, Debug, PartialEq, Eq, Copy, Clone)]
pub enum UpdateFields {
    #[strum(serialize = "SUPER_RESTRICTED")]
    SuperRestricted,
    #[strum(serialize = "CATEGORIES")]
    Categories,
    #[strum(serialize = "BOTH")]
    Both,
}

/// The authoritative state of the word being moderated.
#[derive(Debug, Clone)]
pub struct CurrentWordState {
    pub super_restricted: bool,
    pub categories: Vec<String>,
}

/// What the staff member submitted from the detail form.
#[derive(Debug, Clone)]
pub struct RequestedWordChange {
    pub super_restricted: bool,
    pub categories: Vec<String>,
    pub changed_reason: Option<String>,
}

/// A length mismatch, or any requested category missing from the current set.
/// Deliberately asymmetric: removals are only caught by the length check, so a
/// requested list padded with duplicates can mask one.
fn categories_changed(current: &[String], requested: &[String]) -> bool {
    requested.len() != current.len()
        || requested.iter().any(|category| !current.contains(category))
}

fn has_changed_reason(requested: &RequestedWordChange) -> bool {
    requested
        .changed_reason
        .as_deref()
        .is_some_and(|reason| !reason.trim().is_empty())
}

/// Classifies a requested change against the word's current state, validating
/// required inputs before any patch is constructed.
pub fn decide_update(
    current: &CurrentWordState,
    requested: &RequestedWordChange,
) -> Result<UpdateFields, ApiError> {
    let categories_changed = categories_changed(&current.categories, &requested.categories);
    let super_restricted_changed = requested.super_restricted != current.super_restricted;

    if !categories_changed && requested.categories.is_empty() {
        return Err(ApiError::validation(NO_DATA_TO_UPDATE));
    }

    match (super_restricted_changed, categories_changed) {
        (true, false) => Ok(UpdateFields::SuperRestricted),
        (false, true) => {
            if has_changed_reason(requested) {
                Ok(UpdateFields::Categories)
            } else {
                Err(ApiError::validation(CHANGED_REASON_REQUIRED))
            }
        }
        (true, true) => {
            if has_changed_reason(requested) {
                Ok(UpdateFields::Both)
            } else {
                Err(ApiError::validation(CHANGED_REASON_REQUIRED))
            }
        }
        (false, false) => Err(ApiError::validation(NO_CHANGES_MADE)),
    }
}
