use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// The closed set of reasons a word can be restricted. The serialized forms
/// are the wire/storage ids; display names live in `display_name`.
#[derive(
    AsRefStr, Display, EnumIter, EnumString, Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize,
)]
pub enum Category {
    #[strum(serialize = "restricted")]
    #[serde(rename = "restricted")]
    Restricted,
    #[strum(serialize = "international-orgs-foreign-gov-depts")]
    #[serde(rename = "international-orgs-foreign-gov-depts")]
    InternationalOrgsForeignGovDepts,
    #[strum(serialize = "criminal-fraudulent-purposes")]
    #[serde(rename = "criminal-fraudulent-purposes")]
    CriminalFraudulentPurposes,
    #[strum(serialize = "prev-subjected-to-direction-to-change")]
    #[serde(rename = "prev-subjected-to-direction-to-change")]
    PrevSubjectedToDirectionToChange,
}

impl Category {
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Restricted => "Restricted",
            Category::InternationalOrgsForeignGovDepts => {
                "International organisations and foreign government departments"
            }
            Category::CriminalFraudulentPurposes => "Names for criminal / fraudulent purposes",
            Category::PrevSubjectedToDirectionToChange => {
                "Names previously subjected to a direction to change them"
            }
        }
    }
}

/// An immutable id → display-name table. Callers construct it once and pass it
/// to whatever maps or renders category ids; nothing is held in module state.
pub type CategoryLookup = Vec<(String, &'static str)>;

pub fn category_lookup() -> CategoryLookup {
    Category::iter()
        .map(|category| (category.to_string(), category.display_name()))
        .collect()
}

/// Resolves a stored category id to its display name. Unknown ids render as
/// an empty string rather than failing the page.
pub fn category_name(lookup: &CategoryLookup, id: &str) -> &'static str {
    lookup
        .iter()
        .find(|(category_id, _)| category_id == id)
        .map(|(_, name)| *name)
        .unwrap_or("")
}

/// Maps a list of stored category ids to display names, dropping entries for
/// ids outside the closed set.
pub fn category_names(lookup: &CategoryLookup, ids: &[String]) -> Vec<&'static str> {
    ids.iter()
        .map(|id| category_name(lookup, id))
        .filter(|name| !name.is_empty())
        .collect()
}
