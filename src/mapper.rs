use chrono::DateTime;
use serde::Serialize;

use crate::words::{CategoriesAuditEntryDto, RestrictedWordDto, SuperRestrictedAuditEntryDto};

/// Rendered in place of a deletion date for words that are still active.
pub const ABSENT_DATE: &str = "-";

const DISPLAY_DATE_FORMAT: &str = "%d %b %y";

/// Presentation shape of one restricted word: formatted dates, display
/// usernames, and pre-mapped audit logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestrictedWordViewModel {
    pub id: String,
    pub word: String,
    pub categories: Vec<String>,
    pub created_by: String,
    pub created_reason: String,
    pub deleted_by: Option<String>,
    pub deleted_reason: Option<String>,
    pub created_at: String,
    pub deleted_at: String,
    pub deleted: bool,
    pub super_restricted: bool,
    pub super_restricted_audit_log: Vec<SuperRestrictedAuditEntry>,
    pub categories_audit_log: Vec<CategoriesAuditEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuperRestrictedAuditEntry {
    pub changed_at: String,
    pub changed_by: String,
    pub new_value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoriesAuditEntry {
    pub changed_at: String,
    pub changed_by: String,
    pub changed_reason: String,
    pub categories: Vec<String>,
}

/// Everything before the `@` of an email-form username; the full value when
/// there is no separator.
pub fn username_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// RFC 3339 timestamps become `"DD MMM YY"`. Anything unparseable passes
/// through untouched so the mapping stays total.
pub fn format_display_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub fn map_from_api(dto: &RestrictedWordDto) -> RestrictedWordViewModel {
    RestrictedWordViewModel {
        id: dto.id.clone(),
        word: dto.full_word.clone(),
        categories: dto.categories.clone(),
        created_by: username_from_email(&dto.created_by),
        created_reason: dto.created_reason.clone(),
        deleted_by: dto.deleted_by.as_deref().map(username_from_email),
        deleted_reason: dto
            .deleted_reason
            .as_deref()
            .filter(|reason| !reason.is_empty())
            .map(str::to_string),
        created_at: format_display_date(&dto.created_at),
        deleted_at: dto
            .deleted_at
            .as_deref()
            .filter(|date| !date.is_empty())
            .map(format_display_date)
            .unwrap_or_else(|| ABSENT_DATE.to_string()),
        deleted: dto.deleted,
        super_restricted: dto.super_restricted,
        super_restricted_audit_log: dto
            .super_restricted_audit_log
            .iter()
            .map(map_super_restricted_entry)
            .collect(),
        categories_audit_log: dto
            .categories_audit_log
            .iter()
            .map(map_categories_entry)
            .collect(),
    }
}

fn map_super_restricted_entry(entry: &SuperRestrictedAuditEntryDto) -> SuperRestrictedAuditEntry {
    SuperRestrictedAuditEntry {
        changed_at: format_display_date(&entry.changed_at),
        changed_by: username_from_email(&entry.changed_by),
        new_value: entry.new_value,
    }
}

fn map_categories_entry(entry: &CategoriesAuditEntryDto) -> CategoriesAuditEntry {
    CategoriesAuditEntry {
        changed_at: format_display_date(&entry.changed_at),
        changed_by: username_from_email(&entry.changed_by),
        changed_reason: entry.changed_reason.clone(),
        categories: entry.categories.clone(),
    }
}

/// One display row per super-restricted change, most recent first:
/// formatted date, display username, and a yes/no cell for the new value.
pub fn super_restricted_history_cells(log: &[SuperRestrictedAuditEntry]) -> Vec<[String; 3]> {
    log.iter()
        .rev()
        .map(|entry| {
            [
                entry.changed_at.clone(),
                entry.changed_by.clone(),
                if entry.new_value { "Yes" } else { "No" }.to_string(),
            ]
        })
        .collect()
}

/// Category audit entries in display order, most recent first.
pub fn categories_history(log: &[CategoriesAuditEntry]) -> Vec<CategoriesAuditEntry> {
    log.iter().rev().cloned().collect()
}
