//! Format predicates applied to string properties.

use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use uuid::Uuid;

static EMAIL_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

/// String formats understood by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Hyphenated UUID, e.g. `d57c10f5-639d-5160-9c81-8a0c6c4ec856`
    Uuid,
    /// RFC 3339 timestamp, or `YYYY-MM-DD HH:MM:SS`
    DateTime,
    /// Standard base64 with padding
    Base64,
    Email,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Uuid, Format::DateTime, Format::Base64, Format::Email];

    /// Name used in schemas and in violation messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Uuid => "uuid",
            Format::DateTime => "date-time",
            Format::Base64 => "x-base64",
            Format::Email => "email",
        }
    }

    /// Keyword registered with the JSON Schema validator. Kept apart from
    /// the standard format names so the predicates below always apply.
    pub fn keyword(&self) -> &'static str {
        match self {
            Format::Uuid => "x-uuid",
            Format::DateTime => "x-date-time",
            Format::Base64 => "x-base64",
            Format::Email => "x-email",
        }
    }

    /// Name used in "is not a valid ..." messages
    pub fn label(&self) -> &'static str {
        match self {
            Format::Uuid => "uuid",
            Format::DateTime => "date-time",
            Format::Base64 => "base64 string",
            Format::Email => "email",
        }
    }

    pub fn is_valid(&self, value: &str) -> bool {
        match self {
            Format::Uuid => is_uuid(value),
            Format::DateTime => is_date_time(value),
            Format::Base64 => is_base64(value),
            Format::Email => is_email(value),
        }
    }
}

fn is_uuid(value: &str) -> bool {
    // Only the hyphenated form is accepted, not the simple/braced/urn variants
    value.len() == 36 && Uuid::parse_str(value).is_ok()
}

fn is_date_time(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").is_ok()
}

fn is_base64(value: &str) -> bool {
    !value.is_empty() && STANDARD.decode(value).is_ok()
}

fn is_email(value: &str) -> bool {
    EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}
