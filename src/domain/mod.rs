//! Domain primitives shared by the accounts and voting flows.
//!
//! Records reference each other through string identifiers, so this module
//! owns the identifier format and the election status rules.

pub mod otp;
pub mod password;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Document identifier: 4-byte big-endian unix timestamp followed by 8 random
/// bytes, rendered as 24 lowercase hex characters.
///
/// # Examples
///
/// ```rust
/// use votehub::domain::DocumentId;
///
/// let id = DocumentId::generate();
/// assert_eq!(id.as_str().len(), 24);
/// assert_eq!(DocumentId::parse(&format!("ObjectId('{id}')")), Some(id));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub const LEN: usize = 24;

    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;
        use std::fmt::Write;

        let timestamp = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        let random: [u8; 8] = rand::rng().random();

        let mut id = String::with_capacity(Self::LEN);
        let _ = write!(id, "{timestamp:08x}");
        for b in random {
            let _ = write!(id, "{b:02x}");
        }
        Self(id)
    }

    /// Normalises user-supplied identifiers and accepts only well-formed ones.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = clean_id(raw).to_ascii_lowercase();
        if cleaned.len() == Self::LEN && cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(cleaned))
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// Strips `ObjectId('...')` wrappers, quotes and whitespace that leak into
/// identifiers through templates and copied links.
#[must_use]
pub fn clean_id(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(inner) = s
        .strip_prefix("ObjectId(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        s = inner.trim();
    }
    s.trim_matches(|c| c == '\'' || c == '"').trim()
}

/// Primary keys to try for a user-supplied identifier, in order: the cleaned
/// value as typed, then its lowercase document-id form when that differs.
#[must_use]
pub fn lookup_ids(raw: &str) -> Vec<String> {
    let cleaned = clean_id(raw);
    if cleaned.is_empty() {
        return Vec::new();
    }

    let mut ids = vec![cleaned.to_string()];
    match DocumentId::parse(cleaned) {
        Some(id) if id.as_str() != cleaned => ids.push(id.into_inner()),
        _ => {}
    }
    ids
}

/// Derived from the clock; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionStatus {
    Upcoming,
    Active,
    Ended,
}

impl ElectionStatus {
    /// Status of the `[start, end]` window at `now`. Both bounds are inclusive.
    #[must_use]
    pub fn at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now < start {
            Self::Upcoming
        } else if now > end {
            Self::Ended
        } else {
            Self::Active
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for ElectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An election accepts ballots only when its flag is set and `now` falls
/// inside its window.
#[must_use]
pub fn is_ongoing(
    is_active: bool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    is_active && ElectionStatus::at(start, end, now) == ElectionStatus::Active
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_generated_ids_are_hex_and_unique() {
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        assert_eq!(a.as_str().len(), DocumentId::LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_clean_id_strips_wrappers() {
        assert_eq!(clean_id("  65a1b2c3d4e5f60718293a4b "), "65a1b2c3d4e5f60718293a4b");
        assert_eq!(
            clean_id("ObjectId('65a1b2c3d4e5f60718293a4b')"),
            "65a1b2c3d4e5f60718293a4b"
        );
        assert_eq!(clean_id("\"65a1b2c3d4e5f60718293a4b\""), "65a1b2c3d4e5f60718293a4b");
    }

    #[test]
    fn test_lookup_ids_adds_lowercase_form() {
        assert_eq!(
            lookup_ids("ObjectId('65A1B2C3D4E5F60718293A4B')"),
            vec![
                "65A1B2C3D4E5F60718293A4B".to_string(),
                "65a1b2c3d4e5f60718293a4b".to_string()
            ]
        );
        assert_eq!(
            lookup_ids("65a1b2c3d4e5f60718293a4b"),
            vec!["65a1b2c3d4e5f60718293a4b".to_string()]
        );
        assert_eq!(lookup_ids("legacy-id"), vec!["legacy-id".to_string()]);
        assert!(lookup_ids("  ''  ").is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        assert!(DocumentId::parse("not-an-id").is_none());
        assert!(DocumentId::parse("65a1b2c3d4e5f60718293a4").is_none());
        assert!(DocumentId::parse("zza1b2c3d4e5f60718293a4b").is_none());
        assert_eq!(
            DocumentId::parse("65A1B2C3D4E5F60718293A4B").map(DocumentId::into_inner),
            Some("65a1b2c3d4e5f60718293a4b".to_string())
        );
    }

    #[test]
    fn test_election_status_window() {
        let now = Utc::now();
        let start = now - Duration::hours(1);
        let end = now + Duration::hours(1);

        assert_eq!(ElectionStatus::at(start, end, now), ElectionStatus::Active);
        assert_eq!(
            ElectionStatus::at(start, end, start - Duration::seconds(1)),
            ElectionStatus::Upcoming
        );
        assert_eq!(
            ElectionStatus::at(start, end, end + Duration::seconds(1)),
            ElectionStatus::Ended
        );
        assert_eq!(ElectionStatus::at(start, end, start), ElectionStatus::Active);
        assert_eq!(ElectionStatus::at(start, end, end), ElectionStatus::Active);
    }

    #[test]
    fn test_inactive_election_is_never_ongoing() {
        let now = Utc::now();
        let start = now - Duration::hours(1);
        let end = now + Duration::hours(1);
        assert!(is_ongoing(true, start, end, now));
        assert!(!is_ongoing(false, start, end, now));
    }
}
