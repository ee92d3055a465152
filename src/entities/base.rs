// 🪪 Base fields shared by every entity
//
// "The id is IDENTITY (never changes), everything else is a VALUE"
//
// - id: UUID v4, assigned once at construction
// - created_at: set once, never touched again
// - updated_at: refreshed on every save

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Persisted timestamp layout (UTC, microsecond precision, no offset)
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current time truncated to what the persisted layout can hold,
/// so a saved timestamp reads back bit-for-bit.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// ============================================================================
// BASE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Base {
    /// Stable identity (UUID) - NEVER changes
    pub id: String,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Base {
    pub fn new() -> Self {
        let now = now();

        Base {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh `updated_at`. Never moves it before `created_at`.
    pub fn touch(&mut self) {
        self.updated_at = now().max(self.created_at);
    }
}

impl Default for Base {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TIMESTAMP CODEC
// ============================================================================

/// serde codec for `DateTime<Utc>` in the persisted layout.
///
/// Reading is lenient: RFC 3339 (with offset) and second precision are
/// accepted as well, so stores written by older tools still load.
pub mod timestamp {
    use super::TIME_FORMAT;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }

        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

// ============================================================================
// TESTS
// ============================================================================
