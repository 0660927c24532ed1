use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A cached attestation token, as persisted in the store file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub token: String,
    #[serde(with = "iso_millis")]
    pub expires_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    /// requested lifetime in seconds, kept for audit only
    pub ttl: u64,
}

impl TokenRecord {
    /// Stamp a freshly issued token: `expires_at = created_at + ttl`, saturating
    /// at the latest representable instant.
    pub fn new(token: String, created_at: DateTime<Utc>, ttl: u64) -> Self {
        let expires_at = i64::try_from(ttl)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| created_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            token,
            expires_at,
            created_at,
            ttl,
        }
    }

    /// Valid strictly before `expires_at`; a token expiring exactly now is expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2025-01-01T00:00:00.000Z`.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_ttl_saturates_instead_of_overflowing() {
        let created_at = Utc::now();
        let record = TokenRecord::new("t".into(), created_at, u64::MAX);
        assert_eq!(record.expires_at, DateTime::<Utc>::MAX_UTC);

        let record = TokenRecord::new("t".into(), created_at, 1800);
        assert_eq!(record.expires_at - created_at, TimeDelta::seconds(1800));
    }
}
